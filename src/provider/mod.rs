//! Collaborator abstractions: calendar, notification, reply, and reasoning
//! providers, plus the failure taxonomy they all share.

pub mod error;
pub mod traits;

pub use error::{ProviderError, ProviderErrorKind};
pub use traits::{
    AvailabilityProvider, EventMetadata, EventProvider, NotificationProvider, ReasoningProvider,
    ReplyObservation, ReplyProvider, ToolChoice,
};
