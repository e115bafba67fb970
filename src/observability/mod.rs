//! Session observability.
//!
//! Structured events go through `tracing`; this module adds an optional
//! human-readable markdown file per session for after-the-fact review.

pub mod logger;

pub use logger::SessionLogWriter;
