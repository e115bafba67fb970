//! Markdown session logs.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use uuid::Uuid;

use crate::session::audit::{AuditRecord, InvocationOutcome};
use crate::session::SessionView;

/// Writes one markdown file per session under a configured directory.
///
/// The file is rewritten from the current [`SessionView`] on every call, so
/// a crash mid-session leaves the last published view on disk rather than a
/// torn append.
#[derive(Debug, Clone)]
pub struct SessionLogWriter {
    path: PathBuf,
}

impl SessionLogWriter {
    /// Create a writer for one session.
    ///
    /// # Arguments
    /// * `dir` - Log directory, created if missing.
    /// * `session_id` - Names the file `session-<id>.md`.
    pub fn new(dir: &Path, session_id: Uuid) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
        Ok(Self {
            path: dir.join(format!("session-{session_id}.md")),
        })
    }

    /// Where this session's log lives.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render the view and write the whole file.
    pub fn write(&self, view: &SessionView) -> Result<()> {
        let rendered = render(view);
        std::fs::write(&self.path, rendered)
            .with_context(|| format!("Failed to write session log: {}", self.path.display()))
    }
}

fn render(view: &SessionView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Scheduling Session {}", view.session_id);
    let _ = writeln!(out);
    let _ = writeln!(out, "- **Title:** {}", view.title);
    let _ = writeln!(out, "- **State:** {}", view.state);
    if let Some(slot) = &view.confirmed_slot {
        let _ = writeln!(out, "- **Confirmed slot:** {} - {}", slot.start, slot.end);
    }
    if let Some(event_id) = &view.event_id {
        let _ = writeln!(out, "- **Event id:** {event_id}");
    }
    if let Some(failure) = &view.failure {
        let _ = writeln!(out, "- **Failure:** {failure}");
    }
    if !view.dropped_participants.is_empty() {
        let _ = writeln!(
            out,
            "- **Dropped participants:** {}",
            view.dropped_participants.join(", ")
        );
    }
    let _ = writeln!(out, "- **Updated:** {}", view.updated_at.to_rfc3339());

    if !view.candidates.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Candidates");
        let _ = writeln!(out);
        for candidate in &view.candidates {
            let _ = writeln!(
                out,
                "- {} - {} (score {:.1})",
                candidate.start, candidate.end, candidate.score
            );
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "## Timeline");
    let _ = writeln!(out);
    for record in &view.audit {
        match record {
            AuditRecord::Control(control) => {
                let _ = writeln!(
                    out,
                    "- `{}` **{}** {}",
                    control.at.to_rfc3339(),
                    control.event,
                    control.detail
                );
            }
            AuditRecord::Invocation(inv) => {
                let status = match &inv.outcome {
                    InvocationOutcome::Succeeded { .. } => "ok".to_string(),
                    InvocationOutcome::Failed { kind, message } => {
                        format!("failed ({kind}): {message}")
                    }
                };
                let _ = writeln!(
                    out,
                    "- `{}` **{}** attempt {} - {}",
                    inv.started_at.to_rfc3339(),
                    inv.tool,
                    inv.attempt,
                    status
                );
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::audit::ToolInvocation;
    use crate::session::{SessionState, SessionView};
    use crate::tools::SchedulingTool;
    use chrono::Utc;
    use serde_json::json;

    fn view() -> SessionView {
        let now = Utc::now();
        SessionView {
            session_id: Uuid::new_v4(),
            state: SessionState::Scheduled,
            title: "Design sync".to_string(),
            candidates: Vec::new(),
            confirmed_slot: None,
            event_id: Some("evt-42".to_string()),
            failure: None,
            reproposal_round: 0,
            relaxation_round: 0,
            dropped_participants: vec!["c@example.com".to_string()],
            audit: vec![AuditRecord::Invocation(ToolInvocation::new(
                SchedulingTool::CreateEvent,
                json!({}),
                InvocationOutcome::Succeeded { output: json!({}) },
                1,
                now,
                now,
            ))],
            updated_at: now,
        }
    }

    #[test]
    fn writes_a_readable_markdown_file() {
        let dir = tempfile::tempdir().unwrap();
        let view = view();
        let writer = SessionLogWriter::new(dir.path(), view.session_id).unwrap();
        writer.write(&view).unwrap();

        let contents = std::fs::read_to_string(writer.path()).unwrap();
        assert!(contents.contains("Design sync"));
        assert!(contents.contains("evt-42"));
        assert!(contents.contains("create_event"));
        assert!(contents.contains("Dropped participants"));
    }

    #[test]
    fn rewrites_reflect_the_latest_view() {
        let dir = tempfile::tempdir().unwrap();
        let mut view = view();
        let writer = SessionLogWriter::new(dir.path(), view.session_id).unwrap();
        writer.write(&view).unwrap();

        view.event_id = Some("evt-43".to_string());
        writer.write(&view).unwrap();
        let contents = std::fs::read_to_string(writer.path()).unwrap();
        assert!(contents.contains("evt-43"));
        assert!(!contents.contains("evt-42"));
    }
}
