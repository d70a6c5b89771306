//! # Crew Events
//!
//! Progress reported by the engine as each task starts and finishes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::tasks::TaskId;

/// Kind of crew event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CrewEventKind {
    /// Run accepted, engine about to start
    CrewStarted,
    /// A persona started its task
    TaskStarted,
    /// A persona finished its task
    TaskCompleted,
    /// A task failed; the run fails with it
    TaskFailed,
    /// Final article available
    CrewCompleted,
    /// Run failed
    CrewFailed,
}

impl CrewEventKind {
    /// Serialized name, also used as the SSE event name
    pub fn as_str(&self) -> &'static str {
        match self {
            CrewEventKind::CrewStarted => "crew_started",
            CrewEventKind::TaskStarted => "task_started",
            CrewEventKind::TaskCompleted => "task_completed",
            CrewEventKind::TaskFailed => "task_failed",
            CrewEventKind::CrewCompleted => "crew_completed",
            CrewEventKind::CrewFailed => "crew_failed",
        }
    }
}

/// An event in the crew
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewEvent {
    /// Unique event ID
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: CrewEventKind,
    /// Persona that produced this event (`crew` for run-level events)
    pub agent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskId>,
    /// Associated data (JSON)
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl CrewEvent {
    pub fn new(kind: CrewEventKind, agent: &str) -> Self {
        Self {
            id: event_id(),
            timestamp: Utc::now(),
            kind,
            agent: agent.to_string(),
            task: None,
            data: None,
        }
    }

    pub fn with_task(mut self, task: TaskId) -> Self {
        self.task = Some(task);
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Optional event channel. Sending never fails the run.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::Sender<CrewEvent>>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<CrewEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub async fn emit(&self, event: CrewEvent) {
        if let Some(tx) = &self.tx {
            if tx.send(event).await.is_err() {
                tracing::debug!("Crew event receiver dropped");
            }
        }
    }
}

/// Time-ordered id, unique enough for correlating events in one process
fn event_id() -> String {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_nanos();
    let salt = RandomState::new().build_hasher().finish() as u32;
    format!("{:x}-{:x}", nanos, salt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_creation() {
        let event = CrewEvent::new(CrewEventKind::TaskStarted, "writer").with_task(TaskId::Write);
        assert_eq!(event.agent, "writer");
        assert_eq!(event.task, Some(TaskId::Write));

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"task_started\""));
        assert!(json.contains("\"write\""));
    }

    #[test]
    fn test_kind_name_matches_serde() {
        for kind in [
            CrewEventKind::CrewStarted,
            CrewEventKind::TaskStarted,
            CrewEventKind::TaskCompleted,
            CrewEventKind::TaskFailed,
            CrewEventKind::CrewCompleted,
            CrewEventKind::CrewFailed,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[tokio::test]
    async fn test_sink_delivers_and_tolerates_closed_channel() {
        let (tx, mut rx) = mpsc::channel(4);
        let sink = EventSink::new(tx);
        sink.emit(CrewEvent::new(CrewEventKind::CrewStarted, "crew")).await;
        assert_eq!(rx.recv().await.unwrap().kind, CrewEventKind::CrewStarted);

        drop(rx);
        sink.emit(CrewEvent::new(CrewEventKind::CrewFailed, "crew")).await;
        EventSink::disabled()
            .emit(CrewEvent::new(CrewEventKind::CrewFailed, "crew"))
            .await;
    }
}
