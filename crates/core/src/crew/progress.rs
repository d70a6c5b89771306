//! # Crew Progress
//!
//! Stage tracking driven by real engine events.

use serde::{Deserialize, Serialize};

use super::events::{CrewEvent, CrewEventKind};
use crate::tasks::TaskId;

/// Stage of the crew
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CrewStage {
    /// No run in flight
    #[default]
    Idle,
    /// Planner building the outline
    Planning,
    /// Writer drafting
    Writing,
    /// Editor polishing
    Editing,
    Complete,
    Failed,
}

impl CrewStage {
    /// Status line shown while the stage is active
    pub fn label(&self) -> &'static str {
        match self {
            CrewStage::Idle => "Waiting for a topic",
            CrewStage::Planning => "Planning content structure...",
            CrewStage::Writing => "Writing the article...",
            CrewStage::Editing => "Editing and polishing...",
            CrewStage::Complete => "Article generated successfully!",
            CrewStage::Failed => "Failed to generate article.",
        }
    }

    fn for_task(task: TaskId) -> Self {
        match task {
            TaskId::Plan => CrewStage::Planning,
            TaskId::Write => CrewStage::Writing,
            TaskId::Edit => CrewStage::Editing,
        }
    }
}

/// Progress of the current run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrewProgress {
    pub stage: CrewStage,
    /// Tasks finished in this run
    pub completed_tasks: u8,
    pub active_agent: Option<String>,
}

impl CrewProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one engine event into the progress state.
    pub fn apply(&mut self, event: &CrewEvent) {
        match event.kind {
            CrewEventKind::CrewStarted => {
                *self = Self {
                    stage: CrewStage::Planning,
                    completed_tasks: 0,
                    active_agent: None,
                };
            }
            CrewEventKind::TaskStarted => {
                if let Some(task) = event.task {
                    self.stage = CrewStage::for_task(task);
                }
                self.active_agent = Some(event.agent.clone());
            }
            CrewEventKind::TaskCompleted => {
                self.completed_tasks = self.completed_tasks.saturating_add(1);
                self.active_agent = None;
            }
            CrewEventKind::CrewCompleted => {
                self.stage = CrewStage::Complete;
                self.active_agent = None;
            }
            CrewEventKind::TaskFailed | CrewEventKind::CrewFailed => self.fail(),
        }
    }

    pub fn fail(&mut self) {
        self.stage = CrewStage::Failed;
        self.active_agent = None;
    }

    /// Check if the run has finished, either way
    pub fn is_complete(&self) -> bool {
        matches!(self.stage, CrewStage::Complete | CrewStage::Failed)
    }

    pub fn is_success(&self) -> bool {
        self.stage == CrewStage::Complete
    }

    /// Share of the three tasks done, 0–100
    pub fn percent(&self) -> u8 {
        if self.stage == CrewStage::Complete {
            return 100;
        }
        (u16::from(self.completed_tasks.min(3)) * 100 / 3) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: CrewEventKind, agent: &str, task: Option<TaskId>) -> CrewEvent {
        let event = CrewEvent::new(kind, agent);
        match task {
            Some(task) => event.with_task(task),
            None => event,
        }
    }

    #[test]
    fn test_progress_follows_tasks() {
        let mut progress = CrewProgress::new();
        assert_eq!(progress.stage, CrewStage::Idle);

        progress.apply(&event(CrewEventKind::CrewStarted, "crew", None));
        assert_eq!(progress.stage, CrewStage::Planning);

        progress.apply(&event(CrewEventKind::TaskStarted, "planner", Some(TaskId::Plan)));
        progress.apply(&event(CrewEventKind::TaskCompleted, "planner", Some(TaskId::Plan)));
        assert_eq!(progress.percent(), 33);

        progress.apply(&event(CrewEventKind::TaskStarted, "writer", Some(TaskId::Write)));
        assert_eq!(progress.stage, CrewStage::Writing);
        assert_eq!(progress.active_agent.as_deref(), Some("writer"));

        progress.apply(&event(CrewEventKind::TaskCompleted, "writer", Some(TaskId::Write)));
        progress.apply(&event(CrewEventKind::TaskStarted, "editor", Some(TaskId::Edit)));
        progress.apply(&event(CrewEventKind::TaskCompleted, "editor", Some(TaskId::Edit)));
        progress.apply(&event(CrewEventKind::CrewCompleted, "crew", None));
        assert!(progress.is_success());
        assert_eq!(progress.percent(), 100);
    }

    #[test]
    fn test_failure_is_terminal_until_restart() {
        let mut progress = CrewProgress::new();
        progress.apply(&event(CrewEventKind::CrewStarted, "crew", None));
        progress.apply(&event(CrewEventKind::TaskFailed, "writer", Some(TaskId::Write)));
        assert!(progress.is_complete());
        assert!(!progress.is_success());

        progress.apply(&event(CrewEventKind::CrewStarted, "crew", None));
        assert_eq!(progress.stage, CrewStage::Planning);
        assert_eq!(progress.completed_tasks, 0);
    }
}
