//! # Crew Engine
//!
//! The seam to the external orchestration framework. A [`Crew`] is the
//! bound personas and tasks for one topic; an engine runs it once and
//! returns the final text.

use anyhow::{Context, Result};
use async_trait::async_trait;
use radkit::macros::LLMOutput;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::events::{CrewEvent, CrewEventKind, EventSink};
use crate::agents::{create_personas, BoundPersona};
use crate::credentials::Credential;
use crate::models::ModelConfig;
use crate::run_llm_function;
use crate::tasks::{create_tasks, BoundTask, TaskId};
use crate::topic::Topic;

/// Inputs passed alongside the crew (`{"topic": ...}`)
pub type CrewInputs = HashMap<String, String>;

/// One pipeline run: topic plus personas and tasks in order, all bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crew {
    pub topic: Topic,
    pub agents: Vec<BoundPersona>,
    pub tasks: Vec<BoundTask>,
}

impl Crew {
    /// Build the registries and bind the topic into every template.
    pub fn assemble(topic: &Topic) -> Self {
        let personas = create_personas();
        let tasks = create_tasks(&personas.planner, &personas.writer, &personas.editor);
        Self {
            topic: topic.clone(),
            agents: personas.in_order().iter().map(|p| p.bind(topic)).collect(),
            tasks: tasks.in_order().iter().map(|t| t.bind(topic)).collect(),
        }
    }

    pub fn inputs(&self) -> CrewInputs {
        HashMap::from([("topic".to_string(), self.topic.to_string())])
    }
}

/// Output of one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskOutput {
    pub task: TaskId,
    pub agent: String,
    pub raw: String,
}

/// Terminal result of a crew run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrewOutput {
    /// Output of the last task
    pub raw: String,
    pub tasks_output: Vec<TaskOutput>,
}

impl CrewOutput {
    /// Assemble from per-task outputs; the final article is the last one.
    pub fn from_tasks(tasks_output: Vec<TaskOutput>) -> Result<Self> {
        let raw = tasks_output
            .last()
            .map(|t| t.raw.clone())
            .context("Crew produced no task output")?;
        Ok(Self { raw, tasks_output })
    }
}

/// An orchestration engine: runs the tasks in declared order, feeding each
/// task its predecessor's output.
#[async_trait]
pub trait CrewEngine: Send + Sync {
    async fn kickoff(&self, crew: &Crew, inputs: &CrewInputs, events: &EventSink)
        -> Result<CrewOutput>;
}

/// Structured reply requested from the model for every task.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, LLMOutput)]
pub struct TaskDeliverable {
    /// The complete deliverable for the task, as markdown text
    pub content: String,
}

/// Engine backed by radkit `LlmFunction`s, one call per task.
#[derive(Debug, Clone)]
pub struct RadkitEngine {
    config: ModelConfig,
    credential: Credential,
}

impl RadkitEngine {
    pub fn new(config: ModelConfig, credential: Credential) -> Self {
        Self { config, credential }
    }

    async fn run_task(&self, task: &BoundTask, context: Option<&str>) -> Result<String> {
        let system = task.agent.system_instructions();
        let prompt = task.prompt(context);
        let output = run_llm_function!(
            &self.config,
            self.credential.expose(),
            TaskDeliverable,
            system.as_str(),
            prompt
        )?;
        Ok(output.content)
    }
}

#[async_trait]
impl CrewEngine for RadkitEngine {
    async fn kickoff(
        &self,
        crew: &Crew,
        inputs: &CrewInputs,
        events: &EventSink,
    ) -> Result<CrewOutput> {
        tracing::debug!(?inputs, provider = ?self.config.provider, model = %self.config.model, "Crew kickoff");

        let mut outputs: HashMap<TaskId, String> = HashMap::new();
        let mut tasks_output = Vec::with_capacity(crew.tasks.len());

        for task in &crew.tasks {
            let context = match task.context {
                Some(prev) => Some(outputs.get(&prev).map(String::as_str).with_context(|| {
                    format!(
                        "Task '{}' depends on '{}', which has not run",
                        task.id.as_str(),
                        prev.as_str()
                    )
                })?),
                None => None,
            };

            events
                .emit(CrewEvent::new(CrewEventKind::TaskStarted, &task.agent.id).with_task(task.id))
                .await;

            let raw = match self.run_task(task, context).await {
                Ok(raw) => raw,
                Err(e) => {
                    events
                        .emit(
                            CrewEvent::new(CrewEventKind::TaskFailed, &task.agent.id)
                                .with_task(task.id)
                                .with_data(serde_json::json!({ "error": e.to_string() })),
                        )
                        .await;
                    return Err(e).with_context(|| {
                        format!("{} failed on task '{}'", task.agent.role, task.id.as_str())
                    });
                }
            };

            events
                .emit(
                    CrewEvent::new(CrewEventKind::TaskCompleted, &task.agent.id)
                        .with_task(task.id)
                        .with_data(serde_json::json!({ "chars": raw.chars().count() })),
                )
                .await;

            outputs.insert(task.id, raw.clone());
            tasks_output.push(TaskOutput {
                task: task.id,
                agent: task.agent.id.clone(),
                raw,
            });
        }

        CrewOutput::from_tasks(tasks_output)
    }
}
