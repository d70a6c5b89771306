//! # Article Crew
//!
//! `run(topic)`: assemble the crew, hand it to the engine once, and turn
//! the outcome into an [`ArticleResult`] or a [`ScribeError::Generation`].

use std::sync::Arc;
use tokio::sync::mpsc;

use super::engine::{Crew, CrewEngine};
use super::events::{CrewEvent, CrewEventKind, EventSink};
use crate::article::ArticleResult;
use crate::error::{ScribeError, ScribeResult};
use crate::topic::Topic;

/// Runs the planner → writer → editor pipeline on an engine.
#[derive(Clone)]
pub struct ArticleCrew {
    engine: Arc<dyn CrewEngine>,
    events: EventSink,
}

impl ArticleCrew {
    pub fn new(engine: Arc<dyn CrewEngine>) -> Self {
        Self {
            engine,
            events: EventSink::disabled(),
        }
    }

    /// Report progress on this channel
    pub fn with_event_channel(mut self, tx: mpsc::Sender<CrewEvent>) -> Self {
        self.events = EventSink::new(tx);
        self
    }

    /// Validate a raw topic, then run.
    pub async fn generate(&self, topic: &str) -> ScribeResult<ArticleResult> {
        let topic = Topic::parse(topic)?;
        self.run(&topic).await
    }

    /// One engine invocation per call. Nothing is cached or retried.
    #[tracing::instrument(skip(self), fields(topic = %topic))]
    pub async fn run(&self, topic: &Topic) -> ScribeResult<ArticleResult> {
        self.events
            .emit(CrewEvent::new(CrewEventKind::CrewStarted, "crew"))
            .await;

        let crew = Crew::assemble(topic);
        let inputs = crew.inputs();
        tracing::info!("Crew started");

        let outcome = match self.engine.kickoff(&crew, &inputs, &self.events).await {
            Ok(output) if output.raw.trim().is_empty() => Err(ScribeError::Generation(
                "the crew returned an empty article".to_string(),
            )),
            Ok(output) => Ok(ArticleResult::new(topic.clone(), output.raw)),
            Err(e) => Err(ScribeError::generation(&e)),
        };

        match &outcome {
            Ok(article) => {
                tracing::info!(chars = article.char_count, "Article generated");
                self.events
                    .emit(
                        CrewEvent::new(CrewEventKind::CrewCompleted, "crew")
                            .with_data(serde_json::json!({ "chars": article.char_count })),
                    )
                    .await;
            }
            Err(e) => {
                tracing::warn!("Crew failed: {}", e);
                self.events
                    .emit(
                        CrewEvent::new(CrewEventKind::CrewFailed, "crew")
                            .with_data(serde_json::json!({ "error": e.to_string() })),
                    )
                    .await;
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crew::engine::{CrewInputs, CrewOutput, TaskOutput};
    use crate::tasks::TaskId;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Echoes each task's context so ordering is visible in the output.
    #[derive(Default)]
    struct ScriptedEngine {
        calls: AtomicUsize,
        seen_topics: Mutex<Vec<String>>,
        fail_with: Option<String>,
        final_text: Option<String>,
    }

    #[async_trait]
    impl CrewEngine for ScriptedEngine {
        async fn kickoff(
            &self,
            crew: &Crew,
            inputs: &CrewInputs,
            events: &EventSink,
        ) -> anyhow::Result<CrewOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_topics
                .lock()
                .unwrap()
                .push(inputs.get("topic").cloned().unwrap_or_default());
            if let Some(msg) = &self.fail_with {
                anyhow::bail!("{}", msg);
            }

            let mut previous = String::new();
            let mut outputs = Vec::new();
            for task in &crew.tasks {
                events
                    .emit(CrewEvent::new(CrewEventKind::TaskStarted, &task.agent.id).with_task(task.id))
                    .await;
                let raw = match (&self.final_text, task.id) {
                    (Some(text), TaskId::Edit) => text.clone(),
                    _ => format!("{}<{}", task.id.as_str(), previous),
                };
                previous = raw.clone();
                outputs.push(TaskOutput { task: task.id, agent: task.agent.id.clone(), raw });
            }
            CrewOutput::from_tasks(outputs)
        }
    }

    fn crew(engine: ScriptedEngine) -> (ArticleCrew, Arc<ScriptedEngine>) {
        let engine = Arc::new(engine);
        (ArticleCrew::new(engine.clone()), engine)
    }

    #[tokio::test]
    async fn test_run_returns_last_task_output() {
        let (crew, _) = crew(ScriptedEngine::default());
        let topic = Topic::parse("AI in Healthcare").unwrap();

        let article = crew.run(&topic).await.unwrap();
        assert_eq!(article.raw, "edit<write<plan<");
        assert_eq!(article.char_count, article.raw.chars().count());
        assert_eq!(article.topic, topic);
    }

    #[tokio::test]
    async fn test_engine_error_becomes_generation_error() {
        let (crew, _) = crew(ScriptedEngine {
            fail_with: Some("Rate limit reached for gpt-4o-mini".to_string()),
            ..Default::default()
        });

        let err = crew.generate("Space Tourism").await.unwrap_err();
        assert!(matches!(err, ScribeError::Generation(_)));
        assert!(err.to_string().contains("Rate limit reached for gpt-4o-mini"));
    }

    #[tokio::test]
    async fn test_empty_topic_never_reaches_engine() {
        let (crew, engine) = crew(ScriptedEngine::default());
        let err = crew.generate("   ").await.unwrap_err();
        assert!(matches!(err, ScribeError::InvalidInput(_)));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_repeated_runs_are_not_cached() {
        let (crew, engine) = crew(ScriptedEngine::default());
        crew.generate("Ocean Plastics").await.unwrap();
        crew.generate("Ocean Plastics").await.unwrap();
        assert_eq!(engine.calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            *engine.seen_topics.lock().unwrap(),
            vec!["Ocean Plastics".to_string(), "Ocean Plastics".to_string()]
        );
    }

    #[tokio::test]
    async fn test_blank_output_is_an_error() {
        let (crew, _) = crew(ScriptedEngine {
            final_text: Some("  \n".to_string()),
            ..Default::default()
        });
        let err = crew.generate("Minimalism").await.unwrap_err();
        assert!(matches!(err, ScribeError::Generation(_)));
    }

    #[tokio::test]
    async fn test_events_bracket_the_run() {
        let (tx, mut rx) = mpsc::channel(16);
        let crew = ArticleCrew::new(Arc::new(ScriptedEngine::default())).with_event_channel(tx);
        crew.generate("Home Automation").await.unwrap();
        drop(crew);

        let mut kinds = Vec::new();
        while let Some(event) = rx.recv().await {
            kinds.push(event.kind);
        }
        assert_eq!(kinds.first(), Some(&CrewEventKind::CrewStarted));
        assert_eq!(kinds.last(), Some(&CrewEventKind::CrewCompleted));
        assert_eq!(
            kinds.iter().filter(|k| **k == CrewEventKind::TaskStarted).count(),
            3
        );
    }

    #[test]
    fn test_failed_run_emits_crew_failed() {
        let (tx, mut rx) = mpsc::channel(16);
        let crew = ArticleCrew::new(Arc::new(ScriptedEngine {
            fail_with: Some("boom".to_string()),
            ..Default::default()
        }))
        .with_event_channel(tx);

        let result = tokio_test::block_on(crew.generate("Fermentation"));
        assert!(result.is_err());
        drop(crew);

        let mut last = None;
        while let Ok(event) = rx.try_recv() {
            last = Some(event.kind);
        }
        assert_eq!(last, Some(CrewEventKind::CrewFailed));
    }
}
