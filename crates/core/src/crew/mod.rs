//! # Crew Orchestration
//!
//! Runs the article pipeline on the external engine.
//!
//! ## Pipeline Flow
//!
//! ```text
//! Topic → Content Planner → Content Writer → Editor → ArticleResult
//! ```

pub mod engine;
pub mod events;
pub mod progress;
pub mod runner;

pub use engine::{Crew, CrewEngine, CrewInputs, CrewOutput, RadkitEngine, TaskOutput};
pub use events::{CrewEvent, CrewEventKind, EventSink};
pub use progress::{CrewProgress, CrewStage};
pub use runner::ArticleCrew;
