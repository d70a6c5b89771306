//! # Scribe Core
//!
//! Everything behind the article UI: the three personas, their tasks, the
//! crew runner, and the rendering/export of the finished article.
//!
//! ## Architecture
//!
//! - `agents` / `tasks` - Persona and task registries (unbound templates)
//! - `crew/` - Pipeline runner, engine seam, progress events
//! - `credentials` / `config` / `models` - API key, runtime dir, provider selection
//! - `render` / `export` - Styled HTML, markdown and docx downloads
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scribe_core::crew::{ArticleCrew, RadkitEngine};
//!
//! let engine = RadkitEngine::new(model_config, credential);
//! let crew = ArticleCrew::new(Arc::new(engine));
//! let article = crew.generate("AI in Healthcare").await?;
//! ```

pub mod agents;
pub mod article;
pub mod config;
pub mod credentials;
pub mod crew;
pub mod error;
pub mod export;
pub mod llm_helpers;
pub mod models;
pub mod render;
pub mod tasks;
pub mod template;
pub mod topic;

pub use article::ArticleResult;
pub use error::{ScribeError, ScribeResult};
pub use topic::Topic;
