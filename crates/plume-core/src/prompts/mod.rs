//! Prompt template system.
//!
//! # Example
//!
//! ```rust
//! use plume_core::prompts::{PromptContext, PromptTemplate};
//!
//! # fn main() -> Result<(), plume_core::prompts::PromptError> {
//! let template = PromptTemplate::parse("Topic: {{topic}}")?;
//! let prompt = template.render(&PromptContext::new().with("topic", "autumn menu"))?;
//! assert_eq!(prompt, "Topic: autumn menu");
//! # Ok(())
//! # }
//! ```

pub mod templates;

pub use templates::{PromptContext, PromptError, PromptTemplate, RenderOptions};
