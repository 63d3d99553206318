//! Prompt templates with `{{KEY}}` placeholders.
//!
//! Templates are parsed once into literal and placeholder segments. Rendering is
//! a single pass, so substituted values are never scanned for placeholders: a
//! topic containing `{{style}}` stays verbatim in the output.

use std::collections::HashMap;
use thiserror::Error;

/// Prompt template errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    /// Missing placeholder value.
    #[error("missing placeholder value: {0}")]
    MissingPlaceholder(String),

    /// Invalid template syntax.
    #[error("invalid template syntax: {0}")]
    InvalidSyntax(String),
}

/// Result type for prompt operations.
pub type Result<T> = std::result::Result<T, PromptError>;

/// Values substituted into a template.
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    values: HashMap<String, String>,
}

impl PromptContext {
    /// Create a new empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a context value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Get a context value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Check if context contains a key.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parses `content`.
    ///
    /// A `{{` without a matching `}}` is an error; `{{}}` and single braces are
    /// kept as literal text.
    pub fn parse(content: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = content;

        while let Some(start) = rest.find("{{") {
            let after_open = &rest[start + 2..];
            let Some(end) = after_open.find("}}") else {
                return Err(PromptError::InvalidSyntax(format!(
                    "unclosed placeholder near '{}'",
                    rest[start..].chars().take(20).collect::<String>()
                )));
            };

            literal.push_str(&rest[..start]);
            let name = after_open[..end].trim();
            if name.is_empty() {
                literal.push_str(&rest[start..start + 2 + end + 2]);
            } else {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder(name.to_string()));
            }
            rest = &after_open[end + 2..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// Render the template, failing on any placeholder missing from `context`.
    pub fn render(&self, context: &PromptContext) -> Result<String> {
        self.render_with_options(context, &RenderOptions { strict: true, default_value: None })
    }

    /// Render the template with custom options.
    pub fn render_with_options(
        &self,
        context: &PromptContext,
        options: &RenderOptions,
    ) -> Result<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => match context.get(name) {
                    Some(value) => out.push_str(value),
                    None if options.strict => {
                        return Err(PromptError::MissingPlaceholder(name.clone()));
                    }
                    None => out.push_str(options.default_value.as_deref().unwrap_or_default()),
                },
            }
        }
        Ok(out)
    }

    /// Distinct placeholder names, in order of first appearance.
    pub fn list_placeholders(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder(name) = segment {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }
}

/// Options for template rendering.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Strict mode: error if placeholder is missing.
    pub strict: bool,

    /// Default value for missing placeholders (only used if not strict).
    pub default_value: Option<String>,
}
