//! Prompt assembly.
//!
//! Every prompt Plume sends is a rendered template followed by zero or more
//! labelled sections. A section with an empty or whitespace-only body is left out
//! entirely, so a prompt never carries a dangling label.

use tracing::debug;

use crate::prompts::{PromptContext, PromptTemplate};
use crate::error::Result;

/// Label of the live-search section.
pub const SEARCH_SECTION_LABEL: &str = "Latest news and trends:";
/// Label of the brand knowledge section.
pub const BRAND_SECTION_LABEL: &str = "Brand reference:";

/// A labelled block appended after the rendered template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptSection<'a> {
    /// Heading line, e.g. `Brand reference:`.
    pub label: &'a str,
    /// Section text; omitted when blank.
    pub body: &'a str,
}

impl<'a> PromptSection<'a> {
    /// Creates a section.
    pub const fn new(label: &'a str, body: &'a str) -> Self {
        Self { label, body }
    }

    fn is_blank(&self) -> bool {
        self.body.trim().is_empty()
    }
}

/// Builds prompts from templates and context sections.
///
/// Stateless and deterministic: the same inputs always produce the same bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextAssembler;

impl ContextAssembler {
    /// Creates an assembler.
    pub const fn new() -> Self {
        Self
    }

    /// Renders a platform template for `topic` and `style`, then appends the
    /// search section and the brand section, in that order.
    pub fn build_prompt(
        &self,
        platform_template: &str,
        topic: &str,
        style: &str,
        brand_context: &str,
        search_context: &str,
    ) -> Result<String> {
        let context = PromptContext::new().with("topic", topic).with("style", style);
        self.compose(
            platform_template,
            &context,
            &[
                PromptSection::new(SEARCH_SECTION_LABEL, search_context),
                PromptSection::new(BRAND_SECTION_LABEL, brand_context),
            ],
        )
    }

    /// Renders `template` strictly against `context` and appends the non-blank
    /// `sections` in the order given, separated by one blank line.
    pub fn compose(
        &self,
        template: &str,
        context: &PromptContext,
        sections: &[PromptSection<'_>],
    ) -> Result<String> {
        let mut prompt = PromptTemplate::parse(template)?.render(context)?.trim().to_string();

        let mut included = 0usize;
        for section in sections.iter().filter(|s| !s.is_blank()) {
            if !prompt.is_empty() {
                prompt.push_str("\n\n");
            }
            prompt.push_str(section.label);
            prompt.push('\n');
            prompt.push_str(section.body.trim());
            included += 1;
        }

        debug!(
            prompt_len = prompt.len(),
            sections_included = included,
            sections_omitted = sections.len() - included,
            "Assembled prompt"
        );
        Ok(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlumeError;
    use crate::platform::Platform;

    const TEMPLATE: &str = "Write about {{topic}} in a {{style}} voice.";

    #[test]
    fn test_template_only_when_sections_blank() {
        let prompt = ContextAssembler::new()
            .build_prompt(TEMPLATE, "tea", "calm", "", "  \n\t ")
            .unwrap();
        assert_eq!(prompt, "Write about tea in a calm voice.");
        assert!(!prompt.contains(BRAND_SECTION_LABEL));
        assert!(!prompt.contains(SEARCH_SECTION_LABEL));
    }

    #[test]
    fn test_search_precedes_brand() {
        let prompt = ContextAssembler::new()
            .build_prompt(TEMPLATE, "tea", "calm", "We are Acme Tea.", "Matcha is trending.")
            .unwrap();
        assert_eq!(
            prompt,
            "Write about tea in a calm voice.\n\n\
             Latest news and trends:\nMatcha is trending.\n\n\
             Brand reference:\nWe are Acme Tea."
        );
    }

    #[test]
    fn test_brand_only() {
        let prompt = ContextAssembler::new()
            .build_prompt(TEMPLATE, "tea", "calm", "We are Acme Tea.", "")
            .unwrap();
        assert_eq!(prompt, "Write about tea in a calm voice.\n\nBrand reference:\nWe are Acme Tea.");
    }

    #[test]
    fn test_deterministic() {
        let assembler = ContextAssembler::new();
        let template = Platform::Instagram.template();
        let a = assembler.build_prompt(template, "新品上市", "fun", "brand", "news").unwrap();
        let b = assembler.build_prompt(template, "新品上市", "fun", "brand", "news").unwrap();
        assert_eq!(a, b);
        assert!(a.contains("新品上市"));
    }

    #[test]
    fn test_compose_rejects_missing_placeholder() {
        let err = ContextAssembler::new()
            .compose("Outline: {{plan}}", &PromptContext::new(), &[])
            .unwrap_err();
        assert!(matches!(err, PlumeError::Prompt(_)));
    }
}
