//! Draft/critique workflow engine.
//!
//! A run walks an explicit state machine:
//!
//! ```text
//! Search -> Plan -> Write -> Edit -+-> (terminal)
//!                     ^            |
//!                     +------------+  critique without PASS, under the cap
//! ```
//!
//! Each stage produces a [`StageUpdate`] that the engine applies to the
//! [`AgentState`]; [`next_stage`] then picks the successor from the state alone.

use std::fmt;
use std::sync::Arc;

use plume_models::{Generation, LanguageGateway, ProviderSpec};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::state::{AgentState, StageUpdate};
use crate::context::{BRAND_SECTION_LABEL, ContextAssembler, PromptSection, SEARCH_SECTION_LABEL};
use crate::error::{PlumeError, Result};
use crate::prompts::PromptContext;
use crate::search::{SEARCH_UNCONFIGURED, SearchOutcome, SearchProvider};

/// Editor passes after which the latest draft is accepted regardless.
pub const MAX_REVISIONS: u32 = 2;

const CRITIQUE_PREVIEW_CHARS: usize = 50;
const APPROVAL_MARKER: &str = "PASS";

const SEARCH_SKIPPED: &str = "Searcher: web search skipped.";
const SEARCH_COMPLETED: &str = "Searcher: web search completed.";
const PLAN_READY: &str = "Planner: post outline ready.";
const DRAFT_APPROVED: &str = "Editor: draft approved.";

const PLANNER_SYSTEM_PROMPT: &str = "You are a professional social media strategist.";
const WRITER_SYSTEM_PROMPT: &str = "You are a copywriter who specialises in social media posts.";
const EDITOR_SYSTEM_PROMPT: &str = "You are a strict, professional social media editor.";

const PLANNER_TEMPLATE: &str = "\
Plan a {{platform}} post for the topic below. Outline its structure and key points, \
and weave in current news where it fits.

Topic: {{topic}}
Style: {{style}}";

const EDITOR_TEMPLATE: &str = "\
Review the {{platform}} post draft below. Check that it suits {{platform}}, \
that its tone matches \"{{style}}\", and that it has no typos or clumsy sentences.
If the draft is ready to publish, reply with PASS. Otherwise, give specific revision suggestions.";

const OUTLINE_LABEL: &str = "Outline:";
const FEEDBACK_LABEL: &str = "Editor feedback to address:";
const DRAFT_LABEL: &str = "Draft:";

/// A workflow stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowStage {
    /// Optional live web search.
    Search,
    /// Outline the post.
    Plan,
    /// Write (or rewrite) the draft.
    Write,
    /// Critique the draft and decide whether to stop.
    Edit,
}

impl WorkflowStage {
    /// Name used in traces, logs and errors.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Search => "searcher",
            Self::Plan => "planner",
            Self::Write => "writer",
            Self::Edit => "editor",
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Successor of `stage` given the state after it ran; `None` is terminal.
pub fn next_stage(stage: WorkflowStage, state: &AgentState) -> Option<WorkflowStage> {
    match stage {
        WorkflowStage::Search => Some(WorkflowStage::Plan),
        WorkflowStage::Plan => Some(WorkflowStage::Write),
        WorkflowStage::Write => Some(WorkflowStage::Edit),
        WorkflowStage::Edit if state.is_finished() => None,
        WorkflowStage::Edit => Some(WorkflowStage::Write),
    }
}

/// Whether an editor critique approves the draft.
///
/// A plain case-insensitive substring test, so "bypass" also approves.
pub fn is_approved(critique: &str) -> bool {
    critique.to_uppercase().contains(APPROVAL_MARKER)
}

/// Per-run options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowOptions {
    /// Run the search stage against the search provider.
    pub use_search: bool,
    /// Provider and model every stage generates with.
    pub provider: ProviderSpec,
}

/// Runs the search/plan/write/edit workflow.
pub struct WorkflowEngine {
    gateway: Arc<dyn LanguageGateway>,
    search: Arc<dyn SearchProvider>,
    assembler: ContextAssembler,
}

impl WorkflowEngine {
    /// Creates an engine over the given collaborators.
    pub fn new(gateway: Arc<dyn LanguageGateway>, search: Arc<dyn SearchProvider>) -> Self {
        Self { gateway, search, assembler: ContextAssembler::new() }
    }

    /// Drives `state` to a terminal state.
    ///
    /// # Arguments
    /// * `state` - Fresh state from [`AgentState::new`]
    /// * `options` - Search toggle and provider routing
    /// * `cancel` - Aborts the in-flight stage when triggered
    ///
    /// # Errors
    /// `PlumeError::Cancelled` if `cancel` fires; `state` then holds exactly the
    /// updates of the stages that completed before it. Provider and search
    /// failures propagate unchanged.
    pub async fn run(
        &self,
        state: &mut AgentState,
        options: &WorkflowOptions,
        cancel: &CancellationToken,
    ) -> Result<()> {
        info!(
            platform = %state.platform,
            topic = %state.topic,
            use_search = options.use_search,
            provider = %options.provider.provider,
            "Starting copy workflow"
        );

        let mut stage = Some(WorkflowStage::Search);
        while let Some(current) = stage {
            if cancel.is_cancelled() {
                warn!(stage = %current, "Workflow cancelled before stage");
                return Err(PlumeError::Cancelled);
            }

            let update = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    warn!(stage = %current, "Workflow cancelled during stage");
                    return Err(PlumeError::Cancelled);
                }
                update = self.execute(current, state, options) => update?,
            };

            state.apply(update);
            debug!(
                stage = %current,
                revision_count = state.revision_count,
                trace_len = state.trace.len(),
                "Stage complete"
            );
            stage = next_stage(current, state);
        }

        info!(revision_count = state.revision_count, "Copy workflow finished");
        Ok(())
    }

    async fn execute(
        &self,
        stage: WorkflowStage,
        state: &AgentState,
        options: &WorkflowOptions,
    ) -> Result<StageUpdate> {
        match stage {
            WorkflowStage::Search => self.search_stage(state, options.use_search).await,
            WorkflowStage::Plan => self.plan_stage(state, &options.provider).await,
            WorkflowStage::Write => self.write_stage(state, &options.provider).await,
            WorkflowStage::Edit => self.edit_stage(state, &options.provider).await,
        }
    }

    async fn search_stage(&self, state: &AgentState, use_search: bool) -> Result<StageUpdate> {
        if !use_search {
            return Ok(StageUpdate {
                search_results: Some(String::new()),
                ..StageUpdate::trace(SEARCH_SKIPPED)
            });
        }

        let query = format!("latest trends and news about {}", state.topic);
        match self.search.search(&query).await? {
            SearchOutcome::Results(results) => Ok(StageUpdate {
                search_results: Some(results),
                ..StageUpdate::trace(SEARCH_COMPLETED)
            }),
            SearchOutcome::Unconfigured(message) => {
                warn!(message = %message, "Skipping web search");
                Ok(StageUpdate {
                    search_results: Some(String::new()),
                    ..StageUpdate::trace(SEARCH_UNCONFIGURED)
                })
            }
        }
    }

    async fn plan_stage(&self, state: &AgentState, spec: &ProviderSpec) -> Result<StageUpdate> {
        let prompt = self.assembler.compose(
            PLANNER_TEMPLATE,
            &base_context(state),
            &[
                PromptSection::new(SEARCH_SECTION_LABEL, &state.search_results),
                PromptSection::new(BRAND_SECTION_LABEL, &state.brand_context),
            ],
        )?;
        let plan = self.generate(WorkflowStage::Plan, &prompt, PLANNER_SYSTEM_PROMPT, spec).await?;
        Ok(StageUpdate { plan: Some(plan), ..StageUpdate::trace(PLAN_READY) })
    }

    async fn write_stage(&self, state: &AgentState, spec: &ProviderSpec) -> Result<StageUpdate> {
        let prompt = self.assembler.compose(
            state.platform.template(),
            &base_context(state),
            &[
                PromptSection::new(OUTLINE_LABEL, &state.plan),
                PromptSection::new(BRAND_SECTION_LABEL, &state.brand_context),
                PromptSection::new(FEEDBACK_LABEL, state.critique.as_deref().unwrap_or_default()),
            ],
        )?;
        let draft = self.generate(WorkflowStage::Write, &prompt, WRITER_SYSTEM_PROMPT, spec).await?;
        let entry = format!("Writer: draft {} ready.", state.revision_count + 1);
        Ok(StageUpdate { draft: Some(draft), ..StageUpdate::trace(entry) })
    }

    async fn edit_stage(&self, state: &AgentState, spec: &ProviderSpec) -> Result<StageUpdate> {
        let prompt = self.assembler.compose(
            EDITOR_TEMPLATE,
            &base_context(state),
            &[PromptSection::new(DRAFT_LABEL, &state.draft)],
        )?;
        let critique =
            self.generate(WorkflowStage::Edit, &prompt, EDITOR_SYSTEM_PROMPT, spec).await?;
        let revision_count = state.revision_count + 1;

        if is_approved(&critique) || revision_count >= MAX_REVISIONS {
            debug!(revision_count, approved = is_approved(&critique), "Editor accepted draft");
            return Ok(StageUpdate {
                final_copy: Some(state.draft.clone()),
                revision_count: Some(revision_count),
                ..StageUpdate::trace(DRAFT_APPROVED)
            });
        }

        let preview: String = critique.chars().take(CRITIQUE_PREVIEW_CHARS).collect();
        Ok(StageUpdate {
            critique: Some(critique),
            revision_count: Some(revision_count),
            ..StageUpdate::trace(format!("Editor: revision requested: {preview}..."))
        })
    }

    async fn generate(
        &self,
        stage: WorkflowStage,
        prompt: &str,
        system_prompt: &str,
        spec: &ProviderSpec,
    ) -> Result<String> {
        let generation = self
            .gateway
            .generate_text(prompt, system_prompt, spec)
            .await
            .map_err(|e| PlumeError::upstream(stage.name(), e))?;

        if let Generation::Unconfigured { message } = &generation {
            warn!(stage = %stage, message = %message, "Stage ran without a configured provider");
        }
        Ok(generation.into_text())
    }
}

fn base_context(state: &AgentState) -> PromptContext {
    PromptContext::new()
        .with("platform", state.platform.as_str())
        .with("topic", state.topic.as_str())
        .with("style", state.style.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;
    use async_trait::async_trait;
    use plume_abstraction::{ModelError, Provider};
    use plume_models::{GatewayError, ImageInput};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned generations and records every prompt it receives.
    struct ScriptedGateway {
        replies: Mutex<VecDeque<std::result::Result<Generation, GatewayError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGateway {
        fn new(replies: Vec<std::result::Result<Generation, GatewayError>>) -> Arc<Self> {
            Arc::new(Self { replies: Mutex::new(replies.into()), prompts: Mutex::new(Vec::new()) })
        }

        fn texts(replies: &[&str]) -> Arc<Self> {
            Self::new(replies.iter().map(|r| Ok(generated(r))).collect())
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LanguageGateway for ScriptedGateway {
        async fn generate_text(
            &self,
            prompt: &str,
            _system_prompt: &str,
            _spec: &ProviderSpec,
        ) -> std::result::Result<Generation, GatewayError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies.lock().unwrap().pop_front().expect("unexpected gateway call")
        }

        async fn analyze_image(
            &self,
            _image: &ImageInput,
            _prompt: &str,
        ) -> std::result::Result<Generation, GatewayError> {
            unreachable!("workflow never analyzes images")
        }
    }

    struct StaticSearch(SearchOutcome);

    #[async_trait]
    impl SearchProvider for StaticSearch {
        async fn search(
            &self,
            _query: &str,
        ) -> std::result::Result<SearchOutcome, crate::search::SearchError> {
            Ok(self.0.clone())
        }
    }

    /// Never answers, so a stage blocks until cancelled.
    struct PendingGateway;

    #[async_trait]
    impl LanguageGateway for PendingGateway {
        async fn generate_text(
            &self,
            _prompt: &str,
            _system_prompt: &str,
            _spec: &ProviderSpec,
        ) -> std::result::Result<Generation, GatewayError> {
            std::future::pending().await
        }

        async fn analyze_image(
            &self,
            _image: &ImageInput,
            _prompt: &str,
        ) -> std::result::Result<Generation, GatewayError> {
            std::future::pending().await
        }
    }

    fn generated(content: &str) -> Generation {
        Generation::Generated {
            content: content.to_string(),
            provider: Provider::OpenAI,
            model: "gpt-4o".to_string(),
        }
    }

    fn unconfigured_search() -> Arc<StaticSearch> {
        Arc::new(StaticSearch(SearchOutcome::Unconfigured("Tavily API key not configured.".into())))
    }

    fn fresh_state() -> AgentState {
        AgentState::new(Platform::Instagram, "autumn menu", "playful", "We are Acme Cafe.")
    }

    #[tokio::test]
    async fn test_approved_on_first_edit() {
        let gateway = ScriptedGateway::texts(&["outline", "draft one", "Looks great. PASS"]);
        let engine = WorkflowEngine::new(gateway.clone(), unconfigured_search());
        let mut state = fresh_state();

        engine.run(&mut state, &WorkflowOptions::default(), &CancellationToken::new()).await.unwrap();

        assert_eq!(state.final_copy.as_deref(), Some("draft one"));
        assert_eq!(state.revision_count, 1);
        assert_eq!(
            state.trace,
            vec![
                "Searcher: web search skipped.",
                "Planner: post outline ready.",
                "Writer: draft 1 ready.",
                "Editor: draft approved.",
            ]
        );
        assert_eq!(gateway.prompts().len(), 3);
    }

    #[tokio::test]
    async fn test_revision_cap_stops_loop() {
        let critique = "Make the opening line punchier and add a clear call to action please.";
        let gateway =
            ScriptedGateway::texts(&["outline", "draft one", critique, "draft two", critique]);
        let engine = WorkflowEngine::new(gateway.clone(), unconfigured_search());
        let mut state = fresh_state();

        engine.run(&mut state, &WorkflowOptions::default(), &CancellationToken::new()).await.unwrap();

        assert_eq!(state.revision_count, MAX_REVISIONS);
        assert_eq!(state.final_copy.as_deref(), Some("draft two"));
        let preview: String = critique.chars().take(50).collect();
        assert_eq!(
            state.trace,
            vec![
                "Searcher: web search skipped.".to_string(),
                "Planner: post outline ready.".to_string(),
                "Writer: draft 1 ready.".to_string(),
                format!("Editor: revision requested: {preview}..."),
                "Writer: draft 2 ready.".to_string(),
                "Editor: draft approved.".to_string(),
            ]
        );

        let prompts = gateway.prompts();
        assert_eq!(prompts.len(), 5);
        assert!(!prompts[1].contains(FEEDBACK_LABEL));
        assert!(prompts[3].contains(FEEDBACK_LABEL));
        assert!(prompts[3].contains(critique));
    }

    #[tokio::test]
    async fn test_search_results_reach_planner() {
        let gateway = ScriptedGateway::texts(&["outline", "draft", "pass"]);
        let search = Arc::new(StaticSearch(SearchOutcome::Results("Title: Pumpkin".into())));
        let engine = WorkflowEngine::new(gateway.clone(), search);
        let mut state = fresh_state();
        let options = WorkflowOptions { use_search: true, ..WorkflowOptions::default() };

        engine.run(&mut state, &options, &CancellationToken::new()).await.unwrap();

        assert_eq!(state.search_results, "Title: Pumpkin");
        assert_eq!(state.trace[0], "Searcher: web search completed.");
        let planner_prompt = &gateway.prompts()[0];
        assert!(planner_prompt.contains("Latest news and trends:\nTitle: Pumpkin"));
        assert!(planner_prompt.contains("Brand reference:\nWe are Acme Cafe."));
    }

    #[tokio::test]
    async fn test_unconfigured_search_is_skipped() {
        let gateway = ScriptedGateway::texts(&["outline", "draft", "PASS"]);
        let engine = WorkflowEngine::new(gateway.clone(), unconfigured_search());
        let mut state = fresh_state();
        let options = WorkflowOptions { use_search: true, ..WorkflowOptions::default() };

        engine.run(&mut state, &options, &CancellationToken::new()).await.unwrap();

        assert_eq!(state.search_results, "");
        assert_eq!(state.trace[0], SEARCH_UNCONFIGURED);
        assert!(!gateway.prompts()[0].contains(SEARCH_SECTION_LABEL));
    }

    #[tokio::test]
    async fn test_upstream_failure_names_stage() {
        let gateway = ScriptedGateway::new(vec![
            Ok(generated("outline")),
            Err(GatewayError {
                provider: Provider::Anthropic,
                model: "claude-3-sonnet-20240229".to_string(),
                source: ModelError::RequestError("timeout".to_string()),
            }),
        ]);
        let engine = WorkflowEngine::new(gateway, unconfigured_search());
        let mut state = fresh_state();

        let err = engine
            .run(&mut state, &WorkflowOptions::default(), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            PlumeError::Upstream { stage, provider, .. } => {
                assert_eq!(stage, "writer");
                assert_eq!(provider, Provider::Anthropic);
            }
            other => panic!("Expected Upstream error, got {other:?}"),
        }
        assert!(state.final_copy.is_none());
        assert_eq!(state.trace.len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_leaves_state_untouched() {
        let engine = WorkflowEngine::new(ScriptedGateway::texts(&[]), unconfigured_search());
        let mut state = fresh_state();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = engine.run(&mut state, &WorkflowOptions::default(), &cancel).await.unwrap_err();

        assert!(matches!(err, PlumeError::Cancelled));
        assert_eq!(state, fresh_state());
    }

    #[tokio::test]
    async fn test_cancel_during_stage_keeps_completed_updates_only() {
        let engine = WorkflowEngine::new(Arc::new(PendingGateway), unconfigured_search());
        let mut state = fresh_state();
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = engine.run(&mut state, &WorkflowOptions::default(), &cancel).await.unwrap_err();

        assert!(matches!(err, PlumeError::Cancelled));
        assert_eq!(state.trace, vec!["Searcher: web search skipped."]);
        assert!(state.plan.is_empty());
        assert!(state.final_copy.is_none());
    }

    #[test]
    fn test_transitions() {
        let mut state = fresh_state();
        assert_eq!(next_stage(WorkflowStage::Search, &state), Some(WorkflowStage::Plan));
        assert_eq!(next_stage(WorkflowStage::Plan, &state), Some(WorkflowStage::Write));
        assert_eq!(next_stage(WorkflowStage::Write, &state), Some(WorkflowStage::Edit));
        assert_eq!(next_stage(WorkflowStage::Edit, &state), Some(WorkflowStage::Write));
        state.final_copy = Some("done".to_string());
        assert_eq!(next_stage(WorkflowStage::Edit, &state), None);
    }

    #[test]
    fn test_approval_heuristic() {
        assert!(is_approved("PASS"));
        assert!(is_approved("looks good, pass"));
        assert!(is_approved("Consider a bypass road"));
        assert!(!is_approved("Needs a stronger hook."));
    }
}
