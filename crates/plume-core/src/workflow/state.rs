//! State threaded through a workflow run.

use serde::Serialize;

use crate::platform::Platform;

/// Appends `new` trace entries after `old` ones.
///
/// The only way trace entries enter an [`AgentState`]; stages never reorder or
/// drop earlier entries.
pub fn merge_trace(mut old: Vec<String>, new: Vec<String>) -> Vec<String> {
    old.extend(new);
    old
}

/// Mutable record for one workflow run. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentState {
    /// Target platform.
    pub platform: Platform,
    /// Post topic.
    pub topic: String,
    /// Desired tone.
    pub style: String,
    /// Retrieved brand knowledge, newline-joined.
    pub brand_context: String,
    /// Formatted search results; empty when search was skipped.
    pub search_results: String,
    /// Planner output.
    pub plan: String,
    /// Latest writer output.
    pub draft: String,
    /// Latest editor feedback that asked for a revision.
    pub critique: Option<String>,
    /// Approved copy; set once, when the run terminates.
    pub final_copy: Option<String>,
    /// Number of editor passes so far.
    pub revision_count: u32,
    /// Append-only trace.
    pub trace: Vec<String>,
}

impl AgentState {
    /// Creates the initial state for a run.
    ///
    /// # Arguments
    /// * `platform` - Target platform
    /// * `topic` - Post topic
    /// * `style` - Desired tone
    /// * `brand_context` - Retrieved brand knowledge (may be empty)
    pub fn new(
        platform: Platform,
        topic: impl Into<String>,
        style: impl Into<String>,
        brand_context: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            topic: topic.into(),
            style: style.into(),
            brand_context: brand_context.into(),
            search_results: String::new(),
            plan: String::new(),
            draft: String::new(),
            critique: None,
            final_copy: None,
            revision_count: 0,
            trace: Vec::new(),
        }
    }

    /// Whether the run has reached its terminal state.
    pub fn is_finished(&self) -> bool {
        self.final_copy.is_some()
    }

    /// Applies a stage's partial update.
    pub fn apply(&mut self, update: StageUpdate) {
        if let Some(search_results) = update.search_results {
            self.search_results = search_results;
        }
        if let Some(plan) = update.plan {
            self.plan = plan;
        }
        if let Some(draft) = update.draft {
            self.draft = draft;
        }
        if let Some(critique) = update.critique {
            self.critique = Some(critique);
        }
        if let Some(revision_count) = update.revision_count {
            self.revision_count = revision_count;
        }
        if self.final_copy.is_none() {
            self.final_copy = update.final_copy;
        }
        self.trace = merge_trace(std::mem::take(&mut self.trace), update.trace);
    }
}

/// The fields one stage changes. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageUpdate {
    /// New search results.
    pub search_results: Option<String>,
    /// New plan.
    pub plan: Option<String>,
    /// New draft.
    pub draft: Option<String>,
    /// New critique.
    pub critique: Option<String>,
    /// Approved copy.
    pub final_copy: Option<String>,
    /// New revision count.
    pub revision_count: Option<u32>,
    /// Entries to append to the trace.
    pub trace: Vec<String>,
}

impl StageUpdate {
    /// An update that only appends `entry` to the trace.
    pub fn trace(entry: impl Into<String>) -> Self {
        Self { trace: vec![entry.into()], ..Self::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_trace_appends_in_order() {
        let merged = merge_trace(
            vec!["a".to_string(), "b".to_string()],
            vec!["c".to_string()],
        );
        assert_eq!(merged, vec!["a", "b", "c"]);
        assert_eq!(merge_trace(Vec::new(), Vec::new()), Vec::<String>::new());
    }

    #[test]
    fn test_new_state_is_empty() {
        let state = AgentState::new(Platform::Threads, "tea", "dry", "");
        assert_eq!(state.revision_count, 0);
        assert!(state.trace.is_empty());
        assert!(state.critique.is_none());
        assert!(!state.is_finished());
    }

    #[test]
    fn test_apply_partial_update() {
        let mut state = AgentState::new(Platform::Facebook, "tea", "warm", "brand");
        state.apply(StageUpdate {
            plan: Some("outline".to_string()),
            ..StageUpdate::trace("Planner: post outline ready.")
        });
        assert_eq!(state.plan, "outline");
        assert_eq!(state.draft, "");
        assert_eq!(state.trace, vec!["Planner: post outline ready."]);
    }

    #[test]
    fn test_final_copy_set_once() {
        let mut state = AgentState::new(Platform::Facebook, "tea", "warm", "");
        state.apply(StageUpdate { final_copy: Some("first".to_string()), ..Default::default() });
        state.apply(StageUpdate { final_copy: Some("second".to_string()), ..Default::default() });
        assert_eq!(state.final_copy.as_deref(), Some("first"));
    }
}
