//! Target collection.
//!
//! A pure read over the live DOM: every identifier-carrying element inside a
//! selected row whose test-id matches the operations-button naming pattern
//! becomes a [`Target`]. Must run after render forcing, since it can only see
//! materialized rows. Document order is preserved — it corresponds to
//! on-screen row order and fixes the batch's processing order.

use serde::{Deserialize, Serialize};

use crate::config::{CompiledPatterns, OrchestratorConfig};
use crate::page::HostPage;

/// One actionable, currently-selected row, named by the opaque test-id of its
/// operations button.
///
/// Identifiers are unique per row at collection time but may go stale if the
/// host re-renders; the driver re-queries the live DOM by identifier at
/// activation time instead of re-validating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    test_id: String,
}

impl Target {
    /// Wrap a collected test-id
    #[must_use]
    pub fn new(test_id: impl Into<String>) -> Self {
        Self {
            test_id: test_id.into(),
        }
    }

    /// The operations-button test-id naming this row
    #[must_use]
    pub fn test_id(&self) -> &str {
        &self.test_id
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.test_id)
    }
}

/// Collect the ordered batch of targets from the current DOM.
///
/// Possibly empty; ordering follows document order. No side effects.
#[must_use]
pub fn collect_targets(
    page: &dyn HostPage,
    config: &OrchestratorConfig,
    patterns: &CompiledPatterns,
) -> Vec<Target> {
    page.query_all(&config.selected_selector)
        .into_iter()
        .filter_map(|node| page.attribute(node, "data-testid"))
        .filter(|test_id| patterns.is_op_button(test_id))
        .map(Target::new)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::OrchestratorConfig;
    use crate::fake::FakePage;

    fn setup() -> (OrchestratorConfig, CompiledPatterns, FakePage) {
        let config = OrchestratorConfig::new();
        let patterns = config.compile().unwrap();
        let page = FakePage::new(&config);
        (config, patterns, page)
    }

    #[test]
    fn test_collects_selected_buttons_in_document_order() {
        let (config, patterns, page) = setup();
        page.add_selected_button("szamla-lista-3-operations-button-icon-svg");
        page.add_selected_button("szamla-lista-1-operations-button-icon-svg");
        page.add_selected_button("szamla-lista-2-operations-button-icon-svg");

        let targets = collect_targets(&page, &config, &patterns);
        let ids: Vec<&str> = targets.iter().map(Target::test_id).collect();
        assert_eq!(
            ids,
            vec![
                "szamla-lista-3-operations-button-icon-svg",
                "szamla-lista-1-operations-button-icon-svg",
                "szamla-lista-2-operations-button-icon-svg",
            ]
        );
    }

    #[test]
    fn test_unselected_rows_are_invisible() {
        let (config, patterns, page) = setup();
        page.add_unselected_button("szamla-lista-1-operations-button-icon-svg");

        assert!(collect_targets(&page, &config, &patterns).is_empty());
    }

    #[test]
    fn test_foreign_test_ids_are_filtered_out() {
        let (config, patterns, page) = setup();
        page.add_selected_button("szamla-lista-1-operations-button-icon-svg");
        page.add_selected_button("szamla-lista-1-row-checkbox");
        page.add_selected_button("other-ns-2-operations-button-icon-svg");

        let targets = collect_targets(&page, &config, &patterns);
        assert_eq!(targets.len(), 1);
        assert_eq!(
            targets[0].test_id(),
            "szamla-lista-1-operations-button-icon-svg"
        );
    }

    #[test]
    fn test_empty_page_collects_nothing() {
        let (config, patterns, page) = setup();
        assert!(collect_targets(&page, &config, &patterns).is_empty());
    }
}
