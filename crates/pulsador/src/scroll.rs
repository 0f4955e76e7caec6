//! Render forcing for virtualized lists.
//!
//! A virtualized list only instantiates the rows near the viewport, so the
//! collector would miss every off-screen selection. Jumping the scroll
//! container to its end and back forces the host to materialize all rows
//! before anything else runs. Failing to find a scrollable container is not
//! fatal; the step is simply skipped.

use std::thread;
use tracing::debug;

use crate::config::{OrchestratorConfig, Timings};
use crate::page::{HostPage, NodeId};

/// Locate the scroll container for the virtualized list.
///
/// Walks the configured candidate selectors in priority order and accepts the
/// first candidate — or its immediate structural parent — whose content
/// overflows its viewport by more than the configured tolerance. Falls back
/// to the document's own scrolling surface when no candidate matches.
#[must_use]
pub fn find_scroll_container(
    page: &dyn HostPage,
    config: &OrchestratorConfig,
) -> Option<NodeId> {
    let tolerance = config.scroll_tolerance_px;
    for candidate in &config.scroll_candidates {
        for node in page.query_all(candidate) {
            if page
                .scroll_metrics(node)
                .is_some_and(|m| m.is_scrollable(tolerance))
            {
                return Some(node);
            }
            if let Some(parent) = page.parent(node) {
                if page
                    .scroll_metrics(parent)
                    .is_some_and(|m| m.is_scrollable(tolerance))
                {
                    return Some(parent);
                }
            }
        }
    }
    page.scrolling_root()
}

/// Force the host to materialize all virtualized rows.
///
/// Records the current scroll offset, jumps to the maximum extent, waits for
/// the host to render the newly visible rows, restores the original offset,
/// and waits again. Side effect only; a vanished container is a no-op.
pub fn force_render(page: &dyn HostPage, container: NodeId, timings: &Timings) {
    let Some(metrics) = page.scroll_metrics(container) else {
        debug!("scroll container vanished before render forcing");
        return;
    };
    page.set_scroll_top(container, metrics.scroll_height);
    thread::sleep(timings.scroll_settle_down());
    page.set_scroll_top(container, metrics.scroll_top);
    thread::sleep(timings.scroll_settle_back());
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::OrchestratorConfig;
    use crate::fake::FakePage;
    use crate::page::ScrollMetrics;

    fn scrollable() -> ScrollMetrics {
        ScrollMetrics {
            scroll_top: 120.0,
            scroll_height: 900.0,
            client_height: 300.0,
        }
    }

    fn flat() -> ScrollMetrics {
        ScrollMetrics {
            scroll_top: 0.0,
            scroll_height: 300.0,
            client_height: 300.0,
        }
    }

    fn fast_config() -> OrchestratorConfig {
        OrchestratorConfig::new().with_timings(crate::config::Timings::fast())
    }

    // =========================================================================
    // Container discovery
    // =========================================================================

    #[test]
    fn test_first_scrollable_candidate_wins() {
        let config = fast_config();
        let page = FakePage::new(&config);
        let viewport = page.add_scroll_container("cdk-virtual-scroll-viewport", scrollable());
        page.add_scroll_container("#cdk-drop-list-0", scrollable());

        assert_eq!(find_scroll_container(&page, &config), Some(viewport));
    }

    #[test]
    fn test_flat_candidate_is_passed_over() {
        let config = fast_config();
        let page = FakePage::new(&config);
        page.add_scroll_container("cdk-virtual-scroll-viewport", flat());
        let list = page.add_scroll_container("#cdk-drop-list-0", scrollable());

        assert_eq!(find_scroll_container(&page, &config), Some(list));
    }

    #[test]
    fn test_scrollable_parent_is_accepted() {
        let config = fast_config();
        let page = FakePage::new(&config);
        let parent = page.add_scroll_candidate_with_parent(
            "cdk-virtual-scroll-viewport",
            flat(),
            scrollable(),
        );

        assert_eq!(find_scroll_container(&page, &config), Some(parent));
    }

    #[test]
    fn test_document_surface_is_the_fallback() {
        let config = fast_config();
        let page = FakePage::new(&config);
        page.add_scroll_container("cdk-virtual-scroll-viewport", flat());
        let root = page.set_document_surface(scrollable());

        assert_eq!(find_scroll_container(&page, &config), Some(root));
    }

    #[test]
    fn test_no_container_at_all_is_none() {
        let config = fast_config();
        let page = FakePage::new(&config);
        assert_eq!(find_scroll_container(&page, &config), None);
    }

    // =========================================================================
    // Render forcing
    // =========================================================================

    #[test]
    fn test_force_render_jumps_to_end_and_back() {
        let config = fast_config();
        let page = FakePage::new(&config);
        let container = page.add_scroll_container("cdk-virtual-scroll-viewport", scrollable());

        force_render(&page, container, &config.timings);

        assert_eq!(page.scroll_history(container), vec![900.0, 120.0]);
    }

    #[test]
    fn test_force_render_on_vanished_container_is_a_no_op() {
        let config = fast_config();
        let page = FakePage::new(&config);
        let container = page.add_scroll_container("cdk-virtual-scroll-viewport", scrollable());
        page.remove_node(container);

        force_render(&page, container, &config.timings);

        assert!(page.scroll_history(container).is_empty());
    }
}
