//! Host-page capability interface.
//!
//! The live host DOM is an external, uncontrolled, eventually-consistent data
//! source. Everything the batch does to it goes through this narrow
//! query-and-activate trait so the whole interaction protocol can be driven
//! against a scriptable in-memory fake (see [`crate::fake`]) as well as a
//! real DOM bridge.

use serde::{Deserialize, Serialize};

/// Opaque handle to one host-page element.
///
/// Handles are only meaningful to the [`HostPage`] that issued them and may
/// go stale whenever the host re-renders; every step re-queries rather than
/// caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Wrap a raw handle value
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw handle value
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Scroll geometry of one element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollMetrics {
    /// Current scroll offset from the top, in pixels
    pub scroll_top: f64,
    /// Total content height, in pixels
    pub scroll_height: f64,
    /// Visible height, in pixels
    pub client_height: f64,
}

impl ScrollMetrics {
    /// Whether the content overflows the viewport by more than `tolerance_px`
    #[must_use]
    pub fn is_scrollable(&self, tolerance_px: f64) -> bool {
        self.scroll_height > self.client_height + tolerance_px
    }
}

/// Narrow query-and-activate capability over the host page.
///
/// All methods are synchronous reads or writes against the live document;
/// waiting is expressed by the callers (poller, settle, pacing delays),
/// never inside an implementation.
pub trait HostPage {
    /// All elements matching a selector, in document order.
    fn query_all(&self, selector: &str) -> Vec<NodeId>;

    /// An attribute value of an element, if the element still exists and
    /// carries the attribute.
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// The immediate structural parent of an element.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Scroll geometry of an element, if it still exists.
    fn scroll_metrics(&self, node: NodeId) -> Option<ScrollMetrics>;

    /// Move an element's scroll offset.
    fn set_scroll_top(&self, node: NodeId, px: f64);

    /// The document's own scrolling surface, if one exists.
    fn scrolling_root(&self) -> Option<NodeId>;

    /// Activate (click) the interactive control enclosing an element.
    ///
    /// Returns `false` when the element has vanished; the click is then not
    /// performed.
    fn activate(&self, node: NodeId) -> bool;

    /// Mount the operator trigger next to the header anchor.
    ///
    /// Idempotent: returns `true` when the trigger is present afterwards
    /// (already mounted or freshly mounted), `false` when the anchor cannot
    /// be found yet.
    fn mount_trigger(&self, anchor_selector: &str, marker: &str) -> bool;

    /// First element matching a selector, in document order.
    fn query_first(&self, selector: &str) -> Option<NodeId> {
        self.query_all(selector).into_iter().next()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_round_trip() {
        let node = NodeId::new(17);
        assert_eq!(node.raw(), 17);
        assert_eq!(node, NodeId::new(17));
    }

    #[test]
    fn test_scroll_metrics_overflow_detection() {
        let m = ScrollMetrics {
            scroll_top: 0.0,
            scroll_height: 500.0,
            client_height: 300.0,
        };
        assert!(m.is_scrollable(5.0));
    }

    #[test]
    fn test_scroll_metrics_sub_pixel_rounding_is_absorbed() {
        let m = ScrollMetrics {
            scroll_top: 0.0,
            scroll_height: 303.0,
            client_height: 300.0,
        };
        // 3px of overflow is within the 5px tolerance
        assert!(!m.is_scrollable(5.0));
        assert!(m.is_scrollable(2.0));
    }
}
