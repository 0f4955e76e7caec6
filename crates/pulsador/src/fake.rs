//! Scriptable in-memory host page.
//!
//! A fully scriptable [`HostPage`] for testing the interaction protocol
//! without a browser. It understands exactly the selector shapes this crate
//! emits (selected-row query, overlay-scoped queries, exact test-id lookup,
//! scroll-container candidates) and schedules overlay appearance by query
//! count rather than wall clock, so tests stay deterministic at any timing.

use std::sync::{Arc, Mutex};

use crate::config::OrchestratorConfig;
use crate::orchestrator::Operator;
use crate::page::{HostPage, NodeId, ScrollMetrics};

#[derive(Debug, Clone)]
struct FakeNode {
    test_id: Option<String>,
    selected: bool,
    overlay: bool,
    candidate_for: Option<String>,
    metrics: Option<ScrollMetrics>,
    parent: Option<usize>,
    present: bool,
}

impl FakeNode {
    fn blank() -> Self {
        Self {
            test_id: None,
            selected: false,
            overlay: false,
            candidate_for: None,
            metrics: None,
            parent: None,
            present: true,
        }
    }
}

/// One scripted overlay appearance: activating `trigger` arms it, and after
/// `remaining` further overlay-scoped queries the `entry` node materializes.
#[derive(Debug, Clone)]
struct Reveal {
    trigger: String,
    entry: String,
    remaining: usize,
    armed: bool,
    consumed: bool,
}

/// Scripted node removal after the N-th recorded activation.
#[derive(Debug, Clone)]
struct Removal {
    test_id: String,
    after_activations: usize,
    done: bool,
}

/// Scripted node removal after the N-th overlay-scoped query. The removal
/// applies after the matching query returns, so the query that reaches the
/// count still sees the node and any handle it returned goes stale.
#[derive(Debug, Clone)]
struct QueryRemoval {
    test_id: String,
    after_queries: usize,
    done: bool,
}

#[derive(Debug, Default)]
struct Inner {
    nodes: Vec<FakeNode>,
    reveals: Vec<Reveal>,
    removals: Vec<Removal>,
    query_removals: Vec<QueryRemoval>,
    overlay_queries: usize,
    activations: Vec<String>,
    query_counts: std::collections::HashMap<String, usize>,
    scroll_history: std::collections::HashMap<usize, Vec<f64>>,
    document_surface: Option<usize>,
    trigger_anchor_present: bool,
    trigger_mounted: bool,
    mounts: usize,
}

/// Scriptable in-memory host page.
#[derive(Debug, Clone)]
pub struct FakePage {
    selected_selector: String,
    overlay_selector: String,
    inner: Arc<Mutex<Inner>>,
}

impl FakePage {
    /// Create a fake page wired to a configuration's selector vocabulary
    #[must_use]
    pub fn new(config: &OrchestratorConfig) -> Self {
        Self {
            selected_selector: config.selected_selector.clone(),
            overlay_selector: config.overlay_selector.clone(),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    fn push_node(&self, node: FakeNode) -> NodeId {
        let mut inner = self.lock();
        inner.nodes.push(node);
        NodeId::new((inner.nodes.len() - 1) as u64)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    // -------------------------------------------------------------------------
    // Page construction
    // -------------------------------------------------------------------------

    /// Add an identifier-carrying element inside a selected row
    pub fn add_selected_button(&self, test_id: &str) -> NodeId {
        self.push_node(FakeNode {
            test_id: Some(test_id.to_string()),
            selected: true,
            ..FakeNode::blank()
        })
    }

    /// Add an identifier-carrying element inside an unselected row
    pub fn add_unselected_button(&self, test_id: &str) -> NodeId {
        self.push_node(FakeNode {
            test_id: Some(test_id.to_string()),
            ..FakeNode::blank()
        })
    }

    /// Add an element matched by a scroll-container candidate selector
    pub fn add_scroll_container(&self, candidate_selector: &str, metrics: ScrollMetrics) -> NodeId {
        self.push_node(FakeNode {
            candidate_for: Some(candidate_selector.to_string()),
            metrics: Some(metrics),
            ..FakeNode::blank()
        })
    }

    /// Add a candidate element plus its structural parent; returns the parent
    pub fn add_scroll_candidate_with_parent(
        &self,
        candidate_selector: &str,
        child_metrics: ScrollMetrics,
        parent_metrics: ScrollMetrics,
    ) -> NodeId {
        let parent = self.push_node(FakeNode {
            metrics: Some(parent_metrics),
            ..FakeNode::blank()
        });
        let child = FakeNode {
            candidate_for: Some(candidate_selector.to_string()),
            metrics: Some(child_metrics),
            parent: Some(parent.raw() as usize),
            ..FakeNode::blank()
        };
        self.push_node(child);
        parent
    }

    /// Install the document's own scrolling surface
    pub fn set_document_surface(&self, metrics: ScrollMetrics) -> NodeId {
        let node = self.push_node(FakeNode {
            metrics: Some(metrics),
            ..FakeNode::blank()
        });
        self.lock().document_surface = Some(node.raw() as usize);
        node
    }

    /// Make the trigger-injection anchor (header spacer) present or absent
    pub fn set_trigger_anchor_present(&self, present: bool) {
        self.lock().trigger_anchor_present = present;
    }

    /// Remove a node from the page
    pub fn remove_node(&self, node: NodeId) {
        if let Some(n) = self.lock().nodes.get_mut(node.raw() as usize) {
            n.present = false;
        }
    }

    // -------------------------------------------------------------------------
    // Scripting
    // -------------------------------------------------------------------------

    /// Script an overlay entry to appear after activating `trigger_test_id`
    /// and `after_queries` further overlay-scoped queries.
    pub fn script_overlay_reveal(
        &self,
        trigger_test_id: &str,
        entry_test_id: &str,
        after_queries: usize,
    ) {
        self.lock().reveals.push(Reveal {
            trigger: trigger_test_id.to_string(),
            entry: entry_test_id.to_string(),
            remaining: after_queries,
            armed: false,
            consumed: false,
        });
    }

    /// Script a node to vanish once the activation log reaches a length
    pub fn remove_after_activations(&self, test_id: &str, after_activations: usize) {
        self.lock().removals.push(Removal {
            test_id: test_id.to_string(),
            after_activations,
            done: false,
        });
    }

    /// Script a node to vanish right after the N-th overlay-scoped query.
    ///
    /// The query that reaches the count still sees the node, so a handle it
    /// returned is already stale by the time it gets activated.
    pub fn remove_after_overlay_queries(&self, test_id: &str, after_queries: usize) {
        self.lock().query_removals.push(QueryRemoval {
            test_id: test_id.to_string(),
            after_queries,
            done: false,
        });
    }

    // -------------------------------------------------------------------------
    // Observation
    // -------------------------------------------------------------------------

    /// Test-ids of every activated element, in activation order
    #[must_use]
    pub fn activations(&self) -> Vec<String> {
        self.lock().activations.clone()
    }

    /// How many times a selector string has been queried
    #[must_use]
    pub fn query_count(&self, selector: &str) -> usize {
        self.lock().query_counts.get(selector).copied().unwrap_or(0)
    }

    /// Every scroll offset written to a node, in write order
    #[must_use]
    pub fn scroll_history(&self, node: NodeId) -> Vec<f64> {
        self.lock()
            .scroll_history
            .get(&(node.raw() as usize))
            .cloned()
            .unwrap_or_default()
    }

    /// How many times the trigger was freshly mounted
    #[must_use]
    pub fn mount_count(&self) -> usize {
        self.lock().mounts
    }

    // -------------------------------------------------------------------------
    // Selector interpretation
    // -------------------------------------------------------------------------

    /// Extract the exact test-id from a `[data-testid="…"]`-suffixed selector
    fn exact_id(selector: &str) -> Option<&str> {
        let start = selector.find("[data-testid=\"")? + "[data-testid=\"".len();
        let rest = &selector[start..];
        rest.strip_suffix("\"]")
    }

    fn overlay_scoped(&self, selector: &str) -> bool {
        selector.starts_with(&format!("{} [data-testid", self.overlay_selector))
    }

    /// Advance scripted reveals on an overlay-scoped query: armed reveals
    /// whose countdown is exhausted materialize, others tick down.
    fn advance_reveals(inner: &mut Inner) {
        let mut materialized = Vec::new();
        for reveal in &mut inner.reveals {
            if !reveal.armed || reveal.consumed {
                continue;
            }
            if reveal.remaining == 0 {
                reveal.consumed = true;
                materialized.push(reveal.entry.clone());
            } else {
                reveal.remaining -= 1;
            }
        }
        for entry in materialized {
            inner.nodes.push(FakeNode {
                test_id: Some(entry),
                overlay: true,
                ..FakeNode::blank()
            });
        }
    }

    /// Tick the overlay-query counter and apply due query-keyed removals.
    fn advance_query_removals(inner: &mut Inner) {
        inner.overlay_queries += 1;
        let count = inner.overlay_queries;
        let stale: Vec<String> = inner
            .query_removals
            .iter_mut()
            .filter(|r| !r.done && count >= r.after_queries)
            .map(|r| {
                r.done = true;
                r.test_id.clone()
            })
            .collect();
        for test_id in stale {
            for n in &mut inner.nodes {
                if n.test_id.as_deref() == Some(test_id.as_str()) {
                    n.present = false;
                }
            }
        }
    }

    fn collect_matching<F>(inner: &Inner, pred: F) -> Vec<NodeId>
    where
        F: Fn(&FakeNode) -> bool,
    {
        inner
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.present && pred(n))
            .map(|(i, _)| NodeId::new(i as u64))
            .collect()
    }
}

impl HostPage for FakePage {
    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        let mut inner = self.lock();
        *inner.query_counts.entry(selector.to_string()).or_insert(0) += 1;

        if selector == self.selected_selector {
            return Self::collect_matching(&inner, |n| n.selected && n.test_id.is_some());
        }
        if self.overlay_scoped(selector) {
            Self::advance_reveals(&mut inner);
            let found = if let Some(id) = Self::exact_id(selector) {
                Self::collect_matching(&inner, |n| n.overlay && n.test_id.as_deref() == Some(id))
            } else {
                Self::collect_matching(&inner, |n| n.overlay && n.test_id.is_some())
            };
            Self::advance_query_removals(&mut inner);
            return found;
        }
        if let Some(id) = Self::exact_id(selector) {
            return Self::collect_matching(&inner, |n| n.test_id.as_deref() == Some(id));
        }
        Self::collect_matching(&inner, |n| n.candidate_for.as_deref() == Some(selector))
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let inner = self.lock();
        let n = inner.nodes.get(node.raw() as usize)?;
        if !n.present || name != "data-testid" {
            return None;
        }
        n.test_id.clone()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        let inner = self.lock();
        inner
            .nodes
            .get(node.raw() as usize)
            .and_then(|n| n.parent)
            .map(|i| NodeId::new(i as u64))
    }

    fn scroll_metrics(&self, node: NodeId) -> Option<ScrollMetrics> {
        let inner = self.lock();
        let n = inner.nodes.get(node.raw() as usize)?;
        if !n.present {
            return None;
        }
        n.metrics
    }

    fn set_scroll_top(&self, node: NodeId, px: f64) {
        let mut inner = self.lock();
        let idx = node.raw() as usize;
        let Some(n) = inner.nodes.get_mut(idx) else {
            return;
        };
        if !n.present {
            return;
        }
        if let Some(m) = n.metrics.as_mut() {
            m.scroll_top = px;
        }
        inner.scroll_history.entry(idx).or_default().push(px);
    }

    fn scrolling_root(&self) -> Option<NodeId> {
        self.lock().document_surface.map(|i| NodeId::new(i as u64))
    }

    fn activate(&self, node: NodeId) -> bool {
        let mut inner = self.lock();
        let idx = node.raw() as usize;
        let Some(n) = inner.nodes.get(idx) else {
            return false;
        };
        if !n.present {
            return false;
        }
        let test_id = n.test_id.clone().unwrap_or_else(|| format!("#{idx}"));
        let was_overlay = n.overlay;

        inner.activations.push(test_id.clone());

        // Activating a row's menu button arms its scripted reveals.
        for reveal in &mut inner.reveals {
            if !reveal.consumed && reveal.trigger == test_id {
                reveal.armed = true;
            }
        }

        // Activating an overlay entry closes the overlay.
        if was_overlay {
            for n in &mut inner.nodes {
                if n.overlay {
                    n.present = false;
                }
            }
        }

        // Scripted removals keyed on activation-log length.
        let count = inner.activations.len();
        let stale: Vec<String> = inner
            .removals
            .iter_mut()
            .filter(|r| !r.done && count >= r.after_activations)
            .map(|r| {
                r.done = true;
                r.test_id.clone()
            })
            .collect();
        for test_id in stale {
            for n in &mut inner.nodes {
                if n.test_id.as_deref() == Some(test_id.as_str()) {
                    n.present = false;
                }
            }
        }

        true
    }

    fn mount_trigger(&self, _anchor_selector: &str, _marker: &str) -> bool {
        let mut inner = self.lock();
        if !inner.trigger_anchor_present {
            return false;
        }
        if !inner.trigger_mounted {
            inner.trigger_mounted = true;
            inner.mounts += 1;
        }
        true
    }
}

/// Operator that records every prompt and acknowledges immediately.
#[derive(Debug, Default)]
pub struct RecordingOperator {
    messages: Mutex<Vec<String>>,
}

impl RecordingOperator {
    /// Every message presented so far, in order
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl Operator for RecordingOperator {
    fn acknowledge(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(message.to_string());
    }
}
