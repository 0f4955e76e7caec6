//! Orchestrator configuration.
//!
//! Every selector, identifier pattern, and timing constant the batch uses is
//! carried by an explicit immutable [`OrchestratorConfig`] handed to the
//! orchestrator at construction. Test suites inject shortened timings through
//! the same value for fast, deterministic runs.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::result::{PulsadorError, PulsadorResult};

// =============================================================================
// TIMING CONSTANTS
// =============================================================================

/// Default total poll budget (2 seconds)
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 2000;

/// Default poll step interval (80ms)
pub const DEFAULT_POLL_STEP_MS: u64 = 80;

/// Settle delay after a menu opens, before activating its entry (1 second)
pub const DEFAULT_SETTLE_MS: u64 = 1000;

/// Unconditional pacing delay between targets (3 seconds)
pub const DEFAULT_PACING_MS: u64 = 3000;

/// Settle after scrolling to the end of the list (60ms)
pub const DEFAULT_SCROLL_SETTLE_DOWN_MS: u64 = 60;

/// Settle after restoring the original scroll offset (40ms)
pub const DEFAULT_SCROLL_SETTLE_BACK_MS: u64 = 40;

/// Trigger-injection retry interval (500ms)
pub const DEFAULT_INJECT_POLL_MS: u64 = 500;

/// Height slack when deciding whether a container actually scrolls,
/// absorbing sub-pixel rounding (5px)
pub const DEFAULT_SCROLL_TOLERANCE_PX: f64 = 5.0;

// =============================================================================
// TIMINGS
// =============================================================================

/// Every suspension interval the batch uses, in milliseconds.
///
/// Defaults reproduce the host-facing production values exactly; tests shrink
/// them to single-digit milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timings {
    /// Total budget for one poll session
    pub poll_timeout_ms: u64,
    /// Step interval between poll probes
    pub poll_step_ms: u64,
    /// Settle delay before activating a resolved submenu entry
    pub settle_ms: u64,
    /// Pacing delay between consecutive targets
    pub pacing_ms: u64,
    /// Settle after jumping the scroll container to its end
    pub scroll_settle_down_ms: u64,
    /// Settle after restoring the original scroll offset
    pub scroll_settle_back_ms: u64,
    /// Retry interval for trigger injection
    pub inject_poll_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            poll_timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
            poll_step_ms: DEFAULT_POLL_STEP_MS,
            settle_ms: DEFAULT_SETTLE_MS,
            pacing_ms: DEFAULT_PACING_MS,
            scroll_settle_down_ms: DEFAULT_SCROLL_SETTLE_DOWN_MS,
            scroll_settle_back_ms: DEFAULT_SCROLL_SETTLE_BACK_MS,
            inject_poll_ms: DEFAULT_INJECT_POLL_MS,
        }
    }
}

impl Timings {
    /// Create timings with production defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uniformly short timings for tests (1ms everywhere, 40ms poll budget)
    #[must_use]
    pub fn fast() -> Self {
        Self {
            poll_timeout_ms: 40,
            poll_step_ms: 1,
            settle_ms: 1,
            pacing_ms: 1,
            scroll_settle_down_ms: 1,
            scroll_settle_back_ms: 1,
            inject_poll_ms: 1,
        }
    }

    /// Set the poll budget
    #[must_use]
    pub const fn with_poll_timeout(mut self, ms: u64) -> Self {
        self.poll_timeout_ms = ms;
        self
    }

    /// Set the poll step interval
    #[must_use]
    pub const fn with_poll_step(mut self, ms: u64) -> Self {
        self.poll_step_ms = ms;
        self
    }

    /// Set the settle delay
    #[must_use]
    pub const fn with_settle(mut self, ms: u64) -> Self {
        self.settle_ms = ms;
        self
    }

    /// Set the pacing delay
    #[must_use]
    pub const fn with_pacing(mut self, ms: u64) -> Self {
        self.pacing_ms = ms;
        self
    }

    /// Settle delay as a Duration
    #[must_use]
    pub const fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Pacing delay as a Duration
    #[must_use]
    pub const fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    /// Scroll-down settle as a Duration
    #[must_use]
    pub const fn scroll_settle_down(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_down_ms)
    }

    /// Scroll-back settle as a Duration
    #[must_use]
    pub const fn scroll_settle_back(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_back_ms)
    }
}

// =============================================================================
// ORCHESTRATOR CONFIG
// =============================================================================

/// Immutable configuration for a batch orchestrator.
///
/// Selector and namespace defaults target the host UI the original automation
/// was written against; all of them are contract assumptions on an external
/// system and a mismatch degrades to "not found", never to a fatal error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Identifier namespace shared by every per-row test-id
    pub namespace: String,
    /// Selector for identifier-carrying elements inside selected rows
    pub selected_selector: String,
    /// Selector for the transient menu overlay surface
    pub overlay_selector: String,
    /// Prioritized candidate selectors for the virtualized scroll container
    pub scroll_candidates: Vec<String>,
    /// Selector for the header anchor the operator trigger mounts next to
    pub trigger_anchor: String,
    /// Marker identifying an already-mounted trigger (idempotency check)
    pub trigger_marker: String,
    /// Operator confirmation template; `{count}` is replaced with the
    /// collected target count
    pub confirm_template: String,
    /// Height slack for scroll-container detection, in pixels
    pub scroll_tolerance_px: f64,
    /// Suspension intervals
    pub timings: Timings,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            namespace: "szamla-lista".to_string(),
            selected_selector: ".ndk2-table-body-cell-active [data-testid]".to_string(),
            overlay_selector: ".cdk-overlay-pane".to_string(),
            scroll_candidates: vec![
                "cdk-virtual-scroll-viewport".to_string(),
                "#cdk-drop-list-0".to_string(),
            ],
            trigger_anchor: "ndk2-table-header-grid-item ndk2-spacer.ndk2-spacer-variant-s-fill"
                .to_string(),
            trigger_marker: "pulsador-batch-trigger".to_string(),
            confirm_template: "About to trigger {count} download(s). \
                               Please do not use the browser during the batch."
                .to_string(),
            scroll_tolerance_px: DEFAULT_SCROLL_TOLERANCE_PX,
            timings: Timings::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Create a configuration with production defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identifier namespace
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the selected-row selector
    #[must_use]
    pub fn with_selected_selector(mut self, selector: impl Into<String>) -> Self {
        self.selected_selector = selector.into();
        self
    }

    /// Set the overlay selector
    #[must_use]
    pub fn with_overlay_selector(mut self, selector: impl Into<String>) -> Self {
        self.overlay_selector = selector.into();
        self
    }

    /// Set the scroll-container candidate list
    #[must_use]
    pub fn with_scroll_candidates(mut self, candidates: Vec<String>) -> Self {
        self.scroll_candidates = candidates;
        self
    }

    /// Set the suspension intervals
    #[must_use]
    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    /// Load a configuration from JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> PulsadorResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize this configuration to JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> PulsadorResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Compile the identifier patterns derived from the namespace
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace is empty or a pattern fails to
    /// compile.
    pub fn compile(&self) -> PulsadorResult<CompiledPatterns> {
        if self.namespace.trim().is_empty() {
            return Err(PulsadorError::InvalidConfig {
                message: "namespace must not be empty".to_string(),
            });
        }
        CompiledPatterns::for_namespace(&self.namespace)
    }

    /// Render the operator confirmation message for a collected count
    #[must_use]
    pub fn confirm_message(&self, count: usize) -> String {
        self.confirm_template.replace("{count}", &count.to_string())
    }

    /// Selector addressing any element by exact test-id
    #[must_use]
    pub fn by_test_id(test_id: &str) -> String {
        format!("[data-testid=\"{test_id}\"]")
    }

    /// Overlay-scoped selector for an exact test-id
    #[must_use]
    pub fn overlay_entry_selector(&self, test_id: &str) -> String {
        format!("{} [data-testid=\"{test_id}\"]", self.overlay_selector)
    }

    /// Overlay-scoped selector for any identifier-carrying element
    #[must_use]
    pub fn overlay_any_selector(&self) -> String {
        format!("{} [data-testid]", self.overlay_selector)
    }
}

// =============================================================================
// COMPILED PATTERNS
// =============================================================================

/// The three identifier patterns of the interaction protocol, compiled once.
///
/// Naming convention on the host page, with `ns` the configured namespace:
/// `<ns>-<id>-operations-button-icon-svg` marks a row's menu button and
/// `<ns>-<id>-operations-dropdown-icon-2` marks its submenu entry.
#[derive(Debug, Clone)]
pub struct CompiledPatterns {
    namespace: String,
    op_button: Regex,
    submenu_any: Regex,
}

impl CompiledPatterns {
    /// Compile the patterns for a namespace
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern fails to compile.
    pub fn for_namespace(namespace: &str) -> PulsadorResult<Self> {
        let ns = regex::escape(namespace);
        Ok(Self {
            namespace: namespace.to_string(),
            op_button: Regex::new(&format!(r"{ns}-(\d+)-operations-button-icon-svg"))?,
            submenu_any: Regex::new(&format!(r"{ns}-\d+-operations-dropdown-icon-2"))?,
        })
    }

    /// The namespace these patterns were compiled for
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Whether a test-id names a row's operations button
    #[must_use]
    pub fn is_op_button(&self, test_id: &str) -> bool {
        self.op_button.is_match(test_id)
    }

    /// Extract the row id from an operations-button test-id
    #[must_use]
    pub fn row_id<'a>(&self, test_id: &'a str) -> Option<&'a str> {
        self.op_button
            .captures(test_id)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }

    /// The exact submenu-entry test-id expected for a row id
    #[must_use]
    pub fn submenu_test_id(&self, row_id: &str) -> String {
        format!("{}-{row_id}-operations-dropdown-icon-2", self.namespace)
    }

    /// Whether a test-id names any row's submenu entry (identifier-agnostic)
    #[must_use]
    pub fn is_submenu(&self, test_id: &str) -> bool {
        self.submenu_any.is_match(test_id)
    }
}
