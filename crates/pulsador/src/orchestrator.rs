//! Sequential batch orchestration.
//!
//! The top-level driver: force rendering once, collect once, confirm scope
//! with the operator, then drive every target in collection order with a
//! fixed pacing delay in between. Strictly sequential by construction — the
//! loop never advances until the previous target reached a terminal state —
//! which is the batch's only load- and consistency-control mechanism. There
//! is no cancellation: once started, every collected target is attempted.

use serde::{Deserialize, Serialize};
use std::thread;
use tracing::{debug, info};

use crate::collect::{collect_targets, Target};
use crate::config::{CompiledPatterns, OrchestratorConfig};
use crate::driver::{ActionDriver, DriveOutcome};
use crate::page::HostPage;
use crate::result::PulsadorResult;
use crate::scroll::{find_scroll_container, force_render};

/// Blocking operator prompt.
///
/// The batch reports its collected scope through this seam exactly once and
/// proceeds as soon as the call returns. Acknowledge-only by design: the
/// original control surface offers no cancel, so neither does this trait.
pub trait Operator {
    /// Present a blocking message to the operator and wait for dismissal.
    fn acknowledge(&self, message: &str);
}

/// Operator that acknowledges immediately (headless / unattended runs).
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoAckOperator;

impl Operator for AutoAckOperator {
    fn acknowledge(&self, message: &str) {
        debug!(prompt = message, "operator prompt auto-acknowledged");
    }
}

/// What happened to one batch, in collection order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Number of targets collected at batch start
    pub collected: usize,
    /// Terminal outcome of each driver invocation, in collection order
    pub outcomes: Vec<DriveOutcome>,
}

impl BatchReport {
    /// How many targets ended with an actual submenu activation
    #[must_use]
    pub fn activated(&self) -> usize {
        self.outcomes.iter().filter(|o| o.activated()).count()
    }

    /// How many targets were skipped or left unresolved
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.activated()
    }
}

/// Top-level sequential batch orchestrator.
pub struct BatchOrchestrator<'a> {
    page: &'a dyn HostPage,
    operator: &'a dyn Operator,
    config: OrchestratorConfig,
    patterns: CompiledPatterns,
}

impl std::fmt::Debug for BatchOrchestrator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchOrchestrator")
            .field("config", &self.config)
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl<'a> BatchOrchestrator<'a> {
    /// Create an orchestrator, compiling the configured identifier patterns.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration's namespace patterns cannot be
    /// compiled.
    pub fn new(
        page: &'a dyn HostPage,
        operator: &'a dyn Operator,
        config: OrchestratorConfig,
    ) -> PulsadorResult<Self> {
        let patterns = config.compile()?;
        Ok(Self {
            page,
            operator,
            config,
            patterns,
        })
    }

    /// The configuration this orchestrator was built with
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run one batch to completion.
    ///
    /// Render-force (best effort), collect, confirm scope with the operator,
    /// then drive each target in order with the unconditional pacing delay
    /// after every one — uniform regardless of whether the target resolved
    /// via primary, fallback, or not at all.
    pub fn run_batch(&self) -> BatchReport {
        info!("batch starting");

        match find_scroll_container(self.page, &self.config) {
            Some(container) => {
                debug!("forcing virtualized rows to materialize");
                force_render(self.page, container, &self.config.timings);
            }
            None => debug!("no scrollable container found, skipping render forcing"),
        }

        let targets = collect_targets(self.page, &self.config, &self.patterns);
        info!(count = targets.len(), "targets collected");

        self.operator
            .acknowledge(&self.config.confirm_message(targets.len()));

        if targets.is_empty() {
            info!("nothing to do");
            return BatchReport {
                collected: 0,
                outcomes: Vec::new(),
            };
        }

        let driver = ActionDriver::new(self.page, &self.config, &self.patterns);
        let outcomes = self.drive_all(&driver, &targets);

        let report = BatchReport {
            collected: targets.len(),
            outcomes,
        };
        info!(
            collected = report.collected,
            activated = report.activated(),
            skipped = report.skipped(),
            "batch complete"
        );
        report
    }

    /// Drive every target in order, pacing unconditionally between them.
    fn drive_all(&self, driver: &ActionDriver<'_>, targets: &[Target]) -> Vec<DriveOutcome> {
        let mut outcomes = Vec::with_capacity(targets.len());
        for target in targets {
            let outcome = driver.drive(target);
            debug!(target = %target, outcome = %outcome, "target finished");
            outcomes.push(outcome);
            thread::sleep(self.config.timings.pacing());
        }
        outcomes
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::Timings;
    use crate::fake::{FakePage, RecordingOperator};
    use crate::page::ScrollMetrics;

    fn btn(row: u32) -> String {
        format!("szamla-lista-{row}-operations-button-icon-svg")
    }

    fn entry(row: u32) -> String {
        format!("szamla-lista-{row}-operations-dropdown-icon-2")
    }

    fn fast_config() -> OrchestratorConfig {
        OrchestratorConfig::new().with_timings(Timings::fast())
    }

    // =========================================================================
    // End-to-end batches
    // =========================================================================

    #[test]
    fn test_three_rows_all_primary_in_collection_order() {
        let config = fast_config();
        let page = FakePage::new(&config);
        let operator = RecordingOperator::default();
        for row in 1..=3 {
            page.add_selected_button(&btn(row));
            page.script_overlay_reveal(&btn(row), &entry(row), 1);
        }

        let orchestrator = BatchOrchestrator::new(&page, &operator, config).unwrap();
        let report = orchestrator.run_batch();

        assert_eq!(report.collected, 3);
        assert_eq!(
            report.outcomes,
            vec![DriveOutcome::Primary, DriveOutcome::Primary, DriveOutcome::Primary]
        );
        // 3 menu opens and 3 submenu activations, interleaved in order.
        assert_eq!(
            page.activations(),
            vec![btn(1), entry(1), btn(2), entry(2), btn(3), entry(3)]
        );
    }

    #[test]
    fn test_zero_rows_reports_and_terminates_immediately() {
        let config = fast_config();
        let page = FakePage::new(&config);
        let operator = RecordingOperator::default();

        let orchestrator = BatchOrchestrator::new(&page, &operator, config).unwrap();
        let report = orchestrator.run_batch();

        assert_eq!(report.collected, 0);
        assert!(report.outcomes.is_empty());
        assert!(page.activations().is_empty());
        // The operator was still told about the (empty) scope.
        assert_eq!(operator.messages().len(), 1);
        assert!(operator.messages()[0].contains('0'));
    }

    #[test]
    fn test_confirmation_reports_the_collected_count() {
        let config = fast_config();
        let page = FakePage::new(&config);
        let operator = RecordingOperator::default();
        page.add_selected_button(&btn(1));
        page.add_selected_button(&btn(2));

        let orchestrator = BatchOrchestrator::new(&page, &operator, config).unwrap();
        orchestrator.run_batch();

        assert_eq!(operator.messages().len(), 1);
        assert!(operator.messages()[0].contains('2'));
    }

    #[test]
    fn test_unresolved_target_does_not_stop_the_batch() {
        let config = fast_config();
        let page = FakePage::new(&config);
        let operator = RecordingOperator::default();
        page.add_selected_button(&btn(1)); // never resolves
        page.add_selected_button(&btn(2));
        page.script_overlay_reveal(&btn(2), &entry(2), 0);

        let orchestrator = BatchOrchestrator::new(&page, &operator, config).unwrap();
        let report = orchestrator.run_batch();

        assert_eq!(
            report.outcomes,
            vec![DriveOutcome::Unresolved, DriveOutcome::Primary]
        );
        assert_eq!(report.activated(), 1);
        assert_eq!(report.skipped(), 1);
    }

    #[test]
    fn test_pacing_is_applied_after_every_target() {
        use std::time::{Duration, Instant};

        let config = OrchestratorConfig::new().with_timings(Timings::fast().with_pacing(60));
        let page = FakePage::new(&config);
        let operator = RecordingOperator::default();
        page.add_selected_button(&btn(1));
        page.script_overlay_reveal(&btn(1), &entry(1), 0);
        page.add_selected_button(&btn(2)); // never resolves

        let orchestrator = BatchOrchestrator::new(&page, &operator, config).unwrap();
        let start = Instant::now();
        let report = orchestrator.run_batch();
        let elapsed = start.elapsed();

        assert_eq!(
            report.outcomes,
            vec![DriveOutcome::Primary, DriveOutcome::Unresolved]
        );
        // One full pacing delay after each target, the last and the
        // unresolved one included.
        assert!(
            elapsed >= Duration::from_millis(120),
            "batch finished in {elapsed:?}, pacing was not applied"
        );
    }

    #[test]
    fn test_stale_target_is_driven_and_skipped() {
        let config = fast_config();
        let page = FakePage::new(&config);
        let operator = RecordingOperator::default();
        page.add_selected_button(&btn(1));
        page.add_selected_button(&btn(2));
        page.script_overlay_reveal(&btn(1), &entry(1), 0);
        // Row 2's button vanishes after collection but before activation.
        page.remove_after_activations(&btn(2), 2);

        let orchestrator = BatchOrchestrator::new(&page, &operator, config).unwrap();
        let report = orchestrator.run_batch();

        assert_eq!(report.collected, 2);
        assert_eq!(
            report.outcomes,
            vec![DriveOutcome::Primary, DriveOutcome::SkippedStale]
        );
    }

    #[test]
    fn test_render_forcing_runs_before_collection() {
        let config = fast_config();
        let page = FakePage::new(&config);
        let operator = RecordingOperator::default();
        let container = page.add_scroll_container(
            "cdk-virtual-scroll-viewport",
            ScrollMetrics {
                scroll_top: 50.0,
                scroll_height: 800.0,
                client_height: 200.0,
            },
        );

        let orchestrator = BatchOrchestrator::new(&page, &operator, config).unwrap();
        orchestrator.run_batch();

        assert_eq!(page.scroll_history(container), vec![800.0, 50.0]);
    }

    #[test]
    fn test_orchestrator_debug_output_shows_config_not_page() {
        let config = fast_config();
        let page = FakePage::new(&config);
        let operator = AutoAckOperator;

        let orchestrator = BatchOrchestrator::new(&page, &operator, config).unwrap();

        let rendered = format!("{orchestrator:?}");
        assert!(rendered.contains("BatchOrchestrator"));
        assert!(rendered.contains("namespace"));
    }

    #[test]
    fn test_invalid_namespace_is_a_construction_error() {
        let config = fast_config().with_namespace("");
        let page = FakePage::new(&config);
        let operator = AutoAckOperator;
        assert!(BatchOrchestrator::new(&page, &operator, config).is_err());
    }

    // =========================================================================
    // Property: driver invocations == targets collected at batch start
    // =========================================================================

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn prop_one_outcome_per_collected_target(
                rows in proptest::collection::vec(1u32..1000, 0..8),
                resolving in proptest::collection::vec(any::<bool>(), 8),
            ) {
                let config = fast_config();
                let page = FakePage::new(&config);
                let operator = RecordingOperator::default();
                for (i, row) in rows.iter().enumerate() {
                    page.add_selected_button(&btn(*row));
                    if resolving[i] {
                        page.script_overlay_reveal(&btn(*row), &entry(*row), 0);
                    }
                }

                let orchestrator =
                    BatchOrchestrator::new(&page, &operator, config).unwrap();
                let report = orchestrator.run_batch();

                prop_assert_eq!(report.collected, rows.len());
                prop_assert_eq!(report.outcomes.len(), report.collected);
                prop_assert_eq!(operator.messages().len(), 1);
            }
        }
    }
}
