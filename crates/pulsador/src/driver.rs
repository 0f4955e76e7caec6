//! Per-target action driver.
//!
//! Drives one target through the two-step interaction protocol: open the
//! row's operations menu, wait for the asynchronously rendered submenu entry,
//! settle, activate. Every negative path is a silent skip — malformed
//! identifiers, vanished elements, and unresolved overlays all reach a
//! terminal state without aborting the batch.

use serde::{Deserialize, Serialize};
use std::thread;
use tracing::{debug, warn};

use crate::collect::Target;
use crate::config::{CompiledPatterns, OrchestratorConfig};
use crate::page::HostPage;
use crate::poll::{poll_until, PollOptions};

/// Protocol phase of one in-flight action request.
///
/// Exists only for the duration of one [`ActionDriver::drive`] call; exactly
/// one poll session is outstanding at a time within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPhase {
    /// Nothing has happened yet
    Pending,
    /// The row's operations menu has been activated
    MenuOpened,
    /// A submenu entry was activated
    Resolved,
    /// No submenu entry could be located
    Failed,
}

impl ActionPhase {
    /// Phase name for diagnostics
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::MenuOpened => "menu-opened",
            Self::Resolved => "resolved",
            Self::Failed => "failed",
        }
    }
}

/// Terminal outcome of driving one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriveOutcome {
    /// The row's exact submenu entry was resolved and activated.
    ///
    /// Reported as soon as activation was attempted: if the entry vanished
    /// during the settle delay the activation itself was a no-op, yet the
    /// outcome is still `Primary`, so activation counts derived from
    /// outcomes can overcount by such targets.
    Primary,
    /// An identifier-agnostic submenu entry was activated instead.
    ///
    /// Carries the same vanished-during-settle caveat as [`Self::Primary`].
    Fallback,
    /// Neither primary nor fallback entry appeared within the poll budget
    Unresolved,
    /// The target's identifier did not match the expected pattern
    SkippedMalformed,
    /// The target's element was gone by activation time
    SkippedStale,
}

impl DriveOutcome {
    /// Whether a submenu entry was actually activated
    #[must_use]
    pub const fn activated(&self) -> bool {
        matches!(self, Self::Primary | Self::Fallback)
    }

    /// Outcome name for diagnostics
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
            Self::Unresolved => "unresolved",
            Self::SkippedMalformed => "skipped-malformed",
            Self::SkippedStale => "skipped-stale",
        }
    }
}

impl std::fmt::Display for DriveOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Drives single targets through the open-menu / resolve-submenu protocol.
pub struct ActionDriver<'a> {
    page: &'a dyn HostPage,
    config: &'a OrchestratorConfig,
    patterns: &'a CompiledPatterns,
}

impl std::fmt::Debug for ActionDriver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDriver")
            .field("config", &self.config)
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl<'a> ActionDriver<'a> {
    /// Create a driver over a host page
    #[must_use]
    pub fn new(
        page: &'a dyn HostPage,
        config: &'a OrchestratorConfig,
        patterns: &'a CompiledPatterns,
    ) -> Self {
        Self {
            page,
            config,
            patterns,
        }
    }

    /// Drive one target to a terminal state.
    ///
    /// The fallback path activates *any* overlay entry matching the generic
    /// submenu pattern. That is a deliberate best-effort degradation carried
    /// over from the original behavior: with overlapping overlays it could
    /// activate the wrong row's entry, and the only guard is the strictly
    /// sequential batch (one menu open at a time).
    pub fn drive(&self, target: &Target) -> DriveOutcome {
        let Some(row_id) = self.patterns.row_id(target.test_id()) else {
            debug!(target = %target, "identifier does not match pattern, skipping");
            return DriveOutcome::SkippedMalformed;
        };

        // Re-query the live DOM by identifier; the collected handle may be
        // stale by now.
        let selector = OrchestratorConfig::by_test_id(target.test_id());
        let Some(button) = self.page.query_first(&selector) else {
            debug!(target = %target, "element gone by activation time, skipping");
            return DriveOutcome::SkippedStale;
        };
        if !self.page.activate(button) {
            debug!(target = %target, "element gone by activation time, skipping");
            return DriveOutcome::SkippedStale;
        }
        debug!(
            target = %target,
            phase = ActionPhase::MenuOpened.as_str(),
            "operations menu opened"
        );

        let poll = PollOptions::new()
            .with_timeout(self.config.timings.poll_timeout_ms)
            .with_step(self.config.timings.poll_step_ms);

        // Primary: the exact submenu entry expected for this row.
        let entry_id = self.patterns.submenu_test_id(row_id);
        let primary_selector = self.config.overlay_entry_selector(&entry_id);
        if let Some(entry) = poll_until(|| self.page.query_first(&primary_selector), &poll) {
            thread::sleep(self.config.timings.settle());
            if !self.page.activate(entry) {
                warn!(
                    entry = %entry_id,
                    "submenu entry vanished during settle, still reported as activated"
                );
            }
            debug!(
                target = %target,
                phase = ActionPhase::Resolved.as_str(),
                entry = %entry_id,
                "submenu activated"
            );
            return DriveOutcome::Primary;
        }

        // Fallback: any overlay entry carrying the generic submenu pattern.
        // The overlay occasionally renders with an unexpected identifier
        // ordering; picking "any" matching entry keeps the batch moving.
        warn!(entry = %entry_id, "submenu entry not found, trying fallback");
        let any_selector = self.config.overlay_any_selector();
        let fallback = poll_until(
            || {
                self.page.query_all(&any_selector).into_iter().find(|node| {
                    self.page
                        .attribute(*node, "data-testid")
                        .is_some_and(|id| self.patterns.is_submenu(&id))
                })
            },
            &poll,
        );
        if let Some(entry) = fallback {
            thread::sleep(self.config.timings.settle());
            if !self.page.activate(entry) {
                warn!(
                    target = %target,
                    "fallback entry vanished during settle, still reported as activated"
                );
            }
            debug!(
                target = %target,
                phase = ActionPhase::Resolved.as_str(),
                "fallback submenu activated"
            );
            return DriveOutcome::Fallback;
        }

        warn!(
            target = %target,
            phase = ActionPhase::Failed.as_str(),
            "no submenu entry found, skipping"
        );
        DriveOutcome::Unresolved
    }
}
