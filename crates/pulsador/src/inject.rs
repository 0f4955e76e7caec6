//! Operator trigger injection.
//!
//! The batch is started from a control mounted once into the host page's
//! header region. The host renders that region asynchronously, so mounting
//! is retried at a fixed interval until the anchor exists. Re-invocation is a
//! no-op when the control is already present; the trigger's visual
//! construction lives behind [`HostPage::mount_trigger`].

use std::time::Duration;
use tracing::{debug, info};

use crate::config::OrchestratorConfig;
use crate::page::HostPage;
use crate::poll::{poll_until, PollOptions};

/// Attempt to mount the operator trigger once.
///
/// Returns `true` when the trigger is present afterwards (already mounted or
/// freshly mounted), `false` when the header anchor does not exist yet.
pub fn try_mount_trigger(page: &dyn HostPage, config: &OrchestratorConfig) -> bool {
    if page.mount_trigger(&config.trigger_anchor, &config.trigger_marker) {
        info!("operator trigger mounted");
        true
    } else {
        debug!("trigger anchor not present yet");
        false
    }
}

/// Retry mounting at the configured injection interval until it succeeds or
/// the timeout elapses.
///
/// Returns `false` when the anchor never appeared within the budget; this is
/// the usual scope-not-found degradation, not an error.
pub fn mount_trigger_blocking(
    page: &dyn HostPage,
    config: &OrchestratorConfig,
    timeout: Duration,
) -> bool {
    let options = PollOptions::new()
        .with_timeout(timeout.as_millis() as u64)
        .with_step(config.timings.inject_poll_ms);
    poll_until(|| try_mount_trigger(page, config).then_some(()), &options).is_some()
}
