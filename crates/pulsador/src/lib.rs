//! Pulsador: sequential batch action driver for asynchronously rendered,
//! virtualized list UIs.
//!
//! Pulsador (Spanish: "push-button") automates a repetitive multi-step
//! interaction against a host page it does not control: for each selected
//! row it opens the row's action menu, waits for the asynchronously rendered
//! submenu entry, and activates it — with bounded polling, an
//! identifier-agnostic fallback, and fixed pacing between rows so the host
//! is never overwhelmed.
//!
//! # Architecture
//!
//! ```text
//! BatchOrchestrator
//!   ├─► Render Forcer      (once: scroll to end and back)
//!   ├─► Target Collector   (once: selected rows, document order)
//!   ├─► Operator prompt    (blocking scope confirmation)
//!   └─► loop {
//!         ActionDriver     (open menu ─► poll submenu ─► settle ─► activate)
//!         pacing delay
//!       }
//! ```
//!
//! Every wait routes through the bounded poller or a fixed delay; there is
//! exactly one target in flight at any time. The host DOM is reached only
//! through the narrow [`HostPage`] trait, with a scriptable in-memory
//! implementation in [`fake`] for browser-free tests.
//!
//! ```
//! use pulsador::{AutoAckOperator, BatchOrchestrator, OrchestratorConfig, Timings};
//! use pulsador::fake::FakePage;
//!
//! let config = OrchestratorConfig::new().with_timings(Timings::fast());
//! let page = FakePage::new(&config);
//! let operator = AutoAckOperator;
//! let orchestrator = BatchOrchestrator::new(&page, &operator, config).unwrap();
//! let report = orchestrator.run_batch();
//! assert_eq!(report.collected, 0);
//! ```

#![warn(missing_docs)]

mod collect;
mod config;
mod driver;
mod inject;
mod orchestrator;
mod page;
mod poll;
mod result;
mod scroll;

/// Scriptable in-memory host page for browser-free tests.
pub mod fake;

pub use collect::{collect_targets, Target};
pub use config::{CompiledPatterns, OrchestratorConfig, Timings};
pub use driver::{ActionDriver, ActionPhase, DriveOutcome};
pub use inject::{mount_trigger_blocking, try_mount_trigger};
pub use orchestrator::{AutoAckOperator, BatchOrchestrator, BatchReport, Operator};
pub use page::{HostPage, NodeId, ScrollMetrics};
pub use poll::{poll_until, PollOptions};
pub use result::{PulsadorError, PulsadorResult};
pub use scroll::{find_scroll_container, force_render};
