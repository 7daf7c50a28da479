/*!
 * Diagnostics
 *
 * Read-only observability over the registry and reference counts:
 * combined usage snapshots, a bounded snapshot history, and a
 * shutdown-time leak check. Everything here is advisory; none of it
 * feeds back into deallocation decisions.
 */

use crate::core::limits::{bytes_to_kb, LEAK_REPORT_MAX_ENTRIES, SNAPSHOT_HISTORY_DEPTH};
use crate::core::types::{Address, Size};
use crate::handle::outstanding_refs;
use crate::registry::{Registry, RegistryStats};
use log::warn;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::OnceLock;
use thiserror::Error;

static HISTORY: OnceLock<RwLock<VecDeque<UsageSnapshot>>> = OnceLock::new();

fn history_cell() -> &'static RwLock<VecDeque<UsageSnapshot>> {
    HISTORY.get_or_init(|| RwLock::new(VecDeque::with_capacity(SNAPSHOT_HISTORY_DEPTH)))
}

/// Point-in-time usage across the subsystem
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UsageSnapshot {
    pub registry: RegistryStats,
    /// Global outstanding strong references (advisory)
    pub outstanding_refs: u64,
}

/// One allocation still live at leak-check time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeakEntry {
    pub address: Address,
    pub size: Size,
}

/// Everything still tracked when the leak check ran
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LeakReport {
    pub leaked_bytes: u64,
    pub leaked_allocations: usize,
    pub outstanding_refs: u64,
    /// Bounded sample of live allocations (totals above stay exact)
    pub entries: Vec<LeakEntry>,
}

/// Leak check failure
#[derive(Error, Debug)]
pub enum LeakError {
    #[error("{leaked_allocations} allocation(s) still live at shutdown ({leaked_bytes} B leaked)")]
    Leaked {
        leaked_allocations: usize,
        leaked_bytes: u64,
        report: LeakReport,
    },
}

/// Snapshot the global registry and reference totals
pub fn snapshot() -> UsageSnapshot {
    snapshot_of(Registry::global())
}

/// Snapshot an explicit registry instance
pub fn snapshot_of(registry: &Registry) -> UsageSnapshot {
    UsageSnapshot {
        registry: registry.stats(),
        outstanding_refs: outstanding_refs(),
    }
}

/// Take a snapshot and append it to the bounded history
pub fn record() -> UsageSnapshot {
    let snapshot = snapshot();
    let mut history = history_cell().write();
    if history.len() == SNAPSHOT_HISTORY_DEPTH {
        history.pop_front();
    }
    history.push_back(snapshot.clone());
    snapshot
}

/// Recorded snapshots, oldest first
pub fn history() -> Vec<UsageSnapshot> {
    history_cell().read().iter().cloned().collect()
}

/// Drop all recorded snapshots
pub fn clear_history() {
    history_cell().write().clear();
}

/// Verify the registry is empty, reporting anything still live.
///
/// Intended for process-exit teardown: a populated registry at that point
/// is a leak. The report is also logged as JSON for the logging facility.
pub fn leak_check(registry: &Registry) -> Result<(), LeakError> {
    let stats = registry.stats();
    if stats.live_allocations == 0 {
        return Ok(());
    }

    let report = LeakReport {
        leaked_bytes: stats.tracked_bytes,
        leaked_allocations: stats.live_allocations,
        outstanding_refs: outstanding_refs(),
        entries: registry
            .sample_live(LEAK_REPORT_MAX_ENTRIES)
            .into_iter()
            .map(|(address, size)| LeakEntry { address, size })
            .collect(),
    };

    match serde_json::to_string(&report) {
        Ok(json) => warn!(
            "Leak report ({} KiB still live): {json}",
            bytes_to_kb(report.leaked_bytes as usize)
        ),
        Err(err) => warn!("Leak report serialization failed: {err}"),
    }

    Err(LeakError::Leaked {
        leaked_allocations: report.leaked_allocations,
        leaked_bytes: report.leaked_bytes,
        report,
    })
}
