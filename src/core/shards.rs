/*!
 * Shard Configuration
 *
 * CPU-topology-aware shard counts for the registry's concurrent maps.
 * Power-of-2 shard counts keep the hash distribution cheap (modulo via
 * bitwise AND); the CPU count is detected once and cached.
 */

use super::limits::{MAX_SHARD_COUNT, MIN_SHARD_COUNT};
use std::sync::OnceLock;

/// Detected CPU count, initialized on first use
static CPU_COUNT: OnceLock<usize> = OnceLock::new();

fn cpu_count() -> usize {
    *CPU_COUNT.get_or_init(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or_else(|_| {
                log::warn!("Failed to detect CPU count, defaulting to 8");
                8
            })
    })
}

/// Contention characterization for shard count calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contention {
    /// Heavy concurrent access (the allocation record map: every handle
    /// construction, teardown, and liveness query lands here)
    High,
    /// Light concurrent access (diagnostics, infrequent lookups)
    Low,
}

/// Calculate the shard count for a map with the given contention profile
pub fn shard_count(profile: Contention) -> usize {
    let multiplier = match profile {
        Contention::High => 4,
        Contention::Low => 1,
    };

    (cpu_count() * multiplier)
        .next_power_of_two()
        .clamp(MIN_SHARD_COUNT, MAX_SHARD_COUNT)
}
