//! Simulation statistics collection trait

/// Trait for collecting simulation statistics
///
/// Lets the engine report what happened during a tick without owning any
/// particular metrics backend.
pub trait SimStats {
    /// Record that a cell proposed a move
    fn record_proposal(&mut self);

    /// Record that a proposed move was committed as a swap
    fn record_commit(&mut self);

    /// Record that a proposal lost its target to another proposal
    fn record_conflict(&mut self);

    /// Record that the deadlock breaker committed a proposal
    fn record_forced_commit(&mut self);
}

/// A no-op implementation for when stats collection is not needed
#[derive(Default)]
pub struct NoopStats;

impl SimStats for NoopStats {
    fn record_proposal(&mut self) {}
    fn record_commit(&mut self) {}
    fn record_conflict(&mut self) {}
    fn record_forced_commit(&mut self) {}
}

/// Running totals, reset by the caller whenever it wants a fresh window
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickStats {
    pub proposals: u64,
    pub commits: u64,
    pub conflicts: u64,
    pub forced_commits: u64,
}

impl SimStats for TickStats {
    fn record_proposal(&mut self) {
        self.proposals += 1;
    }

    fn record_commit(&mut self) {
        self.commits += 1;
    }

    fn record_conflict(&mut self) {
        self.conflicts += 1;
    }

    fn record_forced_commit(&mut self) {
        self.forced_commits += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_stats_all_methods() {
        let mut stats = NoopStats;

        for _ in 0..100 {
            stats.record_proposal();
            stats.record_commit();
            stats.record_conflict();
            stats.record_forced_commit();
        }
    }

    #[test]
    fn test_tick_stats_counts() {
        let mut stats = TickStats::default();

        stats.record_proposal();
        stats.record_proposal();
        stats.record_proposal();
        stats.record_commit();
        stats.record_conflict();
        stats.record_conflict();
        stats.record_forced_commit();

        assert_eq!(stats.proposals, 3);
        assert_eq!(stats.commits, 1);
        assert_eq!(stats.conflicts, 2);
        assert_eq!(stats.forced_commits, 1);
    }

    #[test]
    fn test_stats_usable_as_trait_object() {
        let mut stats = TickStats::default();
        {
            let sink: &mut dyn SimStats = &mut stats;
            sink.record_commit();
        }
        assert_eq!(stats.commits, 1);
    }
}
