//! Conflict resolution - turns a tick's proposals into a consistent set of swaps

use ahash::AHashSet;
use glam::IVec2;
use sandfall_simulation::MaterialType;

use super::chunk_manager::ChunkManager;
use super::neighbor_queries::NeighborQueries;
use super::proposal::{Proposal, cell_seed, evaluate_cell};
use super::{SimStats, WorldRng};
use crate::behavior::BehaviorSet;

/// What the resolver did during one tick
#[derive(Debug, Default, Clone)]
pub struct Resolution {
    /// Swaps applied to the grid, in commit order
    pub committed: Vec<Proposal>,
    /// Resolution rounds run
    pub rounds: u32,
    /// Commits made by the deadlock breaker
    pub forced: usize,
    /// Proposals given up for this tick: still pending at the round limit, or
    /// aimed at a position another commit already wrote
    pub dropped: usize,
    /// Positions changed by re-evaluation (state or effects), for chunk activation
    pub touched: Vec<IVec2>,
}

/// Per-tick inputs that stay fixed across rounds
#[derive(Debug, Clone, Copy)]
pub struct ResolveParams {
    pub tick_seed: u64,
    pub max_rounds: u32,
}

/// Conflict resolver - stateless, serial commit phase of a tick
pub struct ConflictResolver;

impl ConflictResolver {
    /// Commit as many proposals as possible without two moves sharing a cell
    ///
    /// Each round shuffles the pending proposals and walks them greedily. A
    /// proposal is accepted when neither of its endpoints was used by an
    /// earlier accepted proposal in the same round. Deferred proposals are
    /// re-evaluated against the updated grid and form the next round. A
    /// position written by a commit is never written again in the same tick,
    /// so a later proposal aimed at it is dropped and the cell retries next
    /// tick. When a round makes no progress, a random half of the conflicts is
    /// forced through without the per-round claim check. Forced moves still
    /// have to satisfy mass ordering.
    pub fn resolve<R: WorldRng>(
        grid: &mut ChunkManager,
        behaviors: &BehaviorSet,
        proposals: Vec<Proposal>,
        params: ResolveParams,
        rng: &mut R,
        stats: &mut dyn SimStats,
    ) -> Resolution {
        let mut resolution = Resolution::default();
        // Every position a commit has written this tick
        let mut moved: AHashSet<IVec2> = AHashSet::new();
        let mut pending = proposals;
        let mut previous_conflicts = usize::MAX;

        while !pending.is_empty() {
            if resolution.rounds >= params.max_rounds {
                resolution.dropped += pending.len();
                log::debug!(
                    "[RESOLVE] Round limit {} reached, dropping {} proposals",
                    params.max_rounds,
                    pending.len()
                );
                break;
            }
            resolution.rounds += 1;

            rng.shuffle(&mut pending);

            let mut claimed: AHashSet<IVec2> = AHashSet::with_capacity(pending.len() * 2);
            let mut deferred = Vec::new();
            for proposal in pending.drain(..) {
                if moved.contains(&proposal.current) {
                    // The cell that proposed this has already been swapped away
                    continue;
                }
                if claimed.contains(&proposal.current) || claimed.contains(&proposal.next) {
                    stats.record_conflict();
                    deferred.push(proposal);
                    continue;
                }
                if moved.contains(&proposal.next) {
                    // Target filled by an earlier round
                    stats.record_conflict();
                    Self::drop_blocked(proposal, &mut resolution);
                    continue;
                }
                if Self::commit(grid, proposal, &mut moved, &mut resolution) {
                    stats.record_commit();
                    claimed.insert(proposal.current);
                    claimed.insert(proposal.next);
                }
            }

            if deferred.len() >= previous_conflicts && !deferred.is_empty() {
                deferred = Self::break_deadlock(grid, deferred, &mut moved, &mut resolution, rng, stats);
            }
            previous_conflicts = deferred.len();

            pending = Self::reevaluate(grid, behaviors, deferred, &moved, params, resolution.rounds, &mut resolution);
        }

        resolution
    }

    /// Swap one proposal into the grid if mass ordering still holds
    fn commit(
        grid: &mut ChunkManager,
        proposal: Proposal,
        moved: &mut AHashSet<IVec2>,
        resolution: &mut Resolution,
    ) -> bool {
        let allowed = match (grid.get_cell(proposal.current), grid.get_cell(proposal.next)) {
            (Some(mover), Some(target)) => target.is_empty_for(mover),
            _ => false,
        };
        if !allowed || !grid.swap_cells(proposal.current, proposal.next) {
            return false;
        }
        moved.insert(proposal.current);
        moved.insert(proposal.next);
        resolution.committed.push(proposal);

        // Liquid next to the vacated cell gets a chance to flow into it
        let vacated = proposal.current;
        let mut wake = Vec::new();
        NeighborQueries::for_each_neighbor(grid, vacated, |pos, cell| {
            if cell.material == MaterialType::Liquid && cell.physics.cancel_horizontal_motion() {
                wake.push(pos);
            }
        });
        for pos in wake {
            if let Some(cell) = grid.get_cell_mut(pos) {
                cell.physics.unlock();
                resolution.touched.push(pos);
            }
        }
        true
    }

    /// Give up on a proposal for this tick, keeping its chunk awake for the next
    fn drop_blocked(proposal: Proposal, resolution: &mut Resolution) {
        resolution.dropped += 1;
        resolution.touched.push(proposal.current);
    }

    /// Force a random half of a stuck conflict set, returning what remains
    fn break_deadlock<R: WorldRng>(
        grid: &mut ChunkManager,
        mut deferred: Vec<Proposal>,
        moved: &mut AHashSet<IVec2>,
        resolution: &mut Resolution,
        rng: &mut R,
        stats: &mut dyn SimStats,
    ) -> Vec<Proposal> {
        rng.shuffle(&mut deferred);
        let half = deferred.len().div_ceil(2);
        let rest = deferred.split_off(half);

        log::debug!(
            "[RESOLVE] No progress with {} conflicts, forcing {}",
            deferred.len() + rest.len(),
            half
        );

        let mut remaining = rest;
        for proposal in deferred {
            if moved.contains(&proposal.current) {
                continue;
            }
            if moved.contains(&proposal.next) {
                Self::drop_blocked(proposal, resolution);
                continue;
            }
            if Self::commit(grid, proposal, moved, resolution) {
                resolution.forced += 1;
                stats.record_commit();
                stats.record_forced_commit();
            } else {
                remaining.push(proposal);
            }
        }
        remaining
    }

    /// Ask every deferred cell where it wants to go now
    fn reevaluate(
        grid: &mut ChunkManager,
        behaviors: &BehaviorSet,
        deferred: Vec<Proposal>,
        moved: &AHashSet<IVec2>,
        params: ResolveParams,
        round: u32,
        resolution: &mut Resolution,
    ) -> Vec<Proposal> {
        let mut next_round = Vec::with_capacity(deferred.len());
        for proposal in deferred {
            let origin = proposal.current;
            if moved.contains(&origin) {
                continue;
            }
            let evaluation = evaluate_cell(
                grid,
                behaviors,
                origin,
                cell_seed(params.tick_seed, round, origin),
            );
            if let Some(state) = evaluation.state
                && let Some(cell) = grid.get_cell_mut(origin)
            {
                *cell = state;
                resolution.touched.push(origin);
            }
            for effect in &evaluation.effects {
                if let Some(target) = effect.apply(grid) {
                    resolution.touched.push(target);
                }
            }
            if let Some(fresh) = evaluation.proposal {
                next_round.push(fresh);
            }
        }
        next_round
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{NoopStats, ScaffoldingConfig, TickStats};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;
    use sandfall_simulation::Cell;

    fn params() -> ResolveParams {
        ResolveParams {
            tick_seed: 11,
            max_rounds: 64,
        }
    }

    fn behaviors() -> BehaviorSet {
        BehaviorSet::new(&ScaffoldingConfig::default())
    }

    #[test]
    fn test_non_conflicting_proposals_all_commit() {
        let mut grid = ChunkManager::new(1, 1, 4, 4);
        grid.set_cell(IVec2::new(0, 0), Cell::new(MaterialType::Solid));
        grid.set_cell(IVec2::new(3, 0), Cell::new(MaterialType::Solid));
        let proposals = vec![
            Proposal::new(IVec2::new(0, 0), IVec2::new(0, 1)),
            Proposal::new(IVec2::new(3, 0), IVec2::new(3, 1)),
        ];
        let mut rng = Xoshiro256StarStar::seed_from_u64(1);

        let resolution = ConflictResolver::resolve(
            &mut grid,
            &behaviors(),
            proposals,
            params(),
            &mut rng,
            &mut NoopStats,
        );

        assert_eq!(resolution.committed.len(), 2);
        assert_eq!(resolution.rounds, 1);
        assert_eq!(grid.get_cell(IVec2::new(0, 1)).map(|c| c.material), Some(MaterialType::Solid));
        assert_eq!(grid.get_cell(IVec2::new(3, 1)).map(|c| c.material), Some(MaterialType::Solid));
    }

    #[test]
    fn test_shared_target_commits_exactly_one() {
        // Both grains want (1, 1); the loser is re-evaluated next round
        let mut grid = ChunkManager::new(1, 1, 3, 3);
        grid.set_cell(IVec2::new(0, 0), Cell::new(MaterialType::Solid));
        grid.set_cell(IVec2::new(2, 0), Cell::new(MaterialType::Solid));
        let proposals = vec![
            Proposal::new(IVec2::new(0, 0), IVec2::new(1, 1)),
            Proposal::new(IVec2::new(2, 0), IVec2::new(1, 1)),
        ];
        let mut rng = Xoshiro256StarStar::seed_from_u64(5);
        let mut stats = TickStats::default();

        let resolution = ConflictResolver::resolve(
            &mut grid,
            &behaviors(),
            proposals,
            params(),
            &mut rng,
            &mut stats,
        );

        let into_target = resolution
            .committed
            .iter()
            .filter(|p| p.next == IVec2::new(1, 1))
            .count();
        assert_eq!(into_target, 1);
        assert_eq!(stats.conflicts, 1);
        assert_eq!(grid.get_cell(IVec2::new(1, 1)).map(|c| c.material), Some(MaterialType::Solid));

        let solids: usize = grid.chunks().map(|c| c.count_material(MaterialType::Solid)).sum();
        assert_eq!(solids, 2);
    }

    #[test]
    fn test_no_position_written_twice_per_round() {
        let mut grid = ChunkManager::new(1, 1, 6, 6);
        let mut proposals = Vec::new();
        for x in 0..6 {
            grid.set_cell(IVec2::new(x, 0), Cell::new(MaterialType::Solid));
            proposals.push(Proposal::new(IVec2::new(x, 0), IVec2::new(x, 1)));
            if x + 1 < 6 {
                proposals.push(Proposal::new(IVec2::new(x, 0), IVec2::new(x + 1, 1)));
            }
        }
        let mut rng = Xoshiro256StarStar::seed_from_u64(8);

        let resolution = ConflictResolver::resolve(
            &mut grid,
            &behaviors(),
            proposals,
            ResolveParams {
                tick_seed: 3,
                max_rounds: 1,
            },
            &mut rng,
            &mut NoopStats,
        );

        let mut seen = AHashSet::new();
        for proposal in &resolution.committed {
            assert!(seen.insert(proposal.next), "{:?} written twice", proposal.next);
            assert!(seen.insert(proposal.current), "{:?} reused", proposal.current);
        }
        let solids: usize = grid.chunks().map(|c| c.count_material(MaterialType::Solid)).sum();
        assert_eq!(solids, 6);
    }

    #[test]
    fn test_filled_target_is_not_reused_in_later_rounds() {
        // Liquid drops into (1, 1) while a grain wants the same cell. Whichever
        // wins, the other must not swap into (1, 1) in a later round.
        for seed in 0..200 {
            let mut grid = ChunkManager::new(1, 1, 3, 3);
            grid.set_cell(IVec2::new(0, 0), Cell::new(MaterialType::Solid));
            grid.set_cell(IVec2::new(0, 1), Cell::new(MaterialType::Solid));
            grid.set_cell(IVec2::new(1, 0), Cell::new(MaterialType::Liquid));
            grid.set_cell(IVec2::new(1, 2), Cell::new(MaterialType::Solid));
            let proposals = vec![
                Proposal::new(IVec2::new(1, 0), IVec2::new(1, 1)),
                Proposal::new(IVec2::new(0, 0), IVec2::new(1, 1)),
            ];
            let mut rng = Xoshiro256StarStar::seed_from_u64(seed);

            let resolution = ConflictResolver::resolve(
                &mut grid,
                &behaviors(),
                proposals,
                ResolveParams {
                    tick_seed: seed,
                    max_rounds: 64,
                },
                &mut rng,
                &mut NoopStats,
            );

            let mut targets = AHashSet::new();
            for proposal in &resolution.committed {
                assert!(
                    targets.insert(proposal.next),
                    "seed {seed}: {:?} filled twice by {:?}",
                    proposal.next,
                    resolution.committed
                );
            }
            assert!(resolution.dropped <= 1, "seed {seed}");
            // A liquid displaced by the grain would otherwise climb into (0, 0)
            assert_ne!(
                grid.get_cell(IVec2::new(0, 0)).map(|c| c.material),
                Some(MaterialType::Liquid),
                "seed {seed}"
            );

            let solids: usize = grid.chunks().map(|c| c.count_material(MaterialType::Solid)).sum();
            let liquids: usize = grid.chunks().map(|c| c.count_material(MaterialType::Liquid)).sum();
            assert_eq!((solids, liquids), (3, 1), "seed {seed}");
        }
    }

    #[test]
    fn test_mass_ordering_blocks_stale_proposals() {
        let mut grid = ChunkManager::new(1, 1, 2, 2);
        grid.set_cell(IVec2::new(0, 0), Cell::new(MaterialType::Liquid));
        grid.set_cell(IVec2::new(0, 1), Cell::new(MaterialType::Solid));
        let proposals = vec![Proposal::new(IVec2::new(0, 0), IVec2::new(0, 1))];
        let mut rng = Xoshiro256StarStar::seed_from_u64(2);

        let resolution = ConflictResolver::resolve(
            &mut grid,
            &behaviors(),
            proposals,
            params(),
            &mut rng,
            &mut NoopStats,
        );

        assert!(resolution.committed.is_empty());
        assert_eq!(grid.get_cell(IVec2::new(0, 1)).map(|c| c.material), Some(MaterialType::Solid));
    }

    #[test]
    fn test_round_limit_drops_leftovers() {
        let mut grid = ChunkManager::new(1, 1, 3, 3);
        grid.set_cell(IVec2::new(0, 0), Cell::new(MaterialType::Solid));
        grid.set_cell(IVec2::new(2, 0), Cell::new(MaterialType::Solid));
        let proposals = vec![
            Proposal::new(IVec2::new(0, 0), IVec2::new(1, 1)),
            Proposal::new(IVec2::new(2, 0), IVec2::new(1, 1)),
        ];
        let mut rng = Xoshiro256StarStar::seed_from_u64(5);

        let resolution = ConflictResolver::resolve(
            &mut grid,
            &behaviors(),
            proposals,
            ResolveParams {
                tick_seed: 1,
                max_rounds: 1,
            },
            &mut rng,
            &mut NoopStats,
        );

        assert_eq!(resolution.rounds, 1);
        assert_eq!(resolution.committed.len(), 1);
        assert!(resolution.dropped <= 1);
    }

    #[test]
    fn test_deadlock_breaker_forces_progress() {
        // Identical conflicting proposals never shrink on their own
        let mut grid = ChunkManager::new(1, 1, 3, 3);
        grid.set_cell(IVec2::new(1, 0), Cell::new(MaterialType::Solid));
        let stuck = vec![Proposal::new(IVec2::new(1, 0), IVec2::new(1, 1)); 4];
        let mut moved = AHashSet::new();
        let mut resolution = Resolution::default();
        let mut rng = Xoshiro256StarStar::seed_from_u64(4);
        let mut stats = TickStats::default();

        let remaining = ConflictResolver::break_deadlock(
            &mut grid,
            stuck,
            &mut moved,
            &mut resolution,
            &mut rng,
            &mut stats,
        );

        // Half forced: one commits, its duplicate is dropped as already moved
        assert_eq!(resolution.forced, 1);
        assert_eq!(stats.forced_commits, 1);
        assert_eq!(remaining.len(), 2);
        assert_eq!(grid.get_cell(IVec2::new(1, 1)).map(|c| c.material), Some(MaterialType::Solid));
    }

    #[test]
    fn test_commit_wakes_resting_liquid_beside_vacated_cell() {
        let mut grid = ChunkManager::new(1, 1, 3, 2);
        let mut pooled = Cell::new(MaterialType::Liquid);
        pooled.physics.halt();
        grid.set_cell(IVec2::new(0, 0), pooled);
        grid.set_cell(IVec2::new(1, 0), Cell::new(MaterialType::Liquid));
        let proposals = vec![Proposal::new(IVec2::new(1, 0), IVec2::new(1, 1))];
        let mut rng = Xoshiro256StarStar::seed_from_u64(2);

        let resolution = ConflictResolver::resolve(
            &mut grid,
            &behaviors(),
            proposals,
            params(),
            &mut rng,
            &mut NoopStats,
        );

        assert_eq!(resolution.committed.len(), 1);
        assert!(resolution.touched.contains(&IVec2::new(0, 0)));
        assert!(
            !grid.get_cell(IVec2::new(0, 0))
                .expect("in bounds")
                .physics
                .cancel_horizontal_motion()
        );
    }

    #[test]
    fn test_resolution_is_deterministic_for_seed() {
        let run = || {
            let mut grid = ChunkManager::new(1, 1, 5, 3);
            let mut proposals = Vec::new();
            for x in 0..5 {
                grid.set_cell(IVec2::new(x, 0), Cell::new(MaterialType::Solid));
                proposals.push(Proposal::new(IVec2::new(x, 0), IVec2::new(2, 1)));
            }
            let mut rng = Xoshiro256StarStar::seed_from_u64(17);
            ConflictResolver::resolve(&mut grid, &behaviors(), proposals, params(), &mut rng, &mut NoopStats)
                .committed
        };
        assert_eq!(run(), run());
    }
}
