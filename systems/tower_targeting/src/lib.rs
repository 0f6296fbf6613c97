#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes deterministic tower targets from world snapshots.

use kernel_defence_core::{HostileId, HostileView, TowerId, TowerTarget, TowerView, Vec2};

/// Tower targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    hostile_workspace: Vec<HostileCandidate>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes tower targets for the provided world snapshot.
    ///
    /// Every tower picks the closest live hostile inside its range; equal
    /// distances resolve to the earliest spawned hostile. The output buffer is
    /// cleared before populating it with the latest assignments.
    pub fn handle(&mut self, towers: &TowerView, hostiles: &HostileView, out: &mut Vec<TowerTarget>) {
        out.clear();

        if towers.is_empty() || hostiles.is_empty() {
            return;
        }

        self.prepare_hostile_workspace(hostiles);
        if self.hostile_workspace.is_empty() {
            return;
        }

        for tower in towers.iter() {
            let max_distance_sq = tower.range * tower.range;
            let mut best: Option<BestCandidate> = None;

            for candidate in &self.hostile_workspace {
                let distance_sq = candidate.position.distance_squared(tower.position);
                if distance_sq > max_distance_sq {
                    continue;
                }

                let current = BestCandidate {
                    distance_sq,
                    hostile: candidate.id,
                };
                match &mut best {
                    Some(existing) => {
                        if current.precedes(existing) {
                            *existing = current;
                        }
                    }
                    None => best = Some(current),
                }
            }

            if let Some(best) = best {
                out.push(TowerTarget {
                    tower: tower.id,
                    hostile: best.hostile,
                    distance_sq: best.distance_sq,
                });
            }
        }
    }

    fn prepare_hostile_workspace(&mut self, hostiles: &HostileView) {
        self.hostile_workspace.clear();
        self.hostile_workspace.reserve(hostiles.len());
        self.hostile_workspace.extend(
            hostiles
                .iter()
                .filter(|snapshot| snapshot.health > 0.0)
                .map(|snapshot| HostileCandidate {
                    id: snapshot.id,
                    position: snapshot.position,
                }),
        );
    }
}

/// Looks up the assignment computed for `tower`, if any.
#[must_use]
pub fn target_of(targets: &[TowerTarget], tower: TowerId) -> Option<HostileId> {
    targets
        .iter()
        .find(|target| target.tower == tower)
        .map(|target| target.hostile)
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct HostileCandidate {
    id: HostileId,
    position: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct BestCandidate {
    distance_sq: f32,
    hostile: HostileId,
}

impl BestCandidate {
    fn precedes(&self, other: &Self) -> bool {
        if self.distance_sq != other.distance_sq {
            return self.distance_sq < other.distance_sq;
        }
        self.hostile < other.hostile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_defence_core::{
        HostileKind, HostileSnapshot, Rarity, SlotId, TowerSnapshot, WeaponKind,
    };

    fn tower_snapshot(id: u32, position: (f32, f32), range: f32) -> TowerSnapshot {
        TowerSnapshot {
            id: TowerId::new(id),
            slot: SlotId::new(id),
            weapon: WeaponKind::KernelPulse,
            rarity: Rarity::Common,
            level: 1,
            position: Vec2::new(position.0, position.1),
            range,
            ready_in: 0.0,
        }
    }

    fn hostile_snapshot(id: u32, position: (f32, f32), health: f32) -> HostileSnapshot {
        HostileSnapshot {
            id: HostileId::new(id),
            kind: HostileKind::Packet,
            position: Vec2::new(position.0, position.1),
            health,
            max_health: 30.0,
            progress: 0.0,
            speed: 60.0,
            speed_factor: 1.0,
            marked: false,
            radius: 12.0,
        }
    }

    #[test]
    fn targets_hostile_within_range() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower_snapshot(1, (0.0, 0.0), 100.0)]);
        let hostiles = HostileView::from_snapshots(vec![hostile_snapshot(2, (30.0, 40.0), 10.0)]);

        let mut out = Vec::new();
        system.handle(&towers, &hostiles, &mut out);

        assert_eq!(
            out,
            vec![TowerTarget {
                tower: TowerId::new(1),
                hostile: HostileId::new(2),
                distance_sq: 2_500.0,
            }]
        );
    }

    #[test]
    fn hostile_outside_range_is_ignored() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower_snapshot(1, (0.0, 0.0), 49.0)]);
        let hostiles = HostileView::from_snapshots(vec![hostile_snapshot(2, (30.0, 40.0), 10.0)]);

        let mut out = Vec::new();
        system.handle(&towers, &hostiles, &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn closest_hostile_wins() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower_snapshot(1, (0.0, 0.0), 200.0)]);
        let hostiles = HostileView::from_snapshots(vec![
            hostile_snapshot(1, (120.0, 0.0), 10.0),
            hostile_snapshot(5, (0.0, 60.0), 10.0),
        ]);

        let mut out = Vec::new();
        system.handle(&towers, &hostiles, &mut out);

        assert_eq!(target_of(&out, TowerId::new(1)), Some(HostileId::new(5)));
    }

    #[test]
    fn earlier_spawn_is_preferred_when_distances_match() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower_snapshot(1, (0.0, 0.0), 200.0)]);
        let hostiles = HostileView::from_snapshots(vec![
            hostile_snapshot(20, (50.0, 0.0), 10.0),
            hostile_snapshot(10, (-50.0, 0.0), 10.0),
        ]);

        let mut out = Vec::new();
        system.handle(&towers, &hostiles, &mut out);

        assert_eq!(target_of(&out, TowerId::new(1)), Some(HostileId::new(10)));
    }

    #[test]
    fn dead_hostiles_are_skipped() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower_snapshot(1, (0.0, 0.0), 200.0)]);
        let hostiles = HostileView::from_snapshots(vec![
            hostile_snapshot(1, (10.0, 0.0), 0.0),
            hostile_snapshot(2, (90.0, 0.0), 5.0),
        ]);

        let mut out = Vec::new();
        system.handle(&towers, &hostiles, &mut out);

        assert_eq!(target_of(&out, TowerId::new(1)), Some(HostileId::new(2)));
    }

    #[test]
    fn output_is_cleared_between_calls() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower_snapshot(1, (0.0, 0.0), 200.0)]);
        let hostiles = HostileView::from_snapshots(vec![hostile_snapshot(1, (10.0, 0.0), 5.0)]);

        let mut out = Vec::new();
        system.handle(&towers, &hostiles, &mut out);
        assert_eq!(out.len(), 1);

        system.handle(&towers, &HostileView::default(), &mut out);
        assert!(out.is_empty());
    }
}
