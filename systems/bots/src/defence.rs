//! Built-in defence strategies.

use kernel_defence_core::{DefenceAction, Progression, SlotId, TowerId, WeaponDefinition};
use kernel_defence_defence_loop::DefenceStrategy;
use kernel_defence_world::{query, World};

/// Share of the storage ceiling [`ReserveAware`] never spends.
const RESERVE_FRACTION: f64 = 0.25;

/// Compiled weapons the player can pay for and power right now, cheapest first.
fn affordable_weapons(world: &World) -> Vec<(&WeaponDefinition, f64)> {
    let hash = query::hash(world);
    let headroom = query::power_capacity(world) - query::power_draw(world);
    let mut weapons: Vec<(&WeaponDefinition, f64)> = query::placeable_weapons(world)
        .into_iter()
        .filter_map(|definition| {
            let cost = query::purchase_cost(world, &definition.id)?;
            let power = query::tower_power(world, &definition.id)?;
            (cost <= hash && power <= headroom).then_some((definition, cost))
        })
        .collect();
    weapons.sort_by(|left, right| left.1.total_cmp(&right.1));
    weapons
}

/// Cheapest upgrade the player can afford, ties going to the older tower.
fn cheapest_upgrade(world: &World, budget: f64) -> Option<TowerId> {
    query::tower_view(world)
        .iter()
        .filter_map(|tower| Some((tower.id, query::upgrade_cost(world, tower.id)?)))
        .filter(|(_, cost)| *cost <= budget)
        .min_by(|left, right| left.1.total_cmp(&right.1))
        .map(|(tower, _)| tower)
}

fn overclock_ready(world: &World) -> bool {
    matches!(
        query::overclock_status(world),
        query::OverclockStatus::Ready
    )
}

fn below_warning(world: &World) -> bool {
    query::efficiency(world) < query::balance(world).efficiency.warning_threshold
}

/// Never acts.
#[derive(Clone, Copy, Debug, Default)]
pub struct Passive;

impl DefenceStrategy for Passive {
    fn name(&self) -> &str {
        "passive"
    }

    fn decide(&self, _world: &World, _progression: &Progression) -> DefenceAction {
        DefenceAction::Idle
    }
}

/// Spends everything as soon as it can: the priciest affordable tower into the
/// first free slot, then the cheapest upgrade. Engages every encounter once it
/// has a tower standing.
#[derive(Clone, Copy, Debug, Default)]
pub struct Greedy;

impl DefenceStrategy for Greedy {
    fn name(&self) -> &str {
        "greedy"
    }

    fn decide(&self, world: &World, _progression: &Progression) -> DefenceAction {
        let towers = query::tower_view(world);
        if query::pending_encounter(world).is_some() && !towers.is_empty() {
            return DefenceAction::EngageEncounter;
        }
        if let (Some(&slot), Some((definition, _))) = (
            query::free_slots(world).first(),
            affordable_weapons(world).last(),
        ) {
            return DefenceAction::Place {
                weapon: definition.id.clone(),
                slot,
            };
        }
        if let Some(tower) = cheapest_upgrade(world, query::hash(world)) {
            return DefenceAction::Upgrade { tower };
        }
        if overclock_ready(world) && !towers.is_empty() {
            return DefenceAction::ActivateOverclock;
        }
        DefenceAction::Idle
    }
}

/// Covers the lane evenly with the cheapest towers before upgrading anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct Spread;

impl Spread {
    /// Free slot farthest from every occupied slot; the lane midpoint slot when
    /// nothing is built yet.
    fn pick_slot(world: &World) -> Option<SlotId> {
        let slots = query::slots(world);
        let occupied: Vec<_> = slots
            .iter()
            .filter(|slot| slot.occupant.is_some())
            .map(|slot| slot.position)
            .collect();
        let free = slots.iter().filter(|slot| slot.occupant.is_none());
        if occupied.is_empty() {
            let free: Vec<_> = free.collect();
            return free.get(free.len() / 2).map(|slot| slot.id);
        }
        free.map(|slot| {
            let gap = occupied
                .iter()
                .map(|position| position.distance_squared(slot.position))
                .fold(f32::INFINITY, f32::min);
            (slot.id, gap)
        })
        .fold(None, |best: Option<(SlotId, f32)>, candidate| match best {
            Some((_, best_gap)) if best_gap >= candidate.1 => best,
            _ => Some(candidate),
        })
        .map(|(slot, _)| slot)
    }
}

impl DefenceStrategy for Spread {
    fn name(&self) -> &str {
        "spread"
    }

    fn decide(&self, world: &World, _progression: &Progression) -> DefenceAction {
        if query::pending_encounter(world).is_some() {
            return DefenceAction::SkipEncounter;
        }
        if let (Some(slot), Some((definition, _))) =
            (Self::pick_slot(world), affordable_weapons(world).first())
        {
            return DefenceAction::Place {
                weapon: definition.id.clone(),
                slot,
            };
        }
        if query::free_slots(world).is_empty() {
            if let Some(tower) = cheapest_upgrade(world, query::hash(world)) {
                return DefenceAction::Upgrade { tower };
            }
        }
        DefenceAction::Idle
    }
}

/// Builds and upgrades only with hash above a reserve kept for emergencies,
/// and dips into the reserve while efficiency is below the warning line.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReserveAware;

impl DefenceStrategy for ReserveAware {
    fn name(&self) -> &str {
        "reserve-aware"
    }

    fn decide(&self, world: &World, _progression: &Progression) -> DefenceAction {
        let hash = query::hash(world);
        let emergency = below_warning(world);
        let reserve = if emergency {
            0.0
        } else {
            query::storage(world) * RESERVE_FRACTION
        };
        let budget = hash - reserve;

        if query::pending_encounter(world).is_some() {
            return if emergency {
                DefenceAction::SkipEncounter
            } else {
                DefenceAction::EngageEncounter
            };
        }
        if emergency && overclock_ready(world) && !query::tower_view(world).is_empty() {
            return DefenceAction::ActivateOverclock;
        }
        let affordable = affordable_weapons(world);
        let placement = affordable
            .iter()
            .rev()
            .find(|(_, cost)| *cost <= budget);
        if let (Some(&slot), Some((definition, _))) = (query::free_slots(world).first(), placement) {
            return DefenceAction::Place {
                weapon: definition.id.clone(),
                slot,
            };
        }
        match cheapest_upgrade(world, budget) {
            Some(tower) => DefenceAction::Upgrade { tower },
            None => DefenceAction::Idle,
        }
    }
}

/// Saves hash until efficiency drops below the warning line, then throws
/// everything at the problem: overclock, cheapest tower, cheapest upgrade.
#[derive(Clone, Copy, Debug, Default)]
pub struct Panic;

impl DefenceStrategy for Panic {
    fn name(&self) -> &str {
        "panic"
    }

    fn decide(&self, world: &World, _progression: &Progression) -> DefenceAction {
        let panicking = below_warning(world);
        if query::pending_encounter(world).is_some() {
            return DefenceAction::SkipEncounter;
        }
        if !panicking {
            return DefenceAction::Idle;
        }
        if overclock_ready(world) && !query::tower_view(world).is_empty() {
            return DefenceAction::ActivateOverclock;
        }
        if let (Some(&slot), Some((definition, _))) = (
            query::free_slots(world).first(),
            affordable_weapons(world).first(),
        ) {
            return DefenceAction::Place {
                weapon: definition.id.clone(),
                slot,
            };
        }
        match cheapest_upgrade(world, query::hash(world)) {
            Some(tower) => DefenceAction::Upgrade { tower },
            None => DefenceAction::Idle,
        }
    }
}
