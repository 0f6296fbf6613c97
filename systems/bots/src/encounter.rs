//! Built-in encounter strategies.

use kernel_defence_core::{geometry::Vec2, EncounterAction, Progression};
use kernel_defence_encounter::{EncounterState, EncounterStrategy};

/// Extra clearance kept from danger circles.
const DODGE_MARGIN: f32 = 12.0;
/// Fraction of the attack reach the melee strategies close to.
const ENGAGE_FRACTION: f32 = 0.8;
/// Fraction of the attack reach [`Kiting`] holds at.
const KITE_FRACTION: f32 = 0.95;
/// Band around the kiting distance inside which the avatar stands still.
const KITE_BAND: f32 = 15.0;

/// What the avatar should be hitting and how large it is.
fn objective(state: &EncounterState) -> (Vec2, f32) {
    let avatar = state.avatar_position();
    if state.boss_invulnerable() {
        let nearest = state.pylon_positions().fold(None, |best: Option<Vec2>, pylon| {
            match best {
                Some(current)
                    if current.distance_squared(avatar) <= pylon.distance_squared(avatar) =>
                {
                    Some(current)
                }
                _ => Some(pylon),
            }
        });
        if let Some(pylon) = nearest {
            return (pylon, state.pylon_radius());
        }
    }
    (state.boss_position(), state.boss_radius())
}

/// Step away from the most deeply overlapped danger, if any.
fn dodge(state: &EncounterState) -> Option<EncounterAction> {
    let avatar = state.avatar_position();
    let clearance = state.avatar_radius() + DODGE_MARGIN;
    state
        .dangers()
        .into_iter()
        .filter_map(|danger| {
            let depth = danger.radius + clearance - danger.position.distance(avatar);
            (depth > 0.0).then_some((danger.position, depth))
        })
        .fold(None, |best: Option<(Vec2, f32)>, candidate| match best {
            Some((_, depth)) if depth >= candidate.1 => best,
            _ => Some(candidate),
        })
        .map(|(position, _)| {
            let away = avatar - position;
            let away = if away.length_squared() <= f32::EPSILON {
                state.center() - avatar
            } else {
                away
            };
            EncounterAction::MoveVector(away)
        })
}

fn close_in(state: &EncounterState) -> EncounterAction {
    let (target, radius) = objective(state);
    let reach = state.attack_range() * ENGAGE_FRACTION + radius;
    if state.avatar_position().distance(target) <= reach {
        EncounterAction::Idle
    } else {
        EncounterAction::MoveToward(target)
    }
}

fn kite(state: &EncounterState) -> EncounterAction {
    let (target, radius) = objective(state);
    let avatar = state.avatar_position();
    let desired = state.attack_range() * KITE_FRACTION + radius;
    let distance = avatar.distance(target);
    if distance > desired + KITE_BAND {
        EncounterAction::MoveToward(target)
    } else if distance < desired - KITE_BAND {
        let away = avatar - target;
        if away.length_squared() <= f32::EPSILON {
            EncounterAction::MoveToward(state.center())
        } else {
            EncounterAction::MoveVector(away)
        }
    } else {
        EncounterAction::Idle
    }
}

/// Never moves.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandingStill;

impl EncounterStrategy for StandingStill {
    fn name(&self) -> &str {
        "standing-still"
    }

    fn decide(&self, _state: &EncounterState, _progression: &Progression) -> EncounterAction {
        EncounterAction::Idle
    }
}

/// Walks into melee range of the boss (or the nearest pylon while the boss is
/// shielded) and stays there regardless of hazards.
#[derive(Clone, Copy, Debug, Default)]
pub struct Aggressive;

impl EncounterStrategy for Aggressive {
    fn name(&self) -> &str {
        "aggressive"
    }

    fn decide(&self, state: &EncounterState, _progression: &Progression) -> EncounterAction {
        close_in(state)
    }
}

/// Holds at the edge of attack range and sidesteps every danger.
#[derive(Clone, Copy, Debug, Default)]
pub struct Kiting;

impl EncounterStrategy for Kiting {
    fn name(&self) -> &str {
        "kiting"
    }

    fn decide(&self, state: &EncounterState, _progression: &Progression) -> EncounterAction {
        dodge(state).unwrap_or_else(|| kite(state))
    }
}

/// Fights up close in the opening phases and switches to kiting once the boss
/// reaches phase 3. Dodges throughout.
#[derive(Clone, Copy, Debug, Default)]
pub struct PhaseAware;

impl EncounterStrategy for PhaseAware {
    fn name(&self) -> &str {
        "phase-aware"
    }

    fn decide(&self, state: &EncounterState, _progression: &Progression) -> EncounterAction {
        if let Some(action) = dodge(state) {
            return action;
        }
        if state.phase() >= 3 {
            kite(state)
        } else {
            close_in(state)
        }
    }
}
