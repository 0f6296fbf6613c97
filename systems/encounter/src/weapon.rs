//! Equipped weapon and the on-hit windows it opens on the boss.

use std::collections::VecDeque;

use kernel_defence_core::{OnHitEffect, SimRng, WeaponKind};
use serde::{Deserialize, Serialize};

/// Avatar damage bonus while a self-mark window is open.
const SELF_MARK_BONUS: f32 = 0.3;

/// Weapon the avatar carries into the encounter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquippedWeapon {
    /// Weapon family; selects the on-hit effect.
    pub kind: WeaponKind,
    /// Weapon level, starting at 1.
    pub level: u32,
}

impl EquippedWeapon {
    /// Creates an equipped weapon.
    #[must_use]
    pub const fn new(kind: WeaponKind, level: u32) -> Self {
        Self { kind, level }
    }

    /// Linear damage multiplier: `1 + per_level * (level - 1)`.
    #[must_use]
    pub fn damage_multiplier(&self, per_level: f32) -> f32 {
        1.0 + per_level * self.level.max(1).saturating_sub(1) as f32
    }
}

/// Open on-hit windows and pools.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct WeaponState {
    effect: OnHitEffect,
    burn_pool: f32,
    burn_rate: f32,
    tag_until: f64,
    tag_bonus: f32,
    slow_until: f64,
    slow_factor: f32,
    stun_until: f64,
    self_mark_until: f64,
    queued_hits: VecDeque<f32>,
}

impl WeaponState {
    pub(crate) fn new(weapon: Option<EquippedWeapon>) -> Self {
        Self {
            effect: weapon.map_or(OnHitEffect::None, |weapon| weapon.kind.on_hit()),
            burn_pool: 0.0,
            burn_rate: 0.0,
            tag_until: f64::NEG_INFINITY,
            tag_bonus: 0.0,
            slow_until: f64::NEG_INFINITY,
            slow_factor: 1.0,
            stun_until: f64::NEG_INFINITY,
            self_mark_until: f64::NEG_INFINITY,
            queued_hits: VecDeque::new(),
        }
    }

    /// Multiplier on every source of boss damage while the tag window is open.
    pub(crate) fn tag_multiplier(&self, clock: f64) -> f32 {
        if clock < self.tag_until {
            1.0 + self.tag_bonus
        } else {
            1.0
        }
    }

    /// Multiplier on direct avatar hits while the self-mark window is open.
    pub(crate) fn self_mark_multiplier(&self, clock: f64) -> f32 {
        if clock < self.self_mark_until {
            1.0 + SELF_MARK_BONUS
        } else {
            1.0
        }
    }

    /// Boss movement multiplier; zero while stunned.
    pub(crate) fn boss_speed_factor(&self, clock: f64) -> f32 {
        if clock < self.stun_until {
            0.0
        } else if clock < self.slow_until {
            self.slow_factor
        } else {
            1.0
        }
    }

    /// Opens the weapon's window after a direct hit on the boss for `damage`.
    pub(crate) fn on_boss_hit(&mut self, damage: f32, clock: f64, rng: &mut SimRng) {
        match self.effect {
            OnHitEffect::None => {}
            OnHitEffect::Burn {
                pool_fraction,
                duration,
            } => {
                self.burn_pool += damage * pool_fraction;
                self.burn_rate = if duration > 0.0 {
                    self.burn_pool / duration
                } else {
                    self.burn_pool
                };
            }
            OnHitEffect::Slow {
                duration,
                factor,
                stun_chance,
                stun_duration,
            } => {
                self.slow_until = clock + f64::from(duration);
                self.slow_factor = factor;
                if rng.next_bool(stun_chance) {
                    self.stun_until = self.stun_until.max(clock + f64::from(stun_duration));
                }
            }
            OnHitEffect::Tag {
                duration,
                damage_bonus,
            } => {
                self.tag_until = clock + f64::from(duration);
                self.tag_bonus = damage_bonus;
            }
            OnHitEffect::Mark { duration } => {
                self.self_mark_until = clock + f64::from(duration);
            }
            OnHitEffect::Split {
                children,
                damage_fraction,
            } => {
                for _ in 0..children {
                    self.queued_hits.push_back(damage * damage_fraction);
                }
            }
        }
    }

    /// Damage owed to the boss this tick from the burn pool and one queued hit.
    pub(crate) fn drain(&mut self, dt: f32) -> f32 {
        let burn = (self.burn_rate * dt).min(self.burn_pool);
        self.burn_pool -= burn;
        if self.burn_pool <= 0.0 {
            self.burn_pool = 0.0;
            self.burn_rate = 0.0;
        }
        burn + self.queued_hits.pop_front().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_multiplier_is_linear_in_level() {
        let first = EquippedWeapon::new(WeaponKind::KernelPulse, 1);
        let tenth = EquippedWeapon::new(WeaponKind::KernelPulse, 10);
        assert_eq!(first.damage_multiplier(0.15), 1.0);
        assert!((tenth.damage_multiplier(0.15) - 2.35).abs() < 1e-5);
        assert_eq!(EquippedWeapon::new(WeaponKind::KernelPulse, 0).damage_multiplier(0.15), 1.0);
    }

    #[test]
    fn burn_pool_is_spent_over_its_duration() {
        let mut state = WeaponState::new(Some(EquippedWeapon::new(WeaponKind::Overflow, 1)));
        let mut rng = SimRng::new(1);
        state.on_boss_hit(20.0, 0.0, &mut rng);
        let mut total = 0.0;
        for _ in 0..40 {
            total += state.drain(0.1);
        }
        assert!((total - 30.0).abs() < 1e-3);
        assert_eq!(state.drain(0.1), 0.0);
    }

    #[test]
    fn split_hits_arrive_one_per_tick() {
        let mut state = WeaponState::new(Some(EquippedWeapon::new(WeaponKind::ForkBomb, 1)));
        let mut rng = SimRng::new(1);
        state.on_boss_hit(10.0, 0.0, &mut rng);
        let hits: Vec<f32> = (0..4).map(|_| state.drain(0.1)).collect();
        assert_eq!(hits, vec![4.0, 4.0, 4.0, 0.0]);
    }

    #[test]
    fn tag_and_self_mark_windows_expire() {
        let mut rng = SimRng::new(1);
        let mut tagged = WeaponState::new(Some(EquippedWeapon::new(WeaponKind::TraceRoute, 1)));
        tagged.on_boss_hit(10.0, 1.0, &mut rng);
        assert!((tagged.tag_multiplier(2.0) - 1.25).abs() < 1e-6);
        assert_eq!(tagged.tag_multiplier(4.0), 1.0);

        let mut marked = WeaponState::new(Some(EquippedWeapon::new(WeaponKind::RootAccess, 1)));
        marked.on_boss_hit(10.0, 0.0, &mut rng);
        assert!(marked.self_mark_multiplier(3.9) > 1.0);
        assert_eq!(marked.self_mark_multiplier(4.0), 1.0);
    }

    #[test]
    fn slows_reduce_boss_speed_and_may_stun() {
        let mut state = WeaponState::new(Some(EquippedWeapon::new(WeaponKind::IceShard, 1)));
        let mut rng = SimRng::new(99);
        let mut stunned = false;
        for hit in 0..200 {
            let clock = f64::from(hit) * 10.0;
            state.on_boss_hit(5.0, clock, &mut rng);
            let factor = state.boss_speed_factor(clock + 0.1);
            assert!(factor == 0.0 || (factor - 0.5).abs() < 1e-6);
            stunned |= factor == 0.0;
            assert_eq!(state.boss_speed_factor(clock + 5.0), 1.0);
        }
        assert!(stunned, "a 10% stun chance should land within 200 hits");
    }
}
