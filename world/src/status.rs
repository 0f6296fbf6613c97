//! Per-hostile transient effects keyed by hostile id.
//!
//! Entries are created lazily by the first effect that lands on a hostile and
//! removed either together with the hostile or once every effect has expired.
//! Timed effects store absolute expiry timestamps; an effect is active while
//! the clock is strictly before its expiry.

use std::collections::BTreeMap;

use kernel_defence_core::HostileId;
use serde::{Deserialize, Serialize};

/// Seconds between burn damage applications.
pub(crate) const BURN_INTERVAL: f32 = 0.5;

/// Burn damage below this is treated as an exhausted pool.
const BURN_EPSILON: f32 = 1e-4;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct StatusEntry {
    tag_until: f64,
    tag_bonus: f32,
    mark_until: f64,
    stun_until: f64,
    slow_until: f64,
    slow_factor: f32,
    burn: Option<BurnPool>,
}

impl StatusEntry {
    fn is_spent(&self, now: f64) -> bool {
        self.burn.is_none()
            && now >= self.tag_until
            && now >= self.mark_until
            && now >= self.stun_until
            && now >= self.slow_until
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct BurnPool {
    remaining: f32,
    per_second: f32,
    accumulator: f32,
}

/// Side map of status effects.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct StatusLedger {
    entries: BTreeMap<HostileId, StatusEntry>,
}

impl StatusLedger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, hostile: HostileId) -> &mut StatusEntry {
        self.entries.entry(hostile).or_default()
    }

    /// Tags the hostile so it takes `bonus` extra damage until `now + duration`.
    pub(crate) fn tag(&mut self, hostile: HostileId, now: f64, duration: f32, bonus: f32) {
        let entry = self.entry(hostile);
        entry.tag_until = entry.tag_until.max(now + f64::from(duration));
        entry.tag_bonus = entry.tag_bonus.max(bonus);
    }

    pub(crate) fn mark(&mut self, hostile: HostileId, now: f64, duration: f32) {
        let entry = self.entry(hostile);
        entry.mark_until = entry.mark_until.max(now + f64::from(duration));
    }

    pub(crate) fn stun(&mut self, hostile: HostileId, now: f64, duration: f32) {
        let entry = self.entry(hostile);
        entry.stun_until = entry.stun_until.max(now + f64::from(duration));
    }

    /// Slows the hostile; overlapping slows keep the strongest factor.
    pub(crate) fn slow(&mut self, hostile: HostileId, now: f64, duration: f32, factor: f32) {
        let entry = self.entry(hostile);
        let factor = factor.clamp(0.0, 1.0);
        entry.slow_factor = if now < entry.slow_until {
            entry.slow_factor.min(factor)
        } else {
            factor
        };
        entry.slow_until = entry.slow_until.max(now + f64::from(duration));
    }

    /// Adds `amount` to the hostile's burn pool, respread over `duration` seconds.
    pub(crate) fn ignite(&mut self, hostile: HostileId, amount: f32, duration: f32) {
        if amount <= 0.0 {
            return;
        }
        let entry = self.entry(hostile);
        let duration = duration.max(BURN_INTERVAL);
        let pool = entry.burn.get_or_insert(BurnPool {
            remaining: 0.0,
            per_second: 0.0,
            accumulator: 0.0,
        });
        pool.remaining += amount;
        pool.per_second = pool.remaining / duration;
    }

    /// Incoming damage multiplier from an active tag.
    pub(crate) fn damage_multiplier(&self, hostile: HostileId, now: f64) -> f32 {
        self.entries
            .get(&hostile)
            .filter(|entry| now < entry.tag_until)
            .map_or(1.0, |entry| 1.0 + entry.tag_bonus)
    }

    pub(crate) fn is_marked(&self, hostile: HostileId, now: f64) -> bool {
        self.entries
            .get(&hostile)
            .map_or(false, |entry| now < entry.mark_until)
    }

    /// Movement multiplier: zero while stunned, the slow factor while slowed.
    pub(crate) fn speed_factor(&self, hostile: HostileId, now: f64) -> f32 {
        match self.entries.get(&hostile) {
            Some(entry) if now < entry.stun_until => 0.0,
            Some(entry) if now < entry.slow_until => entry.slow_factor,
            _ => 1.0,
        }
    }

    /// Spends burn pools on their fixed interval, returning damage per hostile.
    pub(crate) fn tick_burns(&mut self, dt: f32) -> Vec<(HostileId, f32)> {
        let mut damage = Vec::new();
        for (hostile, entry) in &mut self.entries {
            let Some(pool) = entry.burn.as_mut() else {
                continue;
            };
            pool.accumulator += dt;
            while pool.accumulator >= BURN_INTERVAL && pool.remaining > BURN_EPSILON {
                pool.accumulator -= BURN_INTERVAL;
                let dealt = (pool.per_second * BURN_INTERVAL).min(pool.remaining);
                pool.remaining -= dealt;
                damage.push((*hostile, dealt));
            }
            if pool.remaining <= BURN_EPSILON {
                entry.burn = None;
            }
        }
        damage
    }

    /// Drops entries whose effects have all expired.
    pub(crate) fn prune(&mut self, now: f64) {
        self.entries.retain(|_, entry| !entry.is_spent(now));
    }

    pub(crate) fn remove(&mut self, hostile: HostileId) {
        let _ = self.entries.remove(&hostile);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: HostileId = HostileId::new(3);

    #[test]
    fn entries_are_created_lazily() {
        let mut ledger = StatusLedger::new();
        assert_eq!(ledger.len(), 0);
        assert_eq!(ledger.speed_factor(TARGET, 0.0), 1.0);
        ledger.mark(TARGET, 0.0, 4.0);
        assert_eq!(ledger.len(), 1);
        assert!(ledger.is_marked(TARGET, 3.9));
        assert!(!ledger.is_marked(TARGET, 4.0));
    }

    #[test]
    fn stun_overrides_slow() {
        let mut ledger = StatusLedger::new();
        ledger.slow(TARGET, 0.0, 2.0, 0.5);
        ledger.stun(TARGET, 0.0, 0.6);
        assert_eq!(ledger.speed_factor(TARGET, 0.3), 0.0);
        assert_eq!(ledger.speed_factor(TARGET, 1.0), 0.5);
        assert_eq!(ledger.speed_factor(TARGET, 2.5), 1.0);
    }

    #[test]
    fn overlapping_slows_keep_the_strongest_factor() {
        let mut ledger = StatusLedger::new();
        ledger.slow(TARGET, 0.0, 2.0, 0.4);
        ledger.slow(TARGET, 1.0, 2.0, 0.8);
        assert_eq!(ledger.speed_factor(TARGET, 1.5), 0.4);
        ledger.slow(TARGET, 5.0, 1.0, 0.8);
        assert_eq!(ledger.speed_factor(TARGET, 5.5), 0.8);
    }

    #[test]
    fn tag_raises_incoming_damage_until_expiry() {
        let mut ledger = StatusLedger::new();
        ledger.tag(TARGET, 0.0, 3.0, 0.25);
        assert!((ledger.damage_multiplier(TARGET, 1.0) - 1.25).abs() < f32::EPSILON);
        assert!((ledger.damage_multiplier(TARGET, 3.0) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn burn_pool_is_spent_on_a_fixed_interval() {
        let mut ledger = StatusLedger::new();
        ledger.ignite(TARGET, 6.0, 3.0);
        assert!(ledger.tick_burns(0.25).is_empty());

        let mut total = 0.0;
        for _ in 0..20 {
            total += ledger
                .tick_burns(0.25)
                .into_iter()
                .map(|(_, damage)| damage)
                .sum::<f32>();
        }
        assert!((total - 6.0).abs() < 1e-3);
        ledger.prune(10.0);
        assert_eq!(ledger.len(), 0);
    }

    #[test]
    fn prune_keeps_entries_with_live_effects() {
        let mut ledger = StatusLedger::new();
        ledger.tag(TARGET, 0.0, 3.0, 0.25);
        ledger.mark(HostileId::new(9), 0.0, 1.0);
        ledger.prune(2.0);
        assert_eq!(ledger.len(), 1);
        ledger.remove(TARGET);
        assert_eq!(ledger.len(), 0);
    }
}
