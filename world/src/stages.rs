//! Tick stages and the economy-facing commands.

use kernel_defence_core::{
    BalanceConfig, ContentLibrary, Event, HostileId, HostileKind, RejectionReason, SlotId,
    TowerId, WeaponId,
};
use tracing::debug;

use crate::{
    combat::{reject, Hostile},
    WorldState,
};

impl WorldState {
    /// Power drawn by every placed tower.
    pub(crate) fn power_draw(&self) -> f32 {
        self.towers
            .iter()
            .map(|tower| self.limits.tower_power.get(tower.definition.rarity))
            .sum()
    }

    /// Advances the clock, runs the freeze check and the timed schedules.
    pub(crate) fn begin_tick(
        &mut self,
        dt: f32,
        balance: &BalanceConfig,
        out_events: &mut Vec<Event>,
    ) {
        self.tick_index = self.tick_index.saturating_add(1);
        self.clock += f64::from(dt);
        out_events.push(Event::TimeAdvanced { dt });

        let tuning = &balance.efficiency;
        if self.economy.efficiency(tuning) <= 0.0 && !self.frozen_this_tick {
            self.frozen_this_tick = true;
            self.economy.recover_from_freeze(tuning);
            self.stats.freezes = self.stats.freezes.saturating_add(1);
            let _ = self.stats.first_freeze_at.get_or_insert(self.clock);
            debug!(at = self.clock, freezes = self.stats.freezes, "system froze");
            out_events.push(Event::FreezeTriggered { at: self.clock });
        }

        let wave = balance.threat_level.wave_duration;
        if wave > 0.0 {
            let level = (self.clock / f64::from(wave)).floor() as u32;
            if level > self.threat {
                self.threat = level;
                debug!(level, "threat raised");
                out_events.push(Event::ThreatRaised { level });
            }
        }

        if let Some(until) = self.encounters.pending_until {
            if self.clock >= until {
                self.encounters.pending_until = None;
                debug!(at = self.clock, "encounter offer lapsed");
                out_events.push(Event::EncounterSkipped);
            }
        } else if let Some(offer_at) = self.encounters.next_offer_at {
            if self.clock >= offer_at {
                let offers = &balance.encounters;
                let expires_at = self.clock + f64::from(offers.window);
                self.encounters.pending_until = Some(expires_at);
                self.encounters.next_offer_at = Some(offer_at + f64::from(offers.interval));
                debug!(expires_at, "encounter offered");
                out_events.push(Event::EncounterOffered { expires_at });
            }
        }
    }

    /// Overclock expiry, tower cooldowns and the Zero-Day drain.
    pub(crate) fn tick_passives(
        &mut self,
        dt: f32,
        balance: &BalanceConfig,
        out_events: &mut Vec<Event>,
    ) {
        if let Some(until) = self.overclock.active_until {
            if self.clock >= until {
                self.overclock.active_until = None;
                out_events.push(Event::OverclockExpired);
            }
        }

        for tower in self.towers.iter_mut() {
            tower.cooldown = (tower.cooldown - dt).max(0.0);
        }

        let elite_alive = self
            .hostiles
            .values()
            .any(|hostile| hostile.kind == HostileKind::ZeroDay && hostile.is_live());
        if elite_alive {
            self.economy
                .add_leak(balance.zero_day.efficiency_drain_rate * dt, &balance.efficiency);
        }
    }

    pub(crate) fn spawn_hostile(
        &mut self,
        kind: HostileKind,
        balance: &BalanceConfig,
        out_events: &mut Vec<Event>,
    ) {
        if kind == HostileKind::ZeroDay
            && self
                .hostiles
                .values()
                .any(|hostile| hostile.kind == HostileKind::ZeroDay && hostile.is_live())
        {
            debug!("zero-day already alive; spawn skipped");
            return;
        }

        let profile = kind.profile();
        let scaling = &balance.threat_level;
        let threat = self.threat as f32;
        let (base_health, base_speed) = if kind == HostileKind::ZeroDay {
            (balance.zero_day.base_health, balance.zero_day.speed)
        } else {
            (profile.health, profile.speed)
        };
        let health = base_health * (1.0 + scaling.health_scaling * threat);

        let id = self.next_hostile_id;
        self.next_hostile_id = HostileId::new(id.get().saturating_add(1));
        let _ = self.hostiles.insert(
            id,
            Hostile {
                id,
                kind,
                position: self.lane.point_at(0.0),
                health,
                max_health: health,
                progress: 0.0,
                speed: base_speed * (1.0 + scaling.speed_scaling * threat),
                reward: profile.reward,
                leak_damage: profile.leak_damage * (1.0 + scaling.damage_scaling * threat),
                radius: profile.radius,
                reached_objective: false,
            },
        );
        self.stats.hostiles_spawned = self.stats.hostiles_spawned.saturating_add(1);
        out_events.push(Event::HostileSpawned { hostile: id, kind });
    }

    pub(crate) fn advance_hostile(&mut self, hostile: HostileId, distance: f32) {
        let length = self.lane.length();
        let Some(entry) = self.hostiles.get_mut(&hostile).filter(|entry| entry.is_live()) else {
            return;
        };
        entry.progress = (entry.progress + distance.max(0.0)).min(length);
        entry.position = self.lane.point_at(entry.progress);
        if entry.progress >= length {
            entry.reached_objective = true;
        }
    }

    /// Charges the leak of every hostile that reached the objective.
    pub(crate) fn resolve_objective(
        &mut self,
        balance: &BalanceConfig,
        out_events: &mut Vec<Event>,
    ) {
        let arrived: Vec<HostileId> = self
            .hostiles
            .values()
            .filter(|hostile| hostile.reached_objective && hostile.health > 0.0)
            .map(|hostile| hostile.id)
            .collect();

        for id in arrived {
            let Some(hostile) = self.hostiles.remove(&id) else {
                continue;
            };
            self.status.remove(id);
            self.economy.add_leak(hostile.leak_damage, &balance.efficiency);
            self.stats.leaks = self.stats.leaks.saturating_add(1);
            out_events.push(Event::HostileLeaked {
                hostile: id,
                leak: hostile.leak_damage,
            });
        }
    }

    pub(crate) fn tick_status_effects(&mut self, dt: f32) {
        for (hostile, damage) in self.status.tick_burns(dt) {
            let Some(target) = self
                .hostiles
                .get_mut(&hostile)
                .filter(|target| target.is_live())
            else {
                continue;
            };
            self.stats.damage_dealt += f64::from(damage.min(target.health));
            target.health -= damage;
        }
        self.status.prune(self.clock);
    }

    /// Credits and removes defeated hostiles along with their ledger entries.
    pub(crate) fn cleanup(&mut self, balance: &BalanceConfig, out_events: &mut Vec<Event>) {
        let defeated: Vec<HostileId> = self
            .hostiles
            .values()
            .filter(|hostile| hostile.health <= 0.0)
            .map(|hostile| hostile.id)
            .collect();

        for id in defeated {
            let Some(hostile) = self.hostiles.remove(&id) else {
                continue;
            };
            let mut reward = hostile.reward;
            if self.status.is_marked(id, self.clock) {
                reward += balance.towers.mark_bonus;
            }
            if hostile.kind == HostileKind::ZeroDay {
                reward += balance.zero_day.defeat_hash_bonus;
                self.economy
                    .reduce_leak(balance.zero_day.defeat_efficiency_restore);
                self.stats.zero_days_defeated = self.stats.zero_days_defeated.saturating_add(1);
                debug!(hostile = id.get(), "zero-day defeated");
            }
            self.status.remove(id);

            let credited = self.economy.credit(reward, self.limits.storage);
            self.stats.hash_earned += credited;
            self.stats.kills = self.stats.kills.saturating_add(1);
            out_events.push(Event::HostileKilled {
                hostile: id,
                kind: hostile.kind,
                reward: credited,
            });
        }
    }

    /// Leak decay, hash accrual and the efficiency warning.
    pub(crate) fn tick_economy(
        &mut self,
        dt: f32,
        balance: &BalanceConfig,
        out_events: &mut Vec<Event>,
    ) {
        self.economy.decay_leak(dt, self.limits.leak_decay_interval);

        let tuning = &balance.efficiency;
        let boost = match self.overclock.active_until {
            Some(until) if self.clock < until => balance.overclock.hash_multiplier,
            _ => 1.0,
        };
        let efficiency = f64::from(self.economy.efficiency(tuning)) / 100.0;
        let income = self.limits.income_per_second * efficiency * boost * f64::from(dt);
        let credited = self.economy.credit(income, self.limits.storage);
        self.stats.hash_earned += credited;

        if let Some(efficiency) = self.economy.check_warning(tuning) {
            debug!(efficiency, "efficiency warning");
            out_events.push(Event::EfficiencyWarning { efficiency });
        }
        self.frozen_this_tick = false;
    }

    pub(crate) fn place_tower(
        &mut self,
        content: &dyn ContentLibrary,
        balance: &BalanceConfig,
        weapon: &WeaponId,
        slot: SlotId,
        out_events: &mut Vec<Event>,
    ) {
        let Some(definition) = content.weapon(weapon) else {
            reject(RejectionReason::UnknownWeapon, out_events);
            return;
        };
        if !self.progression.is_compiled(weapon) {
            reject(RejectionReason::WeaponNotCompiled, out_events);
            return;
        }
        match self.slots.occupant(slot) {
            None => {
                reject(RejectionReason::UnknownSlot, out_events);
                return;
            }
            Some(Some(_)) => {
                reject(RejectionReason::SlotOccupied, out_events);
                return;
            }
            Some(None) => {}
        }
        let draw = self.limits.tower_power.get(definition.rarity);
        if self.power_draw() + draw > self.limits.power_capacity {
            reject(RejectionReason::PowerBudgetExceeded, out_events);
            return;
        }
        let cost = balance.towers.purchase_cost(definition.rarity);
        if !self.economy.try_spend(cost) {
            reject(RejectionReason::InsufficientFunds, out_events);
            return;
        }

        let level = self
            .progression
            .weapon_level(weapon)
            .min(balance.protocol_scaling.max_level.max(1));
        let tower = self.towers.insert(slot, definition.clone(), level, cost);
        let _ = self.slots.bind(slot, tower);
        self.stats.towers_built = self.stats.towers_built.saturating_add(1);
        self.stats.peak_tower_level = self.stats.peak_tower_level.max(level);
        out_events.push(Event::TowerPlaced {
            tower,
            slot,
            weapon: definition.kind,
        });
    }

    pub(crate) fn upgrade_tower(
        &mut self,
        tower: TowerId,
        balance: &BalanceConfig,
        out_events: &mut Vec<Event>,
    ) {
        let Some(state) = self.towers.get_mut(tower) else {
            reject(RejectionReason::UnknownTower, out_events);
            return;
        };
        if state.level >= balance.protocol_scaling.max_level {
            reject(RejectionReason::MaxLevel, out_events);
            return;
        }
        let cost = balance.towers.upgrade_cost(state.definition.rarity, state.level);
        if !self.economy.try_spend(cost) {
            reject(RejectionReason::InsufficientFunds, out_events);
            return;
        }
        state.level += 1;
        state.invested += cost;
        let level = state.level;
        self.stats.peak_tower_level = self.stats.peak_tower_level.max(level);
        out_events.push(Event::TowerUpgraded { tower, level });
    }

    pub(crate) fn sell_tower(
        &mut self,
        tower: TowerId,
        balance: &BalanceConfig,
        out_events: &mut Vec<Event>,
    ) {
        let Some(state) = self.towers.remove(tower) else {
            reject(RejectionReason::UnknownTower, out_events);
            return;
        };
        self.slots.release(state.slot, tower);
        let refund = self
            .economy
            .credit(state.invested * balance.towers.sell_refund, self.limits.storage);
        self.stats.hash_earned += refund;
        out_events.push(Event::TowerSold { tower, refund });
    }

    pub(crate) fn activate_overclock(
        &mut self,
        balance: &BalanceConfig,
        out_events: &mut Vec<Event>,
    ) {
        let active = self
            .overclock
            .active_until
            .map_or(false, |until| self.clock < until);
        if active || self.clock < self.overclock.ready_at {
            reject(RejectionReason::OverclockUnavailable, out_events);
            return;
        }
        let duration = self.limits.overclock_duration;
        self.overclock.active_until = Some(self.clock + f64::from(duration));
        self.overclock.ready_at = self.clock + f64::from(balance.overclock.cooldown);
        out_events.push(Event::OverclockStarted { duration });
    }

    pub(crate) fn engage_encounter(
        &mut self,
        balance: &BalanceConfig,
        out_events: &mut Vec<Event>,
    ) {
        if self.encounters.pending_until.take().is_none() {
            reject(RejectionReason::NoPendingEncounter, out_events);
            return;
        }
        self.stats.encounters_engaged = self.stats.encounters_engaged.saturating_add(1);
        out_events.push(Event::EncounterEngaged);
        self.spawn_hostile(HostileKind::SectorBoss, balance, out_events);
    }

    pub(crate) fn skip_encounter(&mut self, out_events: &mut Vec<Event>) {
        if self.encounters.pending_until.take().is_none() {
            reject(RejectionReason::NoPendingEncounter, out_events);
            return;
        }
        out_events.push(Event::EncounterSkipped);
    }
}
