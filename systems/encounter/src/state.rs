//! Encounter state: avatar, boss, adds, pylons and the hazards between them.

use std::collections::BTreeMap;

use kernel_defence_core::{
    balance::Bosses,
    derive_seed,
    geometry::{clamp_to_bounds, Vec2},
    BossArchetype, Difficulty, EncounterAction, SimRng,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    archetype::{Behaviour, Scene},
    collision::{self, Contact, Hit},
    hazards::{self, Hazard, HazardKind},
    weapon::WeaponState,
    EncounterConfig,
};

pub(crate) const AVATAR_RADIUS: f32 = 16.0;
pub(crate) const BOSS_RADIUS: f32 = 40.0;
pub(crate) const BOSS_SPEED: f32 = 80.0;
/// Bosses never stray further than this from the arena center.
pub(crate) const LEASH_RADIUS: f32 = 300.0;
/// Distance between the avatar spawn and the bottom edge of the arena.
pub(crate) const SPAWN_MARGIN: f32 = 100.0;
pub(crate) const PYLON_RADIUS: f32 = 24.0;
/// Seconds between two hits from the same persistent hazard kind.
const CONTACT_INTERVAL: f64 = 0.5;
const COOLDOWN_EPSILON: f32 = 1e-4;
const BEAM_SAMPLE_SPACING: f32 = 40.0;

/// Moves `from` toward `to` by at most `step`.
pub(crate) fn approach(from: Vec2, to: Vec2, step: f32) -> Vec2 {
    chase(from, to, step, 0.0)
}

/// Moves `from` toward `to` by at most `step`, halting `stop` units short.
pub(crate) fn chase(from: Vec2, to: Vec2, step: f32, stop: f32) -> Vec2 {
    let offset = to - from;
    let distance = offset.length();
    let travel = step.min(distance - stop);
    if travel <= 0.0 || distance <= f32::EPSILON {
        return from;
    }
    from + offset / distance * travel
}

/// Pulls `position` back inside the leash around `center`.
pub(crate) fn leash(position: Vec2, center: Vec2) -> Vec2 {
    let offset = position - center;
    if offset.length() > LEASH_RADIUS {
        center + offset.normalize_or_zero() * LEASH_RADIUS
    } else {
        position
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Avatar {
    pub(crate) position: Vec2,
    pub(crate) health: f32,
    pub(crate) max_health: f32,
    pub(crate) damage: f32,
    pub(crate) attack_interval: f32,
    pub(crate) attack_range: f32,
    pub(crate) speed: f32,
    pub(crate) cooldown: f32,
    pub(crate) invulnerable_for: f32,
    pub(crate) revive_fraction: f32,
    pub(crate) revive_invulnerability: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Boss {
    pub(crate) position: Vec2,
    pub(crate) health: f32,
    pub(crate) max_health: f32,
    pub(crate) phase: u8,
    pub(crate) invulnerable: bool,
    thresholds: [f32; 3],
}

impl Boss {
    pub(crate) fn new(position: Vec2, max_health: f32, thresholds: [f32; 3]) -> Self {
        Self {
            position,
            health: max_health,
            max_health,
            phase: 1,
            invulnerable: false,
            thresholds,
        }
    }

    pub(crate) fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).max(0.0)
        }
    }

    /// Threshold guarding entry into the phase after the current one.
    fn next_threshold(&self) -> Option<f32> {
        self.thresholds.get(usize::from(self.phase).checked_sub(1)?).copied()
    }

    /// Applies up to `amount` damage and returns the amount that landed.
    pub(crate) fn take_damage(&mut self, amount: f32) -> f32 {
        let applied = amount.min(self.health).max(0.0);
        self.health -= applied;
        applied
    }
}

/// Hostile summoned by a boss that chases the avatar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Add {
    pub(crate) kind: HazardKind,
    pub(crate) position: Vec2,
    pub(crate) health: f32,
    pub(crate) speed: f32,
    pub(crate) radius: f32,
    pub(crate) damage: f32,
}

/// Destructible shield anchor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Pylon {
    pub(crate) position: Vec2,
    pub(crate) health: f32,
    pub(crate) fire_in: f32,
}

/// Circle a bot should keep the avatar out of.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Danger {
    /// Center of the dangerous circle.
    pub position: Vec2,
    /// Radius of the dangerous circle, excluding the avatar's own radius.
    pub radius: f32,
}

/// Running totals reported in the result record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Ledger {
    pub(crate) phase_durations: [f64; 4],
    pub(crate) hazard_hits: BTreeMap<HazardKind, u32>,
    pub(crate) damage_dealt: f64,
    pub(crate) boss_damage: f64,
    pub(crate) damage_taken: f64,
    pub(crate) deaths: u32,
}

enum Target {
    Pylon(usize),
    Add(usize),
    Boss,
}

/// Complete state of one boss encounter.
///
/// Bots read it through the accessors below; only the simulator mutates it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncounterState {
    pub(crate) clock: f64,
    pub(crate) arena: Vec2,
    pub(crate) archetype: BossArchetype,
    pub(crate) difficulty: Difficulty,
    pub(crate) avatar: Avatar,
    pub(crate) boss: Boss,
    pub(crate) behaviour: Behaviour,
    pub(crate) hazards: Vec<Hazard>,
    pub(crate) adds: Vec<Add>,
    pub(crate) pylons: Vec<Pylon>,
    pub(crate) weapon: WeaponState,
    pub(crate) rng: SimRng,
    pub(crate) action: EncounterAction,
    pub(crate) contact_ready_at: BTreeMap<HazardKind, f64>,
    pub(crate) ledger: Ledger,
}

fn archetype_index(archetype: BossArchetype) -> u64 {
    BossArchetype::ALL
        .iter()
        .position(|candidate| *candidate == archetype)
        .map_or(0, |index| index as u64)
}

impl EncounterState {
    pub(crate) fn new(config: &EncounterConfig, bosses: &Bosses) -> Self {
        let tuning = config.archetype.tuning(bosses);
        let avatar_tuning = &bosses.avatar;
        let weapon_multiplier = config
            .weapon
            .map_or(1.0, |weapon| weapon.damage_multiplier(bosses.weapon_damage_per_level));
        let max_health = avatar_tuning.health * config.difficulty.avatar_health_multiplier();
        let avatar = Avatar {
            position: Vec2::new(config.arena.x * 0.5, config.arena.y - SPAWN_MARGIN),
            health: max_health,
            max_health,
            damage: avatar_tuning.damage
                * config.difficulty.avatar_damage_multiplier()
                * weapon_multiplier,
            attack_interval: avatar_tuning.attack_interval,
            attack_range: avatar_tuning.attack_range,
            speed: avatar_tuning.speed,
            cooldown: 0.0,
            invulnerable_for: 0.0,
            revive_fraction: avatar_tuning.revive_fraction,
            revive_invulnerability: avatar_tuning.revive_invulnerability,
        };

        let center = config.arena * 0.5;
        let mut boss = Boss::new(
            center,
            tuning.base_health,
            [
                tuning.phase2_threshold,
                tuning.phase3_threshold,
                tuning.phase4_threshold,
            ],
        );
        let mut hazards = Vec::new();
        let mut adds = Vec::new();
        let mut pylons = Vec::new();
        let mut rng = SimRng::new(derive_seed(
            config.seed,
            "encounter",
            archetype_index(config.archetype),
        ));
        let behaviour = Behaviour::spawn(
            config.archetype,
            &mut Scene {
                center,
                arena: config.arena,
                avatar: avatar.position,
                boss: &mut boss,
                hazards: &mut hazards,
                adds: &mut adds,
                pylons: &mut pylons,
                rng: &mut rng,
            },
        );

        Self {
            clock: 0.0,
            arena: config.arena,
            archetype: config.archetype,
            difficulty: config.difficulty,
            avatar,
            boss,
            behaviour,
            hazards,
            adds,
            pylons,
            weapon: WeaponState::new(config.weapon),
            rng,
            action: EncounterAction::Idle,
            contact_ready_at: BTreeMap::new(),
            ledger: Ledger::default(),
        }
    }

    /// Simulated seconds since the encounter began.
    #[must_use]
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Arena size; positions lie in `[0, arena]`.
    #[must_use]
    pub fn arena(&self) -> Vec2 {
        self.arena
    }

    /// Arena center, also the anchor of the boss leash.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.arena * 0.5
    }

    /// Boss archetype.
    #[must_use]
    pub fn archetype(&self) -> BossArchetype {
        self.archetype
    }

    /// Difficulty tier.
    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Current boss phase, 1 through 4.
    #[must_use]
    pub fn phase(&self) -> u8 {
        self.boss.phase
    }

    /// Avatar position.
    #[must_use]
    pub fn avatar_position(&self) -> Vec2 {
        self.avatar.position
    }

    /// Avatar health.
    #[must_use]
    pub fn avatar_health(&self) -> f32 {
        self.avatar.health
    }

    /// Avatar health ceiling.
    #[must_use]
    pub fn avatar_max_health(&self) -> f32 {
        self.avatar.max_health
    }

    /// Avatar collision radius.
    #[must_use]
    pub fn avatar_radius(&self) -> f32 {
        AVATAR_RADIUS
    }

    /// Avatar attack reach, measured to the edge of the target.
    #[must_use]
    pub fn attack_range(&self) -> f32 {
        self.avatar.attack_range
    }

    /// Whether the avatar is in its post-revive invulnerability window.
    #[must_use]
    pub fn avatar_invulnerable(&self) -> bool {
        self.avatar.invulnerable_for > 0.0
    }

    /// Boss position.
    #[must_use]
    pub fn boss_position(&self) -> Vec2 {
        self.boss.position
    }

    /// Boss collision radius.
    #[must_use]
    pub fn boss_radius(&self) -> f32 {
        BOSS_RADIUS
    }

    /// Contact radius of every shield pylon.
    #[must_use]
    pub fn pylon_radius(&self) -> f32 {
        PYLON_RADIUS
    }

    /// Boss health as a fraction of its maximum.
    #[must_use]
    pub fn boss_health_fraction(&self) -> f32 {
        self.boss.health_fraction()
    }

    /// Whether the boss currently ignores damage.
    #[must_use]
    pub fn boss_invulnerable(&self) -> bool {
        self.boss.invulnerable
    }

    /// Positions of the surviving pylons.
    pub fn pylon_positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.pylons.iter().map(|pylon| pylon.position)
    }

    /// Positions of the live adds.
    pub fn add_positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.adds.iter().map(|add| add.position)
    }

    /// Reports whether the boss has been defeated.
    #[must_use]
    pub fn is_victory(&self) -> bool {
        self.boss.health <= 0.0
    }

    /// Every damaging circle on the field, including telegraphed zones that are
    /// still warning. Beams are sampled into circles along their length.
    #[must_use]
    pub fn dangers(&self) -> Vec<Danger> {
        let mut dangers = Vec::new();
        for hazard in &self.hazards {
            match hazard {
                Hazard::Zone(zone) => dangers.push(Danger {
                    position: zone.center,
                    radius: zone.radius,
                }),
                Hazard::Shot(shot) => dangers.push(Danger {
                    position: shot.position,
                    radius: shot.radius,
                }),
                Hazard::Beam(beam) => {
                    let (start, end) = beam.segment_at(beam.angle);
                    let samples = ((end - start).length() / BEAM_SAMPLE_SPACING).ceil().max(1.0) as u32;
                    for index in 0..=samples {
                        dangers.push(Danger {
                            position: start.lerp(end, index as f32 / samples as f32),
                            radius: beam.half_width,
                        });
                    }
                }
                Hazard::Well(well) => {
                    if well.damage.is_some() {
                        dangers.push(Danger {
                            position: well.center,
                            radius: well.core_radius,
                        });
                    }
                }
            }
        }
        dangers.extend(self.contacts().into_iter().map(|contact| Danger {
            position: contact.position,
            radius: contact.radius,
        }));
        dangers
    }

    fn contacts(&self) -> Vec<Contact> {
        let mut contacts = Vec::new();
        self.behaviour.contacts(&mut contacts);
        contacts.extend(self.adds.iter().map(|add| Contact {
            kind: add.kind,
            position: add.position,
            radius: add.radius,
            damage: add.damage,
        }));
        contacts
    }

    fn split(&mut self) -> (&mut Behaviour, Scene<'_>) {
        let center = self.center();
        let scene = Scene {
            center,
            arena: self.arena,
            avatar: self.avatar.position,
            boss: &mut self.boss,
            hazards: &mut self.hazards,
            adds: &mut self.adds,
            pylons: &mut self.pylons,
            rng: &mut self.rng,
        };
        (&mut self.behaviour, scene)
    }

    /// First half of a tick: clock, phase transitions and the boss's own update.
    pub(crate) fn begin_tick(&mut self, dt: f32) {
        self.clock += f64::from(dt);
        let slot = usize::from(self.boss.phase.clamp(1, 4) - 1);
        self.ledger.phase_durations[slot] += f64::from(dt);

        self.advance_phases();

        // Stuns pin the boss in place; its timers keep running.
        let speed_factor = self.weapon.boss_speed_factor(self.clock);
        let (behaviour, mut scene) = self.split();
        behaviour.update(dt, speed_factor, &mut scene);
    }

    fn advance_phases(&mut self) {
        while self.boss.phase < 4 {
            let Some(threshold) = self.boss.next_threshold() else {
                break;
            };
            if self.boss.health_fraction() > threshold {
                break;
            }
            self.boss.phase += 1;
            let phase = self.boss.phase;
            debug!(
                archetype = self.archetype.name(),
                phase,
                at = self.clock,
                "boss phase advanced"
            );
            let (behaviour, mut scene) = self.split();
            behaviour.enter_phase(phase, &mut scene);
        }
    }

    /// Second half of a tick: avatar, hazards, attacks and collisions.
    pub(crate) fn finish_tick(&mut self, dt: f32) {
        self.avatar.invulnerable_for = (self.avatar.invulnerable_for - dt).max(0.0);
        self.move_avatar(dt);

        hazards::advance(
            &mut self.hazards,
            dt,
            self.avatar.position,
            self.boss.position,
            self.arena,
        );
        let avatar = self.avatar.position;
        for add in &mut self.adds {
            add.position = chase(add.position, avatar, add.speed * dt, add.radius + AVATAR_RADIUS);
        }

        self.avatar_attack(dt);
        self.drain_weapon(dt);
        self.resolve_collisions(dt);
    }

    fn move_avatar(&mut self, dt: f32) {
        let position = self.avatar.position;
        let step = self.avatar.speed * dt;
        let next = match self.action {
            EncounterAction::Idle => position,
            EncounterAction::MoveVector(direction) => {
                position + direction.normalize_or_zero() * step
            }
            EncounterAction::MoveToward(target) if target.is_finite() => {
                approach(position, target, step)
            }
            EncounterAction::MoveToward(_) => position,
        };
        self.avatar.position = clamp_to_bounds(next, self.arena);
    }

    fn pick_target(&self) -> Option<Target> {
        let avatar = self.avatar.position;
        let reach = self.avatar.attack_range;
        let nearest = |positions: &mut dyn Iterator<Item = (usize, Vec2, f32)>| {
            positions
                .filter(|(_, position, radius)| avatar.distance(*position) <= reach + radius)
                .fold(None, |best: Option<(usize, f32)>, (index, position, _)| {
                    let distance_sq = avatar.distance_squared(position);
                    match best {
                        Some((_, best_sq)) if best_sq <= distance_sq => best,
                        _ => Some((index, distance_sq)),
                    }
                })
                .map(|(index, _)| index)
        };

        if self.boss.invulnerable {
            let mut pylons = self
                .pylons
                .iter()
                .enumerate()
                .map(|(index, pylon)| (index, pylon.position, PYLON_RADIUS));
            if let Some(index) = nearest(&mut pylons) {
                return Some(Target::Pylon(index));
            }
        }
        let mut adds = self
            .adds
            .iter()
            .enumerate()
            .map(|(index, add)| (index, add.position, add.radius));
        if let Some(index) = nearest(&mut adds) {
            return Some(Target::Add(index));
        }
        if !self.boss.invulnerable && avatar.distance(self.boss.position) <= reach + BOSS_RADIUS {
            return Some(Target::Boss);
        }
        None
    }

    fn avatar_attack(&mut self, dt: f32) {
        self.avatar.cooldown = (self.avatar.cooldown - dt).max(0.0);
        if self.avatar.cooldown > COOLDOWN_EPSILON {
            return;
        }
        let Some(target) = self.pick_target() else {
            return;
        };
        self.avatar.cooldown = self.avatar.attack_interval;
        let damage = self.avatar.damage * self.weapon.self_mark_multiplier(self.clock);

        match target {
            Target::Pylon(index) => {
                let pylon = &mut self.pylons[index];
                let applied = damage.min(pylon.health);
                pylon.health -= applied;
                self.ledger.damage_dealt += f64::from(applied);
                if pylon.health <= 0.0 {
                    let _ = self.pylons.remove(index);
                }
            }
            Target::Add(index) => {
                let add = &mut self.adds[index];
                let applied = damage.min(add.health);
                add.health -= applied;
                self.ledger.damage_dealt += f64::from(applied);
                if add.health <= 0.0 {
                    let _ = self.adds.remove(index);
                }
            }
            Target::Boss => {
                let applied = self
                    .boss
                    .take_damage(damage * self.weapon.tag_multiplier(self.clock));
                self.record_boss_damage(applied);
                self.weapon.on_boss_hit(applied, self.clock, &mut self.rng);
            }
        }
    }

    fn drain_weapon(&mut self, dt: f32) {
        if self.boss.invulnerable {
            return;
        }
        let owed = self.weapon.drain(dt);
        if owed <= 0.0 {
            return;
        }
        let applied = self
            .boss
            .take_damage(owed * self.weapon.tag_multiplier(self.clock));
        self.record_boss_damage(applied);
    }

    fn record_boss_damage(&mut self, applied: f32) {
        self.ledger.damage_dealt += f64::from(applied);
        self.ledger.boss_damage += f64::from(applied);
    }

    fn resolve_collisions(&mut self, dt: f32) {
        let displacement = collision::pull(self.avatar.position, &self.hazards, dt);
        self.avatar.position = clamp_to_bounds(self.avatar.position + displacement, self.arena);
        if self.avatar.invulnerable_for > 0.0 {
            return;
        }

        let mut hits = Vec::new();
        collision::hazard_hits(self.avatar.position, &mut self.hazards, &mut hits);
        collision::contact_hits(self.avatar.position, &self.contacts(), &mut hits);
        for hit in hits {
            self.apply_hit(hit);
        }
    }

    fn apply_hit(&mut self, hit: Hit) {
        if self.avatar.invulnerable_for > 0.0 {
            return;
        }
        if hit.persistent {
            let ready_at = self
                .contact_ready_at
                .entry(hit.kind)
                .or_insert(f64::NEG_INFINITY);
            if self.clock < *ready_at {
                return;
            }
            *ready_at = self.clock + CONTACT_INTERVAL;
        }

        let amount = hit.damage * self.difficulty.boss_damage_multiplier();
        self.avatar.health -= amount;
        self.ledger.damage_taken += f64::from(amount);
        *self.ledger.hazard_hits.entry(hit.kind).or_insert(0) += 1;

        if self.avatar.health <= 0.0 {
            self.ledger.deaths += 1;
            self.avatar.health = self.avatar.max_health * self.avatar.revive_fraction;
            self.avatar.invulnerable_for = self.avatar.revive_invulnerability;
            debug!(
                archetype = self.archetype.name(),
                hazard = hit.kind.name(),
                deaths = self.ledger.deaths,
                at = self.clock,
                "avatar revived"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EquippedWeapon;
    use kernel_defence_core::{Progression, WeaponKind};

    fn state(archetype: BossArchetype) -> EncounterState {
        let config = EncounterConfig::new(9, archetype, Difficulty::Normal, Progression::fresh());
        EncounterState::new(&config, &Bosses::default())
    }

    #[test]
    fn chase_halts_short_of_the_target() {
        let moved = chase(Vec2::ZERO, Vec2::new(100.0, 0.0), 500.0, 30.0);
        assert_eq!(moved, Vec2::new(70.0, 0.0));
        assert_eq!(chase(Vec2::ZERO, Vec2::new(10.0, 0.0), 5.0, 30.0), Vec2::ZERO);
    }

    #[test]
    fn leash_caps_distance_from_center() {
        let pulled = leash(Vec2::new(1_000.0, 600.0), Vec2::new(600.0, 600.0));
        assert!((pulled.x - 900.0).abs() < 1e-3);
        let inside = Vec2::new(650.0, 600.0);
        assert_eq!(leash(inside, Vec2::new(600.0, 600.0)), inside);
    }

    #[test]
    fn large_hits_cross_several_thresholds_in_one_tick() {
        let mut state = state(BossArchetype::Cyberboss);
        let applied = state.boss.take_damage(state.boss.max_health * 0.8);
        assert!(applied > 0.0);
        state.begin_tick(0.05);
        assert_eq!(state.phase(), 4);
        assert_eq!(state.adds.len(), 4);
    }

    #[test]
    fn thresholds_are_inclusive() {
        let mut state = state(BossArchetype::Cyberboss);
        state.boss.health = state.boss.max_health * 0.75;
        state.begin_tick(0.05);
        assert_eq!(state.phase(), 2);
    }

    #[test]
    fn boss_damage_is_capped_at_remaining_health() {
        let mut boss = Boss::new(Vec2::ZERO, 100.0, [0.5, 0.25, 0.1]);
        assert_eq!(boss.take_damage(30.0), 30.0);
        assert_eq!(boss.take_damage(500.0), 70.0);
        assert_eq!(boss.take_damage(5.0), 0.0);
        assert_eq!(boss.health_fraction(), 0.0);
    }

    #[test]
    fn persistent_hazards_hit_once_per_interval() {
        let mut state = state(BossArchetype::Cyberboss);
        let hit = Hit {
            kind: HazardKind::Puddle,
            damage: 10.0,
            persistent: true,
        };
        state.apply_hit(hit);
        state.apply_hit(hit);
        assert_eq!(state.ledger.hazard_hits.get(&HazardKind::Puddle), Some(&1));
        state.clock += 0.5;
        state.apply_hit(hit);
        assert_eq!(state.ledger.hazard_hits.get(&HazardKind::Puddle), Some(&2));
    }

    #[test]
    fn lethal_hits_revive_with_invulnerability() {
        let mut state = state(BossArchetype::Cyberboss);
        state.avatar.health = 5.0;
        state.apply_hit(Hit {
            kind: HazardKind::HomingVolley,
            damage: 20.0,
            persistent: false,
        });
        assert_eq!(state.ledger.deaths, 1);
        assert!((state.avatar_health() - 250.0).abs() < 1e-3);
        assert!(state.avatar_invulnerable());

        state.apply_hit(Hit {
            kind: HazardKind::HomingVolley,
            damage: 20.0,
            persistent: false,
        });
        assert_eq!(state.ledger.hazard_hits.get(&HazardKind::HomingVolley), Some(&1));
    }

    #[test]
    fn the_boss_is_out_of_reach_from_the_spawn_point() {
        for archetype in BossArchetype::ALL {
            let mut state = state(archetype);
            for _ in 0..2_000 {
                state.begin_tick(0.05);
                state.finish_tick(0.05);
            }
            assert_eq!(state.phase(), 1);
            assert_eq!(state.ledger.boss_damage, 0.0);
        }
    }

    #[test]
    fn owed_weapon_damage_waits_out_invulnerability() {
        for (kind, owed) in [(WeaponKind::ForkBomb, 24.0), (WeaponKind::Overflow, 30.0)] {
            let config = EncounterConfig::new(
                9,
                BossArchetype::VoidHarbinger,
                Difficulty::Normal,
                Progression::fresh(),
            )
            .with_weapon(EquippedWeapon::new(kind, 1));
            let mut state = EncounterState::new(&config, &Bosses::default());
            state.weapon.on_boss_hit(20.0, 0.0, &mut state.rng);

            state.boss.invulnerable = true;
            for _ in 0..50 {
                state.drain_weapon(0.1);
            }
            assert_eq!(state.boss.health, state.boss.max_health, "{kind:?}");
            assert_eq!(state.ledger.boss_damage, 0.0);

            state.boss.invulnerable = false;
            for _ in 0..50 {
                state.drain_weapon(0.1);
            }
            assert!(
                (state.ledger.boss_damage - owed).abs() < 1e-3,
                "{kind:?} landed {}",
                state.ledger.boss_damage
            );
        }
    }

    #[test]
    fn weapons_scale_avatar_damage() {
        let config = EncounterConfig::new(9, BossArchetype::Cyberboss, Difficulty::Easy, Progression::fresh())
            .with_weapon(EquippedWeapon::new(WeaponKind::KernelPulse, 10));
        let state = EncounterState::new(&config, &Bosses::default());
        assert!((state.avatar.damage - 25.0 * 1.25 * 2.35).abs() < 1e-3);
        assert!((state.avatar_max_health() - 750.0).abs() < 1e-3);
    }
}
