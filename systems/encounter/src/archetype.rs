//! Boss behaviour, one variant per archetype.
//!
//! Every variant owns its own timers and auxiliary state. The shared pieces of
//! the arena it manipulates (boss body, hazards, adds, pylons, randomness) are
//! lent to it through a [`Scene`] for the duration of a call.

use std::f32::consts::{FRAC_PI_2, TAU};

use kernel_defence_core::{
    geometry::{rotate, unit_from_angle, Vec2},
    BossArchetype, SimRng,
};
use serde::{Deserialize, Serialize};

use crate::{
    collision::Contact,
    hazards::{Beam, Hazard, HazardKind, Shot, Well, Zone},
    state::{chase, leash, Add, Boss, Pylon, BOSS_SPEED},
};

const CYBER_VOLLEY_INTERVAL: f32 = 3.0;
const CYBER_VOLLEY_INTERVAL_ENRAGED: f32 = 2.0;
const CYBER_CHASE_STOP: f32 = 110.0;
const MINION_WAVE: usize = 4;
const MINION_REINFORCEMENTS: usize = 2;
const MINION_CAP: usize = 8;
const MINION_INTERVAL: f32 = 10.0;
const PUDDLE_INTERVAL: f32 = 4.0;

const VOID_ZONE_INTERVAL: f32 = 5.0;
const PYLON_OFFSET: f32 = 250.0;
const PYLON_HEALTH: f32 = 300.0;
const PYLON_FIRE_INTERVAL: f32 = 3.0;
const VOID_ZONE_JITTER: f32 = 30.0;

const TILE_GRID: usize = 4;
const TILES_PER_WAVE: usize = 3;
const TILE_INTERVAL: f32 = 4.0;
const CHARGE_INTERVAL: f32 = 6.0;
const CHARGE_SPEED_FACTOR: f32 = 3.0;
const CHARGE_DURATION: f32 = 1.5;
const VENT_INTERVAL: f32 = 0.3;
const BLADE_SPEED: f32 = 2.0;
const BLADE_SPEED_ENRAGED: f32 = 3.5;

const WYRM_ORBIT: f32 = 220.0;
const WYRM_ANGULAR_SPEED: f32 = 0.5;
const WYRM_ANGULAR_SPEED_ENRAGED: f32 = 0.9;
const WYRM_SEGMENTS: usize = 8;
const WYRM_SEGMENT_SPACING: f32 = 35.0;
const WYRM_SEGMENT_RADIUS: f32 = 22.0;
const WYRM_SEGMENT_DAMAGE: f32 = 15.0;
const WYRM_TAIL_SPLIT: usize = 4;
const SPIT_INTERVAL: f32 = 3.0;
const RING_INTERVAL: f32 = 4.0;
const RING_SHOTS: u32 = 12;

/// Borrowed view of the arena handed to a behaviour.
pub(crate) struct Scene<'a> {
    pub(crate) center: Vec2,
    pub(crate) arena: Vec2,
    pub(crate) avatar: Vec2,
    pub(crate) boss: &'a mut Boss,
    pub(crate) hazards: &'a mut Vec<Hazard>,
    pub(crate) adds: &'a mut Vec<Add>,
    pub(crate) pylons: &'a mut Vec<Pylon>,
    pub(crate) rng: &'a mut SimRng,
}

struct Volley {
    kind: HazardKind,
    count: u32,
    spread: f32,
    speed: f32,
    radius: f32,
    damage: f32,
    turn_rate: f32,
}

impl Scene<'_> {
    /// Fires `volley` from `from` fanned around the direction of the avatar.
    fn fire_at_avatar(&mut self, from: Vec2, volley: &Volley) {
        let aim = self.avatar - from;
        let half = (volley.count as f32 - 1.0) / 2.0;
        for index in 0..volley.count {
            let direction = rotate(aim, (index as f32 - half) * volley.spread);
            self.hazards.push(Hazard::Shot(
                Shot::fired(
                    volley.kind,
                    from,
                    direction,
                    volley.speed,
                    volley.radius,
                    volley.damage,
                )
                .homing(volley.turn_rate),
            ));
        }
    }

    fn move_boss(&mut self, target: Vec2, step: f32, stop: f32) {
        let next = chase(self.boss.position, target, step, stop);
        self.boss.position = leash(next, self.center);
    }
}

/// Copies of `template` spaced evenly around a full turn.
fn spokes(count: u32, template: &Beam) -> impl Iterator<Item = Hazard> + '_ {
    (0..count).map(move |index| {
        let angle = template.angle + index as f32 * TAU / count as f32;
        Hazard::Beam(Beam {
            angle,
            previous_angle: angle,
            ..template.clone()
        })
    })
}

/// Archetype-specific boss state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) enum Behaviour {
    Cyberboss(Cyberboss),
    VoidHarbinger(VoidHarbinger),
    Overclocker(Overclocker),
    TrojanWyrm(TrojanWyrm),
}

impl Behaviour {
    /// Creates the behaviour and places its opening hazards.
    pub(crate) fn spawn(archetype: BossArchetype, scene: &mut Scene<'_>) -> Self {
        match archetype {
            BossArchetype::Cyberboss => Self::Cyberboss(Cyberboss {
                volley_in: CYBER_VOLLEY_INTERVAL,
                minions_in: MINION_INTERVAL,
                puddle_in: PUDDLE_INTERVAL,
            }),
            BossArchetype::VoidHarbinger => Self::VoidHarbinger(VoidHarbinger {
                zone_in: VOID_ZONE_INTERVAL,
            }),
            BossArchetype::Overclocker => {
                scene.hazards.extend(spokes(2, &blade(scene.boss.position, 0.0, BLADE_SPEED)));
                Self::Overclocker(Overclocker {
                    tiles_in: TILE_INTERVAL,
                    charge_in: CHARGE_INTERVAL,
                    charge: None,
                })
            }
            BossArchetype::TrojanWyrm => {
                let wyrm = TrojanWyrm {
                    center: scene.center,
                    angle: -FRAC_PI_2,
                    segments: WYRM_SEGMENTS,
                    spit_in: SPIT_INTERVAL,
                    ring_in: RING_INTERVAL,
                };
                scene.boss.position = wyrm.head();
                Self::TrojanWyrm(wyrm)
            }
        }
    }

    /// Runs the one-off effects of entering `phase`.
    pub(crate) fn enter_phase(&mut self, phase: u8, scene: &mut Scene<'_>) {
        match self {
            Self::Cyberboss(cyberboss) => cyberboss.enter_phase(phase, scene),
            Self::VoidHarbinger(harbinger) => harbinger.enter_phase(phase, scene),
            Self::Overclocker(overclocker) => overclocker.enter_phase(phase, scene),
            Self::TrojanWyrm(wyrm) => wyrm.enter_phase(phase, scene),
        }
    }

    /// Advances timers and movement. `speed_factor` scales boss movement only.
    pub(crate) fn update(&mut self, dt: f32, speed_factor: f32, scene: &mut Scene<'_>) {
        match self {
            Self::Cyberboss(cyberboss) => cyberboss.update(dt, speed_factor, scene),
            Self::VoidHarbinger(harbinger) => harbinger.update(dt, speed_factor, scene),
            Self::Overclocker(overclocker) => overclocker.update(dt, speed_factor, scene),
            Self::TrojanWyrm(wyrm) => wyrm.update(dt, speed_factor, scene),
        }
    }

    /// Damaging body parts other than hazards and adds.
    pub(crate) fn contacts(&self, out: &mut Vec<Contact>) {
        if let Self::TrojanWyrm(wyrm) = self {
            out.extend(wyrm.segment_positions().map(|position| Contact {
                kind: HazardKind::WyrmBody,
                position,
                radius: WYRM_SEGMENT_RADIUS,
                damage: WYRM_SEGMENT_DAMAGE,
            }));
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Cyberboss {
    volley_in: f32,
    minions_in: f32,
    puddle_in: f32,
}

impl Cyberboss {
    fn enter_phase(&mut self, phase: u8, scene: &mut Scene<'_>) {
        match phase {
            2 => {
                spawn_minions(scene, MINION_WAVE);
                self.minions_in = MINION_INTERVAL;
            }
            3 => self.puddle_in = 1.0,
            4 => {
                let laser = Beam {
                    kind: HazardKind::Laser,
                    pivot: scene.boss.position,
                    follows_boss: true,
                    inner: 0.0,
                    outer: 700.0,
                    angle: 0.0,
                    previous_angle: 0.0,
                    angular_speed: 0.6,
                    half_width: 12.0,
                    damage: 25.0,
                };
                scene.hazards.extend(spokes(4, &laser));
            }
            _ => {}
        }
    }

    fn update(&mut self, dt: f32, speed_factor: f32, scene: &mut Scene<'_>) {
        let avatar = scene.avatar;
        scene.move_boss(avatar, BOSS_SPEED * speed_factor * dt, CYBER_CHASE_STOP);

        self.volley_in -= dt;
        if self.volley_in <= 0.0 {
            self.volley_in += if scene.boss.phase >= 4 {
                CYBER_VOLLEY_INTERVAL_ENRAGED
            } else {
                CYBER_VOLLEY_INTERVAL
            };
            let from = scene.boss.position;
            scene.fire_at_avatar(
                from,
                &Volley {
                    kind: HazardKind::HomingVolley,
                    count: 3,
                    spread: 0.35,
                    speed: 260.0,
                    radius: 10.0,
                    damage: 20.0,
                    turn_rate: 1.5,
                },
            );
        }

        if scene.boss.phase >= 2 {
            self.minions_in -= dt;
            if self.minions_in <= 0.0 {
                self.minions_in += MINION_INTERVAL;
                let alive = scene
                    .adds
                    .iter()
                    .filter(|add| add.kind == HazardKind::Minion)
                    .count();
                spawn_minions(scene, MINION_REINFORCEMENTS.min(MINION_CAP.saturating_sub(alive)));
            }
        }

        if scene.boss.phase >= 3 {
            self.puddle_in -= dt;
            if self.puddle_in <= 0.0 {
                self.puddle_in += PUDDLE_INTERVAL;
                scene.hazards.push(Hazard::Zone(Zone::new(
                    HazardKind::Puddle,
                    scene.avatar,
                    70.0,
                    (1.0, 4.0),
                    15.0,
                )));
            }
        }
    }
}

fn spawn_minions(scene: &mut Scene<'_>, count: usize) {
    let origin = scene.boss.position;
    for _ in 0..count {
        let angle = scene.rng.next_float_range(0.0, TAU);
        scene.adds.push(Add {
            kind: HazardKind::Minion,
            position: origin + unit_from_angle(angle) * 60.0,
            health: 60.0,
            speed: 120.0,
            radius: 14.0,
            damage: 10.0,
        });
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct VoidHarbinger {
    zone_in: f32,
}

impl VoidHarbinger {
    fn enter_phase(&mut self, phase: u8, scene: &mut Scene<'_>) {
        match phase {
            2 => {
                scene.boss.invulnerable = true;
                let offsets = [
                    Vec2::new(-PYLON_OFFSET, 0.0),
                    Vec2::new(PYLON_OFFSET, 0.0),
                    Vec2::new(0.0, -PYLON_OFFSET),
                    Vec2::new(0.0, PYLON_OFFSET),
                ];
                for (index, offset) in offsets.into_iter().enumerate() {
                    scene.pylons.push(Pylon {
                        position: scene.center + offset,
                        health: PYLON_HEALTH,
                        fire_in: 1.0 + index as f32 * 0.5,
                    });
                }
            }
            3 => {
                let rift = Beam {
                    kind: HazardKind::Rift,
                    pivot: scene.center,
                    follows_boss: false,
                    inner: 170.0,
                    outer: 260.0,
                    angle: 0.0,
                    previous_angle: 0.0,
                    angular_speed: 0.5,
                    half_width: 14.0,
                    damage: 20.0,
                };
                scene.hazards.extend(spokes(6, &rift));
            }
            4 => scene.hazards.push(Hazard::Well(Well {
                kind: HazardKind::GravityWell,
                center: scene.center,
                follows_boss: false,
                pull: 60.0,
                core_radius: 80.0,
                damage: Some(30.0),
            })),
            _ => {}
        }
    }

    fn update(&mut self, dt: f32, speed_factor: f32, scene: &mut Scene<'_>) {
        let center = scene.center;
        scene.move_boss(center, BOSS_SPEED * speed_factor * dt, 0.0);

        self.zone_in -= dt;
        if self.zone_in <= 0.0 {
            self.zone_in += VOID_ZONE_INTERVAL;
            let jitter = Vec2::new(
                scene.rng.next_float_range(-VOID_ZONE_JITTER, VOID_ZONE_JITTER),
                scene.rng.next_float_range(-VOID_ZONE_JITTER, VOID_ZONE_JITTER),
            );
            scene.hazards.push(Hazard::Zone(Zone::new(
                HazardKind::VoidZone,
                scene.avatar + jitter,
                90.0,
                (1.5, 6.0),
                12.0,
            )));
        }

        let avatar = scene.avatar;
        for pylon in scene.pylons.iter_mut() {
            pylon.fire_in -= dt;
            if pylon.fire_in <= 0.0 {
                pylon.fire_in += PYLON_FIRE_INTERVAL;
                scene.hazards.push(Hazard::Shot(Shot::fired(
                    HazardKind::PylonOrb,
                    pylon.position,
                    avatar - pylon.position,
                    200.0,
                    12.0,
                    18.0,
                )));
            }
        }

        if scene.boss.invulnerable && scene.pylons.is_empty() {
            scene.boss.invulnerable = false;
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Charge {
    direction: Vec2,
    remaining: f32,
    vent_in: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Overclocker {
    tiles_in: f32,
    charge_in: f32,
    charge: Option<Charge>,
}

fn blade(pivot: Vec2, angle: f32, angular_speed: f32) -> Beam {
    Beam {
        kind: HazardKind::Blade,
        pivot,
        follows_boss: true,
        inner: 40.0,
        outer: 160.0,
        angle,
        previous_angle: angle,
        angular_speed,
        half_width: 10.0,
        damage: 15.0,
    }
}

impl Overclocker {
    fn enter_phase(&mut self, phase: u8, scene: &mut Scene<'_>) {
        match phase {
            2 => {
                self.drop_tiles(scene);
                self.tiles_in = TILE_INTERVAL;
            }
            3 => {
                self.begin_charge(scene);
                self.charge_in = CHARGE_INTERVAL;
            }
            4 => Self::enrage(scene),
            _ => {}
        }
    }

    fn enrage(scene: &mut Scene<'_>) {
        let angle = scene
            .hazards
            .iter()
            .find_map(|hazard| match hazard {
                Hazard::Beam(beam) if beam.kind == HazardKind::Blade => Some(beam.angle),
                _ => None,
            })
            .unwrap_or(0.0);
        scene
            .hazards
            .retain(|hazard| !matches!(hazard, Hazard::Beam(beam) if beam.kind == HazardKind::Blade));
        scene.hazards.extend(spokes(
            4,
            &blade(scene.boss.position, angle, BLADE_SPEED_ENRAGED),
        ));
        scene.hazards.push(Hazard::Well(Well {
            kind: HazardKind::Suction,
            center: scene.boss.position,
            follows_boss: true,
            pull: 50.0,
            core_radius: 0.0,
            damage: None,
        }));
    }

    fn update(&mut self, dt: f32, speed_factor: f32, scene: &mut Scene<'_>) {
        if let Some(charge) = self.charge.as_mut() {
            let step = BOSS_SPEED * CHARGE_SPEED_FACTOR * speed_factor * dt;
            let target = scene.boss.position + charge.direction * step;
            scene.boss.position = leash(target, scene.center);
            charge.remaining -= dt;
            charge.vent_in -= dt;
            if charge.vent_in <= 0.0 {
                charge.vent_in += VENT_INTERVAL;
                scene.hazards.push(Hazard::Zone(Zone::new(
                    HazardKind::SteamVent,
                    scene.boss.position,
                    40.0,
                    (0.3, 5.0),
                    10.0,
                )));
            }
            if charge.remaining <= 0.0 || scene.boss.position != target {
                self.charge = None;
            }
        } else {
            let avatar = scene.avatar;
            scene.move_boss(avatar, BOSS_SPEED * speed_factor * dt, 0.0);
        }

        if scene.boss.phase >= 2 {
            self.tiles_in -= dt;
            if self.tiles_in <= 0.0 {
                self.tiles_in += TILE_INTERVAL;
                self.drop_tiles(scene);
            }
        }

        if scene.boss.phase >= 3 && self.charge.is_none() {
            self.charge_in -= dt;
            if self.charge_in <= 0.0 {
                self.charge_in += CHARGE_INTERVAL;
                self.begin_charge(scene);
            }
        }
    }

    fn begin_charge(&mut self, scene: &Scene<'_>) {
        let aim = (scene.avatar - scene.boss.position).normalize_or_zero();
        if aim != Vec2::ZERO {
            self.charge = Some(Charge {
                direction: aim,
                remaining: CHARGE_DURATION,
                vent_in: 0.0,
            });
        }
    }

    fn drop_tiles(&self, scene: &mut Scene<'_>) {
        let tile = scene.arena / TILE_GRID as f32;
        let mut pool: Vec<usize> = (0..TILE_GRID * TILE_GRID).collect();
        for _ in 0..TILES_PER_WAVE {
            let index = pool.remove(scene.rng.next_index(pool.len()));
            let cell = Vec2::new((index % TILE_GRID) as f32, (index / TILE_GRID) as f32);
            scene.hazards.push(Hazard::Zone(Zone::new(
                HazardKind::FloorTile,
                (cell + Vec2::splat(0.5)) * tile,
                140.0,
                (1.5, 2.0),
                20.0,
            )));
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct TrojanWyrm {
    center: Vec2,
    angle: f32,
    segments: usize,
    spit_in: f32,
    ring_in: f32,
}

impl TrojanWyrm {
    fn head(&self) -> Vec2 {
        self.center + unit_from_angle(self.angle) * WYRM_ORBIT
    }

    fn segment_positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        let step = WYRM_SEGMENT_SPACING / WYRM_ORBIT;
        (1..=self.segments).map(move |index| {
            self.center + unit_from_angle(self.angle - index as f32 * step) * WYRM_ORBIT
        })
    }

    fn enter_phase(&mut self, phase: u8, scene: &mut Scene<'_>) {
        if phase != 3 {
            return;
        }
        let tail: Vec<Vec2> = self.segment_positions().collect();
        self.segments = self.segments.saturating_sub(WYRM_TAIL_SPLIT);
        for position in tail.iter().rev().take(2) {
            scene.adds.push(Add {
                kind: HazardKind::SubWorm,
                position: *position,
                health: 120.0,
                speed: 110.0,
                radius: 18.0,
                damage: 12.0,
            });
        }
    }

    fn update(&mut self, dt: f32, speed_factor: f32, scene: &mut Scene<'_>) {
        let angular_speed = if scene.boss.phase >= 4 {
            WYRM_ANGULAR_SPEED_ENRAGED
        } else {
            WYRM_ANGULAR_SPEED
        };
        self.angle = (self.angle + angular_speed * speed_factor * dt) % TAU;
        scene.boss.position = leash(self.head(), scene.center);

        if scene.boss.phase >= 2 {
            self.spit_in -= dt;
            if self.spit_in <= 0.0 {
                self.spit_in += SPIT_INTERVAL;
                let from = scene.boss.position;
                scene.fire_at_avatar(
                    from,
                    &Volley {
                        kind: HazardKind::Spit,
                        count: 3,
                        spread: 0.25,
                        speed: 240.0,
                        radius: 10.0,
                        damage: 14.0,
                        turn_rate: 0.0,
                    },
                );
            }
        }

        if scene.boss.phase >= 4 {
            self.ring_in -= dt;
            if self.ring_in <= 0.0 {
                self.ring_in += RING_INTERVAL;
                let offset = scene.rng.next_float_range(0.0, TAU / RING_SHOTS as f32);
                let from = scene.boss.position;
                for index in 0..RING_SHOTS {
                    let angle = offset + index as f32 * TAU / RING_SHOTS as f32;
                    scene.hazards.push(Hazard::Shot(Shot::fired(
                        HazardKind::ProjectileRing,
                        from,
                        unit_from_angle(angle),
                        180.0,
                        10.0,
                        12.0,
                    )));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::approach;

    struct Arena {
        boss: Boss,
        hazards: Vec<Hazard>,
        adds: Vec<Add>,
        pylons: Vec<Pylon>,
        rng: SimRng,
    }

    impl Arena {
        fn new() -> Self {
            Self {
                boss: Boss::new(Vec2::new(600.0, 600.0), 1_000.0, [0.75, 0.5, 0.25]),
                hazards: Vec::new(),
                adds: Vec::new(),
                pylons: Vec::new(),
                rng: SimRng::new(5),
            }
        }

        fn scene(&mut self, avatar: Vec2) -> Scene<'_> {
            Scene {
                center: Vec2::new(600.0, 600.0),
                arena: Vec2::new(1_200.0, 1_200.0),
                avatar,
                boss: &mut self.boss,
                hazards: &mut self.hazards,
                adds: &mut self.adds,
                pylons: &mut self.pylons,
                rng: &mut self.rng,
            }
        }
    }

    #[test]
    fn cyberboss_stays_on_its_leash() {
        let mut arena = Arena::new();
        let mut behaviour = Behaviour::spawn(BossArchetype::Cyberboss, &mut arena.scene(Vec2::ZERO));
        for _ in 0..400 {
            behaviour.update(0.05, 1.0, &mut arena.scene(Vec2::new(600.0, 1_150.0)));
        }
        let offset = arena.boss.position - Vec2::new(600.0, 600.0);
        assert!(offset.length() <= 300.0 + 1e-3);
        assert!(arena.boss.position.y > 850.0);
    }

    #[test]
    fn stunned_bosses_hold_position() {
        let mut arena = Arena::new();
        let mut behaviour =
            Behaviour::spawn(BossArchetype::Overclocker, &mut arena.scene(Vec2::ZERO));
        let start = arena.boss.position;
        behaviour.update(0.5, 0.0, &mut arena.scene(Vec2::new(100.0, 100.0)));
        assert_eq!(arena.boss.position, start);
    }

    #[test]
    fn void_harbinger_hides_behind_pylons() {
        let mut arena = Arena::new();
        let mut behaviour =
            Behaviour::spawn(BossArchetype::VoidHarbinger, &mut arena.scene(Vec2::ZERO));
        arena.boss.phase = 2;
        behaviour.enter_phase(2, &mut arena.scene(Vec2::ZERO));
        assert!(arena.boss.invulnerable);
        assert_eq!(arena.pylons.len(), 4);

        arena.pylons.clear();
        behaviour.update(0.05, 1.0, &mut arena.scene(Vec2::ZERO));
        assert!(!arena.boss.invulnerable);
    }

    #[test]
    fn wyrm_tail_split_spawns_sub_worms() {
        let mut arena = Arena::new();
        let mut behaviour =
            Behaviour::spawn(BossArchetype::TrojanWyrm, &mut arena.scene(Vec2::ZERO));
        let mut contacts = Vec::new();
        behaviour.contacts(&mut contacts);
        assert_eq!(contacts.len(), WYRM_SEGMENTS);

        arena.boss.phase = 3;
        behaviour.enter_phase(3, &mut arena.scene(Vec2::ZERO));
        contacts.clear();
        behaviour.contacts(&mut contacts);
        assert_eq!(contacts.len(), WYRM_SEGMENTS - WYRM_TAIL_SPLIT);
        assert_eq!(arena.adds.len(), 2);
        assert!(arena.adds.iter().all(|add| add.kind == HazardKind::SubWorm));
    }

    #[test]
    fn overclocker_enrages_with_four_fast_blades_and_suction() {
        let mut arena = Arena::new();
        let mut behaviour =
            Behaviour::spawn(BossArchetype::Overclocker, &mut arena.scene(Vec2::ZERO));
        behaviour.enter_phase(4, &mut arena.scene(Vec2::ZERO));
        let blades: Vec<&Beam> = arena
            .hazards
            .iter()
            .filter_map(|hazard| match hazard {
                Hazard::Beam(beam) => Some(beam),
                _ => None,
            })
            .collect();
        assert_eq!(blades.len(), 4);
        assert!(blades.iter().all(|beam| beam.angular_speed == BLADE_SPEED_ENRAGED));
        assert!(arena
            .hazards
            .iter()
            .any(|hazard| matches!(hazard, Hazard::Well(well) if well.kind == HazardKind::Suction)));
    }

    #[test]
    fn stunned_harbinger_keeps_its_pylons_firing() {
        let mut arena = Arena::new();
        let mut behaviour =
            Behaviour::spawn(BossArchetype::VoidHarbinger, &mut arena.scene(Vec2::ZERO));
        arena.boss.phase = 2;
        behaviour.enter_phase(2, &mut arena.scene(Vec2::ZERO));
        let start = arena.boss.position;
        for _ in 0..12 {
            behaviour.update(0.1, 0.0, &mut arena.scene(Vec2::new(100.0, 100.0)));
        }
        assert_eq!(arena.boss.position, start);
        assert!(arena
            .hazards
            .iter()
            .any(|hazard| matches!(hazard, Hazard::Shot(shot) if shot.kind == HazardKind::PylonOrb)));

        arena.pylons.clear();
        behaviour.update(0.1, 0.0, &mut arena.scene(Vec2::new(100.0, 100.0)));
        assert!(!arena.boss.invulnerable);
    }

    #[test]
    fn overclocker_phases_arm_on_entry() {
        let mut arena = Arena::new();
        let mut behaviour =
            Behaviour::spawn(BossArchetype::Overclocker, &mut arena.scene(Vec2::ZERO));
        let tiles = |hazards: &[Hazard]| {
            hazards
                .iter()
                .filter(|hazard| matches!(hazard, Hazard::Zone(zone) if zone.kind == HazardKind::FloorTile))
                .count()
        };
        assert_eq!(tiles(arena.hazards.as_slice()), 0);

        arena.boss.phase = 2;
        behaviour.enter_phase(2, &mut arena.scene(Vec2::new(100.0, 100.0)));
        assert_eq!(tiles(arena.hazards.as_slice()), TILES_PER_WAVE);

        arena.boss.phase = 3;
        behaviour.enter_phase(3, &mut arena.scene(Vec2::new(100.0, 100.0)));
        match &behaviour {
            Behaviour::Overclocker(overclocker) => {
                assert!(overclocker.charge.is_some());
                assert_eq!(overclocker.tiles_in, TILE_INTERVAL);
                assert_eq!(overclocker.charge_in, CHARGE_INTERVAL);
            }
            _ => panic!("expected the overclocker"),
        }
    }

    #[test]
    fn floor_tiles_pick_distinct_cells() {
        let mut arena = Arena::new();
        let overclocker = Overclocker {
            tiles_in: 0.0,
            charge_in: 0.0,
            charge: None,
        };
        overclocker.drop_tiles(&mut arena.scene(Vec2::ZERO));
        let mut centers: Vec<(u32, u32)> = arena
            .hazards
            .iter()
            .filter_map(|hazard| match hazard {
                Hazard::Zone(zone) => Some((zone.center.x as u32, zone.center.y as u32)),
                _ => None,
            })
            .collect();
        centers.sort_unstable();
        centers.dedup();
        assert_eq!(centers.len(), TILES_PER_WAVE);
    }

    #[test]
    fn approach_never_overshoots() {
        assert_eq!(approach(Vec2::ZERO, Vec2::new(3.0, 4.0), 10.0), Vec2::new(3.0, 4.0));
        let halfway = approach(Vec2::ZERO, Vec2::new(0.0, 10.0), 5.0);
        assert!((halfway.y - 5.0).abs() < 1e-6);
    }
}
