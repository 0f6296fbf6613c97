//! Boss hazards: telegraphed zones, rotating beams, shots and pulling wells.

use kernel_defence_core::geometry::{steer_toward, unit_from_angle, Vec2};
use serde::{Deserialize, Serialize};

/// Margin outside the arena after which shots are culled.
const CULL_MARGIN: f32 = 50.0;

/// Every source of boss damage, used to key per-hazard hit counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HazardKind {
    /// Cyberboss homing bolts.
    HomingVolley,
    /// Cyberboss minion adds.
    Minion,
    /// Cyberboss damage puddles.
    Puddle,
    /// Cyberboss rotating lasers.
    Laser,
    /// Void Harbinger void zones.
    VoidZone,
    /// Orbs fired by Void Harbinger pylons.
    PylonOrb,
    /// Void Harbinger rotating rift ring.
    Rift,
    /// Void Harbinger gravity well core.
    GravityWell,
    /// Overclocker rotating blades.
    Blade,
    /// Overclocker floor tiles.
    FloorTile,
    /// Overclocker steam vents.
    SteamVent,
    /// Overclocker suction toward the boss.
    Suction,
    /// Trojan Wyrm body segments.
    WyrmBody,
    /// Trojan Wyrm spit volleys.
    Spit,
    /// Trojan Wyrm sub-worm adds.
    SubWorm,
    /// Trojan Wyrm projectile rings.
    ProjectileRing,
}

impl HazardKind {
    /// Stable kebab-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HomingVolley => "homing-volley",
            Self::Minion => "minion",
            Self::Puddle => "puddle",
            Self::Laser => "laser",
            Self::VoidZone => "void-zone",
            Self::PylonOrb => "pylon-orb",
            Self::Rift => "rift",
            Self::GravityWell => "gravity-well",
            Self::Blade => "blade",
            Self::FloorTile => "floor-tile",
            Self::SteamVent => "steam-vent",
            Self::Suction => "suction",
            Self::WyrmBody => "wyrm-body",
            Self::Spit => "spit",
            Self::SubWorm => "sub-worm",
            Self::ProjectileRing => "projectile-ring",
        }
    }
}

/// A live hazard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) enum Hazard {
    Zone(Zone),
    Beam(Beam),
    Shot(Shot),
    Well(Well),
}

/// Circular area that warns before it turns damaging.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Zone {
    pub(crate) kind: HazardKind,
    pub(crate) center: Vec2,
    pub(crate) radius: f32,
    pub(crate) warning: f32,
    pub(crate) active: f32,
    pub(crate) damage: f32,
}

impl Zone {
    pub(crate) fn new(
        kind: HazardKind,
        center: Vec2,
        radius: f32,
        timing: (f32, f32),
        damage: f32,
    ) -> Self {
        Self {
            kind,
            center,
            radius,
            warning: timing.0,
            active: timing.1,
            damage,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.warning <= 0.0
    }
}

/// Rotating segment spanning `inner..outer` from its pivot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Beam {
    pub(crate) kind: HazardKind,
    pub(crate) pivot: Vec2,
    pub(crate) follows_boss: bool,
    pub(crate) inner: f32,
    pub(crate) outer: f32,
    pub(crate) angle: f32,
    pub(crate) previous_angle: f32,
    pub(crate) angular_speed: f32,
    pub(crate) half_width: f32,
    pub(crate) damage: f32,
}

impl Beam {
    /// Endpoints of the beam at `angle`.
    pub(crate) fn segment_at(&self, angle: f32) -> (Vec2, Vec2) {
        let direction = unit_from_angle(angle);
        (
            self.pivot + direction * self.inner,
            self.pivot + direction * self.outer,
        )
    }
}

/// Projectile fired at the avatar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Shot {
    pub(crate) kind: HazardKind,
    pub(crate) position: Vec2,
    pub(crate) previous: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) radius: f32,
    pub(crate) damage: f32,
    /// Radians per second the shot may turn toward the avatar; zero is ballistic.
    pub(crate) turn_rate: f32,
    pub(crate) ttl: f32,
}

impl Shot {
    /// Shot leaving `from` along `direction`.
    pub(crate) fn fired(
        kind: HazardKind,
        from: Vec2,
        direction: Vec2,
        speed: f32,
        radius: f32,
        damage: f32,
    ) -> Self {
        let heading = direction.normalize_or_zero();
        let heading = if heading == Vec2::ZERO { Vec2::Y } else { heading };
        Self {
            kind,
            position: from,
            previous: from,
            velocity: heading * speed,
            radius,
            damage,
            turn_rate: 0.0,
            ttl: 6.0,
        }
    }

    pub(crate) fn homing(mut self, turn_rate: f32) -> Self {
        self.turn_rate = turn_rate;
        self
    }
}

/// Pull toward a point, optionally with a damaging core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Well {
    pub(crate) kind: HazardKind,
    pub(crate) center: Vec2,
    pub(crate) follows_boss: bool,
    pub(crate) pull: f32,
    pub(crate) core_radius: f32,
    pub(crate) damage: Option<f32>,
}

/// Advances every hazard by `dt` and drops the expired ones.
pub(crate) fn advance(hazards: &mut Vec<Hazard>, dt: f32, avatar: Vec2, boss: Vec2, arena: Vec2) {
    for hazard in hazards.iter_mut() {
        match hazard {
            Hazard::Zone(zone) => {
                if zone.warning > 0.0 {
                    zone.warning -= dt;
                } else {
                    zone.active -= dt;
                }
            }
            Hazard::Beam(beam) => {
                if beam.follows_boss {
                    beam.pivot = boss;
                }
                beam.previous_angle = beam.angle;
                beam.angle += beam.angular_speed * dt;
            }
            Hazard::Shot(shot) => {
                shot.previous = shot.position;
                if shot.turn_rate > 0.0 {
                    shot.velocity =
                        steer_toward(shot.velocity, avatar - shot.position, shot.turn_rate * dt);
                }
                shot.position += shot.velocity * dt;
                shot.ttl -= dt;
            }
            Hazard::Well(well) => {
                if well.follows_boss {
                    well.center = boss;
                }
            }
        }
    }

    hazards.retain(|hazard| match hazard {
        Hazard::Zone(zone) => zone.active > 0.0,
        Hazard::Shot(shot) => shot.ttl > 0.0 && inside(shot.position, arena, CULL_MARGIN),
        Hazard::Beam(_) | Hazard::Well(_) => true,
    });
}

fn inside(point: Vec2, arena: Vec2, margin: f32) -> bool {
    point.x >= -margin
        && point.y >= -margin
        && point.x <= arena.x + margin
        && point.y <= arena.y + margin
}
