//! Read-only content lookups: weapon (protocol) definitions and hostile kinds.
//!
//! The simulator never owns content. Loops receive a [`ContentLibrary`]
//! through the [`crate::SimulationContext`] and resolve weapon ids against it;
//! an unknown id simply short-circuits the action that referenced it.

use std::{borrow::Cow, collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// Stable identifier of a weapon definition inside a content library.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WeaponId(Cow<'static, str>);

impl WeaponId {
    /// Creates an identifier from a static name.
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Creates an identifier from an owned name, typically parsed from input.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Textual form of the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WeaponId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rarity tier that drives purchase cost and power draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    /// Entry tier.
    Common,
    /// Second tier.
    Rare,
    /// Third tier.
    Epic,
    /// Top tier.
    Legendary,
}

/// Weapon families. Each family owns exactly one on-hit behaviour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Homing single-target bolt.
    KernelPulse,
    /// Area burst with linear splash falloff.
    BurstProtocol,
    /// Long-range piercing trace that tags what it passes through.
    TraceRoute,
    /// Chilling shard: slows, with a chance to stun.
    IceShard,
    /// Marks targets so their defeat pays a bonus.
    RootAccess,
    /// Splits into child projectiles on a top-level hit.
    ForkBomb,
    /// Ignites targets with a pooled damage-over-time burn.
    Overflow,
    /// Hitscan strike applied instantly on fire.
    NullPointer,
}

impl WeaponKind {
    /// Every weapon kind in declaration order.
    pub const ALL: [WeaponKind; 8] = [
        Self::KernelPulse,
        Self::BurstProtocol,
        Self::TraceRoute,
        Self::IceShard,
        Self::RootAccess,
        Self::ForkBomb,
        Self::Overflow,
        Self::NullPointer,
    ];

    /// Canonical identifier used by the built-in content library.
    #[must_use]
    pub const fn id(self) -> WeaponId {
        WeaponId::from_static(match self {
            Self::KernelPulse => "kernel_pulse",
            Self::BurstProtocol => "burst_protocol",
            Self::TraceRoute => "trace_route",
            Self::IceShard => "ice_shard",
            Self::RootAccess => "root_access",
            Self::ForkBomb => "fork_bomb",
            Self::Overflow => "overflow",
            Self::NullPointer => "null_pointer",
        })
    }

    /// Looks up a weapon kind by its canonical identifier.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id().as_str() == id)
    }

    /// On-hit behaviour attached by this weapon family.
    #[must_use]
    pub const fn on_hit(self) -> OnHitEffect {
        match self {
            Self::KernelPulse | Self::BurstProtocol | Self::NullPointer => OnHitEffect::None,
            Self::TraceRoute => OnHitEffect::Tag {
                duration: 3.0,
                damage_bonus: 0.25,
            },
            Self::IceShard => OnHitEffect::Slow {
                duration: 2.0,
                factor: 0.5,
                stun_chance: 0.1,
                stun_duration: 0.6,
            },
            Self::RootAccess => OnHitEffect::Mark { duration: 4.0 },
            Self::ForkBomb => OnHitEffect::Split {
                children: 3,
                damage_fraction: 0.4,
            },
            Self::Overflow => OnHitEffect::Burn {
                pool_fraction: 1.5,
                duration: 3.0,
            },
        }
    }
}

/// Weapon-specific behaviour applied when a shot connects.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum OnHitEffect {
    /// Plain damage.
    None,
    /// Adds `pool_fraction` of the hit damage to a burn pool spent over `duration` seconds.
    Burn {
        /// Fraction of hit damage converted into burn damage.
        pool_fraction: f32,
        /// Seconds over which the pool is spent.
        duration: f32,
    },
    /// Slows movement and rolls a stun.
    Slow {
        /// Seconds the slow lasts.
        duration: f32,
        /// Movement multiplier while slowed.
        factor: f32,
        /// Probability that a hit also stuns.
        stun_chance: f64,
        /// Seconds a stun lasts.
        stun_duration: f32,
    },
    /// Tags the target so it takes extra damage from every source.
    Tag {
        /// Seconds the tag lasts.
        duration: f32,
        /// Additional damage fraction taken while tagged.
        damage_bonus: f32,
    },
    /// Marks the target so defeating it pays a bonus.
    Mark {
        /// Seconds the mark lasts.
        duration: f32,
    },
    /// Spawns child projectiles from top-level hits.
    Split {
        /// Number of children spawned per hit.
        children: u32,
        /// Child damage as a fraction of the parent hit.
        damage_fraction: f32,
    },
}

/// Immutable weapon definition returned by a content lookup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeaponDefinition {
    /// Identifier of the definition.
    pub id: WeaponId,
    /// Weapon family.
    pub kind: WeaponKind,
    /// Rarity tier.
    pub rarity: Rarity,
    /// Damage per hit at level 1.
    pub base_damage: f32,
    /// Targeting range in world units at level 1.
    pub range: f32,
    /// Shots per second at level 1.
    pub attack_rate: f32,
    /// Projectile speed in world units per second; ignored by hitscan weapons.
    pub projectile_speed: f32,
    /// Whether projectiles steer toward their target.
    pub homing: bool,
    /// Splash radius for area weapons.
    pub splash_radius: Option<f32>,
    /// Number of hostiles a projectile may hit before expiring.
    pub pierce: u32,
    /// Whether damage is applied instantly instead of via a projectile.
    pub hitscan: bool,
}

impl WeaponDefinition {
    /// On-hit behaviour of the weapon family.
    #[must_use]
    pub const fn on_hit(&self) -> OnHitEffect {
        self.kind.on_hit()
    }
}

/// Source of immutable content queried by id.
pub trait ContentLibrary: fmt::Debug + Send + Sync {
    /// Looks up a weapon definition, returning `None` for unknown ids.
    fn weapon(&self, id: &WeaponId) -> Option<&WeaponDefinition>;

    /// Enumerates every definition in deterministic id order.
    fn weapons(&self) -> Vec<&WeaponDefinition>;
}

/// Built-in content shipped with the engine.
#[derive(Clone, Debug)]
pub struct BuiltinContent {
    weapons: BTreeMap<WeaponId, WeaponDefinition>,
}

impl BuiltinContent {
    /// Creates the built-in library.
    #[must_use]
    pub fn new() -> Self {
        let definitions = [
            builtin(WeaponKind::KernelPulse, Rarity::Common, 10.0, 180.0, 1.5, 420.0),
            WeaponDefinition {
                splash_radius: Some(60.0),
                ..builtin(WeaponKind::BurstProtocol, Rarity::Rare, 14.0, 160.0, 0.8, 300.0)
            },
            WeaponDefinition {
                pierce: 3,
                homing: false,
                ..builtin(WeaponKind::TraceRoute, Rarity::Rare, 12.0, 260.0, 1.0, 600.0)
            },
            builtin(WeaponKind::IceShard, Rarity::Rare, 6.0, 170.0, 1.2, 450.0),
            builtin(WeaponKind::RootAccess, Rarity::Epic, 9.0, 200.0, 1.0, 500.0),
            builtin(WeaponKind::ForkBomb, Rarity::Epic, 16.0, 190.0, 0.7, 350.0),
            builtin(WeaponKind::Overflow, Rarity::Epic, 5.0, 150.0, 1.0, 380.0),
            WeaponDefinition {
                hitscan: true,
                homing: false,
                ..builtin(WeaponKind::NullPointer, Rarity::Legendary, 60.0, 300.0, 0.4, 0.0)
            },
        ];

        Self {
            weapons: definitions
                .into_iter()
                .map(|definition| (definition.id.clone(), definition))
                .collect(),
        }
    }
}

impl Default for BuiltinContent {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentLibrary for BuiltinContent {
    fn weapon(&self, id: &WeaponId) -> Option<&WeaponDefinition> {
        self.weapons.get(id)
    }

    fn weapons(&self) -> Vec<&WeaponDefinition> {
        self.weapons.values().collect()
    }
}

fn builtin(
    kind: WeaponKind,
    rarity: Rarity,
    base_damage: f32,
    range: f32,
    attack_rate: f32,
    projectile_speed: f32,
) -> WeaponDefinition {
    WeaponDefinition {
        id: kind.id(),
        kind,
        rarity,
        base_damage,
        range,
        attack_rate,
        projectile_speed,
        homing: true,
        splash_radius: None,
        pierce: 1,
        hitscan: false,
    }
}

/// Identifier of an arena sector in the unlock graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectorId(u32);

impl SectorId {
    /// Creates a sector identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Hostile families that path toward the objective.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HostileKind {
    /// Baseline hostile.
    Packet,
    /// Fast, fragile hostile.
    Worm,
    /// Slow, durable hostile.
    Trojan,
    /// Rare elite that drains efficiency while alive.
    ZeroDay,
    /// Encounter boss spawned when the player engages a sector encounter.
    SectorBoss,
}

impl HostileKind {
    /// Sector that must be unlocked before the spawn policy emits this kind.
    ///
    /// Elites are gated by their own rules and report `None`.
    #[must_use]
    pub const fn unlocked_by(self) -> Option<SectorId> {
        match self {
            Self::Packet => Some(SectorId::new(0)),
            Self::Worm => Some(SectorId::new(1)),
            Self::Trojan => Some(SectorId::new(2)),
            Self::ZeroDay | Self::SectorBoss => None,
        }
    }

    /// Base statistics before threat scaling.
    #[must_use]
    pub const fn profile(self) -> HostileProfile {
        match self {
            Self::Packet => HostileProfile::new(30.0, 60.0, 5.0, 1.0, 12.0),
            Self::Worm => HostileProfile::new(20.0, 110.0, 6.0, 1.0, 9.0),
            Self::Trojan => HostileProfile::new(120.0, 40.0, 15.0, 2.0, 16.0),
            Self::ZeroDay => HostileProfile::new(800.0, 30.0, 0.0, 5.0, 20.0),
            Self::SectorBoss => HostileProfile::new(2_000.0, 25.0, 250.0, 8.0, 26.0),
        }
    }
}

/// Base statistics of a hostile kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HostileProfile {
    /// Health at threat level zero.
    pub health: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Hash credited on defeat.
    pub reward: f64,
    /// Leak counter increase when the hostile reaches the objective.
    pub leak_damage: f32,
    /// Collision radius.
    pub radius: f32,
}

impl HostileProfile {
    const fn new(health: f32, speed: f32, reward: f64, leak_damage: f32, radius: f32) -> Self {
        Self {
            health,
            speed,
            reward,
            leak_damage,
            radius,
        }
    }
}
