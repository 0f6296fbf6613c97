//! Tower fire, projectile flight and hit resolution.

use std::mem;

use kernel_defence_core::{
    geometry::{rotate, segment_circle_entry, steer_toward, Vec2},
    BalanceConfig, Event, HostileId, HostileKind, OnHitEffect, RejectionReason, TowerId,
};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{towers::TowerState, WorldState};

/// Radians per second a homing projectile may turn.
const HOMING_TURN_RATE: f32 = 6.0;

/// Collision radius of a projectile.
const PROJECTILE_RADIUS: f32 = 4.0;

/// Lifetime of a projectile relative to the time it needs to cross its range.
const LIFETIME_FACTOR: f32 = 2.0;

/// Angle between neighbouring split children.
const SPLIT_SPREAD: f32 = 0.5;

/// Seconds a split child stays alive.
const CHILD_LIFETIME: f32 = 0.6;

/// Speed given to children of hitscan shots.
const CHILD_SPEED: f32 = 300.0;

/// Hostile walking the lane.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Hostile {
    pub(crate) id: HostileId,
    pub(crate) kind: HostileKind,
    pub(crate) position: Vec2,
    pub(crate) health: f32,
    pub(crate) max_health: f32,
    pub(crate) progress: f32,
    pub(crate) speed: f32,
    pub(crate) reward: f64,
    pub(crate) leak_damage: f32,
    pub(crate) radius: f32,
    pub(crate) reached_objective: bool,
}

impl Hostile {
    /// Alive and still on the lane.
    pub(crate) fn is_live(&self) -> bool {
        self.health > 0.0 && !self.reached_objective
    }
}

/// Projectile in flight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Projectile {
    position: Vec2,
    previous: Vec2,
    velocity: Vec2,
    lifetime: f32,
    damage: f32,
    target: Option<HostileId>,
    splash_radius: Option<f32>,
    pierce: u32,
    child: bool,
    effect: OnHitEffect,
    struck: Vec<HostileId>,
}

/// Damage packet shared by projectile and hitscan hits.
#[derive(Clone, Copy, Debug)]
struct Hit {
    damage: f32,
    splash_radius: Option<f32>,
    effect: OnHitEffect,
    child: bool,
}

impl WorldState {
    /// Effective targeting range of `tower`.
    pub(crate) fn effective_range(&self, tower: &TowerState, balance: &BalanceConfig) -> f32 {
        tower.definition.range
            * balance.protocol_scaling.range_multiplier(tower.level)
            * self.limits.range_multiplier
    }

    fn overclock_active(&self) -> bool {
        self.overclock
            .active_until
            .map_or(false, |until| self.clock < until)
    }

    pub(crate) fn fire_at(
        &mut self,
        tower: TowerId,
        hostile: HostileId,
        balance: &BalanceConfig,
        out_events: &mut Vec<Event>,
    ) {
        let Some(state) = self.towers.get(tower) else {
            reject(RejectionReason::UnknownTower, out_events);
            return;
        };
        if state.cooldown > 0.0 {
            reject(RejectionReason::TowerNotReady, out_events);
            return;
        }
        let Some(target) = self.hostiles.get(&hostile).filter(|target| target.is_live()) else {
            reject(RejectionReason::UnknownHostile, out_events);
            return;
        };

        let definition = &state.definition;
        let scaling = &balance.protocol_scaling;
        let damage = definition.base_damage
            * scaling.damage_multiplier(state.level)
            * self.limits.damage_multiplier;
        let boost = if self.overclock_active() {
            balance.overclock.attack_rate_multiplier
        } else {
            1.0
        };
        let rate = definition.attack_rate * scaling.fire_rate_multiplier(state.level) * boost;
        let cooldown = if rate > 0.0 { 1.0 / rate } else { f32::MAX };
        let origin = self.slots.position(state.slot).unwrap_or(target.position);
        let aim = target.position;
        let speed = definition.projectile_speed * self.limits.projectile_speed_multiplier;
        let range = self.effective_range(state, balance);
        let hit = Hit {
            damage,
            splash_radius: definition.splash_radius,
            effect: definition.on_hit(),
            child: false,
        };
        let hitscan = definition.hitscan || speed <= 0.0;
        let homing = definition.homing;
        let pierce = definition.pierce.max(1);

        if let Some(state) = self.towers.get_mut(tower) {
            state.cooldown = cooldown;
        }
        out_events.push(Event::TowerFired { tower, hostile });

        let heading = (aim - origin).normalize_or_zero();
        let heading = if heading == Vec2::ZERO { Vec2::Y } else { heading };
        if hitscan {
            self.land_hit(hostile, aim, heading * CHILD_SPEED, hit);
            return;
        }

        self.projectiles.push(Projectile {
            position: origin,
            previous: origin,
            velocity: heading * speed,
            lifetime: LIFETIME_FACTOR * range / speed,
            damage: hit.damage,
            target: homing.then_some(hostile),
            splash_radius: hit.splash_radius,
            pierce,
            child: false,
            effect: hit.effect,
            struck: Vec::new(),
        });
    }

    pub(crate) fn advance_projectiles(&mut self, dt: f32) {
        let (min, max) = self.lane.culling_bounds();
        let hostiles = &self.hostiles;
        for projectile in &mut self.projectiles {
            projectile.previous = projectile.position;
            match projectile
                .target
                .and_then(|id| hostiles.get(&id))
                .filter(|target| target.is_live())
            {
                Some(target) => {
                    projectile.velocity = steer_toward(
                        projectile.velocity,
                        target.position - projectile.position,
                        HOMING_TURN_RATE * dt,
                    );
                }
                None => projectile.target = None,
            }
            projectile.position += projectile.velocity * dt;
            projectile.lifetime -= dt;
        }

        self.projectiles.retain(|projectile| {
            projectile.lifetime > 0.0
                && projectile.position.cmpge(min).all()
                && projectile.position.cmple(max).all()
        });
    }

    /// Resolves at most one hit per projectile: the earliest entry along its
    /// swept segment, ties broken by hostile id.
    pub(crate) fn resolve_collisions(&mut self) {
        let in_flight = mem::take(&mut self.projectiles);
        let mut survivors = Vec::with_capacity(in_flight.len());

        for mut projectile in in_flight {
            let earliest = self
                .hostiles
                .values()
                .filter(|hostile| hostile.is_live() && !projectile.struck.contains(&hostile.id))
                .filter_map(|hostile| {
                    segment_circle_entry(
                        projectile.previous,
                        projectile.position,
                        hostile.position,
                        hostile.radius + PROJECTILE_RADIUS,
                    )
                    .map(|t| (t, hostile.id))
                })
                .min_by(|left, right| left.0.total_cmp(&right.0).then(left.1.cmp(&right.1)));

            let Some((t, hostile)) = earliest else {
                survivors.push(projectile);
                continue;
            };

            let impact = projectile.previous.lerp(projectile.position, t);
            self.land_hit(
                hostile,
                impact,
                projectile.velocity,
                Hit {
                    damage: projectile.damage,
                    splash_radius: projectile.splash_radius,
                    effect: projectile.effect,
                    child: projectile.child,
                },
            );
            projectile.struck.push(hostile);
            projectile.pierce = projectile.pierce.saturating_sub(1);
            if projectile.pierce > 0 {
                survivors.push(projectile);
            }
        }

        // Children spawned by split hits were pushed while resolving.
        survivors.append(&mut self.projectiles);
        self.projectiles = survivors;
    }

    /// Applies a hit on `hostile` at `impact`: damage, on-hit effect, splash
    /// and split children.
    fn land_hit(&mut self, hostile: HostileId, impact: Vec2, velocity: Vec2, hit: Hit) {
        self.strike(hostile, hit.damage, hit.effect);

        if let Some(radius) = hit.splash_radius.filter(|radius| *radius > 0.0) {
            let splashed: Vec<(HostileId, f32)> = self
                .hostiles
                .values()
                .filter(|other| other.id != hostile && other.is_live())
                .filter_map(|other| {
                    let distance = other.position.distance(impact);
                    (distance < radius).then(|| (other.id, 1.0 - distance / radius))
                })
                .collect();
            for (other, falloff) in splashed {
                self.strike(other, hit.damage * falloff, OnHitEffect::None);
            }
        }

        if let OnHitEffect::Split {
            children,
            damage_fraction,
        } = hit.effect
        {
            if !hit.child {
                self.spawn_children(hostile, impact, velocity, hit, children, damage_fraction);
            }
        }
    }

    fn spawn_children(
        &mut self,
        parent_target: HostileId,
        impact: Vec2,
        velocity: Vec2,
        hit: Hit,
        children: u32,
        damage_fraction: f32,
    ) {
        let velocity = if velocity.length_squared() > 0.0 {
            velocity
        } else {
            Vec2::Y * CHILD_SPEED
        };
        let centre = (children.saturating_sub(1)) as f32 / 2.0;
        for index in 0..children {
            let angle = (index as f32 - centre) * SPLIT_SPREAD;
            self.projectiles.push(Projectile {
                position: impact,
                previous: impact,
                velocity: rotate(velocity, angle),
                lifetime: CHILD_LIFETIME,
                damage: hit.damage * damage_fraction,
                target: None,
                splash_radius: None,
                pierce: 1,
                child: true,
                effect: hit.effect,
                struck: vec![parent_target],
            });
        }
    }

    /// Deals damage scaled by the target's tag and attaches `effect`.
    pub(crate) fn strike(&mut self, hostile: HostileId, damage: f32, effect: OnHitEffect) {
        let now = self.clock;
        let multiplier = self.status.damage_multiplier(hostile, now);
        let Some(target) = self.hostiles.get_mut(&hostile).filter(|target| target.is_live()) else {
            return;
        };
        let dealt = (damage * multiplier).max(0.0);
        self.stats.damage_dealt += f64::from(dealt.min(target.health));
        target.health -= dealt;

        match effect {
            OnHitEffect::None | OnHitEffect::Split { .. } => {}
            OnHitEffect::Burn {
                pool_fraction,
                duration,
            } => self.status.ignite(hostile, dealt * pool_fraction, duration),
            OnHitEffect::Slow {
                duration,
                factor,
                stun_chance,
                stun_duration,
            } => {
                self.status.slow(hostile, now, duration, factor);
                if self.rng.next_bool(stun_chance) {
                    self.status.stun(hostile, now, stun_duration);
                }
            }
            OnHitEffect::Tag {
                duration,
                damage_bonus,
            } => self.status.tag(hostile, now, duration, damage_bonus),
            OnHitEffect::Mark { duration } => self.status.mark(hostile, now, duration),
        }
    }
}

/// Records a rejected command.
pub(crate) fn reject(reason: RejectionReason, out_events: &mut Vec<Event>) {
    trace!(?reason, "command rejected");
    out_events.push(Event::ActionRejected { reason });
}
