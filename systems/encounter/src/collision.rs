//! Hazard and contact collisions against the avatar.

use kernel_defence_core::geometry::{
    point_segment_distance, segment_circle_entry, unit_from_angle, Vec2,
};

use crate::{
    hazards::{Beam, Hazard, HazardKind},
    state::AVATAR_RADIUS,
};

/// Circle that damages the avatar on touch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Contact {
    pub(crate) kind: HazardKind,
    pub(crate) position: Vec2,
    pub(crate) radius: f32,
    pub(crate) damage: f32,
}

/// Damage the avatar took from one source this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Hit {
    pub(crate) kind: HazardKind,
    pub(crate) damage: f32,
    /// Persistent sources are rate limited per kind; shots are consumed instead.
    pub(crate) persistent: bool,
}

/// Displacement applied to the avatar by every well this tick.
pub(crate) fn pull(avatar: Vec2, hazards: &[Hazard], dt: f32) -> Vec2 {
    hazards
        .iter()
        .filter_map(|hazard| match hazard {
            Hazard::Well(well) => Some(well),
            _ => None,
        })
        .fold(Vec2::ZERO, |total, well| {
            let offset = well.center - avatar;
            let distance = offset.length();
            if distance <= f32::EPSILON {
                return total;
            }
            total + offset / distance * (well.pull * dt).min(distance)
        })
}

/// Collects hazard hits at `avatar`, removing the shots that connect.
pub(crate) fn hazard_hits(avatar: Vec2, hazards: &mut Vec<Hazard>, hits: &mut Vec<Hit>) {
    hazards.retain(|hazard| match hazard {
        Hazard::Zone(zone) => {
            if zone.is_active() && avatar.distance(zone.center) <= zone.radius + AVATAR_RADIUS {
                hits.push(Hit {
                    kind: zone.kind,
                    damage: zone.damage,
                    persistent: true,
                });
            }
            true
        }
        Hazard::Beam(beam) => {
            if beam_touches(beam, avatar) {
                hits.push(Hit {
                    kind: beam.kind,
                    damage: beam.damage,
                    persistent: true,
                });
            }
            true
        }
        Hazard::Well(well) => {
            if let Some(damage) = well.damage {
                if avatar.distance(well.center) <= well.core_radius + AVATAR_RADIUS {
                    hits.push(Hit {
                        kind: well.kind,
                        damage,
                        persistent: true,
                    });
                }
            }
            true
        }
        Hazard::Shot(shot) => {
            let connected =
                segment_circle_entry(shot.previous, shot.position, avatar, shot.radius + AVATAR_RADIUS)
                    .is_some();
            if connected {
                hits.push(Hit {
                    kind: shot.kind,
                    damage: shot.damage,
                    persistent: false,
                });
            }
            !connected
        }
    });
}

/// Collects contact hits at `avatar`.
pub(crate) fn contact_hits(avatar: Vec2, contacts: &[Contact], hits: &mut Vec<Hit>) {
    hits.extend(
        contacts
            .iter()
            .filter(|contact| avatar.distance(contact.position) <= contact.radius + AVATAR_RADIUS)
            .map(|contact| Hit {
                kind: contact.kind,
                damage: contact.damage,
                persistent: true,
            }),
    );
}

/// Reports whether the beam touched `point` at either end of this tick's sweep
/// or anywhere in the wedge it swept between them.
fn beam_touches(beam: &Beam, point: Vec2) -> bool {
    let reach = beam.half_width + AVATAR_RADIUS;
    let (start, end) = beam.segment_at(beam.angle);
    if point_segment_distance(point, start, end) <= reach {
        return true;
    }
    let (start, end) = beam.segment_at(beam.previous_angle);
    if point_segment_distance(point, start, end) <= reach {
        return true;
    }

    let offset = point - beam.pivot;
    let radial = offset.length();
    if radial < beam.inner - reach || radial > beam.outer + reach {
        return false;
    }
    let (from, to) = if beam.angle >= beam.previous_angle {
        (beam.previous_angle, beam.angle)
    } else {
        (beam.angle, beam.previous_angle)
    };
    within_wedge(unit_from_angle(from), unit_from_angle(to), offset)
}

fn within_wedge(first: Vec2, last: Vec2, offset: Vec2) -> bool {
    first.perp_dot(offset) >= 0.0 && offset.perp_dot(last) >= 0.0 && offset.dot(first + last) > 0.0
}
