#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement system that advances hostiles along the lane.

use kernel_defence_core::{Command, Event, HostileView};

/// Pure system that reacts to time events and emits lane advancement commands.
#[derive(Debug, Default)]
pub struct Movement {
    scratch: Vec<Command>,
}

impl Movement {
    /// Consumes world events and the hostile view to emit movement commands.
    ///
    /// Each live hostile travels `speed * speed_factor * dt`. Stunned
    /// hostiles report a zero factor and receive no command.
    pub fn handle(&mut self, events: &[Event], hostile_view: &HostileView, out: &mut Vec<Command>) {
        let dt: f32 = events
            .iter()
            .filter_map(|event| match event {
                Event::TimeAdvanced { dt } => Some(*dt),
                _ => None,
            })
            .sum();
        if dt <= 0.0 {
            return;
        }

        self.scratch.clear();
        for hostile in hostile_view.iter() {
            if hostile.health <= 0.0 {
                continue;
            }
            let distance = hostile.speed * hostile.speed_factor * dt;
            if distance <= 0.0 {
                continue;
            }
            self.scratch.push(Command::AdvanceHostile {
                hostile: hostile.id,
                distance,
            });
        }
        out.append(&mut self.scratch);
    }
}
