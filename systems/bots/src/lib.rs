#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Built-in bot strategies for both simulation loops and a registry that
//! resolves them by name.
//!
//! Every strategy is a stateless unit struct: it reads the state handed to it
//! and returns one action.

mod defence;
mod encounter;

use kernel_defence_defence_loop::DefenceStrategy;
use kernel_defence_encounter::EncounterStrategy;

pub use defence::{Greedy, Panic, Passive, ReserveAware, Spread};
pub use encounter::{Aggressive, Kiting, PhaseAware, StandingStill};

/// Names accepted by [`defence_strategy`], in display order.
pub const DEFENCE_STRATEGIES: [&str; 5] = ["passive", "greedy", "spread", "reserve-aware", "panic"];

/// Names accepted by [`encounter_strategy`], in display order.
pub const ENCOUNTER_STRATEGIES: [&str; 4] =
    ["standing-still", "aggressive", "kiting", "phase-aware"];

/// Resolves a defence strategy by name.
#[must_use]
pub fn defence_strategy(name: &str) -> Option<Box<dyn DefenceStrategy>> {
    let strategy: Box<dyn DefenceStrategy> = match name {
        "passive" => Box::new(Passive),
        "greedy" => Box::new(Greedy),
        "spread" => Box::new(Spread),
        "reserve-aware" => Box::new(ReserveAware),
        "panic" => Box::new(Panic),
        _ => return None,
    };
    Some(strategy)
}

/// Resolves an encounter strategy by name.
#[must_use]
pub fn encounter_strategy(name: &str) -> Option<Box<dyn EncounterStrategy>> {
    let strategy: Box<dyn EncounterStrategy> = match name {
        "standing-still" => Box::new(StandingStill),
        "aggressive" => Box::new(Aggressive),
        "kiting" => Box::new(Kiting),
        "phase-aware" => Box::new(PhaseAware),
        _ => return None,
    };
    Some(strategy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_registered_name_resolves_to_itself() {
        for name in DEFENCE_STRATEGIES {
            let strategy = defence_strategy(name).expect("registered defence strategy");
            assert_eq!(strategy.name(), name);
        }
        for name in ENCOUNTER_STRATEGIES {
            let strategy = encounter_strategy(name).expect("registered encounter strategy");
            assert_eq!(strategy.name(), name);
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!(defence_strategy("hoarder").is_none());
        assert!(encounter_strategy("").is_none());
    }
}
