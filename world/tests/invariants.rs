use std::collections::BTreeSet;

use kernel_defence_core::{
    Command, HostileId, HostileKind, Progression, Scenario, SimulationContext, SlotId, TowerId,
    WeaponKind,
};
use kernel_defence_world::{self as world, query, World, WorldConfig};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Step {
    Place { weapon: usize, slot: u32 },
    Upgrade { tower: u32 },
    Sell { tower: u32 },
    Spawn { kind: usize },
    Fire { tower: u32, hostile: u32 },
    Overclock,
    Tick { dt: f32 },
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0..WeaponKind::ALL.len(), 0u32..16)
            .prop_map(|(weapon, slot)| Step::Place { weapon, slot }),
        (0u32..12).prop_map(|tower| Step::Upgrade { tower }),
        (0u32..12).prop_map(|tower| Step::Sell { tower }),
        (0usize..3).prop_map(|kind| Step::Spawn { kind }),
        (0u32..12, 0u32..40).prop_map(|(tower, hostile)| Step::Fire { tower, hostile }),
        Just(Step::Overclock),
        (0.01f32..2.0).prop_map(|dt| Step::Tick { dt }),
    ]
}

fn commands(step: Step) -> Vec<Command> {
    const KINDS: [HostileKind; 3] = [HostileKind::Packet, HostileKind::Worm, HostileKind::Trojan];
    match step {
        Step::Place { weapon, slot } => vec![Command::PlaceTower {
            weapon: WeaponKind::ALL[weapon].id(),
            slot: SlotId::new(slot),
        }],
        Step::Upgrade { tower } => vec![Command::UpgradeTower {
            tower: TowerId::new(tower),
        }],
        Step::Sell { tower } => vec![Command::SellTower {
            tower: TowerId::new(tower),
        }],
        Step::Spawn { kind } => vec![Command::SpawnHostile { kind: KINDS[kind] }],
        Step::Fire { tower, hostile } => vec![Command::FireAt {
            tower: TowerId::new(tower),
            hostile: HostileId::new(hostile),
        }],
        Step::Overclock => vec![Command::ActivateOverclock],
        Step::Tick { dt } => vec![
            Command::Tick { dt },
            Command::TickPassives { dt },
            Command::ResolveObjective,
            Command::AdvanceProjectiles { dt },
            Command::ResolveCollisions,
            Command::TickStatusEffects { dt },
            Command::Cleanup,
            Command::TickEconomy { dt },
        ],
    }
}

fn assert_invariants(world: &World, after_tick: bool) {
    assert!(query::hash(world) <= query::storage(world) + 1e-9);
    assert!(query::hash(world) >= 0.0);
    assert!(query::power_draw(world) <= query::power_capacity(world) + 1e-4);

    let efficiency = query::efficiency(world);
    assert!((0.0..=100.0).contains(&efficiency));

    let towers = query::tower_view(world);
    let slots = query::slots(world);
    let occupied: Vec<TowerId> = slots.iter().filter_map(|slot| slot.occupant).collect();
    let unique: BTreeSet<TowerId> = occupied.iter().copied().collect();
    assert_eq!(occupied.len(), towers.len(), "occupied slots must match live towers");
    assert_eq!(unique.len(), occupied.len(), "a tower is bound to two slots");
    for tower in towers.iter() {
        assert_eq!(slots[tower.slot.get() as usize].occupant, Some(tower.id));
    }
    if after_tick {
        assert!(query::status_entry_count(world) <= query::hostile_view(world).len());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn resource_and_slot_invariants_hold(steps in prop::collection::vec(step(), 1..120)) {
        let mut progression = Progression::with_compiled(&WeaponKind::ALL);
        progression.starting_hash = 800.0;
        let mut world = World::new(
            SimulationContext::builtin(),
            &progression,
            &WorldConfig::new(99, Scenario::Standard),
        )
        .expect("default configuration is valid");

        for step in steps {
            let after_tick = matches!(step, Step::Tick { .. });
            for command in commands(step) {
                let mut events = Vec::new();
                world::apply(&mut world, command, &mut events);
            }
            assert_invariants(&world, after_tick);
        }
    }
}
