use kernel_defence_core::{
    Command, Event, HostileKind, Progression, Scenario, SimulationContext, SlotId, WeaponKind,
};
use kernel_defence_system_tower_combat::TowerCombat;
use kernel_defence_system_tower_targeting::TowerTargeting;
use kernel_defence_world::{self as world, query, World, WorldConfig};

fn armed_world() -> World {
    let mut progression = Progression::with_compiled(&[WeaponKind::NullPointer]);
    progression.starting_hash = 1_000.0;
    let mut world = World::new(
        SimulationContext::builtin(),
        &progression,
        &WorldConfig::new(21, Scenario::Standard),
    )
    .expect("default configuration is valid");

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::PlaceTower {
            weapon: WeaponKind::NullPointer.id(),
            slot: SlotId::new(0),
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::SpawnHostile {
            kind: HostileKind::Packet,
        },
        &mut events,
    );
    world
}

fn fire_round(
    world: &mut World,
    targeting: &mut TowerTargeting,
    combat: &mut TowerCombat,
) -> (Vec<Command>, Vec<Event>) {
    let towers = query::tower_view(world);
    let mut targets = Vec::new();
    targeting.handle(&towers, &query::hostile_view(world), &mut targets);

    let mut commands = Vec::new();
    combat.handle(&towers, &targets, &mut commands);

    let mut events = Vec::new();
    for command in commands.clone() {
        world::apply(world, command, &mut events);
    }
    world::apply(world, Command::Cleanup, &mut events);
    (commands, events)
}

#[test]
fn ready_tower_fires_on_its_target() {
    let mut world = armed_world();
    let mut targeting = TowerTargeting::new();
    let mut combat = TowerCombat::new();

    let (commands, events) = fire_round(&mut world, &mut targeting, &mut combat);

    assert_eq!(commands.len(), 1);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::HostileKilled { kind: HostileKind::Packet, .. })));
    assert!(query::hostile_view(&world).is_empty());
}

#[test]
fn cooling_tower_holds_fire() {
    let mut world = armed_world();
    let mut targeting = TowerTargeting::new();
    let mut combat = TowerCombat::new();
    let _ = fire_round(&mut world, &mut targeting, &mut combat);

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SpawnHostile {
            kind: HostileKind::Packet,
        },
        &mut events,
    );
    let (commands, _) = fire_round(&mut world, &mut targeting, &mut combat);
    assert!(commands.is_empty());

    let mut events = Vec::new();
    world::apply(&mut world, Command::Tick { dt: 3.0 }, &mut events);
    world::apply(&mut world, Command::TickPassives { dt: 3.0 }, &mut events);
    let (commands, _) = fire_round(&mut world, &mut targeting, &mut combat);
    assert_eq!(commands.len(), 1);
}
