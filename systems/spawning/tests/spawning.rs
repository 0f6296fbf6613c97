use std::collections::BTreeSet;

use kernel_defence_core::{
    BalanceConfig, Command, Event, HostileKind, Progression, Scenario, SectorId,
    SimulationContext,
};
use kernel_defence_system_spawning::{Config, Spawning};
use kernel_defence_world::{self as world, query, World, WorldConfig};

fn tick(dt: f32) -> [Event; 1] {
    [Event::TimeAdvanced { dt }]
}

fn all_sectors() -> Progression {
    let mut progression = Progression::fresh();
    progression.unlocked_sectors = (0..3).map(SectorId::new).collect();
    progression
}

fn spawned_kinds(commands: &[Command]) -> Vec<HostileKind> {
    commands
        .iter()
        .map(|command| match command {
            Command::SpawnHostile { kind } => *kind,
            other => panic!("unexpected command emitted: {other:?}"),
        })
        .collect()
}

#[test]
fn emits_at_most_one_spawn_for_large_dt() {
    let balance = BalanceConfig::default();
    let mut spawning = Spawning::new(Config::new(0x1234_5678, Scenario::Standard));
    let mut commands = Vec::new();
    spawning.handle(&tick(30.0), 0, &Progression::fresh(), false, &balance, &mut commands);
    assert_eq!(commands.len(), 1);

    commands.clear();
    spawning.handle(&tick(0.1), 0, &Progression::fresh(), false, &balance, &mut commands);
    assert_eq!(commands.len(), 1, "carry is capped at one interval");
}

#[test]
fn waits_for_a_full_interval() {
    let balance = BalanceConfig::default();
    let mut spawning = Spawning::new(Config::new(9, Scenario::Standard));
    let mut commands = Vec::new();
    for _ in 0..7 {
        spawning.handle(&tick(0.25), 0, &Progression::fresh(), false, &balance, &mut commands);
    }
    assert!(commands.is_empty());
    spawning.handle(&tick(0.25), 0, &Progression::fresh(), false, &balance, &mut commands);
    assert_eq!(commands.len(), 1);
}

#[test]
fn fresh_profiles_only_spawn_packets() {
    let balance = BalanceConfig::default();
    let mut spawning = Spawning::new(Config::new(3, Scenario::Standard));
    let mut commands = Vec::new();
    for _ in 0..100 {
        spawning.handle(&tick(2.0), 0, &Progression::fresh(), false, &balance, &mut commands);
    }
    assert_eq!(commands.len(), 100);
    assert!(spawned_kinds(&commands)
        .into_iter()
        .all(|kind| kind == HostileKind::Packet));
}

#[test]
fn unlocked_sectors_widen_the_spawn_pool() {
    let balance = BalanceConfig::default();
    let mut spawning = Spawning::new(Config::new(3, Scenario::Standard));
    let mut commands = Vec::new();
    for _ in 0..200 {
        spawning.handle(&tick(2.0), 0, &all_sectors(), false, &balance, &mut commands);
    }
    let kinds: BTreeSet<HostileKind> = spawned_kinds(&commands).into_iter().collect();
    assert_eq!(
        kinds,
        [HostileKind::Packet, HostileKind::Worm, HostileKind::Trojan]
            .into_iter()
            .collect()
    );
}

#[test]
fn locked_pool_spawns_nothing() {
    let balance = BalanceConfig::default();
    let mut progression = Progression::fresh();
    progression.unlocked_sectors.clear();
    let mut spawning = Spawning::new(Config::new(3, Scenario::Standard));
    let mut commands = Vec::new();
    spawning.handle(&tick(5.0), 0, &progression, false, &balance, &mut commands);
    assert!(commands.is_empty());
}

#[test]
fn zero_day_respects_the_threat_gate_and_the_single_elite_rule() {
    let mut balance = BalanceConfig::default();
    balance.zero_day.spawn_chance = 1.0;
    let mut spawning = Spawning::new(Config::new(11, Scenario::Standard));

    let mut commands = Vec::new();
    spawning.handle(&tick(2.0), 3, &Progression::fresh(), false, &balance, &mut commands);
    assert_eq!(spawned_kinds(&commands), vec![HostileKind::Packet]);

    commands.clear();
    spawning.handle(&tick(2.0), 4, &Progression::fresh(), false, &balance, &mut commands);
    assert_eq!(spawned_kinds(&commands), vec![HostileKind::ZeroDay]);

    commands.clear();
    spawning.handle(&tick(2.0), 4, &Progression::fresh(), true, &balance, &mut commands);
    assert_eq!(spawned_kinds(&commands), vec![HostileKind::Packet]);
}

#[test]
fn identical_seeds_replay_identically() {
    let run = |seed: u64| {
        let balance = BalanceConfig::default();
        let mut spawning = Spawning::new(Config::new(seed, Scenario::Onslaught));
        let mut commands = Vec::new();
        for _ in 0..300 {
            spawning.handle(&tick(0.5), 2, &all_sectors(), false, &balance, &mut commands);
        }
        spawned_kinds(&commands)
    };
    assert_eq!(run(42), run(42));
    assert_ne!(run(42), run(43));
}

#[test]
fn spawn_commands_enter_the_world() {
    let mut world = World::new(
        SimulationContext::builtin(),
        &Progression::fresh(),
        &WorldConfig::new(5, Scenario::Standard),
    )
    .expect("default configuration is valid");
    let balance = BalanceConfig::default();
    let mut spawning = Spawning::new(Config::new(5, Scenario::Standard));

    for _ in 0..20 {
        let mut events = Vec::new();
        world::apply(&mut world, Command::Tick { dt: 0.25 }, &mut events);
        let mut commands = Vec::new();
        spawning.handle(
            &events,
            query::threat_level(&world),
            query::progression(&world),
            query::hostile_count(&world, HostileKind::ZeroDay) > 0,
            &balance,
            &mut commands,
        );
        for command in commands {
            world::apply(&mut world, command, &mut events);
        }
    }

    assert_eq!(query::hostile_view(&world).len(), 2);
    assert_eq!(query::stats(&world).hostiles_spawned, 2);
}
