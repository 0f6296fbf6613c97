use kernel_defence_core::{
    Command, Event, HostileId, HostileKind, Progression, RejectionReason, Scenario,
    SimulationContext, SlotId, TowerId, WeaponId, WeaponKind,
};
use kernel_defence_world::{self as world, query, World, WorldConfig, WorldSnapshot};

fn world_with(progression: &Progression) -> World {
    World::new(
        SimulationContext::builtin(),
        progression,
        &WorldConfig::new(7, Scenario::Standard),
    )
    .expect("default configuration is valid")
}

fn rich(kinds: &[WeaponKind]) -> Progression {
    let mut progression = Progression::with_compiled(kinds);
    progression.starting_hash = 1_000.0;
    progression
}

fn apply(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    events
}

fn run_stages(world: &mut World, dt: f32) -> Vec<Event> {
    let mut events = Vec::new();
    for command in [
        Command::Tick { dt },
        Command::TickPassives { dt },
        Command::ResolveObjective,
        Command::AdvanceProjectiles { dt },
        Command::ResolveCollisions,
        Command::TickStatusEffects { dt },
        Command::Cleanup,
        Command::TickEconomy { dt },
    ] {
        world::apply(world, command, &mut events);
    }
    events
}

fn rejection(events: &[Event]) -> Option<RejectionReason> {
    events.iter().find_map(|event| match event {
        Event::ActionRejected { reason } => Some(*reason),
        _ => None,
    })
}

fn place(weapon: WeaponKind, slot: u32) -> Command {
    Command::PlaceTower {
        weapon: weapon.id(),
        slot: SlotId::new(slot),
    }
}

#[test]
fn placing_a_tower_spends_hash_and_binds_the_slot() {
    let mut world = world_with(&Progression::with_compiled(&[WeaponKind::KernelPulse]));
    let events = apply(&mut world, place(WeaponKind::KernelPulse, 3));

    assert!(events.iter().any(|event| matches!(
        event,
        Event::TowerPlaced { tower, slot, weapon: WeaponKind::KernelPulse }
            if *tower == TowerId::new(0) && *slot == SlotId::new(3)
    )));
    assert!((query::hash(&world) - 100.0).abs() < 1e-9);
    assert_eq!(query::slots(&world)[3].occupant, Some(TowerId::new(0)));
    assert!((query::power_draw(&world) - 10.0).abs() < 1e-6);
}

#[test]
fn invalid_placements_are_rejected_without_side_effects() {
    let mut world = world_with(&Progression::with_compiled(&[WeaponKind::KernelPulse]));

    let unknown = Command::PlaceTower {
        weapon: WeaponId::new("quantum_toaster"),
        slot: SlotId::new(0),
    };
    assert_eq!(
        rejection(&apply(&mut world, unknown)),
        Some(RejectionReason::UnknownWeapon)
    );
    assert_eq!(
        rejection(&apply(&mut world, place(WeaponKind::IceShard, 0))),
        Some(RejectionReason::WeaponNotCompiled)
    );
    assert_eq!(
        rejection(&apply(&mut world, place(WeaponKind::KernelPulse, 999))),
        Some(RejectionReason::UnknownSlot)
    );

    assert_eq!(rejection(&apply(&mut world, place(WeaponKind::KernelPulse, 0))), None);
    assert_eq!(
        rejection(&apply(&mut world, place(WeaponKind::KernelPulse, 0))),
        Some(RejectionReason::SlotOccupied)
    );
    assert_eq!(rejection(&apply(&mut world, place(WeaponKind::KernelPulse, 1))), None);
    assert_eq!(rejection(&apply(&mut world, place(WeaponKind::KernelPulse, 2))), None);
    assert_eq!(
        rejection(&apply(&mut world, place(WeaponKind::KernelPulse, 4))),
        Some(RejectionReason::InsufficientFunds)
    );

    assert_eq!(query::tower_view(&world).len(), 3);
    assert!(query::hash(&world).abs() < 1e-9);
}

#[test]
fn power_budget_caps_placement_before_funds() {
    let mut world = world_with(&rich(&[WeaponKind::NullPointer]));
    assert_eq!(rejection(&apply(&mut world, place(WeaponKind::NullPointer, 0))), None);
    assert_eq!(rejection(&apply(&mut world, place(WeaponKind::NullPointer, 1))), None);
    assert_eq!(
        rejection(&apply(&mut world, place(WeaponKind::NullPointer, 2))),
        Some(RejectionReason::PowerBudgetExceeded)
    );
    assert!(query::power_draw(&world) <= query::power_capacity(&world));
}

#[test]
fn selling_refunds_half_the_investment_and_frees_the_slot() {
    let mut world = world_with(&Progression::with_compiled(&[WeaponKind::KernelPulse]));
    let _ = apply(&mut world, place(WeaponKind::KernelPulse, 5));
    let events = apply(
        &mut world,
        Command::SellTower {
            tower: TowerId::new(0),
        },
    );

    assert!(events
        .iter()
        .any(|event| matches!(event, Event::TowerSold { refund, .. } if (*refund - 25.0).abs() < 1e-9)));
    assert!((query::hash(&world) - 125.0).abs() < 1e-9);
    assert!(query::free_slots(&world).contains(&SlotId::new(5)));
    assert!(query::tower_view(&world).is_empty());
    assert_eq!(
        rejection(&apply(
            &mut world,
            Command::SellTower {
                tower: TowerId::new(0)
            }
        )),
        Some(RejectionReason::UnknownTower)
    );
}

#[test]
fn upgrades_stop_at_the_maximum_level() {
    let mut progression = rich(&[WeaponKind::KernelPulse]);
    let _ = progression
        .weapon_levels
        .insert(WeaponKind::KernelPulse.id(), 9);
    let mut world = world_with(&progression);
    let _ = apply(&mut world, place(WeaponKind::KernelPulse, 0));
    let tower = TowerId::new(0);

    assert_eq!(query::upgrade_cost(&world, tower), Some(337.5));
    let events = apply(&mut world, Command::UpgradeTower { tower });
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::TowerUpgraded { level: 10, .. })));
    assert_eq!(query::upgrade_cost(&world, tower), None);
    assert_eq!(
        rejection(&apply(&mut world, Command::UpgradeTower { tower })),
        Some(RejectionReason::MaxLevel)
    );
    assert_eq!(query::stats(&world).peak_tower_level, 10);
}

#[test]
fn overclock_expires_and_then_cools_down() {
    let mut world = world_with(&Progression::fresh());
    let started = apply(&mut world, Command::ActivateOverclock);
    assert!(started
        .iter()
        .any(|event| matches!(event, Event::OverclockStarted { .. })));
    assert_eq!(
        rejection(&apply(&mut world, Command::ActivateOverclock)),
        Some(RejectionReason::OverclockUnavailable)
    );

    let mut expired = false;
    for _ in 0..25 {
        expired |= run_stages(&mut world, 1.0)
            .iter()
            .any(|event| matches!(event, Event::OverclockExpired));
    }
    assert!(expired);
    assert!(matches!(
        query::overclock_status(&world),
        query::OverclockStatus::CoolingDown { .. }
    ));
    assert_eq!(
        rejection(&apply(&mut world, Command::ActivateOverclock)),
        Some(RejectionReason::OverclockUnavailable)
    );
}

#[test]
fn encounters_are_offered_on_schedule_and_spawn_a_sector_boss() {
    let mut world = world_with(&Progression::fresh());
    assert_eq!(
        rejection(&apply(&mut world, Command::EngageEncounter)),
        Some(RejectionReason::NoPendingEncounter)
    );

    let mut offered_at = None;
    for _ in 0..130 {
        let events = run_stages(&mut world, 1.0);
        if events
            .iter()
            .any(|event| matches!(event, Event::EncounterOffered { .. }))
        {
            offered_at = Some(query::clock(&world));
            break;
        }
    }
    assert_eq!(offered_at, Some(120.0));

    let events = apply(&mut world, Command::EngageEncounter);
    assert!(events.contains(&Event::EncounterEngaged));
    assert!(events.iter().any(|event| matches!(
        event,
        Event::HostileSpawned {
            kind: HostileKind::SectorBoss,
            ..
        }
    )));
    assert_eq!(query::pending_encounter(&world), None);
    assert_eq!(query::stats(&world).encounters_engaged, 1);
}

#[test]
fn unanswered_encounter_offers_lapse() {
    let mut world = world_with(&Progression::fresh());
    let mut lapsed = false;
    for _ in 0..150 {
        lapsed |= run_stages(&mut world, 1.0).contains(&Event::EncounterSkipped);
    }
    assert!(lapsed);
    assert_eq!(query::pending_encounter(&world), None);
}

#[test]
fn arriving_hostiles_raise_the_leak_counter() {
    let mut world = world_with(&Progression::fresh());
    let _ = apply(
        &mut world,
        Command::SpawnHostile {
            kind: HostileKind::Packet,
        },
    );
    let _ = apply(
        &mut world,
        Command::AdvanceHostile {
            hostile: HostileId::new(0),
            distance: 10_000.0,
        },
    );
    let events = apply(&mut world, Command::ResolveObjective);

    assert!(events
        .iter()
        .any(|event| matches!(event, Event::HostileLeaked { leak, .. } if (*leak - 1.0).abs() < 1e-6)));
    assert!((query::leak(&world) - 1.0).abs() < 1e-6);
    assert!(query::hostile_view(&world).is_empty());
    assert_eq!(query::stats(&world).leaks, 1);
}

#[test]
fn a_saturated_leak_counter_freezes_and_recovers() {
    let mut world = world_with(&Progression::fresh());
    for index in 0..20 {
        let _ = apply(
            &mut world,
            Command::SpawnHostile {
                kind: HostileKind::Packet,
            },
        );
        let _ = apply(
            &mut world,
            Command::AdvanceHostile {
                hostile: HostileId::new(index),
                distance: 10_000.0,
            },
        );
    }
    let _ = apply(&mut world, Command::ResolveObjective);
    assert_eq!(query::efficiency(&world), 0.0);

    let events = run_stages(&mut world, 0.1);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::FreezeTriggered { .. })));
    assert!(query::efficiency(&world) > 0.0);
    assert_eq!(query::stats(&world).freezes, 1);
    assert!(query::stats(&world).first_freeze_at.is_some());
}

#[test]
fn hitscan_kill_credits_the_reward() {
    let mut world = world_with(&rich(&[WeaponKind::NullPointer]));
    let _ = apply(&mut world, place(WeaponKind::NullPointer, 0));
    let _ = apply(
        &mut world,
        Command::SpawnHostile {
            kind: HostileKind::Packet,
        },
    );
    let hash_before = query::hash(&world);
    let fire = Command::FireAt {
        tower: TowerId::new(0),
        hostile: HostileId::new(0),
    };
    let _ = apply(&mut world, fire.clone());
    let events = apply(&mut world, Command::Cleanup);

    assert!(events.iter().any(|event| matches!(
        event,
        Event::HostileKilled { reward, kind: HostileKind::Packet, .. } if (*reward - 5.0).abs() < 1e-9
    )));
    assert!((query::hash(&world) - hash_before - 5.0).abs() < 1e-9);
    assert_eq!(query::stats(&world).kills, 1);
    assert_eq!(
        rejection(&apply(&mut world, fire)),
        Some(RejectionReason::TowerNotReady)
    );
}

#[test]
fn projectiles_travel_and_hit_their_target() {
    let mut world = world_with(&Progression::with_compiled(&[WeaponKind::KernelPulse]));
    let _ = apply(&mut world, place(WeaponKind::KernelPulse, 0));
    let _ = apply(
        &mut world,
        Command::SpawnHostile {
            kind: HostileKind::Packet,
        },
    );
    let slot_progress = query::lane_length(&world) / query::slot_count(&world) as f32 / 2.0;
    let _ = apply(
        &mut world,
        Command::AdvanceHostile {
            hostile: HostileId::new(0),
            distance: slot_progress,
        },
    );
    let _ = apply(
        &mut world,
        Command::FireAt {
            tower: TowerId::new(0),
            hostile: HostileId::new(0),
        },
    );
    assert_eq!(query::projectile_count(&world), 1);

    for _ in 0..20 {
        let _ = apply(&mut world, Command::AdvanceProjectiles { dt: 0.05 });
        let _ = apply(&mut world, Command::ResolveCollisions);
    }

    let hostile = *query::hostile_view(&world)
        .iter()
        .next()
        .expect("hostile survives one shot");
    assert!((hostile.health - 20.0).abs() < 1e-4);
    assert_eq!(query::projectile_count(&world), 0);
}

#[test]
fn snapshot_resume_matches_uninterrupted_run() {
    let progression = rich(&[WeaponKind::KernelPulse, WeaponKind::IceShard]);
    let script = |world: &mut World, tick: u32| {
        if tick % 20 == 0 {
            let _ = apply(
                world,
                Command::SpawnHostile {
                    kind: HostileKind::Packet,
                },
            );
        }
        if tick == 5 {
            let _ = apply(world, place(WeaponKind::IceShard, 0));
            let _ = apply(world, place(WeaponKind::KernelPulse, 1));
        }
        let hostiles: Vec<_> = query::hostile_view(world).iter().copied().collect();
        for hostile in &hostiles {
            let _ = apply(
                world,
                Command::AdvanceHostile {
                    hostile: hostile.id,
                    distance: hostile.speed * hostile.speed_factor * 0.1,
                },
            );
        }
        let towers: Vec<_> = query::tower_view(world).iter().copied().collect();
        for tower in towers.iter().filter(|tower| tower.ready_in <= 0.0) {
            if let Some(target) = hostiles
                .iter()
                .find(|hostile| hostile.position.distance(tower.position) <= tower.range)
            {
                let _ = apply(
                    world,
                    Command::FireAt {
                        tower: tower.id,
                        hostile: target.id,
                    },
                );
            }
        }
        let _ = run_stages(world, 0.1);
    };

    let mut uninterrupted = world_with(&progression);
    for tick in 0..400 {
        script(&mut uninterrupted, tick);
    }

    let mut first_half = world_with(&progression);
    for tick in 0..200 {
        script(&mut first_half, tick);
    }
    let bytes = bincode::serialize(&first_half.snapshot()).expect("serialize");
    let snapshot: WorldSnapshot = bincode::deserialize(&bytes).expect("deserialize");
    let mut resumed = World::restore(snapshot, SimulationContext::builtin());
    for tick in 200..400 {
        script(&mut resumed, tick);
    }

    assert_eq!(query::stats(&resumed), query::stats(&uninterrupted));
    assert_eq!(
        format!("{:?}", query::hostile_view(&resumed)),
        format!("{:?}", query::hostile_view(&uninterrupted))
    );
    assert_eq!(query::hash(&resumed), query::hash(&uninterrupted));
}
