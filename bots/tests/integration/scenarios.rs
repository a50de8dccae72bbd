// tactical_bots_core/bots/tests/integration/scenarios.rs

#[path = "../support/mod.rs"]
mod support;

use rand::rngs::StdRng;
use rand::SeedableRng;

use support::{open_level, test_config, RecordingDamage};
use tactical_bots_core::DamageService;
use tactical_bots_core::core::error::BotError;
use tactical_bots_core::core::services::{Services, WorldQuery};
use tactical_bots_core::core::types::{Aabb, CombatTarget, LevelDescription, Objective, RayHit, Team, TeamSpawn, Vec2, Vec3};
use tactical_bots_core::entities::bot::{Bot, BotState, BotStateKind};
use tactical_bots_core::entities::health::HealthLedger;
use tactical_bots_core::server::events::BotEvent;
use tactical_bots_core::server::game_loop::{MatchRunner, MatchSummary};
use tactical_bots_core::server::instance::BotSubsystem;
use tactical_bots_core::world::map_generator::MapGenerator;
use tactical_bots_core::world::obstacle_index::StaticWorld;

fn arena_match(seed: u64, bots_per_team: usize) -> MatchRunner {
    let generated = MapGenerator::generate_arena(&mut StdRng::seed_from_u64(seed));
    let services = Services::new().with_world(StaticWorld::new(generated.boxes)).with_damage(HealthLedger::new());
    let mut sub = BotSubsystem::new(test_config(seed, bots_per_team), generated.level, services).expect("subsystem");
    sub.init().expect("init");
    MatchRunner::new(sub)
}

fn in_bounds(level: &LevelDescription, p: Vec3) -> bool {
    p.is_finite()
        && p.x >= level.bounds_min.x
        && p.x <= level.bounds_max.x
        && p.z >= level.bounds_min.y
        && p.z <= level.bounds_max.y
}

#[test]
fn full_match_on_the_generated_arena() {
    let mut runner = arena_match(7, 3);
    let summary = runner.run_ticks(2400);
    let sub = runner.subsystem();

    assert_eq!(summary.ticks, 2400);
    assert!(summary.shots > 0, "nobody fired: {:?}", summary);
    assert!(summary.state_changes > 0);
    assert!(summary.hits <= summary.shots);
    assert!(summary.headshots <= summary.hits);

    // Initial spawns count as respawns; every later one needs a death first.
    let initial = sub.bots().len() as u64;
    assert!(summary.respawns >= initial);
    let dead_now = sub.bots().iter().filter(|b| !b.alive).count() as u64;
    assert_eq!(summary.deaths, summary.respawns - initial + dead_now);

    for bot in sub.bots() {
        assert!(in_bounds(sub.level(), bot.position), "{} left the arena at {:?}", bot.name, bot.position);
        assert_eq!(bot.alive, bot.state.kind() != BotStateKind::Dead);
        assert!(bot.health >= 0.0 && bot.health <= bot.max_health);
    }
}

#[test]
fn same_seed_same_match() {
    let mut first = arena_match(21, 2);
    let mut second = arena_match(21, 2);
    let a: MatchSummary = first.run_ticks(600);
    let b: MatchSummary = second.run_ticks(600);
    assert_eq!(a, b);
    for (x, y) in first.subsystem().bots().iter().zip(second.subsystem().bots()) {
        assert_eq!(x.position, y.position);
        assert_eq!(x.state, y.state);
    }
}

/// Full-height wall down the middle; each team's first objective sits on the
/// far side.
fn split_level() -> (LevelDescription, Aabb) {
    let wall = Aabb::new(Vec3::new(-0.5, 0.0, -20.0), Vec3::new(0.5, 4.0, 20.0));
    let level = LevelDescription {
        objectives: vec![
            Objective { id: 1, center: Vec3::new(10.0, 0.0, 0.0), radius: 3.0 },
            Objective { id: 2, center: Vec3::new(-10.0, 0.0, 0.0), radius: 3.0 },
        ],
        spawns: vec![
            TeamSpawn { team: Team::Red, position: Vec3::new(-17.0, 0.0, 0.0) },
            TeamSpawn { team: Team::Blue, position: Vec3::new(17.0, 0.0, 0.0) },
        ],
        bounds_min: Vec2::splat(-20.0),
        bounds_max: Vec2::splat(20.0),
    };
    (level, wall)
}

#[test]
fn unreachable_objective_is_abandoned() {
    let (level, wall) = split_level();
    let services = Services::new().with_world(StaticWorld::from_solids(&[wall])).with_damage(HealthLedger::new());
    let mut sub = BotSubsystem::new(test_config(5, 1), level, services).expect("subsystem");
    sub.init().expect("init");
    for id in 0..2 {
        sub.bot_mut(id).expect("bot").tactical_timer = 1.0e6;
    }
    assert_eq!(sub.bot(0).expect("red").objective, 0);

    let home = sub.level().objectives[1].clone();
    let mut reached = false;
    for _ in 0..200 {
        sub.update(0.05);
        let red = sub.bot(0).expect("red");
        assert!(red.position.x < 0.0, "crossed the wall at {:?}", red.position);
        reached |= red.objective == 1 && home.contains(red.position);
    }
    assert!(reached, "red never settled on the reachable objective");
}

#[test]
fn one_broken_bot_does_not_stall_the_rest() {
    let mut sub = BotSubsystem::new(test_config(9, 2), open_level(20.0), Services::new()).expect("subsystem");
    sub.init().expect("init");
    sub.bot_mut(0).expect("bot").position = Vec3::new(f32::NAN, 0.0, 0.0);
    let before: Vec<Vec3> = sub.bots().iter().map(|b| b.position).collect();

    for _ in 0..20 {
        sub.update(0.05);
    }
    assert!(sub.bot(0).expect("broken").position.x.is_nan());
    for (bot, start) in sub.bots().iter().zip(&before).skip(1) {
        assert!(bot.position.is_finite());
        assert!(bot.position.distance(*start) > 0.5, "{} never moved", bot.name);
    }

    sub.bot_mut(0).expect("bot").position = Vec3::new(-15.0, 0.0, 0.0);
    sub.update(0.05);
    assert!(sub.bot(0).expect("repaired").position.is_finite());
}

/// Open world whose collision query panics west of `x = -10`.
struct FaultyWorld;

impl WorldQuery for FaultyWorld {
    fn obstacles(&self) -> Vec<Aabb> {
        Vec::new()
    }

    fn resolve_capsule_collision(&self, position: Vec3, _radius: f32, _half_height: f32) -> Vec3 {
        if position.x < -10.0 {
            panic!("collision query failed at {:?}", position);
        }
        Vec3::ZERO
    }

    fn raycast(&self, _origin: Vec3, _dir: Vec3, _max_distance: f32) -> Option<RayHit> {
        None
    }
}

#[test]
fn panicking_world_query_only_skips_the_affected_bots() {
    let services = Services::new().with_world(FaultyWorld);
    let mut sub = BotSubsystem::new(test_config(11, 2), open_level(20.0), services).expect("subsystem");
    sub.init().expect("init");
    let before: Vec<Vec3> = sub.bots().iter().map(|b| b.position).collect();
    assert!(sub.bots().iter().filter(|b| b.team == Team::Red).all(|b| b.position.x < -10.0));

    for _ in 0..10 {
        sub.update(0.05);
    }
    assert_eq!(sub.frame(), 10);
    for (bot, start) in sub.bots().iter().zip(&before) {
        assert!(bot.alive && bot.position.is_finite());
        match bot.team {
            Team::Red => {
                assert_eq!(bot.velocity, Vec3::ZERO);
                assert!(bot.nav.route.is_empty());
            }
            Team::Blue => assert!(bot.position.distance(*start) > 0.2, "{} never moved", bot.name),
        }
    }
}

/// Two red bots standing close enough to push each other apart, with the
/// blue team out of play.
fn red_pair(first: Vec3, second: Vec3) -> BotSubsystem {
    let mut sub = BotSubsystem::new(test_config(13, 2), open_level(20.0), Services::new()).expect("subsystem");
    sub.init().expect("init");
    let template = sub.bot(0).expect("red").clone();
    for (id, position) in [(0, first), (1, second)] {
        let bot = sub.bot_mut(id).expect("red");
        assert_eq!(bot.team, Team::Red);
        *bot = Bot { id, name: bot.name.clone(), position, tactical_timer: 1.0e6, ..template.clone() };
    }
    for id in 2..4 {
        let bot = sub.bot_mut(id).expect("blue");
        bot.alive = false;
        bot.state = BotState::Dead { respawn_in: 1.0e6 };
    }
    sub
}

#[test]
fn bots_read_each_other_as_of_the_start_of_the_tick() {
    let p = Vec3::new(-8.0, 0.0, 0.3);
    let q = Vec3::new(-8.0, 0.0, -0.3);
    let mut forward = red_pair(p, q);
    let mut swapped = red_pair(q, p);

    // Whoever steps first, each bot sees the other where it stood when the
    // tick began, so swapping roster slots swaps the results exactly.
    for tick in 0..5 {
        forward.update(0.05);
        swapped.update(0.05);
        for (a, b) in [(0, 1), (1, 0)] {
            let (x, y) = (forward.bot(a).expect("bot"), swapped.bot(b).expect("bot"));
            assert!(
                x.position.distance(y.position) < 1e-5,
                "tick {}: slot {} at {:?}, mirrored slot {} at {:?}",
                tick,
                a,
                x.position,
                b,
                y.position
            );
            assert_eq!(x.state, y.state);
        }
    }
    for id in 0..2 {
        assert!(forward.bot(id).expect("bot").position.x > -8.0);
    }
}

#[test]
fn externally_dealt_death_respawns_the_bot() {
    let damage = RecordingDamage::default();
    let mut config = test_config(3, 1);
    config.respawn_delay_secs = 0.5;
    let services = Services::new().with_damage(damage.clone());
    let mut sub = BotSubsystem::new(config, open_level(20.0), services).expect("subsystem");
    sub.init().expect("init");
    sub.drain_events();

    damage.set_health(CombatTarget::Agent(1), 0.0);
    sub.update(0.1);
    let blue = sub.bot(1).expect("blue");
    assert!(!blue.alive);
    assert_eq!(blue.deaths, 1);
    let events = sub.drain_events();
    assert!(events.contains(&BotEvent::AgentDied { agent: 1, killer: None }));
    assert!(sub.minimap_markers().iter().all(|m| m.agent != 1));

    for _ in 0..8 {
        sub.update(0.1);
    }
    let blue = sub.bot(1).expect("blue");
    assert!(blue.alive);
    assert_eq!(blue.health, blue.max_health);
    assert_eq!(damage.health(CombatTarget::Agent(1)), Some(blue.max_health));
    assert!(sub.drain_events().iter().any(|e| matches!(e, BotEvent::AgentRespawned { agent: 1, .. })));
}

#[test]
fn init_clear_and_minimap() {
    let mut sub = BotSubsystem::new(test_config(4, 3), open_level(20.0), Services::new()).expect("subsystem");
    assert!(sub.bots().is_empty());
    sub.init().expect("init");
    assert_eq!(sub.bots().len(), 6);
    let respawned = sub.drain_events().iter().filter(|e| matches!(e, BotEvent::AgentRespawned { .. })).count();
    assert_eq!(respawned, 6);

    let markers = sub.minimap_markers();
    assert_eq!(markers.len(), 6);
    assert_eq!(markers.iter().filter(|m| m.team == Team::Red).count(), 3);
    for marker in &markers {
        assert_eq!(sub.bot(marker.agent).expect("bot").position, marker.position);
    }

    sub.update(0.05);
    sub.rebuild_navigation();
    assert!(sub.bots().iter().all(|b| b.nav.needs_repath));

    sub.clear();
    assert!(sub.bots().is_empty());
    assert!(sub.minimap_markers().is_empty());
    assert!(sub.drain_events().is_empty());

    sub.init().expect("second init");
    assert_eq!(sub.bots().len(), 6);
}

#[test]
fn rejects_levels_it_cannot_play() {
    let mut level = open_level(20.0);
    level.spawns.retain(|s| s.team == Team::Red);
    let err = BotSubsystem::new(test_config(1, 2), level.clone(), Services::new()).err();
    assert!(matches!(err, Some(BotError::Level(_))));
    assert!(BotSubsystem::new(test_config(1, 0), level, Services::new()).is_ok());

    let mut flat = open_level(20.0);
    flat.bounds_max = flat.bounds_min;
    assert!(matches!(BotSubsystem::new(test_config(1, 1), flat, Services::new()).err(), Some(BotError::Level(_))));

    let mut config = test_config(1, 1);
    config.navigation.heuristic_weight = 0.5;
    assert!(matches!(BotSubsystem::new(config, open_level(20.0), Services::new()).err(), Some(BotError::Config(_))));
}

#[test]
fn ignores_bad_time_steps() {
    let mut sub = BotSubsystem::new(test_config(2, 1), open_level(20.0), Services::new()).expect("subsystem");
    sub.init().expect("init");
    let before: Vec<Vec3> = sub.bots().iter().map(|b| b.position).collect();
    sub.update(0.0);
    sub.update(-1.0);
    sub.update(f32::NAN);
    assert_eq!(sub.frame(), 0);
    assert_eq!(sub.bots().iter().map(|b| b.position).collect::<Vec<_>>(), before);
}
