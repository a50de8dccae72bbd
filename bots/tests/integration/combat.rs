// tactical_bots_core/bots/tests/integration/combat.rs

#[path = "../support/mod.rs"]
mod support;

use support::{open_level, test_config, RecordingDamage, ScriptedPlayer, ToggleWall};
use tactical_bots_core::core::services::{DamageService, Services};
use tactical_bots_core::core::types::{horizontal_distance, CombatTarget, StatusEffectKind, TacticalItemKind, Team, Vec3};
use tactical_bots_core::entities::bot::{BotState, BotStateKind};
use tactical_bots_core::server::events::BotEvent;
use tactical_bots_core::server::instance::BotSubsystem;
use tactical_bots_core::systems::ai::combat::{aim_error_bound, hit_chance};
use tactical_bots_core::systems::ai::difficulty::DifficultyTier;

const RED: usize = 0;
const BLUE: usize = 1;

fn duel(seed: u64, damage: Option<RecordingDamage>) -> (BotSubsystem, ToggleWall) {
    let wall = ToggleWall::new(&[]);
    let mut services = Services::new().with_world(wall.clone());
    if let Some(damage) = damage {
        services = services.with_damage(damage);
    }
    let mut sub = BotSubsystem::new(test_config(seed, 1), open_level(20.0), services).expect("subsystem");
    sub.init().expect("init");
    sub.drain_events();
    (sub, wall)
}

/// Puts a bot at `position` facing +X with no tactical plan.
fn place(sub: &mut BotSubsystem, id: usize, position: Vec3, yaw: f32) {
    let bot = sub.bot_mut(id).expect("bot");
    bot.position = position;
    bot.yaw = yaw;
    bot.tactical_timer = 100.0;
}

/// Blind and stunned: never notices anyone, never moves, never shoots.
fn pacify(sub: &mut BotSubsystem, id: usize) {
    let bot = sub.bot_mut(id).expect("bot");
    bot.status.blind = 1000.0;
    bot.status.stunned = 1000.0;
}

fn shots(events: &[BotEvent]) -> Vec<&BotEvent> {
    events.iter().filter(|e| matches!(e, BotEvent::ShotFired { .. })).collect()
}

#[test]
fn detection_takes_the_sampled_sight_time() {
    let (mut sub, _wall) = duel(11, Some(RecordingDamage::default()));
    place(&mut sub, RED, Vec3::new(-10.0, 0.0, 0.0), 0.0);
    place(&mut sub, BLUE, Vec3::new(10.0, 0.0, 0.0), 0.0);
    pacify(&mut sub, BLUE);
    sub.bot_mut(RED).expect("red").perception.detect_need = 0.3;

    sub.update(0.1);
    sub.update(0.1);
    assert_eq!(sub.bot(RED).expect("red").state.kind(), BotStateKind::MoveToObjective);
    assert!(sub.bot(RED).expect("red").perception.seen_time > 0.15);

    sub.update(0.1);
    sub.update(0.1);
    assert_eq!(sub.bot(RED).expect("red").state, BotState::Engage { target: CombatTarget::Agent(BLUE) });
    let events = sub.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        BotEvent::StateChanged { agent: RED, to: BotStateKind::Engage, .. }
    )));
}

#[test]
fn blinded_bots_do_not_notice_anyone() {
    let (mut sub, _wall) = duel(12, Some(RecordingDamage::default()));
    place(&mut sub, RED, Vec3::new(-10.0, 0.0, 0.0), 0.0);
    place(&mut sub, BLUE, Vec3::new(10.0, 0.0, 0.0), 0.0);
    pacify(&mut sub, BLUE);
    sub.bot_mut(RED).expect("red").perception.detect_need = 0.3;
    sub.bot_mut(RED).expect("red").status.blind = 2.0;

    for _ in 0..10 {
        sub.update(0.1);
    }
    let red = sub.bot(RED).expect("red");
    assert_eq!(red.state.kind(), BotStateKind::MoveToObjective);
    assert_eq!(red.perception.seen_time, 0.0);
}

#[test]
fn occluded_targets_are_never_shot() {
    let damage = RecordingDamage::default();
    let (mut sub, wall) = duel(13, Some(damage.clone()));
    place(&mut sub, RED, Vec3::new(-10.0, 0.0, 0.0), 0.0);
    place(&mut sub, BLUE, Vec3::new(10.0, 0.0, 0.0), 0.0);
    pacify(&mut sub, BLUE);
    {
        let red = sub.bot_mut(RED).expect("red");
        red.state = BotState::Engage { target: CombatTarget::Agent(BLUE) };
        red.combat.burst_left = 3;
    }

    wall.raised.set(true);
    for _ in 0..10 {
        sub.update(0.1);
    }
    assert_eq!(sub.bot(RED).expect("red").state.kind(), BotStateKind::Engage, "still within the grace period");
    assert_eq!(damage.call_count(), 0);
    assert!(shots(&sub.drain_events()).is_empty());

    wall.raised.set(false);
    let mut fired = 0;
    for _ in 0..20 {
        sub.update(0.1);
        fired += shots(&sub.drain_events()).len();
    }
    assert!(fired > 0, "no shots once the wall came down");
}

#[test]
fn losing_sight_falls_back_to_search() {
    let (mut sub, wall) = duel(14, Some(RecordingDamage::default()));
    place(&mut sub, RED, Vec3::new(-10.0, 0.0, 0.0), 0.0);
    place(&mut sub, BLUE, Vec3::new(10.0, 0.0, 0.0), 0.0);
    pacify(&mut sub, BLUE);
    sub.bot_mut(RED).expect("red").state = BotState::Engage { target: CombatTarget::Agent(BLUE) };
    sub.bot_mut(RED).expect("red").perception.remember(Vec3::new(10.0, 0.0, 0.0));

    wall.raised.set(true);
    let grace = sub.profile().lose_sight_grace;
    let ticks = ((grace + 0.5) / 0.1).ceil() as usize;
    for _ in 0..ticks {
        sub.update(0.1);
    }
    match sub.bot(RED).expect("red").state {
        BotState::Search { last_known, .. } => assert!(horizontal_distance(last_known, Vec3::new(10.0, 0.0, 0.0)) < 1e-3),
        ref other => panic!("expected search, got {:?}", other),
    }
}

#[test]
fn a_single_hit_does_not_trigger_retreat_but_critical_health_does() {
    let damage = RecordingDamage::default();
    let (mut sub, _wall) = duel(15, Some(damage.clone()));
    place(&mut sub, RED, Vec3::new(-10.0, 0.0, 0.0), 0.0);
    place(&mut sub, BLUE, Vec3::new(12.0, 0.0, 0.0), 0.0);
    pacify(&mut sub, BLUE);
    {
        let red = sub.bot_mut(RED).expect("red");
        red.state = BotState::Engage { target: CombatTarget::Agent(BLUE) };
        red.combat.engage_time = 5.0;
        red.combat.reaction = 10.0;
    }

    damage.set_health(CombatTarget::Agent(RED), 90.0);
    sub.update(0.1);
    let red = sub.bot(RED).expect("red");
    assert_eq!(red.health, 90.0);
    assert_eq!(red.combat.recent_hits.len(), 1);
    assert_eq!(red.state.kind(), BotStateKind::Engage);
    sub.drain_events();

    damage.set_health(CombatTarget::Agent(RED), 15.0);
    sub.update(0.1);
    let red = sub.bot(RED).expect("red");
    let BotState::Retreat { to, .. } = red.state else {
        panic!("expected retreat, got {:?}", red.state);
    };
    let threat = Vec3::new(12.0, 0.0, 0.0);
    assert!(horizontal_distance(to, threat) > horizontal_distance(red.position, threat));
    assert!(red.combat.retreat_cooldown > 0.0);

    let events = sub.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        BotEvent::TacticalItem { thrower: RED, kind: TacticalItemKind::Smoke, .. }
    )));
}

#[test]
fn fights_without_a_damage_service() {
    let (mut sub, _wall) = duel(16, None);
    place(&mut sub, RED, Vec3::new(-8.0, 0.0, 0.0), 0.0);
    place(&mut sub, BLUE, Vec3::new(8.0, 0.0, 0.0), std::f32::consts::PI);

    let mut fired = Vec::new();
    for _ in 0..100 {
        sub.update(0.05);
        fired.extend(sub.drain_events().into_iter().filter(|e| matches!(e, BotEvent::ShotFired { .. })));
    }
    assert!(!fired.is_empty());
    assert!(fired.iter().all(|e| matches!(e, BotEvent::ShotFired { damage, .. } if *damage == 0.0)));
    assert!(sub.bots().iter().all(|b| b.alive && b.health == b.max_health));
}

#[test]
fn engages_the_human_player() {
    let damage = RecordingDamage::default();
    let mut host = damage.clone();
    host.register(CombatTarget::Player, 100.0);
    let player = ScriptedPlayer::new(Vec3::new(-2.0, 0.0, 0.0), Team::Blue);
    let services = Services::new().with_damage(damage.clone()).with_player(player);
    let mut sub = BotSubsystem::new(test_config(17, 1), open_level(20.0), services).expect("subsystem");
    sub.init().expect("init");
    place(&mut sub, RED, Vec3::new(-10.0, 0.0, 0.0), 0.0);
    damage.set_health(CombatTarget::Agent(BLUE), 0.0);

    let mut at_player = 0;
    for _ in 0..60 {
        sub.update(0.05);
        at_player += sub
            .drain_events()
            .iter()
            .filter(|e| matches!(e, BotEvent::ShotFired { shooter: RED, target: CombatTarget::Player, .. }))
            .count();
    }
    assert!(!sub.bot(BLUE).expect("blue").alive);
    assert!(at_player > 0);
}

#[test]
fn status_effects_respect_teams_and_sight() {
    let (mut sub, wall) = duel(18, Some(RecordingDamage::default()));
    place(&mut sub, RED, Vec3::new(-10.0, 0.0, 0.0), 0.0);
    place(&mut sub, BLUE, Vec3::new(10.0, 0.0, 0.0), 0.0);
    let blue_eye = Vec3::new(10.0, 1.6, 0.0);

    assert_eq!(sub.apply_status_effect(StatusEffectKind::Blind, blue_eye, 4.0, 2.0, Team::Red), 1);
    assert!(sub.bot(BLUE).expect("blue").status.is_blind());
    assert!(!sub.bot(RED).expect("red").status.is_blind());
    assert_eq!(sub.apply_status_effect(StatusEffectKind::Blind, blue_eye, 4.0, 2.0, Team::Blue), 0);

    wall.raised.set(true);
    let near_red = Vec3::new(-8.0, 1.6, 0.0);
    assert_eq!(sub.apply_status_effect(StatusEffectKind::Blind, near_red, 4.0, 2.0, Team::Blue), 0);
    assert_eq!(sub.apply_status_effect(StatusEffectKind::Stun, near_red, 4.0, 1.0, Team::Blue), 1);
    assert!(sub.bot(RED).expect("red").status.is_stunned());

    assert_eq!(sub.apply_status_effect(StatusEffectKind::Obscure, Vec3::ZERO, 3.0, 0.5, Team::Red), 0);
    assert_eq!(sub.smokes().len(), 1);
    for _ in 0..6 {
        sub.update(0.1);
    }
    assert!(sub.smokes().is_empty());
}

#[test]
fn stunned_bots_stay_put() {
    let (mut sub, _wall) = duel(19, Some(RecordingDamage::default()));
    place(&mut sub, RED, Vec3::new(-10.0, 0.0, 0.0), 0.0);
    pacify(&mut sub, BLUE);
    sub.apply_status_effect(StatusEffectKind::Stun, Vec3::new(-10.0, 1.0, 0.0), 2.0, 1.0, Team::Blue);
    for _ in 0..5 {
        sub.update(0.1);
    }
    let red = sub.bot(RED).expect("red");
    assert!(horizontal_distance(red.position, Vec3::new(-10.0, 0.0, 0.0)) < 1e-3, "moved to {:?}", red.position);
}

#[test]
fn smoke_blocks_detection() {
    let (mut sub, _wall) = duel(20, Some(RecordingDamage::default()));
    place(&mut sub, RED, Vec3::new(-10.0, 0.0, 0.0), 0.0);
    place(&mut sub, BLUE, Vec3::new(10.0, 0.0, 0.0), 0.0);
    pacify(&mut sub, BLUE);
    sub.bot_mut(RED).expect("red").perception.detect_need = 0.3;
    sub.apply_status_effect(StatusEffectKind::Obscure, Vec3::new(0.0, 1.4, 0.0), 3.0, 5.0, Team::Blue);

    for _ in 0..10 {
        sub.update(0.1);
    }
    assert_eq!(sub.bot(RED).expect("red").state.kind(), BotStateKind::MoveToObjective);
}

#[test]
fn harder_tiers_are_never_weaker() {
    for pair in DifficultyTier::ORDERED.windows(2) {
        let (easier, harder) = (pair[0].profile(), pair[1].profile());
        assert!(harder.detection_range >= easier.detection_range);
        assert!(harder.aggression >= easier.aggression);
        assert!(harder.hit_chance_mult >= easier.hit_chance_mult);
        assert!(harder.engage_range >= easier.engage_range);
        assert!(harder.fov_cos <= easier.fov_cos, "wider view");
        assert!(harder.detect_time.max <= easier.detect_time.max);
        assert!(harder.reaction_time.max <= easier.reaction_time.max);
        assert!(harder.first_shot_delay.max <= easier.first_shot_delay.max);
        assert!(harder.turn_rate >= easier.turn_rate);
        assert!(harder.headshot_chance >= easier.headshot_chance);
        for distance in [4.0, 15.0, 30.0, 60.0] {
            assert!(hit_chance(distance, harder) >= hit_chance(distance, easier));
            assert!(aim_error_bound(distance, harder) <= aim_error_bound(distance, easier));
        }
    }
}
