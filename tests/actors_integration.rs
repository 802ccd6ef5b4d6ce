//! Actor brains running inside a session.

mod common;

use common::{DT, session};
use skirmish::components::brain::StateTag;
use skirmish::components::entityid::EntityId;
use skirmish::components::kind::{EnemyKind, EntityKind};
use skirmish::lifecycle::{CreateEntity, DamageOutcome};
use skirmish::math::Vec2;
use skirmish::resources::input::Action;
use skirmish::resources::spawnmanager::SpawnManager;
use skirmish::session::Session;
use skirmish::states::DAMAGE_WINDOW;

fn with_player_at(position: Vec2) -> (Session, EntityId) {
    let mut session = session();
    session
        .world_mut()
        .resource_mut::<SpawnManager>()
        .register(position);
    let player = session.spawn_local_player().unwrap();
    (session, player)
}

fn run(session: &mut Session, ticks: u32) {
    for _ in 0..ticks {
        session.tick(DT);
    }
}

#[test]
fn player_walks_while_a_direction_is_held() {
    let (mut session, player) = with_player_at(Vec2::ZERO);
    run(&mut session, 1);
    assert_eq!(session.entity(player).unwrap().state, Some(StateTag::Idle));

    session.input_mut().set(Action::Right, true);
    run(&mut session, 10);
    let snapshot = session.entity(player).unwrap();
    assert_eq!(snapshot.state, Some(StateTag::Walk));
    assert!(snapshot.position.x > 0.0);
    assert!(!snapshot.flip_x);

    session.input_mut().set(Action::Right, false);
    run(&mut session, 3);
    assert_eq!(session.entity(player).unwrap().state, Some(StateTag::Idle));
}

#[test]
fn player_attack_hits_the_grunt_in_front() {
    let (mut session, player) = with_player_at(Vec2::ZERO);
    // Inside the player's reach, outside the grunt's.
    let grunt = session
        .create_entity(CreateEntity::new(
            EntityKind::Enemy(EnemyKind::Grunt),
            Vec2::new(1.2, 0.0),
        ))
        .unwrap();
    run(&mut session, 1);

    session.input_mut().set(Action::Attack, true);
    run(&mut session, 1);
    assert_eq!(session.entity(player).unwrap().state, Some(StateTag::Attack));
    run(&mut session, 1);

    let target = session.entity(grunt).unwrap();
    assert_eq!(target.health, Some(2.0));
    assert_eq!(target.state, Some(StateTag::Damage));
}

#[test]
fn thrower_projectile_hurts_the_player_once() {
    let (mut session, player) = with_player_at(Vec2::new(4.0, 0.0));
    session.create_entity(CreateEntity::new(
        EntityKind::Enemy(EnemyKind::Thrower),
        Vec2::ZERO,
    ));
    run(&mut session, 2);
    // Thrower, player and the projectile in flight.
    assert_eq!(session.entity_count(), 3);

    run(&mut session, 60);
    assert_eq!(session.entity(player).unwrap().health, Some(4.0));
    assert_eq!(session.entity_count(), 2);
}

#[test]
fn dead_player_respawns_with_full_health() {
    let (mut session, player) = with_player_at(Vec2::new(1.0, 1.0));
    run(&mut session, 1);
    assert_eq!(
        session.apply_damage(player, 10.0, Vec2::new(-1.0, 0.0), 3.0),
        DamageOutcome::Applied
    );
    assert_eq!(session.entity(player).unwrap().health, Some(0.0));

    let ticks = (DAMAGE_WINDOW / DT).ceil() as u32 + 4;
    run(&mut session, ticks);
    let snapshot = session.entity(player).unwrap();
    assert_eq!(snapshot.health, Some(5.0));
    assert_eq!(snapshot.state, Some(StateTag::Idle));
    assert_eq!(snapshot.position, Vec2::new(1.0, 1.0));
    assert_eq!(session.spawns().taken_len(), 1);
}

#[test]
fn replica_enemies_take_no_actions() {
    let (mut session, player) = with_player_at(Vec2::new(4.0, 0.0));
    session.create_entity(
        CreateEntity::new(EntityKind::Enemy(EnemyKind::Thrower), Vec2::ZERO)
            .with_id(EntityId(900))
            .remote(),
    );
    run(&mut session, 90);
    assert_eq!(session.entity_count(), 2);
    assert_eq!(session.entity(player).unwrap().health, Some(5.0));
}
