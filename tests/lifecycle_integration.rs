//! Entity registry operations: ids, removal, damage and spawn points.

mod common;

use common::{DT, EngineCall, count, counting_session, session};
use skirmish::components::brain::StateTag;
use skirmish::components::entityid::{EntityId, PlayerId};
use skirmish::components::kind::{EnemyKind, EntityKind, ItemKind};
use skirmish::lifecycle::{CreateEntity, DamageOutcome};
use skirmish::math::Vec2;
use skirmish::resources::spawnmanager::SpawnManager;
use skirmish::states::DAMAGE_WINDOW;

const GRUNT: EntityKind = EntityKind::Enemy(EnemyKind::Grunt);

#[test]
fn entity_exists_only_after_the_step() {
    let mut session = session();
    let id = session.create_entity(CreateEntity::new(GRUNT, Vec2::ZERO).with_id(EntityId(7)));
    assert_eq!(id, Some(EntityId(7)));
    assert!(session.entity(EntityId(7)).is_none());
    assert_eq!(session.entity_count(), 0);

    session.tick(DT);

    let snapshot = session.entity(EntityId(7)).unwrap();
    assert_eq!(snapshot.kind, GRUNT);
    assert_eq!(snapshot.health, Some(3.0));
}

#[test]
fn duplicate_explicit_id_before_drain_yields_one_entity() {
    let mut session = session();
    let first = session.create_entity(CreateEntity::new(GRUNT, Vec2::ZERO).with_id(EntityId(42)));
    let second =
        session.create_entity(CreateEntity::new(GRUNT, Vec2::new(4.0, 0.0)).with_id(EntityId(42)));
    assert_eq!(first, Some(EntityId(42)));
    assert_eq!(second, None);

    session.tick(DT);
    assert_eq!(session.entity_count(), 1);
    assert_eq!(session.entity(EntityId(42)).unwrap().position, Vec2::ZERO);

    // Still rejected once live.
    assert_eq!(
        session.create_entity(CreateEntity::new(GRUNT, Vec2::ZERO).with_id(EntityId(42))),
        None
    );
}

#[test]
fn allocated_ids_skip_explicit_ones() {
    let mut session = session();
    session.create_entity(CreateEntity::new(EntityKind::Static, Vec2::ZERO).with_id(EntityId(0)));
    let next = session.create_entity(CreateEntity::new(EntityKind::Static, Vec2::new(1.0, 0.0)));
    assert_eq!(next, Some(EntityId(1)));
}

#[test]
fn removing_an_unknown_entity_is_a_no_op() {
    let mut session = session();
    assert!(!session.remove_entity(EntityId(1234)));
    assert!(!session.remove_entity_local(EntityId(1234)));
    assert_eq!(session.pending_count(), 0);
}

#[test]
fn removal_before_the_build_cancels_it() {
    let mut session = session();
    let id = session
        .create_entity(CreateEntity::new(GRUNT, Vec2::ZERO))
        .unwrap();
    assert!(session.remove_entity(id));
    session.tick(DT);
    assert!(session.entity(id).is_none());
    assert_eq!(session.entity_count(), 0);
}

#[test]
fn reissued_id_builds_the_latest_request() {
    let mut session = session();
    let id = EntityId(5);
    session.create_entity(CreateEntity::new(GRUNT, Vec2::ZERO).with_id(id));
    assert!(session.remove_entity(id));
    let coin = CreateEntity::new(EntityKind::Item(ItemKind::Coin), Vec2::new(10.0, 0.0));
    assert_eq!(session.create_entity(coin.with_id(id)), Some(id));

    session.tick(DT);
    assert_eq!(session.entity_count(), 1);
    let snapshot = session.entity(id).unwrap();
    assert_eq!(snapshot.kind, EntityKind::Item(ItemKind::Coin));
    assert_eq!(snapshot.position, Vec2::new(10.0, 0.0));
}

#[test]
fn double_removal_detaches_once() {
    let (mut session, log) = counting_session();
    let id = session
        .create_entity(CreateEntity::new(EntityKind::Item(ItemKind::Coin), Vec2::ZERO))
        .unwrap();
    session.tick(DT);

    assert!(session.remove_entity(id));
    assert!(!session.remove_entity(id));
    session.tick(DT);

    assert_eq!(count(&log, |c| matches!(c, EngineCall::DestroyBody(_))), 1);
    assert_eq!(session.entity_count(), 0);
}

#[test]
fn damage_is_edge_triggered() {
    let (mut session, log) = counting_session();
    let id = session
        .create_entity(CreateEntity::new(GRUNT, Vec2::ZERO))
        .unwrap();
    session.tick(DT);
    let impulses = |log| count(log, |c| matches!(c, EngineCall::Impulse(..)));

    let first = session.apply_damage(id, 1.0, Vec2::new(1.0, 0.0), 5.0);
    assert_eq!(first, DamageOutcome::Applied);
    assert_eq!(session.entity(id).unwrap().health, Some(2.0));
    let pending = session.pending_count();

    // Still entering DAMAGE: ignored.
    let second = session.apply_damage(id, 1.0, Vec2::new(1.0, 0.0), 5.0);
    assert_eq!(second, DamageOutcome::Ignored);
    assert_eq!(session.entity(id).unwrap().health, Some(2.0));
    assert_eq!(session.pending_count(), pending);

    session.tick(DT);
    assert_eq!(impulses(&log), 1);
    assert_eq!(session.entity(id).unwrap().state, Some(StateTag::Damage));

    // In DAMAGE: still ignored.
    assert_eq!(
        session.apply_damage(id, 1.0, Vec2::new(1.0, 0.0), 5.0),
        DamageOutcome::Ignored
    );
    session.tick(DT);
    assert_eq!(impulses(&log), 1);
    assert_eq!(session.entity(id).unwrap().health, Some(2.0));

    // Once the window closes the grunt can be hurt again.
    let ticks = (DAMAGE_WINDOW / DT).ceil() as u32 + 2;
    for _ in 0..ticks {
        session.tick(DT);
    }
    assert_ne!(session.entity(id).unwrap().state, Some(StateTag::Damage));
    assert_eq!(
        session.apply_damage(id, 1.0, Vec2::new(-1.0, 0.0), 5.0),
        DamageOutcome::Applied
    );
}

#[test]
fn knockback_carries_through_the_damage_window() {
    let mut session = session();
    let id = session
        .create_entity(CreateEntity::new(GRUNT, Vec2::ZERO))
        .unwrap();
    session.tick(DT);

    assert_eq!(
        session.apply_damage(id, 1.0, Vec2::new(1.0, 0.0), 5.0),
        DamageOutcome::Applied
    );
    // Stop just short of the window closing.
    let ticks = (DAMAGE_WINDOW / DT).ceil() as u32 - 2;
    for _ in 0..ticks {
        session.tick(DT);
    }
    let snapshot = session.entity(id).unwrap();
    assert_eq!(snapshot.state, Some(StateTag::Damage));
    assert!(snapshot.position.x > 1.0, "pushed only to {:?}", snapshot.position);
}

#[test]
fn non_damageable_entities_ignore_damage() {
    let mut session = session();
    let id = session
        .create_entity(CreateEntity::new(EntityKind::Static, Vec2::ZERO))
        .unwrap();
    session.tick(DT);
    assert_eq!(
        session.apply_damage(id, 1.0, Vec2::ZERO, 0.0),
        DamageOutcome::Ignored
    );
    assert_eq!(
        session.apply_damage(EntityId(555), 1.0, Vec2::ZERO, 0.0),
        DamageOutcome::Ignored
    );
}

#[test]
fn damage_to_a_replica_is_forwarded() {
    let mut session = session();
    session.create_entity(
        CreateEntity::new(GRUNT, Vec2::ZERO)
            .with_id(EntityId(900))
            .remote(),
    );
    session.tick(DT);
    assert_eq!(
        session.apply_damage(EntityId(900), 1.0, Vec2::new(1.0, 0.0), 2.0),
        DamageOutcome::Forwarded
    );
    assert_eq!(session.entity(EntityId(900)).unwrap().health, Some(3.0));
}

#[test]
fn killed_grunt_is_removed_and_drops_its_coin() {
    let mut session = session();
    let id = session
        .create_entity(CreateEntity::new(GRUNT, Vec2::ZERO))
        .unwrap();
    session.tick(DT);
    assert_eq!(
        session.apply_damage(id, 10.0, Vec2::new(1.0, 0.0), 0.0),
        DamageOutcome::Applied
    );

    let ticks = (DAMAGE_WINDOW / DT).ceil() as u32 + 4;
    for _ in 0..ticks {
        session.tick(DT);
    }
    assert!(session.entity(id).is_none());
    assert_eq!(session.entity_count(), 1);
}

#[test]
fn spawn_pool_scenario() {
    let mut spawns = SpawnManager::with_points(
        1,
        [Vec2::new(0.0, 0.0), Vec2::new(5.0, 0.0), Vec2::new(10.0, 0.0)],
    );
    let first = spawns.claim(PlayerId(1)).unwrap();
    assert_eq!(spawns.available_len(), 2);
    assert_eq!(spawns.taken_len(), 1);

    let again = spawns.claim(PlayerId(1)).unwrap();
    assert_eq!(again, first);
    assert_eq!(spawns.available_len(), 2);
    assert_eq!(spawns.taken_len(), 1);
}

#[test]
fn spawn_pool_is_conserved() {
    let mut spawns = SpawnManager::with_points(7, (0..5).map(|i| Vec2::new(i as f32, 0.0)));
    let mut rng = fastrand::Rng::with_seed(99);
    for _ in 0..500 {
        let player = PlayerId(rng.i64(0..8));
        match rng.u8(0..3) {
            0 => {
                spawns.claim(player);
            }
            1 => {
                spawns.release(player);
            }
            _ => {
                spawns.respawn(player);
            }
        }
        assert_eq!(spawns.available_len() + spawns.taken_len(), 5);
        assert_eq!(spawns.total(), 5);
    }
}

#[test]
fn removing_a_player_releases_its_spawn_point() {
    let mut session = session();
    session.world_mut().resource_mut::<SpawnManager>().register(Vec2::new(2.0, 2.0));
    let id = session.spawn_local_player().unwrap();
    assert_eq!(session.spawns().taken_len(), 1);
    session.tick(DT);

    assert_eq!(session.entity(id).unwrap().position, Vec2::new(2.0, 2.0));
    session.remove_entity(id);
    session.tick(DT);
    assert_eq!(session.spawns().available_len(), 1);
    assert_eq!(session.spawns().taken_len(), 0);
}

#[test]
fn removing_an_unbuilt_player_releases_its_spawn_point() {
    let mut session = session();
    session.world_mut().resource_mut::<SpawnManager>().register(Vec2::new(2.0, 2.0));
    let id = session.spawn_local_player().unwrap();
    assert!(session.remove_entity(id));
    assert_eq!(session.spawns().available_len(), 1);
    assert_eq!(session.spawns().taken_len(), 0);

    session.tick(DT);
    assert!(session.entity(id).is_none());
    assert_eq!(session.spawns().taken_len(), 0);
}

#[test]
fn player_without_spawn_points_is_an_error() {
    let mut session = session();
    assert!(session.spawn_local_player().is_err());
    assert_eq!(session.pending_count(), 0);
}
