//! Inbound packet application and outbound replication.

mod common;

use common::{DT, observed_session, quiet_config, session};
use skirmish::components::brain::StateTag;
use skirmish::components::entityid::{Authority, EntityId, PlayerId};
use skirmish::components::kind::{EnemyKind, EntityKind, ItemKind};
use skirmish::events::packet::Packet;
use skirmish::lifecycle::CreateEntity;
use skirmish::math::Vec2;
use skirmish::resources::spawnmanager::SpawnManager;
use skirmish::session::Session;
use skirmish::states::DAMAGE_WINDOW;

const GRUNT: EntityKind = EntityKind::Enemy(EnemyKind::Grunt);

fn created(id: i64, kind: EntityKind, x: f32) -> Packet {
    Packet::EntityCreated {
        id: EntityId(id),
        kind,
        x,
        y: 0.0,
        vx: 0.0,
        vy: 0.0,
        flip_x: false,
    }
}

fn state_change(id: i64, state: StateTag) -> Packet {
    Packet::EntityStateChange {
        id: EntityId(id),
        animation: format!("{:?}", state).to_lowercase(),
        flip_x: true,
        state,
        extra: None,
    }
}

fn replica_with_grunt() -> Session {
    let mut session = session();
    session.handle().deliver(created(500, GRUNT, 3.0));
    session.tick(DT);
    session
}

#[test]
fn created_packet_builds_a_replica() {
    let session = replica_with_grunt();
    let snapshot = session.entity(EntityId(500)).unwrap();
    assert_eq!(snapshot.authority, Authority::Remote);
    assert_eq!(snapshot.position, Vec2::new(3.0, 0.0));
}

#[test]
fn duplicate_created_packet_is_rejected() {
    let mut session = replica_with_grunt();
    session.handle().deliver(created(500, GRUNT, 9.0));
    let report = session.tick(DT);
    assert_eq!(report.failed, 1);
    assert_eq!(session.entity_count(), 1);
    assert_eq!(session.entity(EntityId(500)).unwrap().position.x, 3.0);
}

#[test]
fn state_change_is_applied_to_an_idle_replica() {
    let mut session = replica_with_grunt();
    session.handle().deliver(state_change(500, StateTag::Walk));
    session.tick(DT);
    let snapshot = session.entity(EntityId(500)).unwrap();
    assert_eq!(snapshot.state, Some(StateTag::Walk));
    assert!(snapshot.flip_x);
    assert_eq!(snapshot.animation, "walk");
}

#[test]
fn state_change_is_refused_during_attack() {
    let mut session = replica_with_grunt();
    session.handle().deliver(state_change(500, StateTag::Attack));
    session.tick(DT);
    assert_eq!(session.entity(EntityId(500)).unwrap().state, Some(StateTag::Attack));

    session.handle().deliver(state_change(500, StateTag::Walk));
    session.tick(DT);
    assert_eq!(session.entity(EntityId(500)).unwrap().state, Some(StateTag::Attack));
}

#[test]
fn replica_closes_its_own_damage_window() {
    let mut session = replica_with_grunt();
    session.handle().deliver(state_change(500, StateTag::Damage));
    session.tick(DT);
    assert_eq!(session.entity(EntityId(500)).unwrap().state, Some(StateTag::Damage));

    session.handle().deliver(state_change(500, StateTag::Walk));
    session.tick(DT);
    assert_eq!(session.entity(EntityId(500)).unwrap().state, Some(StateTag::Damage));

    let ticks = (DAMAGE_WINDOW / DT).ceil() as u32 + 2;
    for _ in 0..ticks {
        session.tick(DT);
    }
    assert_eq!(session.entity(EntityId(500)).unwrap().state, Some(StateTag::Idle));
}

#[test]
fn created_and_follow_up_packets_in_one_batch() {
    let mut session = session();
    let handle = session.handle();
    handle.deliver(created(600, GRUNT, 0.0));
    handle.deliver(state_change(600, StateTag::Walk));
    handle.deliver(Packet::EntityPosition {
        id: EntityId(600),
        x: 2.5,
        y: 0.0,
        velocity: None,
    });
    let report = session.tick(DT);
    assert_eq!(report.failed, 0);

    let snapshot = session.entity(EntityId(600)).unwrap();
    assert_eq!(snapshot.state, Some(StateTag::Walk));
    assert_eq!(snapshot.position, Vec2::new(2.5, 0.0));
}

#[test]
fn state_change_for_an_owned_entity_is_ignored() {
    let mut session = session();
    let id = session
        .create_entity(CreateEntity::new(GRUNT, Vec2::ZERO))
        .unwrap();
    session.tick(DT);
    session.handle().deliver(state_change(id.0, StateTag::Walk));
    session.tick(DT);
    assert_eq!(session.entity(id).unwrap().state, Some(StateTag::Idle));
}

#[test]
fn position_packet_moves_a_replica_but_not_our_player() {
    let mut session = replica_with_grunt();
    session
        .world_mut()
        .resource_mut::<SpawnManager>()
        .register(Vec2::new(-4.0, 0.0));
    let player = session.spawn_local_player().unwrap();
    session.tick(DT);

    let handle = session.handle();
    for id in [EntityId(500), player] {
        handle.deliver(Packet::EntityPosition {
            id,
            x: 1.0,
            y: 1.0,
            velocity: None,
        });
    }
    session.tick(DT);

    assert_eq!(session.entity(EntityId(500)).unwrap().position, Vec2::new(1.0, 1.0));
    assert_eq!(session.entity(player).unwrap().position, Vec2::new(-4.0, 0.0));
}

#[test]
fn removed_packet_removes_without_echo() {
    let (mut session, rx) = observed_session(quiet_config());
    session.handle().deliver(created(500, GRUNT, 3.0));
    session.tick(DT);
    session.handle().deliver(Packet::EntityRemoved { id: EntityId(500) });
    session.tick(DT);

    assert!(session.entity(EntityId(500)).is_none());
    assert!(
        rx.try_iter()
            .all(|p| !matches!(p, Packet::EntityRemoved { .. }))
    );
}

#[test]
fn packets_for_unknown_entities_are_counted_as_failures() {
    let mut session = session();
    let handle = session.handle();
    handle.deliver(Packet::EntityRemoved { id: EntityId(1) });
    handle.deliver(Packet::EntityPosition {
        id: EntityId(1),
        x: 0.0,
        y: 0.0,
        velocity: None,
    });
    handle.deliver(state_change(1, StateTag::Idle));
    handle.deliver(Packet::ScoreChanged {
        player_id: PlayerId(77),
        score: 5,
    });
    let report = session.tick(DT);
    assert_eq!(report.failed, 4);
    assert!(!session.is_closed());
}

#[test]
fn damage_packet_applies_only_to_owned_targets() {
    let mut session = replica_with_grunt();
    let owned = session
        .create_entity(CreateEntity::new(GRUNT, Vec2::new(-5.0, 0.0)))
        .unwrap();
    session.tick(DT);

    for id in [EntityId(500), owned] {
        session.handle().deliver(Packet::EntityDamage {
            target_id: id,
            amount: 1.0,
            dir_x: 1.0,
            dir_y: 0.0,
            knockback: 0.0,
        });
    }
    session.tick(DT);
    assert_eq!(session.entity(EntityId(500)).unwrap().health, Some(3.0));
    assert_eq!(session.entity(owned).unwrap().health, Some(2.0));
}

#[test]
fn score_and_chat_packets() {
    let mut session = session();
    session.add_participant(PlayerId(3), "guest");
    session.handle().deliver(Packet::ScoreChanged {
        player_id: PlayerId(3),
        score: 120,
    });
    session.handle().deliver(Packet::ChatMessage {
        sender: "guest".into(),
        text: "hello".into(),
    });
    session.tick(DT);

    assert_eq!(session.scores().score(PlayerId(3)), Some(120));
    assert_eq!(session.scores().leader(), Some(PlayerId(3)));
    let line = session.chat().lines().last().unwrap();
    assert_eq!((line.sender.as_str(), line.text.as_str()), ("guest", "hello"));
}

#[test]
fn owned_entities_are_announced_and_geometry_is_not() {
    let (mut session, rx) = observed_session(quiet_config());
    let grunt = session
        .create_entity(CreateEntity::new(GRUNT, Vec2::ZERO))
        .unwrap();
    session.create_entity(CreateEntity::new(EntityKind::Static, Vec2::new(0.0, -2.0)));
    session.create_entity(
        CreateEntity::new(GRUNT, Vec2::new(4.0, 0.0))
            .with_id(EntityId(900))
            .remote(),
    );
    session.tick(DT);

    let packets: Vec<Packet> = rx.try_iter().collect();
    let announced: Vec<EntityId> = packets
        .iter()
        .filter_map(|p| match p {
            Packet::EntityCreated { id, .. } => Some(*id),
            _ => None,
        })
        .collect();
    assert_eq!(announced, vec![grunt]);
    // The owned grunt entered Idle and said so; the replica stayed quiet.
    assert!(packets.iter().any(|p| matches!(
        p,
        Packet::EntityStateChange { id, state: StateTag::Idle, .. } if *id == grunt
    )));
    assert!(!packets.iter().any(|p| matches!(
        p,
        Packet::EntityStateChange { id, .. } if *id == EntityId(900)
    )));
}

#[test]
fn host_and_replica_stay_in_step() {
    let mut host_config = quiet_config();
    host_config.player_id = PlayerId(0);
    let mut client_config = quiet_config();
    client_config.authoritative = false;
    client_config.player_id = PlayerId(1);
    client_config.id_base = 1 << 32;

    let (mut host, host_rx) = observed_session(host_config);
    let (mut client, client_rx) = observed_session(client_config);
    let grunt = host
        .create_entity(CreateEntity::new(GRUNT, Vec2::new(2.0, 0.0)))
        .unwrap();

    for _ in 0..3 {
        host.tick(DT);
        for packet in host_rx.try_iter() {
            client.handle().deliver(packet);
        }
        client.tick(DT);
        for packet in client_rx.try_iter() {
            host.handle().deliver(packet);
        }
    }
    assert_eq!(client.entity(grunt).unwrap().authority, Authority::Remote);

    // A hit landed on the client is forwarded to the host, which applies it.
    client.apply_damage(grunt, 1.0, Vec2::new(1.0, 0.0), 0.0);
    client.tick(DT);
    for packet in client_rx.try_iter() {
        host.handle().deliver(packet);
    }
    host.tick(DT);
    assert_eq!(host.entity(grunt).unwrap().health, Some(2.0));
    assert_eq!(host.entity(grunt).unwrap().state, Some(StateTag::Damage));

    // The host's DAMAGE announcement reaches the client.
    for packet in host_rx.try_iter() {
        client.handle().deliver(packet);
    }
    client.tick(DT);
    client.tick(DT);
    assert_eq!(client.entity(grunt).unwrap().state, Some(StateTag::Damage));

    host.remove_entity(grunt);
    host.tick(DT);
    for packet in host_rx.try_iter() {
        client.handle().deliver(packet);
    }
    client.tick(DT);
    assert!(client.entity(grunt).is_none());
}

#[test]
fn replica_player_scores_on_a_host_item() {
    let mut host_config = quiet_config();
    host_config.player_id = PlayerId(0);
    let mut client_config = quiet_config();
    client_config.authoritative = false;
    client_config.player_id = PlayerId(1);
    client_config.player_name = "guest".into();
    client_config.id_base = 1 << 32;

    let (mut host, host_rx) = observed_session(host_config);
    let (mut client, client_rx) = observed_session(client_config);
    host.add_participant(PlayerId(1), "guest");
    client.add_participant(PlayerId(0), "player");

    let coin = host
        .create_entity(CreateEntity::new(
            EntityKind::Item(ItemKind::Coin),
            Vec2::new(0.2, 0.0),
        ))
        .unwrap();
    client
        .world_mut()
        .resource_mut::<SpawnManager>()
        .register(Vec2::ZERO);
    let player = client.spawn_local_player().unwrap();

    for _ in 0..6 {
        host.tick(DT);
        for packet in host_rx.try_iter() {
            client.handle().deliver(packet);
        }
        client.tick(DT);
        for packet in client_rx.try_iter() {
            host.handle().deliver(packet);
        }
    }

    assert_eq!(client.scores().score(PlayerId(1)), Some(10));
    assert_eq!(host.scores().score(PlayerId(1)), Some(10));
    assert_eq!(host.scores().score(PlayerId(0)), Some(0));
    assert!(client.entity(coin).is_none());
    assert!(host.entity(coin).is_none());
    assert!(client.entity(player).is_some());
}
