// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;
use herbert_rs::{
    handlers::{chat, multiplayer},
    models::{
        mode::Mods,
        multiplayer::{MatchTeam, MatchTeamType, SlotStatus},
        session::Session,
    },
    packets::{
        models::{
            ChangeSettingsPacket, ChangeSlotPacket, CreateMatchPacket, EmptyPacket,
            JoinMatchPacket, ScoreUpdatePacket, TransferHostPacket,
        },
        server as server_packets,
        types::{OsuMatch, RawBytes},
    },
    store::{channels, matches, sessions},
};

use crate::unit_tests::{
    TestHarness, connect_session, split_packets, test_account, test_harness,
};

fn create_packet(name: &str, password: Option<&str>) -> CreateMatchPacket {
    CreateMatchPacket {
        match_data: OsuMatch {
            name: name.to_string(),
            password: password.map(str::to_string),
            map_name: "artist - song [hard]".to_string(),
            map_id: 555,
            map_md5: "abcdabcdabcdabcdabcdabcdabcdabcd".to_string(),
            ..OsuMatch::default()
        },
    }
}

async fn setup_room(harness: &TestHarness) -> Result<(Session, Session)> {
    let mut alice = connect_session(harness, &test_account(1001, "Alice")).await?;
    let mut bob = connect_session(harness, &test_account(1002, "Bob")).await?;

    multiplayer::create_match(&harness.app, &mut alice, create_packet("room", Some("pw")))
        .await?;
    multiplayer::join_match_handler(&harness.app, &mut bob, JoinMatchPacket {
        match_id: 1,
        password: "pw".to_string(),
    })
    .await?;

    Ok((alice, bob))
}

#[tokio::test]
async fn test_create_and_join() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    let (alice, bob) = setup_room(&harness).await?;

    let m = matches::fetch_by_id(app, 1).await?.expect("created");
    assert_eq!(m.host_id, 1001);
    assert_eq!(m.get_slot_idx(1001), Some(0));
    assert_eq!(m.get_slot_idx(1002), Some(1));
    assert_eq!(alice.match_id, Some(1));
    assert_eq!(bob.match_id, Some(1));

    // the room channel exists and holds both players
    let chat = channels::fetch_by_name(app, "#multi_1").await?.expect("room chat");
    assert!(chat.members.contains(&1001) && chat.members.contains(&1002));

    // both got MATCH_JOIN_SUCCESS
    for id in [1001, 1002] {
        let ids: Vec<u16> = split_packets(&sessions::dequeue_data(app, id).await?)
            .iter()
            .map(|(id, _)| *id)
            .collect();
        assert!(ids.contains(&36), "user {id}");
    }
    Ok(())
}

#[tokio::test]
async fn test_wrong_password_fails() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    let mut alice = connect_session(&harness, &test_account(1001, "Alice")).await?;
    let mut bob = connect_session(&harness, &test_account(1002, "Bob")).await?;

    multiplayer::create_match(app, &mut alice, create_packet("room", Some("pw"))).await?;
    multiplayer::join_match_handler(app, &mut bob, JoinMatchPacket {
        match_id: 1,
        password: "wrong".to_string(),
    })
    .await?;

    assert_eq!(bob.match_id, None);
    let ids: Vec<u16> = split_packets(&sessions::dequeue_data(app, 1002).await?)
        .iter()
        .map(|(id, _)| *id)
        .collect();
    assert!(ids.contains(&37)); // MATCH_JOIN_FAIL
    Ok(())
}

#[tokio::test]
async fn test_host_transfer_and_dispose() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    // Carol sits in the lobby to observe the dispose broadcast
    let mut carol = connect_session(&harness, &test_account(1003, "Carol")).await?;
    carol.in_lobby = true;
    let mut lobby = channels::fetch_by_name(app, "#lobby").await?.expect("seeded");
    chat::join_channel(app, &mut carol, &mut lobby).await?;

    let (mut alice, mut bob) = setup_room(&harness).await?;
    sessions::dequeue_data(app, 1002).await?;
    sessions::dequeue_data(app, 1003).await?;

    // host leaves: Bob inherits the room
    multiplayer::part_match(app, &mut alice, EmptyPacket).await?;
    let m = matches::fetch_by_id(app, 1).await?.expect("still alive");
    assert_eq!(m.host_id, 1002);

    let bob_ids: Vec<u16> = split_packets(&sessions::dequeue_data(app, 1002).await?)
        .iter()
        .map(|(id, _)| *id)
        .collect();
    assert!(bob_ids.contains(&50)); // MATCH_TRANSFER_HOST

    // last player leaves: match disposed, lobby notified
    multiplayer::part_match(app, &mut bob, EmptyPacket).await?;
    assert!(matches::fetch_by_id(app, 1).await?.is_none());
    assert!(channels::fetch_by_name(app, "#multi_1").await?.is_none());

    let carol_packets = split_packets(&sessions::dequeue_data(app, 1003).await?);
    let dispose = carol_packets
        .iter()
        .find(|(id, _)| *id == 28)
        .expect("DISPOSE_MATCH");
    assert_eq!(dispose.1, 1i32.to_le_bytes());
    Ok(())
}

#[tokio::test]
async fn test_change_slot_rules() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    let (_alice, mut bob) = setup_room(&harness).await?;

    // moving onto an occupied slot is refused
    multiplayer::change_slot(app, &mut bob, ChangeSlotPacket { slot_id: 0 }).await?;
    let m = matches::fetch_by_id(app, 1).await?.expect("alive");
    assert_eq!(m.get_slot_idx(1002), Some(1));

    multiplayer::change_slot(app, &mut bob, ChangeSlotPacket { slot_id: 5 }).await?;
    let m = matches::fetch_by_id(app, 1).await?.expect("alive");
    assert_eq!(m.get_slot_idx(1002), Some(5));
    assert_eq!(m.slots[1].status, SlotStatus::OPEN);

    // out of range is ignored
    multiplayer::change_slot(app, &mut bob, ChangeSlotPacket { slot_id: 16 }).await?;
    let m = matches::fetch_by_id(app, 1).await?.expect("alive");
    assert_eq!(m.get_slot_idx(1002), Some(5));
    Ok(())
}

#[tokio::test]
async fn test_freemod_transitions() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    let (mut alice, _bob) = setup_room(&harness).await?;

    // give the match DT + HD, then enable freemod
    let mut m = matches::fetch_by_id(app, 1).await?.expect("alive");
    m.mods = Mods::DOUBLE_TIME | Mods::HIDDEN;
    matches::write_record(app, &m).await?;

    let mut data = server_packets::write_match(&m);
    data.freemod = true;
    multiplayer::change_settings(app, &mut alice, ChangeSettingsPacket {
        match_data: data,
    })
    .await?;

    let m = matches::fetch_by_id(app, 1).await?.expect("alive");
    assert!(m.freemod);
    // speed mods stay global, the rest moved into the occupied slots
    assert_eq!(m.mods, Mods::DOUBLE_TIME);
    assert_eq!(m.slots[0].mods, Mods::HIDDEN);
    assert_eq!(m.slots[1].mods, Mods::HIDDEN);
    assert_eq!(m.slots[2].mods, Mods::empty());

    // host picks up HARDROCK, freemod is then disabled
    let mut m = matches::fetch_by_id(app, 1).await?.expect("alive");
    m.slots[0].mods = Mods::HIDDEN | Mods::HARDROCK;
    matches::write_record(app, &m).await?;

    let mut data = server_packets::write_match(&m);
    data.freemod = false;
    multiplayer::change_settings(app, &mut alice, ChangeSettingsPacket {
        match_data: data,
    })
    .await?;

    let m = matches::fetch_by_id(app, 1).await?.expect("alive");
    assert!(!m.freemod);
    assert_eq!(m.mods, Mods::DOUBLE_TIME | Mods::HIDDEN | Mods::HARDROCK);
    assert!(m.slots.iter().all(|slot| slot.mods.is_empty()));
    Ok(())
}

#[tokio::test]
async fn test_map_unset_unreadies() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    let (mut alice, mut bob) = setup_room(&harness).await?;
    multiplayer::ready(app, &mut bob, EmptyPacket).await?;

    let m = matches::fetch_by_id(app, 1).await?.expect("alive");
    assert_eq!(m.slots[1].status, SlotStatus::READY);

    let mut data = server_packets::write_match(&m);
    data.map_id = -1;
    data.map_name = String::new();
    data.map_md5 = String::new();
    multiplayer::change_settings(app, &mut alice, ChangeSettingsPacket {
        match_data: data,
    })
    .await?;

    let m = matches::fetch_by_id(app, 1).await?.expect("alive");
    assert_eq!(m.map_id, None);
    assert_eq!(m.last_map_id, Some(555));
    assert_eq!(m.slots[1].status, SlotStatus::NOT_READY);
    Ok(())
}

#[tokio::test]
async fn test_start_skips_users_without_map() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    let (mut alice, mut bob) = setup_room(&harness).await?;
    multiplayer::no_beatmap(app, &mut bob, EmptyPacket).await?;

    sessions::dequeue_data(app, 1001).await?;
    sessions::dequeue_data(app, 1002).await?;

    multiplayer::match_start_handler(app, &mut alice, EmptyPacket).await?;

    let m = matches::fetch_by_id(app, 1).await?.expect("alive");
    assert!(m.in_progress);
    assert_eq!(m.slots[0].status, SlotStatus::PLAYING);
    assert_eq!(m.slots[1].status, SlotStatus::NO_MAP);

    // Alice got MATCH_START, Bob (no map) is immune
    let alice_ids: Vec<u16> = split_packets(&sessions::dequeue_data(app, 1001).await?)
        .iter()
        .map(|(id, _)| *id)
        .collect();
    assert!(alice_ids.contains(&46));

    let bob_ids: Vec<u16> = split_packets(&sessions::dequeue_data(app, 1002).await?)
        .iter()
        .map(|(id, _)| *id)
        .collect();
    assert!(!bob_ids.contains(&46));
    Ok(())
}

#[tokio::test]
async fn test_score_update_patches_slot_index() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    let (mut alice, mut bob) = setup_room(&harness).await?;
    multiplayer::change_slot(app, &mut bob, ChangeSlotPacket { slot_id: 4 }).await?;
    multiplayer::match_start_handler(app, &mut alice, EmptyPacket).await?;

    sessions::dequeue_data(app, 1001).await?;
    sessions::dequeue_data(app, 1002).await?;

    // 29-byte score frame with a zeroed slot byte
    let raw_frame = vec![0u8; 29];
    multiplayer::score_update(app, &mut bob, ScoreUpdatePacket {
        raw: RawBytes(raw_frame),
    })
    .await?;

    let alice_packets = split_packets(&sessions::dequeue_data(app, 1001).await?);
    assert_eq!(alice_packets.len(), 1);
    assert_eq!(alice_packets[0].0, 48); // MATCH_SCORE_UPDATE
    // payload byte 4 (framed byte 11) now carries Bob's slot index
    assert_eq!(alice_packets[0].1[4], 4);

    // the sender does not hear its own frame back
    assert!(sessions::dequeue_data(app, 1002).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_complete_barrier() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    let (mut alice, mut bob) = setup_room(&harness).await?;
    multiplayer::match_start_handler(app, &mut alice, EmptyPacket).await?;

    multiplayer::complete(app, &mut alice, EmptyPacket).await?;
    let m = matches::fetch_by_id(app, 1).await?.expect("alive");
    assert!(m.in_progress, "one player still going");

    sessions::dequeue_data(app, 1001).await?;
    sessions::dequeue_data(app, 1002).await?;

    multiplayer::complete(app, &mut bob, EmptyPacket).await?;
    let m = matches::fetch_by_id(app, 1).await?.expect("alive");
    assert!(!m.in_progress);
    assert!(m.slots.iter().all(|slot| slot.status != SlotStatus::PLAYING));

    let alice_ids: Vec<u16> = split_packets(&sessions::dequeue_data(app, 1001).await?)
        .iter()
        .map(|(id, _)| *id)
        .collect();
    assert!(alice_ids.contains(&58)); // MATCH_COMPLETE
    Ok(())
}

#[tokio::test]
async fn test_transfer_host_rules() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    let (mut alice, mut bob) = setup_room(&harness).await?;

    // non-host cannot transfer
    multiplayer::transfer_host(app, &mut bob, TransferHostPacket { slot_id: 1 }).await?;
    let m = matches::fetch_by_id(app, 1).await?.expect("alive");
    assert_eq!(m.host_id, 1001);

    // host transfers to an empty slot: refused
    multiplayer::transfer_host(app, &mut alice, TransferHostPacket { slot_id: 9 })
        .await?;
    let m = matches::fetch_by_id(app, 1).await?.expect("alive");
    assert_eq!(m.host_id, 1001);

    multiplayer::transfer_host(app, &mut alice, TransferHostPacket { slot_id: 1 })
        .await?;
    let m = matches::fetch_by_id(app, 1).await?.expect("alive");
    assert_eq!(m.host_id, 1002);
    Ok(())
}

#[tokio::test]
async fn test_team_vs_assigns_red() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    let (mut alice, _bob) = setup_room(&harness).await?;

    let m = matches::fetch_by_id(app, 1).await?.expect("alive");
    let mut data = server_packets::write_match(&m);
    data.team_type = MatchTeamType::TeamVs as u8;
    multiplayer::change_settings(app, &mut alice, ChangeSettingsPacket {
        match_data: data,
    })
    .await?;

    let m = matches::fetch_by_id(app, 1).await?.expect("alive");
    assert_eq!(m.team_type, MatchTeamType::TeamVs);
    assert_eq!(m.slots[0].team, MatchTeam::Red);
    assert_eq!(m.slots[1].team, MatchTeam::Red);

    // a fresh joiner in versus mode starts on red too
    let mut carol = connect_session(&harness, &test_account(1003, "Carol")).await?;
    multiplayer::join_match_handler(app, &mut carol, JoinMatchPacket {
        match_id: 1,
        password: "pw".to_string(),
    })
    .await?;
    let m = matches::fetch_by_id(app, 1).await?.expect("alive");
    let slot = m.get_slot(1003).expect("seated");
    assert_eq!(slot.team, MatchTeam::Red);
    Ok(())
}
