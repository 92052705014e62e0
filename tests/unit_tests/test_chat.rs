// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;
use herbert_rs::{
    handlers::chat,
    packets::{models::MessagePacket, types::Message},
    store::{channels, sessions},
    utils::unix_timestamp,
};

use crate::unit_tests::{connect_session, split_packets, test_account, test_harness};

fn message_to(target: &str, content: &str) -> MessagePacket {
    MessagePacket {
        message: Message {
            sender_name: String::new(),
            content: content.to_string(),
            target: target.to_string(),
            sender_id: 0,
        },
    }
}

#[tokio::test]
async fn test_join_idempotent_and_lobby_gate() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    let mut session = connect_session(&harness, &test_account(1001, "Alice")).await?;

    let mut osu = channels::fetch_by_name(app, "#osu").await?.expect("seeded");
    assert!(chat::join_channel(app, &mut session, &mut osu).await?);
    assert!(!chat::join_channel(app, &mut session, &mut osu).await?);

    // #lobby requires the in-lobby flag
    let mut lobby = channels::fetch_by_name(app, "#lobby").await?.expect("seeded");
    assert!(!chat::join_channel(app, &mut session, &mut lobby).await?);
    session.in_lobby = true;
    assert!(chat::join_channel(app, &mut session, &mut lobby).await?);
    Ok(())
}

#[tokio::test]
async fn test_public_message_excludes_sender() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    let mut alice = connect_session(&harness, &test_account(1001, "Alice")).await?;
    let mut bob = connect_session(&harness, &test_account(1002, "Bob")).await?;

    let mut osu = channels::fetch_by_name(app, "#osu").await?.expect("seeded");
    chat::join_channel(app, &mut alice, &mut osu).await?;
    let mut osu = channels::fetch_by_name(app, "#osu").await?.expect("seeded");
    chat::join_channel(app, &mut bob, &mut osu).await?;

    // clear the join traffic
    sessions::dequeue_data(app, 1001).await?;
    sessions::dequeue_data(app, 1002).await?;

    chat::send_public_message(app, &mut alice, message_to("#osu", "hello")).await?;

    let bob_queue = sessions::dequeue_data(app, 1002).await?;
    let bob_packets = split_packets(&bob_queue);
    assert_eq!(bob_packets.len(), 1);
    assert_eq!(bob_packets[0].0, 7); // SEND_MESSAGE

    // bancho convention: the sender hears nothing back
    assert!(sessions::dequeue_data(app, 1001).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_write_protected_channel_drops() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    let mut alice = connect_session(&harness, &test_account(1001, "Alice")).await?;
    let mut bob = connect_session(&harness, &test_account(1002, "Bob")).await?;

    let mut announce = channels::fetch_by_name(app, "#announce").await?.expect("seeded");
    chat::join_channel(app, &mut alice, &mut announce).await?;
    let mut announce = channels::fetch_by_name(app, "#announce").await?.expect("seeded");
    chat::join_channel(app, &mut bob, &mut announce).await?;

    sessions::dequeue_data(app, 1002).await?;

    chat::send_public_message(app, &mut alice, message_to("#announce", "spam")).await?;
    assert!(sessions::dequeue_data(app, 1002).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_ignored_targets_accepted_and_dropped() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    let mut alice = connect_session(&harness, &test_account(1001, "Alice")).await?;
    chat::send_public_message(app, &mut alice, message_to("#highlight", "x")).await?;
    chat::send_public_message(app, &mut alice, message_to("#userlog", "x")).await?;
    Ok(())
}

#[tokio::test]
async fn test_dm_blocked_for_non_friend() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    let mut alice = connect_session(&harness, &test_account(1001, "Alice")).await?;
    let mut bob_account = test_account(1002, "Bob");
    bob_account.friends = vec![]; // Alice is not a friend
    let mut bob = connect_session(&harness, &bob_account).await?;
    bob.friend_only_dms = true;
    sessions::write_records(app, &bob).await?;

    chat::send_private_message(app, &mut alice, message_to("Bob", "hi bob")).await?;

    // Alice gets the block notice, Bob gets nothing
    let alice_queue = sessions::dequeue_data(app, 1001).await?;
    let alice_packets = split_packets(&alice_queue);
    assert_eq!(alice_packets.len(), 1);
    assert_eq!(alice_packets[0].0, 100); // USER_DM_BLOCKED

    assert!(sessions::dequeue_data(app, 1002).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_dm_to_silenced_target() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    let mut alice = connect_session(&harness, &test_account(1001, "Alice")).await?;
    let mut bob_account = test_account(1002, "Bob");
    bob_account.silence_end = unix_timestamp() + 3600;
    connect_session(&harness, &bob_account).await?;

    chat::send_private_message(app, &mut alice, message_to("Bob", "hi")).await?;

    let alice_packets = split_packets(&sessions::dequeue_data(app, 1001).await?);
    assert_eq!(alice_packets[0].0, 101); // TARGET_IS_SILENCED
    assert!(sessions::dequeue_data(app, 1002).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_dm_delivery() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    let mut bob_account = test_account(1002, "Bob");
    bob_account.friends = vec![1001];
    let mut alice = connect_session(&harness, &test_account(1001, "Alice")).await?;
    connect_session(&harness, &bob_account).await?;

    chat::send_private_message(app, &mut alice, message_to("Bob", "hi bob")).await?;

    let bob_packets = split_packets(&sessions::dequeue_data(app, 1002).await?);
    assert_eq!(bob_packets.len(), 1);
    assert_eq!(bob_packets[0].0, 7);
    Ok(())
}

#[tokio::test]
async fn test_silenced_sender_dropped() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    let mut alice_account = test_account(1001, "Alice");
    alice_account.silence_end = unix_timestamp() + 3600;
    let mut alice = connect_session(&harness, &alice_account).await?;
    connect_session(&harness, &test_account(1002, "Bob")).await?;

    chat::send_private_message(app, &mut alice, message_to("Bob", "hi")).await?;
    assert!(sessions::dequeue_data(app, 1002).await?.is_empty());
    Ok(())
}
