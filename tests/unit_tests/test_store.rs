// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;
use herbert_rs::{
    models::{
        channel::Channel,
        mode::{Mode, Mods},
        multiplayer::Match,
        stats::Stats,
    },
    packets::server as packets,
    store::{channels, matches, sessions},
};

use crate::unit_tests::{connect_session, split_packets, test_account, test_harness};

#[tokio::test]
async fn test_queue_fifo_and_destructive_drain() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    sessions::enqueue_data(app, 1001, b"abc").await?;
    sessions::enqueue_data(app, 1001, b"def").await?;

    assert_eq!(&sessions::dequeue_data(app, 1001).await?[..], b"abcdef");
    assert!(sessions::dequeue_data(app, 1001).await?.is_empty());

    sessions::enqueue_data(app, 1001, b"x").await?;
    assert_eq!(&sessions::dequeue_data(app, 1001).await?[..], b"x");
    Ok(())
}

#[tokio::test]
async fn test_session_indices_map_back() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    let account = test_account(1001, "Cool Guy");
    let session = connect_session(&harness, &account).await?;

    let by_id = sessions::fetch_by_id(app, 1001).await?.expect("by id");
    let by_name = sessions::fetch_by_name(app, "Cool Guy").await?.expect("by name");
    let by_token = sessions::fetch_by_token(app, &session.token)
        .await?
        .expect("by token");

    for found in [&by_id, &by_name, &by_token] {
        assert_eq!(found.id(), session.id());
        assert_eq!(found.token, session.token);
        assert_eq!(found.safe_name(), "cool_guy");
    }

    assert_eq!(sessions::fetch_all(app).await?.len(), 1);
    assert_eq!(sessions::session_ids(app).await?, vec![1001]);
    Ok(())
}

#[tokio::test]
async fn test_session_delete_removes_all_indices() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    let session = connect_session(&harness, &test_account(1001, "Cool Guy")).await?;
    sessions::delete(app, &session).await?;
    sessions::remove_from_session_list(app, &session).await?;

    assert!(sessions::fetch_by_id(app, 1001).await?.is_none());
    assert!(sessions::fetch_by_name(app, "Cool Guy").await?.is_none());
    assert!(sessions::fetch_by_token(app, &session.token).await?.is_none());
    assert!(sessions::session_ids(app).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_temp_channel_disposed_when_empty() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    let mut session = connect_session(&harness, &test_account(1001, "Alice")).await?;

    let mut channel = Channel::spectator(1001, "Alice");
    channels::write_record(app, &channel).await?;

    herbert_rs::handlers::chat::join_channel(app, &mut session, &mut channel).await?;
    assert!(channels::fetch_by_name(app, "#spec_1001").await?.is_some());

    herbert_rs::handlers::chat::leave_channel(app, &mut session, "#spec_1001").await?;
    assert!(channels::fetch_by_name(app, "#spec_1001").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_persistent_channel_survives_empty() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    let mut session = connect_session(&harness, &test_account(1001, "Alice")).await?;
    let mut channel = channels::fetch_by_name(app, "#osu").await?.expect("seeded");

    herbert_rs::handlers::chat::join_channel(app, &mut session, &mut channel).await?;
    herbert_rs::handlers::chat::leave_channel(app, &mut session, "#osu").await?;

    let channel = channels::fetch_by_name(app, "#osu").await?.expect("still there");
    assert!(channel.members.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_channel_initialise_skips_existing() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    let mut channel = channels::fetch_by_name(app, "#osu").await?.expect("seeded");
    channel.members.push(1001);
    channels::write_record(app, &channel).await?;

    // a second initialise must not wipe the membership
    channels::initialise(app).await?;
    let channel = channels::fetch_by_name(app, "#osu").await?.expect("seeded");
    assert_eq!(channel.members, vec![1001]);
    Ok(())
}

#[tokio::test]
async fn test_user_stats_pp_overflow() -> Result<()> {
    let harness = test_harness().await?;

    let session = connect_session(&harness, &test_account(1001, "Alice")).await?;
    harness.stats.insert(Stats {
        pp: 40_000.0,
        ranked_score: 123,
        ..Stats::empty(1001, Mode::Std)
    });

    let stats = harness.app.stats.fetch(1001, Mode::Std).await?;
    let packet = &split_packets(&packets::user_stats(&session, &stats))[0];
    assert_eq!(packet.0, 11);

    // the i16 pp field cannot carry 40k; it rides in the ranked-score slot
    let payload = &packet.1;
    let ranked_score =
        i64::from_le_bytes(payload[payload.len() - 30..payload.len() - 22].try_into()?);
    let pp = i16::from_le_bytes(payload[payload.len() - 2..].try_into()?);
    assert_eq!(ranked_score, 40_000);
    assert_eq!(pp, 0);
    Ok(())
}

#[tokio::test]
async fn test_match_store_indices() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    let m = Match::new(1, "My Room".to_string(), 1001, Mods::empty(), Mode::Std);
    matches::write_record(app, &m).await?;

    assert!(matches::fetch_by_id(app, 1).await?.is_some());
    assert!(matches::fetch_by_name(app, "My Room").await?.is_some());
    assert_eq!(matches::next_match_id(app).await?, 2);

    matches::delete(app, &m).await?;
    assert!(matches::fetch_by_id(app, 1).await?.is_none());
    assert_eq!(matches::next_match_id(app).await?, 1);
    Ok(())
}
