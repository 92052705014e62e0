// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;
use herbert_rs::{
    handlers::spectator,
    packets::models::{EmptyPacket, SpectateFramesPacket, StartSpectatingPacket},
    packets::reader::PacketReader,
    packets::types::{ReplayFrameBundle, WireValue},
    store::{channels, sessions},
};

use crate::unit_tests::{connect_session, split_packets, test_account, test_harness};

#[tokio::test]
async fn test_spectate_lifecycle_and_channel() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    connect_session(&harness, &test_account(1001, "Bob")).await?;
    let mut alice = connect_session(&harness, &test_account(1002, "Alice")).await?;

    spectator::start_spectating(app, &mut alice, StartSpectatingPacket {
        target_id: 1001,
    })
    .await?;

    assert_eq!(alice.spectating, Some(1001));

    let bob = sessions::fetch_by_id(app, 1001).await?.expect("online");
    assert_eq!(bob.spectators, vec![1002]);

    // host and spectator share the spec channel
    let spec_channel = channels::fetch_by_name(app, "#spec_1001").await?.expect("created");
    assert!(spec_channel.temp && spec_channel.hidden);
    assert!(spec_channel.members.contains(&1001));
    assert!(spec_channel.members.contains(&1002));

    // SPECTATOR_JOINED reached the host
    let bob_ids: Vec<u16> = split_packets(&sessions::dequeue_data(app, 1001).await?)
        .iter()
        .map(|(id, _)| *id)
        .collect();
    assert!(bob_ids.contains(&13));

    spectator::stop_spectating(app, &mut alice, EmptyPacket).await?;
    assert_eq!(alice.spectating, None);

    // last spectator left: the channel dissolves with the host
    assert!(channels::fetch_by_name(app, "#spec_1001").await?.is_none());
    let bob = sessions::fetch_by_id(app, 1001).await?.expect("online");
    assert!(bob.spectators.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_frames_fan_out_to_all_spectators() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    connect_session(&harness, &test_account(1001, "Bob")).await?;
    let mut alice = connect_session(&harness, &test_account(1002, "Alice")).await?;
    let mut carol = connect_session(&harness, &test_account(1003, "Carol")).await?;

    spectator::start_spectating(app, &mut alice, StartSpectatingPacket {
        target_id: 1001,
    })
    .await?;
    spectator::start_spectating(app, &mut carol, StartSpectatingPacket {
        target_id: 1001,
    })
    .await?;

    sessions::dequeue_data(app, 1002).await?;
    sessions::dequeue_data(app, 1003).await?;

    // Bob relays a frame bundle
    let bundle = ReplayFrameBundle {
        sequence: 3,
        ..ReplayFrameBundle::default()
    };
    let mut frame_bytes = Vec::new();
    bundle.write(&mut frame_bytes);
    let mut reader = PacketReader::new(&frame_bytes);
    let parsed = ReplayFrameBundle::read(&mut reader);

    let mut bob = sessions::fetch_by_id(app, 1001).await?.expect("online");
    spectator::spectate_frames(app, &mut bob, SpectateFramesPacket { bundle: parsed })
        .await?;

    // each spectator got exactly one SPECTATE_FRAMES with the verbatim payload
    for spectator_id in [1002, 1003] {
        let queue = sessions::dequeue_data(app, spectator_id).await?;
        let packets = split_packets(&queue);
        assert_eq!(packets.len(), 1, "spectator {spectator_id}");
        assert_eq!(packets[0].0, 15);
        assert_eq!(packets[0].1, frame_bytes);
    }
    Ok(())
}

#[tokio::test]
async fn test_cant_spectate_notifies_host_and_peers() -> Result<()> {
    let harness = test_harness().await?;
    let app = &harness.app;

    connect_session(&harness, &test_account(1001, "Bob")).await?;
    let mut alice = connect_session(&harness, &test_account(1002, "Alice")).await?;
    let mut carol = connect_session(&harness, &test_account(1003, "Carol")).await?;

    spectator::start_spectating(app, &mut alice, StartSpectatingPacket {
        target_id: 1001,
    })
    .await?;
    spectator::start_spectating(app, &mut carol, StartSpectatingPacket {
        target_id: 1001,
    })
    .await?;

    sessions::dequeue_data(app, 1001).await?;
    sessions::dequeue_data(app, 1003).await?;

    spectator::cant_spectate(app, &mut alice, EmptyPacket).await?;

    for watcher in [1001, 1003] {
        let ids: Vec<u16> = split_packets(&sessions::dequeue_data(app, watcher).await?)
            .iter()
            .map(|(id, _)| *id)
            .collect();
        assert!(ids.contains(&22), "watcher {watcher}");
    }
    Ok(())
}
