// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;
use tracing::{info, warn};

use crate::{
    models::{channel::Channel, session::Session},
    packets::{
        models::{EmptyPacket, SpectateFramesPacket, StartSpectatingPacket},
        server as packets,
    },
    server::context::App,
    store::{channels, sessions},
};

/// Attaches `spectator` to `host`, creating the `#spec_<host>` channel on
/// first use and introducing the newcomer to every fellow spectator.
pub async fn add_spectator(
    app: &App,
    host: &mut Session,
    spectator: &mut Session,
) -> Result<()> {
    let channel_name = format!("#spec_{}", host.id());

    let mut spectator_channel =
        match channels::fetch_by_name(app, &channel_name).await? {
            Some(channel) => channel,
            None => {
                let mut channel = Channel::spectator(host.id(), host.name());
                channels::write_record(app, &channel).await?;
                chat_join(app, host, &mut channel).await?;
                channel
            },
        };

    chat_join(app, spectator, &mut spectator_channel).await?;

    let fellow_joined = packets::fellow_spectator_joined(spectator.id());
    for &host_spectator in &host.spectators {
        sessions::enqueue_data(app, host_spectator, &fellow_joined).await?;
        sessions::enqueue_data(
            app,
            spectator.id(),
            &packets::fellow_spectator_joined(host_spectator),
        )
        .await?;
    }

    sessions::enqueue_data(
        app,
        host.id(),
        &packets::host_spectator_joined(spectator.id()),
    )
    .await?;

    host.spectators.push(spectator.id());
    spectator.spectating = Some(host.id());

    sessions::write_records(app, host).await?;
    sessions::write_records(app, spectator).await?;

    info!("{} started spectating {}", spectator.name(), host.name());
    Ok(())
}

async fn chat_join(
    app: &App,
    session: &mut Session,
    channel: &mut Channel,
) -> Result<()> {
    super::chat::join_channel(app, session, channel).await?;
    Ok(())
}

/// Detaches `spectator` from the host. The spec channel dissolves with its
/// last member; remaining spectators learn about the departure.
pub async fn remove_spectator(
    app: &App,
    host_id: i32,
    spectator: &mut Session,
) -> Result<()> {
    let Some(mut host) = sessions::fetch_by_id(app, host_id).await? else {
        spectator.spectating = None;
        return Ok(());
    };

    host.spectators.retain(|&id| id != spectator.id());

    let channel_name = format!("#spec_{host_id}");
    let mut buffer = Vec::new();

    if let Some(spectator_channel) = channels::fetch_by_name(app, &channel_name).await? {
        super::chat::leave_channel(app, spectator, &channel_name).await?;

        if host.spectators.is_empty() {
            super::chat::leave_channel(app, &mut host, &channel_name).await?;
        } else {
            let channel_info = packets::channel_info(&spectator_channel);
            buffer.extend_from_slice(&channel_info);
            sessions::enqueue_data(app, host_id, &channel_info).await?;
        }
    }

    buffer.extend_from_slice(&packets::fellow_spectator_left(spectator.id()));
    for &host_spectator in &host.spectators {
        sessions::enqueue_data(app, host_spectator, &buffer).await?;
    }

    sessions::enqueue_data(
        app,
        host_id,
        &packets::host_spectator_left(spectator.id()),
    )
    .await?;

    spectator.spectating = None;

    sessions::write_records(app, &host).await?;
    sessions::write_records(app, spectator).await?;

    info!("{} stopped spectating {}", spectator.name(), host.name());
    Ok(())
}

pub async fn start_spectating(
    app: &App,
    session: &mut Session,
    packet: StartSpectatingPacket,
) -> Result<()> {
    if session.spectating == Some(packet.target_id) {
        return Ok(());
    }

    if let Some(current_host) = session.spectating {
        remove_spectator(app, current_host, session).await?;
    }

    let Some(mut host) = sessions::fetch_by_id(app, packet.target_id).await? else {
        warn!(
            "{} tried to spectate offline user {}",
            session.name(),
            packet.target_id
        );
        return Ok(());
    };

    add_spectator(app, &mut host, session).await
}

pub async fn stop_spectating(
    app: &App,
    session: &mut Session,
    _packet: EmptyPacket,
) -> Result<()> {
    let Some(host_id) = session.spectating else {
        warn!("{} stopped spectating while not spectating", session.name());
        return Ok(());
    };

    remove_spectator(app, host_id, session).await
}

pub async fn cant_spectate(
    app: &App,
    session: &mut Session,
    _packet: EmptyPacket,
) -> Result<()> {
    let Some(host_id) = session.spectating else {
        warn!("{} sent cant-spectate while not spectating", session.name());
        return Ok(());
    };

    let Some(host) = sessions::fetch_by_id(app, host_id).await? else {
        return Ok(());
    };

    let data = packets::cant_spectate(session.id());
    sessions::enqueue_data(app, host.id(), &data).await?;
    for &co_spectator in &host.spectators {
        if co_spectator != session.id() {
            sessions::enqueue_data(app, co_spectator, &data).await?;
        }
    }

    Ok(())
}

/// Forwards the un-decoded frame payload to every attached spectator.
pub async fn spectate_frames(
    app: &App,
    session: &mut Session,
    packet: SpectateFramesPacket,
) -> Result<()> {
    let data = packets::spectate_frames(&packet.bundle.raw);
    for &spectator_id in &session.spectators {
        sessions::enqueue_data(app, spectator_id, &data).await?;
    }
    Ok(())
}
