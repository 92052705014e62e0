// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;

use crate::{
    models::{
        mode::{Action, Mode, Mods, PresenceFilter},
        session::Session,
    },
    packets::{
        models::{
            ChangeActionPacket, EmptyPacket, PresenceRequestPacket, ReceiveUpdatesPacket,
            StatsRequestPacket,
        },
        server as packets,
    },
    server::context::App,
    store::sessions,
};

/// Writes the client-reported status into the session. Observers learn about
/// it through the coalesced persist at the end of the request.
pub async fn change_action(
    _app: &App,
    session: &mut Session,
    packet: ChangeActionPacket,
) -> Result<()> {
    let mods = Mods::from_bits_truncate(packet.mods);

    session.status.action = Action::from_u8(packet.action);
    session.status.action_text = packet.action_text;
    session.status.map_md5 = packet.map_md5;
    session.status.mods = mods;
    session.status.mode = Mode::from_mods(packet.mode, mods);
    session.status.map_id = packet.map_id;

    Ok(())
}

/// The client asking for its own fresh numbers.
pub async fn request_status_update(
    app: &App,
    session: &mut Session,
    _packet: EmptyPacket,
) -> Result<()> {
    let stats = app.stats.fetch(session.id(), session.status.mode).await?;

    let mut data = packets::user_presence(session, &stats);
    data.extend(packets::user_stats(session, &stats));
    sessions::enqueue_data(app, session.id(), &data).await
}

/// Visibility rule shared by the stats/presence request family: restricted
/// peers are invisible to everyone but themselves.
fn visible_to(target: &Session, caller: &Session) -> bool {
    target.is_public() || target.id() == caller.id()
}

pub async fn stats_request(
    app: &App,
    session: &mut Session,
    packet: StatsRequestPacket,
) -> Result<()> {
    for target_id in packet.session_ids {
        let Some(target) = sessions::fetch_by_id(app, target_id).await? else {
            continue;
        };
        if !visible_to(&target, session) {
            continue;
        }

        let stats = app.stats.fetch(target.id(), target.status.mode).await?;
        sessions::enqueue_data(app, session.id(), &packets::user_stats(&target, &stats))
            .await?;
    }

    Ok(())
}

pub async fn presence_request(
    app: &App,
    session: &mut Session,
    packet: PresenceRequestPacket,
) -> Result<()> {
    for target_id in packet.session_ids {
        let Some(target) = sessions::fetch_by_id(app, target_id).await? else {
            continue;
        };
        if !visible_to(&target, session) {
            continue;
        }

        let stats = app.stats.fetch(target.id(), target.status.mode).await?;
        sessions::enqueue_data(
            app,
            session.id(),
            &packets::user_presence(&target, &stats),
        )
        .await?;
    }

    Ok(())
}

pub async fn presence_request_all(
    app: &App,
    session: &mut Session,
    _packet: EmptyPacket,
) -> Result<()> {
    for target in sessions::fetch_all(app).await? {
        if !visible_to(&target, session) {
            continue;
        }

        let stats = app.stats.fetch(target.id(), target.status.mode).await?;
        sessions::enqueue_data(
            app,
            session.id(),
            &packets::user_presence(&target, &stats),
        )
        .await?;
    }

    Ok(())
}

pub async fn receive_updates(
    _app: &App,
    session: &mut Session,
    packet: ReceiveUpdatesPacket,
) -> Result<()> {
    session.status.presence_filter = PresenceFilter::from_i32(packet.filter);
    Ok(())
}
