// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;
use tracing::{info, warn};

use crate::{
    models::{channel::Channel, session::Session},
    packets::{
        models::{AwayMessagePacket, ChannelPacket, MessagePacket},
        server as packets,
        types::Message,
    },
    server::context::App,
    store::{channels, sessions},
};

/// Message targets the client uses for its own bookkeeping; accepted and
/// dropped.
const IGNORED_TARGETS: [&str; 2] = ["#highlight", "#userlog"];

/// Adds the session to a channel. Idempotent-safe: returns false when the
/// session is already a member or the channel policy denies the join.
pub async fn join_channel(
    app: &App,
    session: &mut Session,
    channel: &mut Channel,
) -> Result<bool> {
    if channel.members.contains(&session.id()) {
        return Ok(false);
    }

    if !channel.public_read && !session.account.is_staff() {
        return Ok(false);
    }

    if channel.name == "#lobby" && !session.in_lobby {
        return Ok(false);
    }

    session.channels.push(channel.name.clone());
    sessions::write_records(app, session).await?;

    channel.members.push(session.id());
    channels::update(app, channel).await?;

    sessions::enqueue_data(
        app,
        session.id(),
        &packets::join_channel_success(&channel.name),
    )
    .await?;

    info!("{} joined {}", session.name(), channel.name);
    Ok(true)
}

/// Removes the session from a channel. Temp channels are disposed when their
/// last member leaves.
pub async fn leave_channel(
    app: &App,
    session: &mut Session,
    channel_name: &str,
) -> Result<()> {
    if let Some(mut channel) = channels::fetch_by_name(app, channel_name).await? {
        channel.members.retain(|&member_id| member_id != session.id());

        if channel.temp && channel.members.is_empty() {
            channels::delete(app, &channel).await?;
        } else {
            channels::update(app, &channel).await?;
        }
    }

    session.channels.retain(|name| name != channel_name);
    sessions::write_records(app, session).await
}

/// Delivers a chat line to a channel's members. The sender is excluded unless
/// `to_self` is set; non-members and read-only channels drop silently.
pub async fn send_channel_message(
    app: &App,
    sender: &Session,
    channel: &Channel,
    content: &str,
    to_self: bool,
) -> Result<()> {
    if !channel.members.contains(&sender.id()) {
        warn!(
            "{} tried to write to {} without being a member",
            sender.name(),
            channel.name
        );
        return Ok(());
    }

    if !channel.public_write && !sender.account.is_staff() {
        warn!("{} cannot write to {}", sender.name(), channel.name);
        return Ok(());
    }

    let message = Message {
        sender_name: sender.name().to_string(),
        content: content.to_string(),
        target: Channel::wire_name(&channel.name).to_string(),
        sender_id: sender.id(),
    };
    let data = packets::send_message(&message);

    for &member_id in &channel.members {
        if member_id == sender.id() && !to_self {
            continue;
        }
        sessions::enqueue_data(app, member_id, &data).await?;
    }

    Ok(())
}

/// Maps the aliased names the client speaks back onto the session's actual
/// ephemeral channel.
fn resolve_target(session: &Session, target: &str) -> Option<String> {
    match target {
        "#multiplayer" => session.match_id.map(|match_id| format!("#multi_{match_id}")),
        "#spectator" => Some(format!(
            "#spec_{}",
            session.spectating.unwrap_or_else(|| session.id())
        )),
        _ => Some(target.to_string()),
    }
}

pub async fn send_public_message(
    app: &App,
    session: &mut Session,
    packet: MessagePacket,
) -> Result<()> {
    if session.is_silenced() {
        warn!("{} tried to chat while silenced", session.name());
        return Ok(());
    }

    let target = packet.message.target.as_str();
    if IGNORED_TARGETS.contains(&target) {
        return Ok(());
    }

    let Some(channel_name) = resolve_target(session, target) else {
        warn!("{} messaged {target} without a backing channel", session.name());
        return Ok(());
    };

    let Some(channel) = channels::fetch_by_name(app, &channel_name).await? else {
        warn!("{} messaged non-existent channel {channel_name}", session.name());
        return Ok(());
    };

    send_channel_message(app, session, &channel, &packet.message.content, false).await
}

pub async fn send_private_message(
    app: &App,
    session: &mut Session,
    packet: MessagePacket,
) -> Result<()> {
    if session.is_silenced() {
        warn!("{} tried to DM while silenced", session.name());
        return Ok(());
    }

    let Some(recipient) =
        sessions::fetch_by_name(app, &packet.message.target).await?
    else {
        warn!(
            "{} sent a DM to offline user {}",
            session.name(),
            packet.message.target
        );
        return Ok(());
    };

    if recipient.friend_only_dms && !recipient.account.friends.contains(&session.id()) {
        sessions::enqueue_data(
            app,
            session.id(),
            &packets::private_message_blocked(recipient.name()),
        )
        .await?;
        return Ok(());
    }

    if recipient.is_silenced() {
        sessions::enqueue_data(
            app,
            session.id(),
            &packets::target_silenced(recipient.name()),
        )
        .await?;
        return Ok(());
    }

    let message = Message {
        sender_name: session.name().to_string(),
        content: packet.message.content.clone(),
        target: recipient.name().to_string(),
        sender_id: session.id(),
    };
    sessions::enqueue_data(app, recipient.id(), &packets::send_message(&message)).await
}

pub async fn channel_join(
    app: &App,
    session: &mut Session,
    packet: ChannelPacket,
) -> Result<()> {
    let Some(channel_name) = resolve_target(session, &packet.name) else {
        return Ok(());
    };

    let Some(mut channel) = channels::fetch_by_name(app, &channel_name).await? else {
        warn!("{} tried to join unknown channel {channel_name}", session.name());
        return Ok(());
    };

    join_channel(app, session, &mut channel).await?;
    Ok(())
}

pub async fn channel_part(
    app: &App,
    session: &mut Session,
    packet: ChannelPacket,
) -> Result<()> {
    let Some(channel_name) = resolve_target(session, &packet.name) else {
        return Ok(());
    };

    if !session.channels.contains(&channel_name) {
        return Ok(());
    }

    leave_channel(app, session, &channel_name).await
}

pub async fn set_away_message(
    _app: &App,
    session: &mut Session,
    packet: AwayMessagePacket,
) -> Result<()> {
    let content = packet.message.content;
    session.away_message = (!content.is_empty()).then_some(content);
    Ok(())
}
