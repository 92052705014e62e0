// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Constructors for every packet the server emits. Each returns the framed
//! bytes ready to be appended to an outbound queue.

use crate::{
    models::{
        channel::Channel, icon::MenuIcon, multiplayer::Match, session::Session,
        stats::Stats,
    },
    packets::{
        ids::ServerPackets,
        types::{Message, OsuChannel, OsuMatch, WireValue},
        writer::PacketWriter,
    },
};

pub fn user_id(id: i32) -> Vec<u8> {
    let mut packet = PacketWriter::from_id(ServerPackets::UserId);
    packet.write_i32(id);
    packet.serialise()
}

pub fn version_update_forced() -> Vec<u8> {
    PacketWriter::from_id(ServerPackets::VersionUpdateForced).serialise()
}

pub fn notification(msg: &str) -> Vec<u8> {
    let mut packet = PacketWriter::from_id(ServerPackets::Notification);
    packet.write_string(msg);
    packet.serialise()
}

pub fn protocol_version(version: i32) -> Vec<u8> {
    let mut packet = PacketWriter::from_id(ServerPackets::ProtocolVersion);
    packet.write_i32(version);
    packet.serialise()
}

pub fn bancho_privileges(privileges: i32) -> Vec<u8> {
    let mut packet = PacketWriter::from_id(ServerPackets::Privileges);
    packet.write_i32(privileges);
    packet.serialise()
}

pub fn channel_info_end() -> Vec<u8> {
    PacketWriter::from_id(ServerPackets::ChannelInfoEnd).serialise()
}

pub fn restart_server(millis: i32) -> Vec<u8> {
    let mut packet = PacketWriter::from_id(ServerPackets::Restart);
    packet.write_i32(millis);
    packet.serialise()
}

pub fn menu_icon(icon: &MenuIcon) -> Vec<u8> {
    let mut packet = PacketWriter::from_id(ServerPackets::MainMenuIcon);
    packet.write_string(&format!("{}|{}", icon.image_url, icon.click_url));
    packet.serialise()
}

pub fn friends_list(friends: &[i32]) -> Vec<u8> {
    let mut packet = PacketWriter::from_id(ServerPackets::FriendsList);
    packet.write_i32_list(friends);
    packet.serialise()
}

pub fn silence_end(seconds: i32) -> Vec<u8> {
    let mut packet = PacketWriter::from_id(ServerPackets::SilenceEnd);
    packet.write_i32(seconds);
    packet.serialise()
}

pub fn join_channel_success(channel_name: &str) -> Vec<u8> {
    let mut packet = PacketWriter::from_id(ServerPackets::ChannelJoinSuccess);
    packet.write_string(Channel::wire_name(channel_name));
    packet.serialise()
}

pub fn channel_info(channel: &Channel) -> Vec<u8> {
    let osu_channel = OsuChannel {
        name: Channel::wire_name(&channel.name).to_string(),
        topic: channel.description.clone(),
        player_count: channel.members.len() as i32,
    };

    let mut packet = PacketWriter::from_id(ServerPackets::ChannelInfo);
    let mut body = Vec::new();
    osu_channel.write(&mut body);
    packet.write(&body);
    packet.serialise()
}

pub fn channel_kick(channel_name: &str) -> Vec<u8> {
    let mut packet = PacketWriter::from_id(ServerPackets::ChannelKick);
    packet.write_string(Channel::wire_name(channel_name));
    packet.serialise()
}

pub fn user_presence(session: &Session, stats: &Stats) -> Vec<u8> {
    let mut packet = PacketWriter::from_id(ServerPackets::UserPresence);

    packet.write_i32(session.id());
    packet.write_string(session.name());
    packet.write_u8((session.utc_offset + 24) as u8);
    packet.write_u8(session.geolocation.country.code);
    packet.write_u8(
        session.bancho_privileges().bits() | (session.status.mode.as_vn() << 5),
    );
    packet.write_f32(session.geolocation.longitude);
    packet.write_f32(session.geolocation.latitude);
    packet.write_i32(stats.rank);

    packet.serialise()
}

pub fn user_stats(session: &Session, stats: &Stats) -> Vec<u8> {
    // The pp field is an i16 on the wire; overflowing values ride in the
    // ranked-score slot instead, which the client displays correctly.
    let (ranked_score, pp) = if stats.pp > 0x7fff as f32 {
        (stats.pp as i64, 0)
    } else {
        (stats.ranked_score, stats.pp as i16)
    };

    let mut packet = PacketWriter::from_id(ServerPackets::UserStats);

    packet.write_i32(session.id());
    packet.write_u8(session.status.action as u8);
    packet.write_string(&session.status.action_text);
    packet.write_string(&session.status.map_md5);
    packet.write_i32(session.status.mods.bits() as i32);
    packet.write_u8(session.status.mode.as_vn());
    packet.write_i32(session.status.map_id);
    packet.write_i64(ranked_score);
    packet.write_f32(stats.accuracy / 100.0);
    packet.write_i32(stats.playcount);
    packet.write_i64(stats.total_score);
    packet.write_i32(stats.rank);
    packet.write_i16(pp);

    packet.serialise()
}

pub fn user_restricted() -> Vec<u8> {
    PacketWriter::from_id(ServerPackets::AccountRestricted).serialise()
}

pub fn send_message(message: &Message) -> Vec<u8> {
    let mut packet = PacketWriter::from_id(ServerPackets::SendMessage);
    let mut body = Vec::new();
    message.write(&mut body);
    packet.write(&body);
    packet.serialise()
}

pub fn logout(user_id: i32) -> Vec<u8> {
    let mut packet = PacketWriter::from_id(ServerPackets::UserLogout);
    packet.write_i32(user_id);
    packet.write_u8(0);
    packet.serialise()
}

pub fn fellow_spectator_joined(user_id: i32) -> Vec<u8> {
    let mut packet = PacketWriter::from_id(ServerPackets::FellowSpectatorJoined);
    packet.write_i32(user_id);
    packet.serialise()
}

pub fn host_spectator_joined(user_id: i32) -> Vec<u8> {
    let mut packet = PacketWriter::from_id(ServerPackets::SpectatorJoined);
    packet.write_i32(user_id);
    packet.serialise()
}

pub fn fellow_spectator_left(user_id: i32) -> Vec<u8> {
    let mut packet = PacketWriter::from_id(ServerPackets::FellowSpectatorLeft);
    packet.write_i32(user_id);
    packet.serialise()
}

pub fn host_spectator_left(user_id: i32) -> Vec<u8> {
    let mut packet = PacketWriter::from_id(ServerPackets::SpectatorLeft);
    packet.write_i32(user_id);
    packet.serialise()
}

pub fn spectate_frames(frames: &[u8]) -> Vec<u8> {
    let mut packet = PacketWriter::from_id(ServerPackets::SpectateFrames);
    packet.write(frames);
    packet.serialise()
}

pub fn cant_spectate(user_id: i32) -> Vec<u8> {
    let mut packet = PacketWriter::from_id(ServerPackets::SpectatorCantSpectate);
    packet.write_i32(user_id);
    packet.serialise()
}

pub fn private_message_blocked(recipient_name: &str) -> Vec<u8> {
    let mut packet = PacketWriter::from_id(ServerPackets::UserDmBlocked);
    packet.write_string(recipient_name);
    packet.serialise()
}

pub fn target_silenced(recipient_name: &str) -> Vec<u8> {
    let mut packet = PacketWriter::from_id(ServerPackets::TargetIsSilenced);
    packet.write_string(recipient_name);
    packet.serialise()
}

/// Projects the domain match onto its wire record.
pub fn write_match(m: &Match) -> OsuMatch {
    let mut slot_statuses = [0u8; 16];
    let mut slot_teams = [0u8; 16];
    let mut slot_mods = [0u32; 16];

    for (idx, slot) in m.slots.iter().enumerate().take(16) {
        slot_statuses[idx] = slot.status.bits();
        slot_teams[idx] = slot.team as u8;
        slot_mods[idx] = slot.mods.bits();
    }

    OsuMatch {
        id: m.id as u16,
        in_progress: m.in_progress,
        mods: m.mods.bits(),
        name: m.name.clone(),
        password: m.password.clone(),
        map_name: m.map_title.clone().unwrap_or_default(),
        map_id: m.map_id.unwrap_or(-1),
        map_md5: m.map_md5.clone().unwrap_or_default(),
        slot_statuses,
        slot_teams,
        slot_user_ids: m
            .slots
            .iter()
            .filter_map(|slot| slot.session_id)
            .collect(),
        host_id: m.host_id,
        mode: m.mode.as_vn(),
        win_condition: m.win_condition as u8,
        team_type: m.team_type as u8,
        freemod: m.freemod,
        slot_mods,
        seed: m.seed,
    }
}

fn match_packet(id: ServerPackets, m: &Match, send_password: bool) -> Vec<u8> {
    let mut packet = PacketWriter::from_id(id);
    let mut body = Vec::new();
    write_match(m).serialise_into(&mut body, send_password);
    packet.write(&body);
    packet.serialise()
}

pub fn update_match(m: &Match, send_password: bool) -> Vec<u8> {
    match_packet(ServerPackets::UpdateMatch, m, send_password)
}

pub fn new_match(m: &Match) -> Vec<u8> {
    match_packet(ServerPackets::NewMatch, m, true)
}

pub fn match_start(m: &Match) -> Vec<u8> {
    match_packet(ServerPackets::MatchStart, m, true)
}

pub fn match_join_success(m: &Match) -> Vec<u8> {
    match_packet(ServerPackets::MatchJoinSuccess, m, true)
}

pub fn match_join_fail() -> Vec<u8> {
    PacketWriter::from_id(ServerPackets::MatchJoinFail).serialise()
}

pub fn dispose_match(match_id: i32) -> Vec<u8> {
    let mut packet = PacketWriter::from_id(ServerPackets::DisposeMatch);
    packet.write_i32(match_id);
    packet.serialise()
}

pub fn match_transfer_host() -> Vec<u8> {
    PacketWriter::from_id(ServerPackets::MatchTransferHost).serialise()
}

pub fn match_complete() -> Vec<u8> {
    PacketWriter::from_id(ServerPackets::MatchComplete).serialise()
}

pub fn match_all_players_loaded() -> Vec<u8> {
    PacketWriter::from_id(ServerPackets::MatchAllPlayersLoaded).serialise()
}

pub fn match_player_failed(slot_id: i32) -> Vec<u8> {
    let mut packet = PacketWriter::from_id(ServerPackets::MatchPlayerFailed);
    packet.write_i32(slot_id);
    packet.serialise()
}

pub fn match_player_skipped(user_id: i32) -> Vec<u8> {
    let mut packet = PacketWriter::from_id(ServerPackets::MatchPlayerSkipped);
    packet.write_i32(user_id);
    packet.serialise()
}

pub fn match_skip() -> Vec<u8> {
    PacketWriter::from_id(ServerPackets::MatchSkip).serialise()
}

/// Relays a raw score frame to the other players. Byte 11 of the framed
/// packet (offset 4 of the payload) is rewritten to the sender's slot index.
pub fn match_score_update(raw_frame: &[u8], slot_id: u8) -> Vec<u8> {
    let mut packet = PacketWriter::from_id(ServerPackets::MatchScoreUpdate);
    packet.write(raw_frame);

    let mut framed = packet.serialise();
    if framed.len() > 11 {
        framed[11] = slot_id;
    }
    framed
}

pub fn match_invite(sender: &Session, m: &Match, target_name: &str) -> Vec<u8> {
    let message = Message {
        sender_name: sender.name().to_string(),
        content: format!("Join my multiplayer match: {}", m.embed()),
        target: target_name.to_string(),
        sender_id: sender.id(),
    };

    let mut packet = PacketWriter::from_id(ServerPackets::MatchInvite);
    let mut body = Vec::new();
    message.write(&mut body);
    packet.write(&body);
    packet.serialise()
}
