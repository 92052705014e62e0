//! Packet handlers and the table wiring them to packet ids.

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

pub mod chat;
pub mod friends;
pub mod multiplayer;
pub mod presence;
pub mod session;
pub mod spectator;

use crate::{
    models::session::Session,
    packets::{
        ids::ClientPackets,
        models::{
            AwayMessagePacket, ChangeActionPacket, ChangePasswordPacket,
            ChangeSettingsPacket, ChangeSlotPacket, ChannelPacket, CreateMatchPacket,
            EmptyPacket, FriendPacket, InvitePacket, JoinMatchPacket, LockSlotPacket,
            LogoutPacket, MatchIdPacket, MessagePacket, PacketPayload,
            PresenceRequestPacket, ReceiveUpdatesPacket, ScoreUpdatePacket,
            SpectateFramesPacket, StartSpectatingPacket, StatsRequestPacket,
            ToggleDmsPacket, TransferHostPacket,
        },
        reader::PacketReader,
    },
    server::{
        context::App,
        dispatch::{HandlerFuture, Packet, PacketHandlerFn, Registry},
    },
};

macro_rules! handler {
    ($payload:ty, $func:path) => {{
        fn wrapper<'a>(
            app: &'a App,
            session: &'a mut Session,
            packet: Packet<'a>,
        ) -> HandlerFuture<'a> {
            Box::pin(async move {
                let mut reader = PacketReader::new(packet.payload);
                let payload = <$payload as PacketPayload>::read(&mut reader);
                $func(app, session, payload).await
            })
        }
        wrapper as PacketHandlerFn
    }};
}

/// Builds the packet-id → handler table. Entries flagged `true` stay
/// reachable for restricted sessions.
pub fn registry() -> Registry {
    use ClientPackets as Id;

    let mut registry = Registry::new();

    registry.register(
        Id::ChangeAction,
        true,
        handler!(ChangeActionPacket, presence::change_action),
    );
    registry.register(
        Id::SendPublicMessage,
        false,
        handler!(MessagePacket, chat::send_public_message),
    );
    registry.register(Id::Logout, true, handler!(LogoutPacket, session::logout_handler));
    registry.register(
        Id::RequestStatusUpdate,
        true,
        handler!(EmptyPacket, presence::request_status_update),
    );

    registry.register(
        Id::StartSpectating,
        false,
        handler!(StartSpectatingPacket, spectator::start_spectating),
    );
    registry.register(
        Id::StopSpectating,
        false,
        handler!(EmptyPacket, spectator::stop_spectating),
    );
    registry.register(
        Id::SpectateFrames,
        false,
        handler!(SpectateFramesPacket, spectator::spectate_frames),
    );
    registry.register(
        Id::CantSpectate,
        false,
        handler!(EmptyPacket, spectator::cant_spectate),
    );

    registry.register(
        Id::SendPrivateMessage,
        false,
        handler!(MessagePacket, chat::send_private_message),
    );
    registry.register(
        Id::ChannelJoin,
        true,
        handler!(ChannelPacket, chat::channel_join),
    );
    registry.register(
        Id::ChannelPart,
        true,
        handler!(ChannelPacket, chat::channel_part),
    );
    registry.register(
        Id::SetAwayMessage,
        true,
        handler!(AwayMessagePacket, chat::set_away_message),
    );

    registry.register(
        Id::PartLobby,
        false,
        handler!(EmptyPacket, multiplayer::part_lobby),
    );
    registry.register(
        Id::JoinLobby,
        false,
        handler!(EmptyPacket, multiplayer::join_lobby),
    );
    registry.register(
        Id::CreateMatch,
        false,
        handler!(CreateMatchPacket, multiplayer::create_match),
    );
    registry.register(
        Id::JoinMatch,
        false,
        handler!(JoinMatchPacket, multiplayer::join_match_handler),
    );
    registry.register(
        Id::PartMatch,
        false,
        handler!(EmptyPacket, multiplayer::part_match),
    );
    registry.register(
        Id::MatchChangeSlot,
        false,
        handler!(ChangeSlotPacket, multiplayer::change_slot),
    );
    registry.register(Id::MatchReady, false, handler!(EmptyPacket, multiplayer::ready));
    registry.register(
        Id::MatchLock,
        false,
        handler!(LockSlotPacket, multiplayer::lock_slot),
    );
    registry.register(
        Id::MatchChangeSettings,
        false,
        handler!(ChangeSettingsPacket, multiplayer::change_settings),
    );
    registry.register(
        Id::MatchStart,
        false,
        handler!(EmptyPacket, multiplayer::match_start_handler),
    );
    registry.register(
        Id::MatchScoreUpdate,
        false,
        handler!(ScoreUpdatePacket, multiplayer::score_update),
    );
    registry.register(
        Id::MatchComplete,
        false,
        handler!(EmptyPacket, multiplayer::complete),
    );
    registry.register(
        Id::MatchLoadComplete,
        false,
        handler!(EmptyPacket, multiplayer::load_complete),
    );
    registry.register(
        Id::MatchNoBeatmap,
        false,
        handler!(EmptyPacket, multiplayer::no_beatmap),
    );
    registry.register(
        Id::MatchNotReady,
        false,
        handler!(EmptyPacket, multiplayer::not_ready),
    );
    registry.register(Id::MatchFailed, false, handler!(EmptyPacket, multiplayer::failed));
    registry.register(
        Id::MatchHasBeatmap,
        false,
        handler!(EmptyPacket, multiplayer::has_beatmap),
    );
    registry.register(
        Id::MatchSkipRequest,
        false,
        handler!(EmptyPacket, multiplayer::skip_request),
    );
    registry.register(
        Id::MatchTransferHost,
        false,
        handler!(TransferHostPacket, multiplayer::transfer_host),
    );
    registry.register(
        Id::MatchChangeTeam,
        false,
        handler!(EmptyPacket, multiplayer::change_team),
    );
    registry.register(
        Id::MatchChangePassword,
        false,
        handler!(ChangePasswordPacket, multiplayer::change_password),
    );
    registry.register(
        Id::MatchInvite,
        false,
        handler!(InvitePacket, multiplayer::invite),
    );
    registry.register(
        Id::TournamentMatchInfoRequest,
        false,
        handler!(MatchIdPacket, multiplayer::tournament_match_info),
    );
    registry.register(
        Id::TournamentJoinMatchChannel,
        false,
        handler!(MatchIdPacket, multiplayer::tournament_join_channel),
    );
    registry.register(
        Id::TournamentLeaveMatchChannel,
        false,
        handler!(MatchIdPacket, multiplayer::tournament_leave_channel),
    );

    registry.register(
        Id::FriendAdd,
        false,
        handler!(FriendPacket, friends::friend_add),
    );
    registry.register(
        Id::FriendRemove,
        false,
        handler!(FriendPacket, friends::friend_remove),
    );
    registry.register(
        Id::ToggleBlockNonFriendDms,
        true,
        handler!(ToggleDmsPacket, friends::toggle_block_non_friend_dms),
    );

    registry.register(
        Id::UserStatsRequest,
        true,
        handler!(StatsRequestPacket, presence::stats_request),
    );
    registry.register(
        Id::UserPresenceRequest,
        true,
        handler!(PresenceRequestPacket, presence::presence_request),
    );
    registry.register(
        Id::UserPresenceRequestAll,
        true,
        handler!(EmptyPacket, presence::presence_request_all),
    );
    registry.register(
        Id::ReceiveUpdates,
        true,
        handler!(ReceiveUpdatesPacket, presence::receive_updates),
    );

    registry
}
