// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

/// Packet ids sent by the client. Ids missing from this enum are skipped by
/// the dispatcher using their declared length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ClientPackets {
    ChangeAction = 0,
    SendPublicMessage = 1,
    Logout = 2,
    RequestStatusUpdate = 3,
    Ping = 4,
    StartSpectating = 16,
    StopSpectating = 17,
    SpectateFrames = 18,
    CantSpectate = 21,
    SendPrivateMessage = 25,
    PartLobby = 29,
    JoinLobby = 30,
    CreateMatch = 31,
    JoinMatch = 32,
    PartMatch = 33,
    MatchChangeSlot = 38,
    MatchReady = 39,
    MatchLock = 40,
    MatchChangeSettings = 41,
    MatchStart = 44,
    MatchScoreUpdate = 47,
    MatchComplete = 49,
    MatchChangeMods = 51,
    MatchLoadComplete = 52,
    MatchNoBeatmap = 54,
    MatchNotReady = 55,
    MatchFailed = 56,
    MatchHasBeatmap = 59,
    MatchSkipRequest = 60,
    ChannelJoin = 63,
    BeatmapInfoRequest = 68,
    MatchTransferHost = 70,
    FriendAdd = 73,
    FriendRemove = 74,
    MatchChangeTeam = 77,
    ChannelPart = 78,
    ReceiveUpdates = 79,
    SetAwayMessage = 82,
    IrcOnly = 84,
    UserStatsRequest = 85,
    MatchInvite = 87,
    MatchChangePassword = 90,
    TournamentMatchInfoRequest = 93,
    UserPresenceRequest = 97,
    UserPresenceRequestAll = 98,
    ToggleBlockNonFriendDms = 99,
    TournamentJoinMatchChannel = 108,
    TournamentLeaveMatchChannel = 109,
}

impl ClientPackets {
    pub fn from_u16(id: u16) -> Option<Self> {
        Some(match id {
            0 => Self::ChangeAction,
            1 => Self::SendPublicMessage,
            2 => Self::Logout,
            3 => Self::RequestStatusUpdate,
            4 => Self::Ping,
            16 => Self::StartSpectating,
            17 => Self::StopSpectating,
            18 => Self::SpectateFrames,
            21 => Self::CantSpectate,
            25 => Self::SendPrivateMessage,
            29 => Self::PartLobby,
            30 => Self::JoinLobby,
            31 => Self::CreateMatch,
            32 => Self::JoinMatch,
            33 => Self::PartMatch,
            38 => Self::MatchChangeSlot,
            39 => Self::MatchReady,
            40 => Self::MatchLock,
            41 => Self::MatchChangeSettings,
            44 => Self::MatchStart,
            47 => Self::MatchScoreUpdate,
            49 => Self::MatchComplete,
            51 => Self::MatchChangeMods,
            52 => Self::MatchLoadComplete,
            54 => Self::MatchNoBeatmap,
            55 => Self::MatchNotReady,
            56 => Self::MatchFailed,
            59 => Self::MatchHasBeatmap,
            60 => Self::MatchSkipRequest,
            63 => Self::ChannelJoin,
            68 => Self::BeatmapInfoRequest,
            70 => Self::MatchTransferHost,
            73 => Self::FriendAdd,
            74 => Self::FriendRemove,
            77 => Self::MatchChangeTeam,
            78 => Self::ChannelPart,
            79 => Self::ReceiveUpdates,
            82 => Self::SetAwayMessage,
            84 => Self::IrcOnly,
            85 => Self::UserStatsRequest,
            87 => Self::MatchInvite,
            90 => Self::MatchChangePassword,
            93 => Self::TournamentMatchInfoRequest,
            97 => Self::UserPresenceRequest,
            98 => Self::UserPresenceRequestAll,
            99 => Self::ToggleBlockNonFriendDms,
            108 => Self::TournamentJoinMatchChannel,
            109 => Self::TournamentLeaveMatchChannel,
            _ => return None,
        })
    }
}

/// Packet ids sent by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ServerPackets {
    UserId = 5,
    SendMessage = 7,
    Pong = 8,
    UserStats = 11,
    UserLogout = 12,
    SpectatorJoined = 13,
    SpectatorLeft = 14,
    SpectateFrames = 15,
    VersionUpdate = 19,
    SpectatorCantSpectate = 22,
    GetAttention = 23,
    Notification = 24,
    UpdateMatch = 26,
    NewMatch = 27,
    DisposeMatch = 28,
    ToggleBlockNonFriendDms = 34,
    MatchJoinSuccess = 36,
    MatchJoinFail = 37,
    FellowSpectatorJoined = 42,
    FellowSpectatorLeft = 43,
    MatchStart = 46,
    MatchScoreUpdate = 48,
    MatchTransferHost = 50,
    MatchAllPlayersLoaded = 53,
    MatchPlayerFailed = 57,
    MatchComplete = 58,
    MatchSkip = 61,
    ChannelJoinSuccess = 64,
    ChannelInfo = 65,
    ChannelKick = 66,
    ChannelAutoJoin = 67,
    Privileges = 71,
    FriendsList = 72,
    ProtocolVersion = 75,
    MainMenuIcon = 76,
    Monitor = 80,
    MatchPlayerSkipped = 81,
    UserPresence = 83,
    Restart = 86,
    MatchInvite = 88,
    ChannelInfoEnd = 89,
    MatchChangePassword = 91,
    SilenceEnd = 92,
    UserSilenced = 94,
    UserDmBlocked = 100,
    TargetIsSilenced = 101,
    VersionUpdateForced = 102,
    SwitchServer = 103,
    AccountRestricted = 104,
    Rtx = 105,
    MatchAbort = 106,
}
