// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Gameplay modifier bitmask as sent by the client.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Mods: u32 {
        const NOFAIL = 1 << 0;
        const EASY = 1 << 1;
        const TOUCHSCREEN = 1 << 2;
        const HIDDEN = 1 << 3;
        const HARDROCK = 1 << 4;
        const SUDDEN_DEATH = 1 << 5;
        const DOUBLE_TIME = 1 << 6;
        const RELAX = 1 << 7;
        const HALF_TIME = 1 << 8;
        const NIGHTCORE = 1 << 9;
        const FLASHLIGHT = 1 << 10;
        const AUTOPLAY = 1 << 11;
        const SPUN_OUT = 1 << 12;
        const AUTOPILOT = 1 << 13;
        const PERFECT = 1 << 14;
        const KEY4 = 1 << 15;
        const KEY5 = 1 << 16;
        const KEY6 = 1 << 17;
        const KEY7 = 1 << 18;
        const KEY8 = 1 << 19;
        const FADE_IN = 1 << 20;
        const RANDOM = 1 << 21;
        const CINEMA = 1 << 22;
        const TARGET = 1 << 23;
        const KEY9 = 1 << 24;
        const KEY_COOP = 1 << 25;
        const KEY1 = 1 << 26;
        const KEY3 = 1 << 27;
        const KEY2 = 1 << 28;
        const SCOREV2 = 1 << 29;
        const MIRROR = 1 << 30;

        /// Mods that affect playback speed; the only ones that stay global
        /// when a match enables freemod.
        const SPEED_MODS = Self::DOUBLE_TIME.bits()
            | Self::NIGHTCORE.bits()
            | Self::HALF_TIME.bits();
    }
}

/// Extended mode ids: vanilla 0-3, relax variants at 4-6, autopilot at 8.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Mode {
    #[default]
    Std = 0,
    Taiko = 1,
    Catch = 2,
    Mania = 3,

    RelaxStd = 4,
    RelaxTaiko = 5,
    RelaxCatch = 6,

    AutopilotStd = 8,
}

impl Mode {
    /// Maps the client's vanilla mode id plus its mod bitmask onto the
    /// extended mode id. Mania has no relax variant.
    pub fn from_mods(mode_vn: u8, mods: Mods) -> Self {
        if mods.contains(Mods::RELAX) {
            match mode_vn {
                0 => Mode::RelaxStd,
                1 => Mode::RelaxTaiko,
                2 => Mode::RelaxCatch,
                _ => Mode::Mania,
            }
        } else if mods.contains(Mods::AUTOPILOT) && mode_vn == 0 {
            Mode::AutopilotStd
        } else {
            Mode::from_vn(mode_vn)
        }
    }

    pub fn from_vn(mode_vn: u8) -> Self {
        match mode_vn {
            1 => Mode::Taiko,
            2 => Mode::Catch,
            3 => Mode::Mania,
            _ => Mode::Std,
        }
    }

    /// The vanilla mode id understood by the client.
    pub fn as_vn(self) -> u8 {
        (self as u8) % 4
    }

    pub fn stats_prefix(self) -> &'static str {
        match self.as_vn() {
            1 => "taiko",
            2 => "ctb",
            3 => "mania",
            _ => "std",
        }
    }

    pub fn stats_table(self) -> &'static str {
        match self {
            Mode::RelaxStd | Mode::RelaxTaiko | Mode::RelaxCatch => "rx_stats",
            Mode::AutopilotStd => "ap_stats",
            _ => "users_stats",
        }
    }

    /// Name of the leaderboard zset family in the shared store.
    pub fn leaderboard(self) -> &'static str {
        match self {
            Mode::RelaxStd | Mode::RelaxTaiko | Mode::RelaxCatch => "relaxboard",
            Mode::AutopilotStd => "autoboard",
            _ => "leaderboard",
        }
    }
}

/// What the client reports itself doing, shown in its status panel.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Action {
    #[default]
    Idle = 0,
    Afk = 1,
    Playing = 2,
    Editing = 3,
    Modding = 4,
    Multiplayer = 5,
    Watching = 6,
    Unknown = 7,
    Testing = 8,
    Submitting = 9,
    Paused = 10,
    Lobby = 11,
    Multiplaying = 12,
    OsuDirect = 13,
}

impl Action {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Action::Afk,
            2 => Action::Playing,
            3 => Action::Editing,
            4 => Action::Modding,
            5 => Action::Multiplayer,
            6 => Action::Watching,
            7 => Action::Unknown,
            8 => Action::Testing,
            9 => Action::Submitting,
            10 => Action::Paused,
            11 => Action::Lobby,
            12 => Action::Multiplaying,
            13 => Action::OsuDirect,
            _ => Action::Idle,
        }
    }
}

/// Which peers' presence updates the client wants streamed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum PresenceFilter {
    #[default]
    Nil = 0,
    All = 1,
    Friends = 2,
}

impl PresenceFilter {
    pub fn from_i32(value: i32) -> Self {
        match value {
            1 => PresenceFilter::All,
            2 => PresenceFilter::Friends,
            _ => PresenceFilter::Nil,
        }
    }
}
