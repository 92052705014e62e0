// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::models::mode::{Mode, Mods};

bitflags! {
    /// Slot state machine. Exactly one of these bits is set at a time; the
    /// HAS_USER union exists for occupancy checks.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SlotStatus: u8 {
        const OPEN = 1;
        const LOCKED = 2;
        const NOT_READY = 4;
        const READY = 8;
        const NO_MAP = 16;
        const PLAYING = 32;
        const COMPLETE = 64;
        const QUIT = 128;

        const HAS_USER = Self::NOT_READY.bits()
            | Self::READY.bits()
            | Self::NO_MAP.bits()
            | Self::PLAYING.bits()
            | Self::COMPLETE.bits();
    }
}

impl Default for SlotStatus {
    fn default() -> Self {
        SlotStatus::OPEN
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MatchTeam {
    #[default]
    Neutral = 0,
    Blue = 1,
    Red = 2,
}

impl MatchTeam {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => MatchTeam::Blue,
            2 => MatchTeam::Red,
            _ => MatchTeam::Neutral,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MatchWinCondition {
    #[default]
    Score = 0,
    Accuracy = 1,
    Combo = 2,
    ScoreV2 = 3,
}

impl MatchWinCondition {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => MatchWinCondition::Accuracy,
            2 => MatchWinCondition::Combo,
            3 => MatchWinCondition::ScoreV2,
            _ => MatchWinCondition::Score,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MatchTeamType {
    #[default]
    HeadToHead = 0,
    TagCoop = 1,
    TeamVs = 2,
    TagTeamVs = 3,
}

impl MatchTeamType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => MatchTeamType::TagCoop,
            2 => MatchTeamType::TeamVs,
            3 => MatchTeamType::TagTeamVs,
            _ => MatchTeamType::HeadToHead,
        }
    }

    pub fn is_versus(self) -> bool {
        matches!(self, MatchTeamType::TeamVs | MatchTeamType::TagTeamVs)
    }
}

/// One seat in a multiplayer room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub session_id: Option<i32>,
    pub status: SlotStatus,
    pub team: MatchTeam,
    pub mods: Mods,
    pub loaded: bool,
    pub skipped: bool,
}

impl Default for Slot {
    fn default() -> Self {
        Slot {
            session_id: None,
            status: SlotStatus::OPEN,
            team: MatchTeam::Neutral,
            mods: Mods::empty(),
            loaded: false,
            skipped: false,
        }
    }
}

impl Slot {
    pub fn empty(&self) -> bool {
        self.session_id.is_none()
    }

    pub fn has_user(&self) -> bool {
        self.status.intersects(SlotStatus::HAS_USER)
    }

    pub fn copy_from(&mut self, other: &Slot) {
        self.session_id = other.session_id;
        self.status = other.status;
        self.team = other.team;
        self.mods = other.mods;
    }

    pub fn reset(&mut self, new_status: SlotStatus) {
        self.session_id = None;
        self.status = new_status;
        self.team = MatchTeam::Neutral;
        self.mods = Mods::empty();
        self.loaded = false;
        self.skipped = false;
    }
}

pub const MATCH_SLOTS: usize = 16;

/// A multiplayer room: 16 slots, a host and the map/mods/rule state shared by
/// everyone in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: i32,
    pub name: String,
    pub host_id: i32,
    pub mods: Mods,
    pub mode: Mode,

    pub map_id: Option<i32>,
    pub map_md5: Option<String>,
    pub map_title: Option<String>,
    pub last_map_id: Option<i32>,

    pub freemod: bool,

    pub slots: Vec<Slot>,
    pub password: Option<String>,
    pub refs: Vec<i32>,
    pub team_type: MatchTeamType,
    pub win_condition: MatchWinCondition,

    pub in_progress: bool,
    /// Mania-only map seed shared with every player.
    pub seed: i32,

    pub tourney_clients: Vec<i32>,
}

impl Match {
    pub fn new(id: i32, name: String, host_id: i32, mods: Mods, mode: Mode) -> Self {
        Match {
            id,
            name,
            host_id,
            mods,
            mode,
            map_id: None,
            map_md5: None,
            map_title: None,
            last_map_id: None,
            freemod: false,
            slots: (0..MATCH_SLOTS).map(|_| Slot::default()).collect(),
            password: None,
            refs: vec![],
            team_type: MatchTeamType::HeadToHead,
            win_condition: MatchWinCondition::Score,
            in_progress: false,
            seed: 0,
            tourney_clients: vec![],
        }
    }

    pub fn contains(&self, session_id: i32) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.session_id == Some(session_id))
    }

    pub fn url(&self) -> String {
        format!(
            "osump://{}/{}",
            self.id,
            self.password.as_deref().unwrap_or("")
        )
    }

    pub fn embed(&self) -> String {
        format!("[{} {}]", self.url(), self.name)
    }

    pub fn get_slot(&self, session_id: i32) -> Option<&Slot> {
        self.slots
            .iter()
            .find(|slot| slot.session_id == Some(session_id))
    }

    pub fn get_slot_mut(&mut self, session_id: i32) -> Option<&mut Slot> {
        self.slots
            .iter_mut()
            .find(|slot| slot.session_id == Some(session_id))
    }

    pub fn get_slot_idx(&self, session_id: i32) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.session_id == Some(session_id))
    }

    /// The lowest-index OPEN slot, the tie-break rule for joins.
    pub fn get_next_free_slot_idx(&self) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.status == SlotStatus::OPEN)
    }

    pub fn get_host_slot(&self) -> Option<&Slot> {
        self.slots
            .iter()
            .find(|slot| slot.has_user() && slot.session_id == Some(self.host_id))
    }

    /// Rolls every slot in `expected` status back to NOT_READY.
    pub fn unready_users(&mut self, expected: SlotStatus) {
        for slot in &mut self.slots {
            if slot.status == expected {
                slot.status = SlotStatus::NOT_READY;
            }
        }
    }
}
