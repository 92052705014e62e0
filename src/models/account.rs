// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::utils::make_safe_name;

bitflags! {
    /// Server-side privilege bitmask as stored in the account repository.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Privileges: u32 {
        const USER_PUBLIC = 1;
        const USER_NORMAL = 2 << 0;
        const USER_DONOR = 2 << 1;
        const ADMIN_ACCESS_RAP = 2 << 2;
        const ADMIN_MANAGE_USERS = 2 << 3;
        const ADMIN_BAN_USERS = 2 << 4;
        const ADMIN_SILENCE_USERS = 2 << 5;
        const ADMIN_WIPE_USERS = 2 << 6;
        const ADMIN_MANAGE_BEATMAPS = 2 << 7;
        const ADMIN_MANAGE_SERVERS = 2 << 8;
        const ADMIN_MANAGE_SETTINGS = 2 << 9;
        const ADMIN_MANAGE_BETAKEYS = 2 << 10;
        const ADMIN_MANAGE_REPORTS = 2 << 11;
        const ADMIN_MANAGE_DOCS = 2 << 12;
        const ADMIN_MANAGE_BADGES = 2 << 13;
        const ADMIN_VIEW_RAP_LOGS = 2 << 14;
        const ADMIN_MANAGE_PRIVILEGES = 2 << 15;
        const ADMIN_SEND_ALERTS = 2 << 16;
        const ADMIN_CHAT_MOD = 2 << 17;
        const ADMIN_KICK_USERS = 2 << 18;
        const USER_PENDING_VERIFICATION = 2 << 19;
        const USER_TOURNAMENT_STAFF = 2 << 20;
        const ADMIN_CAKER = 2 << 21;
    }
}

bitflags! {
    /// The much smaller privilege set the client understands.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct BanchoPrivileges: u8 {
        const PLAYER = 1 << 0;
        const MODERATOR = 1 << 1;
        const SUPPORTER = 1 << 2;
        const OWNER = 1 << 3;
        const DEVELOPER = 1 << 4;
        const TOURNAMENT_STAFF = 1 << 5;
    }
}

/// Persistent identity owned by the account repository. The core only reads
/// it, apart from privilege writes routed back through the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: i32,
    pub name: String,
    pub email: String,

    pub privileges: Privileges,

    pub password_bcrypt: String,
    pub country: String,

    pub friends: Vec<i32>,

    pub clan_id: i32,
    pub clan_privileges: i32,

    pub silence_end: i64,
    pub donor_expire: i64,
    pub freeze_end: i64,
}

impl Account {
    pub fn safe_name(&self) -> String {
        make_safe_name(&self.name)
    }

    /// Projects the repository bitmask onto the client-visible one. Everyone
    /// gets SUPPORTER (free osu!direct).
    pub fn bancho_privileges(&self) -> BanchoPrivileges {
        let mut privileges = BanchoPrivileges::SUPPORTER;

        if self.privileges.contains(Privileges::USER_NORMAL) {
            privileges |= BanchoPrivileges::PLAYER;
        }

        if self.privileges.contains(Privileges::ADMIN_MANAGE_USERS) {
            privileges |= BanchoPrivileges::MODERATOR;
        } else if self.privileges.contains(Privileges::ADMIN_MANAGE_SETTINGS) {
            privileges |= BanchoPrivileges::DEVELOPER;
        }

        if self.privileges.contains(Privileges::ADMIN_CAKER) {
            privileges |= BanchoPrivileges::OWNER;
        }

        privileges
    }

    /// Moderators and above bypass channel read/write restrictions.
    pub fn is_staff(&self) -> bool {
        self.privileges.contains(Privileges::ADMIN_MANAGE_USERS)
    }
}
