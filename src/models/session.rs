// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use serde::{Deserialize, Serialize};

use crate::{
    models::{
        account::{Account, BanchoPrivileges, Privileges},
        geolocation::Geolocation,
        hardware::HardwareInfo,
        mode::{Action, Mode, Mods, PresenceFilter},
        version::OsuVersion,
    },
    utils::{make_safe_name, unix_timestamp},
};

/// The client-reported status shown to other users.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub presence_filter: PresenceFilter,
    pub action: Action,
    pub action_text: String,
    pub map_md5: String,
    pub map_id: i32,
    pub mods: Mods,
    pub mode: Mode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastNp {
    pub map_id: i32,
    pub mode_vn: u8,
}

/// A logged-in client. Account fields are rehydrated from the account
/// repository on every store read; everything else round-trips through the
/// session record below.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub account: Account,

    pub token: String,
    pub geolocation: Geolocation,
    pub utc_offset: i32,
    pub login_time: i64,

    pub status: Status,

    pub channels: Vec<String>,
    pub spectators: Vec<i32>,
    pub spectating: Option<i32>,
    pub match_id: Option<i32>,

    pub friend_only_dms: bool,
    pub in_lobby: bool,
    pub away_message: Option<String>,

    pub client_version: OsuVersion,
    pub hardware: HardwareInfo,

    pub last_np: Option<LastNp>,
}

/// The runtime half of a session as serialised into the shared store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i32,
    pub token: String,
    pub geolocation: Geolocation,
    pub utc_offset: i32,
    pub login_time: i64,
    pub status: Status,
    pub channels: Vec<String>,
    pub spectators: Vec<i32>,
    pub spectating: Option<i32>,
    pub match_id: Option<i32>,
    pub friend_only_dms: bool,
    pub in_lobby: bool,
    pub away_message: Option<String>,
    pub client_version: OsuVersion,
    pub hardware: HardwareInfo,
    pub last_np: Option<LastNp>,
}

impl Session {
    pub fn id(&self) -> i32 {
        self.account.id
    }

    pub fn name(&self) -> &str {
        &self.account.name
    }

    pub fn safe_name(&self) -> String {
        make_safe_name(&self.account.name)
    }

    pub fn privileges(&self) -> Privileges {
        self.account.privileges
    }

    pub fn bancho_privileges(&self) -> BanchoPrivileges {
        self.account.bancho_privileges()
    }

    /// Restricted sessions only get the whitelisted handler map and are
    /// invisible to other users.
    pub fn is_public(&self) -> bool {
        self.account.privileges.contains(Privileges::USER_PUBLIC)
    }

    pub fn is_silenced(&self) -> bool {
        self.account.silence_end > unix_timestamp()
    }

    /// Seconds of silence remaining, as reported in the welcome stream.
    pub fn silence_expire(&self) -> i32 {
        if self.account.silence_end == 0 {
            return 0;
        }

        (self.account.silence_end - unix_timestamp()).max(0) as i32
    }

    pub fn record(&self) -> SessionRecord {
        SessionRecord {
            id: self.account.id,
            token: self.token.clone(),
            geolocation: self.geolocation.clone(),
            utc_offset: self.utc_offset,
            login_time: self.login_time,
            status: self.status.clone(),
            channels: self.channels.clone(),
            spectators: self.spectators.clone(),
            spectating: self.spectating,
            match_id: self.match_id,
            friend_only_dms: self.friend_only_dms,
            in_lobby: self.in_lobby,
            away_message: self.away_message.clone(),
            client_version: self.client_version.clone(),
            hardware: self.hardware.clone(),
            last_np: self.last_np,
        }
    }

    pub fn from_record(account: Account, record: SessionRecord) -> Self {
        Session {
            account,
            token: record.token,
            geolocation: record.geolocation,
            utc_offset: record.utc_offset,
            login_time: record.login_time,
            status: record.status,
            channels: record.channels,
            spectators: record.spectators,
            spectating: record.spectating,
            match_id: record.match_id,
            friend_only_dms: record.friend_only_dms,
            in_lobby: record.in_lobby,
            away_message: record.away_message,
            client_version: record.client_version,
            hardware: record.hardware,
            last_np: record.last_np,
        }
    }
}
