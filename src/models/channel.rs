// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use serde::{Deserialize, Serialize};

/// A chat room. Persistent channels come from config; `#spec_<host>` and
/// `#multi_<match>` are created and disposed with their owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    pub description: String,

    pub public_read: bool,
    pub public_write: bool,
    /// Disposed as soon as the last member leaves.
    pub temp: bool,
    pub hidden: bool,

    pub members: Vec<i32>,
}

impl Channel {
    pub fn spectator(host_id: i32, host_name: &str) -> Self {
        Channel {
            name: format!("#spec_{host_id}"),
            description: format!("Spectator channel for {host_name}"),
            public_read: true,
            public_write: true,
            temp: true,
            hidden: true,
            members: vec![],
        }
    }

    pub fn multiplayer(match_id: i32, match_name: &str) -> Self {
        Channel {
            name: format!("#multi_{match_id}"),
            description: format!("Multiplayer channel for {match_name}"),
            public_read: true,
            public_write: true,
            temp: true,
            hidden: true,
            members: vec![],
        }
    }

    /// The name the client sees. Per-match and per-host channels are always
    /// presented under their generic aliases.
    pub fn wire_name(name: &str) -> &str {
        if name.starts_with("#multi_") {
            "#multiplayer"
        } else if name.starts_with("#spec_") {
            "#spectator"
        } else {
            name
        }
    }
}
