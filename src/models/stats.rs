// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use serde::{Deserialize, Serialize};

use crate::models::mode::Mode;

/// Score state for one user in one mode. Only part of this reaches the wire;
/// the rest is carried for parity with the stats repository row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub user_id: i32,
    pub mode: Mode,

    pub ranked_score: i64,
    pub total_score: i64,
    pub pp: f32,
    pub rank: i32,
    pub accuracy: f32,
    pub playcount: i32,
    pub playtime: i32,
    pub max_combo: i32,
    pub total_hits: i32,
    pub replays_watched: i32,
}

impl Stats {
    pub fn empty(user_id: i32, mode: Mode) -> Self {
        Stats {
            user_id,
            mode,
            ranked_score: 0,
            total_score: 0,
            pp: 0.0,
            rank: 0,
            accuracy: 0.0,
            playcount: 0,
            playtime: 0,
            max_combo: 0,
            total_hits: 0,
            replays_watched: 0,
        }
    }
}
