// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;

use crate::models::{mode::Mode, stats::Stats};

/// Per-mode score state. The production backend joins the mode's stats table
/// with the `ripple:<leaderboard>:<stats_prefix>` zset, where `rank` is
/// 1 + the zero-based reverse rank, or 0 when the user is unranked.
#[async_trait]
pub trait StatsRepository: Send + Sync {
    async fn fetch(&self, user_id: i32, mode: Mode) -> Result<Stats>;
}

/// Development and test backend; unknown users get empty stats.
#[derive(Default)]
pub struct MemoryStats {
    stats: DashMap<(i32, Mode), Stats>,
}

impl MemoryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, stats: Stats) {
        self.stats.insert((stats.user_id, stats.mode), stats);
    }
}

#[async_trait]
impl StatsRepository for MemoryStats {
    async fn fetch(&self, user_id: i32, mode: Mode) -> Result<Stats> {
        Ok(self
            .stats
            .get(&(user_id, mode))
            .map(|entry| entry.clone())
            .unwrap_or_else(|| Stats::empty(user_id, mode)))
    }
}
