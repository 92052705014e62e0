// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;
use async_trait::async_trait;
use rand::RngExt;

use crate::models::icon::MenuIcon;

/// Source of the current main menu banners (`main_menu_icons WHERE
/// is_current = 1` in production).
#[async_trait]
pub trait IconRepository: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<MenuIcon>>;

    /// One banner picked at random, if any are live.
    async fn fetch_random(&self) -> Result<Option<MenuIcon>> {
        let icons = self.fetch_all().await?;
        if icons.is_empty() {
            return Ok(None);
        }

        let idx = rand::rng().random_range(0..icons.len());
        Ok(icons.into_iter().nth(idx))
    }
}

/// Fixed icon list for development and tests.
#[derive(Default)]
pub struct MemoryIcons {
    icons: Vec<MenuIcon>,
}

impl MemoryIcons {
    pub fn new(icons: Vec<MenuIcon>) -> Self {
        MemoryIcons { icons }
    }
}

#[async_trait]
impl IconRepository for MemoryIcons {
    async fn fetch_all(&self) -> Result<Vec<MenuIcon>> {
        Ok(self.icons.clone())
    }
}
