// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;

use crate::{models::account::Account, utils::make_safe_name};

/// The persistent account store (`users`, `users_stats`,
/// `users_relationships`). Lives behind a relational database in production;
/// the core only knows these operations.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn fetch_by_id(&self, id: i32) -> Result<Option<Account>>;
    async fn fetch_by_name(&self, name: &str) -> Result<Option<Account>>;

    /// Writes a changed privilege bitmask back.
    async fn update_privileges(&self, account: &Account) -> Result<()>;

    /// Inserts into `users_relationships`.
    async fn add_friend(&self, user_id: i32, target_id: i32) -> Result<()>;

    /// Deletes from `users_relationships`.
    async fn remove_friend(&self, user_id: i32, target_id: i32) -> Result<()>;
}

/// Development and test backend holding accounts in memory.
#[derive(Default)]
pub struct MemoryAccounts {
    accounts: DashMap<i32, Account>,
}

impl MemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, account: Account) {
        self.accounts.insert(account.id, account);
    }
}

#[async_trait]
impl AccountRepository for MemoryAccounts {
    async fn fetch_by_id(&self, id: i32) -> Result<Option<Account>> {
        Ok(self.accounts.get(&id).map(|entry| entry.clone()))
    }

    async fn fetch_by_name(&self, name: &str) -> Result<Option<Account>> {
        let safe_name = make_safe_name(name);
        Ok(self
            .accounts
            .iter()
            .find(|entry| entry.safe_name() == safe_name)
            .map(|entry| entry.clone()))
    }

    async fn update_privileges(&self, account: &Account) -> Result<()> {
        if let Some(mut entry) = self.accounts.get_mut(&account.id) {
            entry.privileges = account.privileges;
        }
        Ok(())
    }

    async fn add_friend(&self, user_id: i32, target_id: i32) -> Result<()> {
        if let Some(mut entry) = self.accounts.get_mut(&user_id)
            && !entry.friends.contains(&target_id)
        {
            entry.friends.push(target_id);
        }
        Ok(())
    }

    async fn remove_friend(&self, user_id: i32, target_id: i32) -> Result<()> {
        if let Some(mut entry) = self.accounts.get_mut(&user_id) {
            entry.friends.retain(|&id| id != target_id);
        }
        Ok(())
    }
}
