// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::{Context, Result};
use dashmap::DashMap;

/// bcrypt verification off the request path. Successful checks memoize
/// `hash → plain` so repeat logins skip the work factor entirely.
#[derive(Default)]
pub struct PasswordService {
    cache: DashMap<String, String>,
}

impl PasswordService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn verify(&self, plain_md5: &str, bcrypt_hash: &str) -> Result<bool> {
        if let Some(known_plain) = self.cache.get(bcrypt_hash) {
            return Ok(known_plain.as_str() == plain_md5);
        }

        let plain = plain_md5.to_string();
        let hash = bcrypt_hash.to_string();
        let result = tokio::task::spawn_blocking(move || bcrypt::verify(&plain, &hash))
            .await
            .context("bcrypt worker panicked")??;

        if result {
            self.cache
                .insert(bcrypt_hash.to_string(), plain_md5.to_string());
        }

        Ok(result)
    }
}
