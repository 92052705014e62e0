// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{any::Any, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;

/// Held for the duration of a named critical section; dropping it releases
/// the lock on every exit path.
pub struct LockGuard {
    _inner: Box<dyn Any + Send>,
}

impl LockGuard {
    pub fn new(inner: Box<dyn Any + Send>) -> Self {
        LockGuard { _inner: inner }
    }
}

/// The shared key/value store every replica talks to. The operation set is
/// Redis-shaped: hashes for entity records, byte strings for outbound queues,
/// a list for the global session ids, and named locks guarding mutation.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn hget(&self, hash: &str, key: &str) -> Result<Option<Vec<u8>>>;
    async fn hset(&self, hash: &str, key: &str, value: Vec<u8>) -> Result<()>;
    async fn hdel(&self, hash: &str, key: &str) -> Result<()>;
    async fn hgetall(&self, hash: &str) -> Result<Vec<(String, Vec<u8>)>>;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn append(&self, key: &str, data: &[u8]) -> Result<()>;
    async fn del(&self, key: &str) -> Result<()>;

    async fn lpush(&self, key: &str, value: &str) -> Result<()>;
    async fn lrem(&self, key: &str, value: &str) -> Result<()>;
    async fn lrange(&self, key: &str) -> Result<Vec<String>>;

    async fn lock(&self, name: &str) -> Result<LockGuard>;
}

/// In-process implementation with the same semantics, used by tests and as
/// the single-replica default. A networked Redis client satisfies the same
/// trait for multi-replica deployments.
#[derive(Default)]
pub struct MemoryKv {
    hashes: DashMap<String, std::collections::HashMap<String, Vec<u8>>>,
    strings: DashMap<String, Vec<u8>>,
    lists: DashMap<String, Vec<String>>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn hget(&self, hash: &str, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .hashes
            .get(hash)
            .and_then(|entries| entries.get(key).cloned()))
    }

    async fn hset(&self, hash: &str, key: &str, value: Vec<u8>) -> Result<()> {
        self.hashes
            .entry(hash.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn hdel(&self, hash: &str, key: &str) -> Result<()> {
        if let Some(mut entries) = self.hashes.get_mut(hash) {
            entries.remove(key);
        }
        Ok(())
    }

    async fn hgetall(&self, hash: &str) -> Result<Vec<(String, Vec<u8>)>> {
        Ok(self
            .hashes
            .get(hash)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.strings.get(key).map(|v| v.clone()))
    }

    async fn append(&self, key: &str, data: &[u8]) -> Result<()> {
        self.strings
            .entry(key.to_string())
            .or_default()
            .extend_from_slice(data);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.strings.remove(key);
        Ok(())
    }

    async fn lpush(&self, key: &str, value: &str) -> Result<()> {
        self.lists
            .entry(key.to_string())
            .or_default()
            .insert(0, value.to_string());
        Ok(())
    }

    async fn lrem(&self, key: &str, value: &str) -> Result<()> {
        if let Some(mut list) = self.lists.get_mut(key) {
            list.retain(|entry| entry != value);
        }
        Ok(())
    }

    async fn lrange(&self, key: &str) -> Result<Vec<String>> {
        Ok(self
            .lists
            .get(key)
            .map(|list| list.clone())
            .unwrap_or_default())
    }

    async fn lock(&self, name: &str) -> Result<LockGuard> {
        let mutex = self
            .locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = mutex.lock_owned().await;
        Ok(LockGuard::new(Box::new(guard)))
    }
}
