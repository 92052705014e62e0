// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

type HandlerFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;
pub type PubSubHandler = Arc<dyn Fn(String) -> HandlerFuture + Send + Sync>;

/// Where cross-process notifications come from. A Redis pub/sub connection
/// in production; `MemoryPubSub` in a single process.
#[async_trait]
pub trait PubSubSource: Send + Sync {
    /// The next (channel, payload) message, or `None` if the timeout lapsed.
    async fn get_message(&self, timeout: Duration) -> Result<Option<(String, String)>>;
}

/// Channel-name → handler table, registered once at startup.
#[derive(Default)]
pub struct PubSubRegistry {
    handlers: HashMap<String, PubSubHandler>,
}

impl PubSubRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, Fut>(&mut self, channel: &str, handler: F)
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.handlers.insert(
            channel.to_string(),
            Arc::new(move |payload| Box::pin(handler(payload))),
        );
    }

    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

/// Polls the source until cancelled: 1 s receive timeout, 10 ms pacing
/// between receives. Handler failures are logged, never fatal.
pub async fn run_pubsub_loop(
    source: Arc<dyn PubSubSource>,
    registry: Arc<PubSubRegistry>,
    cancel: CancellationToken,
) {
    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => break,
            message = source.get_message(Duration::from_secs(1)) => message,
        };

        match message {
            Ok(Some((channel, payload))) => {
                if let Some(handler) = registry.handlers.get(&channel) {
                    if let Err(e) = handler(payload).await {
                        warn!("pubsub handler for {channel} failed: {e}");
                    }
                } else {
                    debug!("pubsub message on unhandled channel {channel}");
                }
            },
            Ok(None) => {},
            Err(e) => warn!("pubsub receive failed: {e}"),
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(Duration::from_millis(10)) => {},
        }
    }

    debug!("pubsub loop stopped");
}

/// In-process bus for single-replica runs and tests.
pub struct MemoryPubSub {
    tx: mpsc::UnboundedSender<(String, String)>,
    rx: Mutex<mpsc::UnboundedReceiver<(String, String)>>,
}

impl Default for MemoryPubSub {
    fn default() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        MemoryPubSub {
            tx,
            rx: Mutex::new(rx),
        }
    }
}

impl MemoryPubSub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, channel: &str, payload: &str) {
        let _ = self.tx.send((channel.to_string(), payload.to_string()));
    }
}

#[async_trait]
impl PubSubSource for MemoryPubSub {
    async fn get_message(&self, timeout: Duration) -> Result<Option<(String, String)>> {
        let mut rx = self.rx.lock().await;
        Ok(tokio::time::timeout(timeout, rx.recv()).await.ok().flatten())
    }
}
