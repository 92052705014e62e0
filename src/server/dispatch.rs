// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{collections::HashMap, future::Future, pin::Pin};

use anyhow::Result;
use bytes::Bytes;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::{
    models::session::Session,
    packets::{
        header::{HEADER_LEN, PacketHeader},
        ids::ClientPackets,
    },
    server::context::App,
    store::sessions,
};

/// One framed packet as cut out of the request batch.
#[derive(Debug)]
pub struct Packet<'a> {
    pub id: ClientPackets,
    pub payload: &'a [u8],
}

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
pub type PacketHandlerFn =
    for<'a> fn(&'a App, &'a mut Session, Packet<'a>) -> HandlerFuture<'a>;

pub struct HandlerEntry {
    pub handler: PacketHandlerFn,
    /// Whether restricted sessions may still invoke this handler.
    pub allow_restricted: bool,
}

/// Packet-id → handler table, built once at startup.
#[derive(Default)]
pub struct Registry {
    handlers: HashMap<ClientPackets, HandlerEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        id: ClientPackets,
        allow_restricted: bool,
        handler: PacketHandlerFn,
    ) {
        self.handlers.insert(
            id,
            HandlerEntry {
                handler,
                allow_restricted,
            },
        );
    }

    pub fn get(&self, id: ClientPackets) -> Option<&HandlerEntry> {
        self.handlers.get(&id)
    }
}

static REGISTRY: Lazy<Registry> = Lazy::new(crate::handlers::registry);

pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Splits the batch into packets, runs each recognized handler in order, and
/// coalesces all session mutations into one store write at the end. Returns
/// the session's drained outbound queue as the response body.
pub async fn handle_request(
    app: &App,
    session: &mut Session,
    body: &[u8],
) -> Result<Bytes> {
    let registry = registry();
    let restricted = !session.is_public();

    let mut offset = 0;
    let mut dispatched = false;
    let mut logged_out = false;

    while body.len().saturating_sub(offset) >= HEADER_LEN {
        let Some((raw_id, length)) = PacketHeader::parse(&body[offset..]) else {
            break;
        };

        let end = offset + HEADER_LEN + length;
        if end > body.len() {
            // declared length overruns the batch: handler is not invoked and
            // the cursor jumps past the declared extent
            offset = end;
            continue;
        }
        let payload = &body[offset + HEADER_LEN..end];
        offset = end;

        let Some(id) = ClientPackets::from_u16(raw_id) else {
            debug!("skipping unknown packet id {raw_id} ({length} bytes)");
            continue;
        };
        let Some(entry) = registry.get(id) else {
            continue;
        };
        if restricted && !entry.allow_restricted {
            continue;
        }

        debug!("handling packet {id:?}");
        (entry.handler)(app, session, Packet { id, payload }).await?;

        if id == ClientPackets::Logout {
            logged_out = true;
            break;
        }
        dispatched = true;
    }

    if dispatched && !logged_out {
        sessions::update(app, session).await?;
    }

    sessions::dequeue_data(app, session.id()).await
}
