// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;

use anyhow::{Context, Result};
use herbert_rs::{
    cfg::{cli::resolve_config_path, config::Config, logger::init_logger},
    external::{
        accounts::MemoryAccounts,
        geolocation::{GeolocationService, NullResolver},
        icons::MemoryIcons,
        oui::OuiRepository,
        password::PasswordService,
        pubsub::{MemoryPubSub, PubSubRegistry, PubSubSource, run_pubsub_loop},
        stats::MemoryStats,
    },
    handlers,
    models::account::Privileges,
    packets::server as packets,
    server::{api, context::App},
    store::{channels, kv::MemoryKv, sessions},
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let _logger_guard = init_logger("config/logger.yaml")?;

    let cfg = resolve_config_path("config/herbert.yaml")
        .and_then(Config::load_from_file)
        .context("failed to resolve or load config")?;
    let port = cfg.server.port;

    // Single-replica wiring: the in-memory store plus development
    // collaborators. Multi-replica deployments swap in the networked
    // equivalents behind the same traits.
    let app = Arc::new(App {
        cfg,
        kv: Arc::new(MemoryKv::new()),
        accounts: Arc::new(MemoryAccounts::new()),
        stats: Arc::new(MemoryStats::new()),
        icons: Arc::new(MemoryIcons::new(vec![])),
        geolocation: Arc::new(GeolocationService::new(Arc::new(NullResolver))),
        password: Arc::new(PasswordService::new()),
        oui: Some(Arc::new(OuiRepository::new(".oui_cache.csv"))),
    });

    channels::initialise(&app).await?;

    let pubsub_source = Arc::new(MemoryPubSub::new());
    let cancel = CancellationToken::new();
    let pubsub_task = tokio::spawn(run_pubsub_loop(
        Arc::clone(&pubsub_source) as Arc<dyn PubSubSource>,
        Arc::new(register_pubsubs(Arc::clone(&app))),
        cancel.clone(),
    ));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;
    info!("serving bancho on port {port}");

    axum::serve(listener, api::router(Arc::clone(&app)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    cancel.cancel();
    pubsub_task.await.context("pubsub loop panicked")?;

    Ok(())
}

/// Cross-process notifications: account restriction and server-wide alerts.
fn register_pubsubs(app: Arc<App>) -> PubSubRegistry {
    let mut registry = PubSubRegistry::new();

    {
        let app = Arc::clone(&app);
        registry.register("herbert:restrict", move |payload| {
            let app = Arc::clone(&app);
            async move {
                let user_id: i32 = payload.trim().parse()?;
                let Some(mut session) = sessions::fetch_by_id(&app, user_id).await?
                else {
                    warn!("restrict request for offline user {user_id}");
                    return Ok(());
                };

                handlers::session::remove_privilege(
                    &app,
                    &mut session,
                    Privileges::USER_PUBLIC,
                )
                .await?;
                sessions::enqueue_data(
                    &app,
                    user_id,
                    &packets::notification(&app.cfg.policy.restriction_message),
                )
                .await?;

                info!("restricted user {user_id}");
                Ok(())
            }
        });
    }

    registry.register("herbert:alert", move |payload| {
        let app = Arc::clone(&app);
        async move {
            sessions::enqueue_global(&app, &packets::notification(&payload), &[])
                .await
        }
    });

    registry
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {e}");
    }
}
