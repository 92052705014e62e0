// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;
use tracing::{debug, info};

use crate::{
    models::{account::Privileges, session::Session},
    packets::{models::LogoutPacket, server as packets},
    server::{context::App, fanout},
    store::sessions,
    utils::unix_timestamp,
};

/// Tears the session down: match and spectator detach, channel sweep, queue
/// clear, store removal, and a LOGOUT broadcast when the user was visible.
pub async fn logout(app: &App, session: &mut Session) -> Result<()> {
    if session.match_id.is_some() {
        super::multiplayer::leave_match(app, session).await?;
    }

    if let Some(host_id) = session.spectating {
        super::spectator::remove_spectator(app, host_id, session).await?;
    }

    for channel_name in session.channels.clone() {
        super::chat::leave_channel(app, session, &channel_name).await?;
    }

    sessions::dequeue_data(app, session.id()).await?;
    sessions::delete(app, session).await?;
    sessions::remove_from_session_list(app, session).await?;

    if session.is_public() {
        fanout::to_global(app, &packets::logout(session.id()), &[session.id()]).await?;
    }

    info!("{} logged out", session.name());
    Ok(())
}

/// The osu! client fires a logout right after connecting; anything within a
/// second of login is jitter and ignored.
pub async fn logout_handler(
    app: &App,
    session: &mut Session,
    _packet: LogoutPacket,
) -> Result<()> {
    if unix_timestamp() - session.login_time < 1 {
        debug!("suppressing logout for {} right after login", session.name());
        return Ok(());
    }

    logout(app, session).await
}

/// Strips a privilege both from the live session and the account repository.
pub async fn remove_privilege(
    app: &App,
    session: &mut Session,
    privilege: Privileges,
) -> Result<()> {
    session.account.privileges.remove(privilege);

    app.accounts.update_privileges(&session.account).await?;
    sessions::write_records(app, session).await
}
