// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;

use crate::{
    cfg::config::Config,
    external::{
        accounts::AccountRepository, geolocation::GeolocationService,
        icons::IconRepository, oui::OuiRepository, password::PasswordService,
        stats::StatsRepository,
    },
    store::kv::KvStore,
};

/// Everything a handler can reach: the backing store and the external
/// collaborators, injected once at construction so tests can swap any of
/// them.
pub struct App {
    pub cfg: Config,
    pub kv: Arc<dyn KvStore>,

    pub accounts: Arc<dyn AccountRepository>,
    pub stats: Arc<dyn StatsRepository>,
    pub icons: Arc<dyn IconRepository>,
    pub geolocation: Arc<GeolocationService>,
    pub password: Arc<PasswordService>,

    /// Absent in environments without network access; login then skips the
    /// adapter registry check.
    pub oui: Option<Arc<OuiRepository>>,
}
