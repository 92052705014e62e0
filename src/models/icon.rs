// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use serde::{Deserialize, Serialize};

/// Main menu banner shown by the client; serialised on the wire as
/// `image_url|click_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuIcon {
    pub image_url: String,
    pub click_url: String,
}
