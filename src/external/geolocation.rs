// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;

use anyhow::Result;
use axum::http::HeaderMap;
use dashmap::DashMap;

use crate::models::geolocation::{Country, Geolocation};

/// Resolves an IP to a location. Backed by a MaxMind database in production;
/// nginx deployments may answer from headers instead and never hit this.
pub trait GeolocationResolver: Send + Sync {
    fn resolve(&self, ip: &str) -> Result<Geolocation>;
}

/// Resolver that knows nothing; every IP maps to the reserved country.
#[derive(Default)]
pub struct NullResolver;

impl GeolocationResolver for NullResolver {
    fn resolve(&self, ip: &str) -> Result<Geolocation> {
        Ok(Geolocation {
            ip: Some(ip.to_string()),
            ..Geolocation::default()
        })
    }
}

/// Header-driven geolocation with a per-IP cache in front of the resolver.
pub struct GeolocationService {
    resolver: Arc<dyn GeolocationResolver>,
    cache: DashMap<String, Geolocation>,
}

impl GeolocationService {
    pub fn new(resolver: Arc<dyn GeolocationResolver>) -> Self {
        GeolocationService {
            resolver,
            cache: DashMap::new(),
        }
    }

    /// Pulls the client IP out of the proxy headers (`CF-Connecting-IP`
    /// first, then the first `X-Forwarded-For` hop, then `X-Real-IP`) and
    /// resolves it. nginx-provided country/location headers short-circuit the
    /// resolver entirely.
    pub fn from_headers(&self, headers: &HeaderMap) -> Geolocation {
        let ip = client_ip(headers);

        if let Some(country) = header_str(headers, "X-Country-Code") {
            let longitude = header_str(headers, "X-Longitude")
                .and_then(|value| value.parse().ok())
                .unwrap_or(0.0);
            let latitude = header_str(headers, "X-Latitude")
                .and_then(|value| value.parse().ok())
                .unwrap_or(0.0);

            return Geolocation {
                longitude,
                latitude,
                country: Country::from_iso(&country),
                ip,
            };
        }

        let Some(ip) = ip else {
            return Geolocation::default();
        };

        if let Some(cached) = self.cache.get(&ip) {
            return cached.clone();
        }

        match self.resolver.resolve(&ip) {
            Ok(geolocation) => {
                self.cache.insert(ip, geolocation.clone());
                geolocation
            },
            Err(e) => {
                tracing::warn!("geolocation lookup for {ip} failed: {e}");
                Geolocation {
                    ip: Some(ip),
                    ..Geolocation::default()
                }
            },
        }
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(ip) = header_str(headers, "CF-Connecting-IP") {
        return Some(ip);
    }

    if let Some(forwards) = header_str(headers, "X-Forwarded-For") {
        let first = forwards.split(',').next().map(str::trim);
        if let Some(ip) = first.filter(|ip| !ip.is_empty()) {
            return Some(ip.to_string());
        }
    }

    header_str(headers, "X-Real-IP")
}
