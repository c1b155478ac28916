use std::{
    net::{IpAddr, SocketAddr},
    str::FromStr,
};

use actix_web::{http::header::HeaderName, HttpRequest};
use log::*;
use regex::Regex;

use crate::{config::ServerConfig, server::WEBHOOK_PATH};

/// Get the remote IP address from the request. It uses 3 sources to determine the IP address, in decreasing order
/// of preference:
/// 1. The right-most `X-Forwarded-For` entry, iif `use_x_forwarded_for` is set to true in the configuration.
/// 2. The `Forwarded` header, iif `use_forwarded` is set to true in the configuration.
/// 3. The peer address from the connection info.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    let mut result = None;
    if use_x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        // Only the right-most entry was added by our own proxy. Anything to its left is client supplied.
        result = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.rsplit(',').next())
            .and_then(parse_ip);
        if let Some(ip) = result {
            debug!("Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    if use_forwarded && result.is_none() {
        trace!("Checking Forwarded header");
        if let Ok(re) = Regex::new(r#"(?i)for=(?P<ip>[^;,]+)"#) {
            result = req
                .headers()
                .get("Forwarded")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| re.captures(v))
                .and_then(|caps| caps.name("ip"))
                .and_then(|m| parse_ip(m.as_str()));
        }
        if let Some(ip) = result {
            debug!("Using Forwarded header for remote address: {ip}");
        }
    }
    result.or_else(|| {
        let peer_addr = req.connection_info().peer_addr().map(|a| a.to_string());
        trace!("Using Peer address for remote address: {:?}", peer_addr);
        peer_addr.and_then(|s| parse_ip(&s))
    })
}

/// Accepts bare addresses, socket addresses and the quoted/bracketed forms used in `Forwarded` headers.
fn parse_ip(s: &str) -> Option<IpAddr> {
    let s = s.trim().trim_matches('"');
    IpAddr::from_str(s)
        .ok()
        .or_else(|| SocketAddr::from_str(s).ok().map(|a| a.ip()))
        .or_else(|| IpAddr::from_str(s.trim_start_matches('[').trim_end_matches(']')).ok())
}

/// With no whitelist configured every peer is allowed. Otherwise the peer must be known and on the list.
pub fn is_whitelisted(peer: Option<IpAddr>, whitelist: Option<&[IpAddr]>) -> bool {
    match (peer, whitelist) {
        (_, None) => true,
        (Some(ip), Some(whitelist)) => {
            let allowed = whitelist.contains(&ip);
            if !allowed {
                warn!("🪝️ Rejecting webhook from {ip}, which is not whitelisted");
            }
            allowed
        },
        (None, Some(_)) => {
            warn!("🪝️ No IP address found for the webhook peer, denying access.");
            false
        },
    }
}

/// Decides which peers may call the webhook endpoint. Every other path is open.
#[derive(Clone, Debug, Default)]
pub struct WebhookPeerGuard {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
    pub whitelist: Option<Vec<IpAddr>>,
}

impl WebhookPeerGuard {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            use_x_forwarded_for: config.use_x_forwarded_for,
            use_forwarded: config.use_forwarded,
            whitelist: config.webhook_whitelist.clone(),
        }
    }

    pub fn allows(&self, req: &HttpRequest) -> bool {
        if req.path() != WEBHOOK_PATH {
            return true;
        }
        let peer_ip = get_remote_ip(req, self.use_x_forwarded_for, self.use_forwarded);
        is_whitelisted(peer_ip, self.whitelist.as_deref())
    }
}

/// A request header as a string. Missing or non-ASCII values are `None`.
pub fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
    let name = HeaderName::from_str(name).ok()?;
    req.headers().get(name).and_then(|v| v.to_str().ok()).map(String::from)
}
