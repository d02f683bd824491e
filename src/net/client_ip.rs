use crate::models::signup::ClientInfo;
use axum::http::HeaderMap;
use axum::http::header::USER_AGENT;
use std::net::SocketAddr;

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Resolve the client address from proxy headers, falling back to the peer address.
///
/// Precedence: `cf-connecting-ip`, `x-real-ip`, first entry of `x-forwarded-for`, peer.
pub fn extract_client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    header(headers, "cf-connecting-ip")
        .or_else(|| header(headers, "x-real-ip"))
        .or_else(|| {
            header(headers, "x-forwarded-for")
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .map(str::to_string)
        .unwrap_or_else(|| peer.ip().to_string())
}

pub fn client_info(headers: &HeaderMap, peer: SocketAddr) -> ClientInfo {
    ClientInfo {
        ip: extract_client_ip(headers, peer),
        user_agent: headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string(),
    }
}
