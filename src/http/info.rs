//! Request, host and response snapshots written into request log events.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, Request, StatusCode};
use serde::Serialize;

pub const X_FORWARDED_HOST: &str = "x-forwarded-host";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

fn header_value(headers: &HeaderMap, name: impl header::AsHeaderName) -> String {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default()
}

/// `http.request` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestInfo {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub method: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub scheme: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub protocol: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user_agent: String,
}

impl RequestInfo {
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let uri = request.uri();
        Self {
            path: uri
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| uri.path().to_string()),
            method: request.method().to_string(),
            content_type: header_value(request.headers(), header::CONTENT_TYPE),
            scheme: uri.scheme_str().unwrap_or_default().to_string(),
            protocol: format!("{:?}", request.version()),
            user_agent: header_value(request.headers(), header::USER_AGENT),
        }
    }
}

/// `http.response` section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseInfo {
    #[serde(skip_serializing_if = "is_zero")]
    pub status_code: u16,
}

fn is_zero(code: &u16) -> bool {
    *code == 0
}

impl From<StatusCode> for ResponseInfo {
    fn from(status: StatusCode) -> Self {
        Self {
            status_code: status.as_u16(),
        }
    }
}

/// The `http` field of a request log event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HttpInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseInfo>,
}

/// The `host` field of a request log event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostInfo {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub hostname: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub forwarded_hostname: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ip: String,
}

impl HostInfo {
    /// Snapshot host details. The peer address comes from axum's `ConnectInfo`
    /// when the server was started with connect info.
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let headers = request.headers();
        let host = headers
            .get(header::HOST)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .or_else(|| request.uri().authority().map(|a| a.as_str().to_string()))
            .unwrap_or_default();
        let remote = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Self {
            hostname: strip_port(&host).to_string(),
            forwarded_hostname: header_value(headers, X_FORWARDED_HOST),
            ip: client_ip(headers, remote),
        }
    }
}

/// Host without its port. Bracketed IPv6 literals keep their brackets.
pub fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    host.split(':').next().unwrap_or_default()
}

/// `X-Forwarded-For` when set, otherwise the transport peer address.
pub fn client_ip(headers: &HeaderMap, remote: Option<SocketAddr>) -> String {
    let forwarded = header_value(headers, X_FORWARDED_FOR);
    if !forwarded.is_empty() {
        return forwarded;
    }
    remote.map(|addr| addr.ip().to_string()).unwrap_or_default()
}
