use serde::{Deserialize, Serialize};

use super::array_literal::ListOrScalar;

/// Snapshot of the routing configuration as served to clients
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSnapshot {
    pub proxy_protocol: bool,
    pub routes: Vec<RouteRecord>,
}

/// One route with every field filled in
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRecord {
    /// Single host, or several rendered as `[a, b]`
    pub host: String,
    /// Single backend, or several rendered as `[a, b]`
    pub backend: String,
    pub strategy: String,
    #[serde(rename = "cachePingTTL")]
    pub cache_ping_ttl: String,
    pub modify_virtual_host: bool,
    /// `None` when the route has no fallback section at all
    pub fallback: Option<FallbackRecord>,
}

/// Status response served when a route's backends are unreachable
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackRecord {
    pub motd: String,
    pub version_name: String,
    pub version_protocol: i64,
    pub max_players: i64,
    pub online_players: i64,
}

/// Configuration submitted by a client. Everything but `host` and `backend` may be left out.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInput {
    #[serde(default)]
    pub proxy_protocol: Option<bool>,
    #[serde(default)]
    pub routes: Vec<RouteInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInput {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default, rename = "cachePingTTL")]
    pub cache_ping_ttl: Option<String>,
    #[serde(default)]
    pub modify_virtual_host: Option<bool>,
    #[serde(default)]
    pub fallback: Option<FallbackInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackInput {
    #[serde(default)]
    pub motd: Option<String>,
    #[serde(default)]
    pub version_name: Option<String>,
    #[serde(default)]
    pub version_protocol: Option<i64>,
    #[serde(default)]
    pub max_players: Option<i64>,
    #[serde(default)]
    pub online_players: Option<i64>,
}

impl FallbackInput {
    /// True when no field was sent at all
    pub fn is_empty(&self) -> bool {
        self.motd.is_none()
            && self.version_name.is_none()
            && self.version_protocol.is_none()
            && self.max_players.is_none()
            && self.online_players.is_none()
    }
}

impl From<RouteRecord> for RouteInput {
    fn from(record: RouteRecord) -> Self {
        Self {
            host: Some(record.host),
            backend: Some(record.backend),
            strategy: Some(record.strategy),
            cache_ping_ttl: Some(record.cache_ping_ttl),
            modify_virtual_host: Some(record.modify_virtual_host),
            fallback: record.fallback.map(FallbackInput::from),
        }
    }
}

impl From<FallbackRecord> for FallbackInput {
    fn from(record: FallbackRecord) -> Self {
        Self {
            motd: Some(record.motd),
            version_name: Some(record.version_name),
            version_protocol: Some(record.version_protocol),
            max_players: Some(record.max_players),
            online_players: Some(record.online_players),
        }
    }
}

impl From<ConfigSnapshot> for ConfigInput {
    fn from(snapshot: ConfigSnapshot) -> Self {
        Self {
            proxy_protocol: Some(snapshot.proxy_protocol),
            routes: snapshot.routes.into_iter().map(RouteInput::from).collect(),
        }
    }
}

/// Root of the persisted Gate configuration file, as written by the saver
#[derive(Debug, Clone, Serialize)]
pub struct GateFile {
    pub config: GateConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateConfig {
    pub proxy_protocol: bool,
    pub lite: LiteConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct LiteConfig {
    pub enabled: bool,
    pub routes: Vec<RouteEntry>,
}

/// Persisted route. Optional keys are only written when they differ from their default.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteEntry {
    pub host: ListOrScalar,
    pub backend: ListOrScalar,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(rename = "cachePingTTL", skip_serializing_if = "Option::is_none")]
    pub cache_ping_ttl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modify_virtual_host: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackSpec>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FallbackSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub players: Option<PlayersSpec>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VersionSpec {
    pub name: String,
    pub protocol: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayersSpec {
    pub max: i64,
    pub online: i64,
}
