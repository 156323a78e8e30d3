// src/config/loader.rs
use log::debug;
use serde_yaml::Value;

use super::array_literal;
use super::defaults;
use super::error::{ConfigError, Result};
use super::model::{ConfigSnapshot, FallbackRecord, RouteRecord};

/// Build a snapshot from the persisted document
pub fn load(document: &Value) -> Result<ConfigSnapshot> {
    if !matches!(document, Value::Mapping(_) | Value::Null) {
        return Err(ConfigError::Malformed {
            path: "(root)".to_string(),
            expected: "a mapping",
        });
    }

    let config = section(document, "config", || "config".to_string())?;
    let lite = match config {
        Some(config) => section(config, "lite", || "config.lite".to_string())?,
        None => None,
    };

    let proxy_protocol = config
        .and_then(|c| c.get("proxyProtocol"))
        .and_then(Value::as_bool)
        .unwrap_or(defaults::PROXY_PROTOCOL);

    let routes = match lite.and_then(|lite| lite.get("routes")) {
        None | Some(Value::Null) => {
            debug!("No config.lite.routes section, starting with an empty route list");
            Vec::new()
        }
        Some(Value::Sequence(entries)) => entries
            .iter()
            .enumerate()
            .map(|(index, entry)| load_route(index, entry))
            .collect::<Result<Vec<RouteRecord>>>()?,
        Some(_) => {
            return Err(ConfigError::Malformed {
                path: "config.lite.routes".to_string(),
                expected: "a sequence",
            });
        }
    };

    debug!("Loaded {} route(s), proxyProtocol={}", routes.len(), proxy_protocol);

    Ok(ConfigSnapshot {
        proxy_protocol,
        routes,
    })
}

fn load_route(index: usize, entry: &Value) -> Result<RouteRecord> {
    let path = format!("config.lite.routes[{}]", index);
    if !entry.is_mapping() {
        return Err(ConfigError::Malformed {
            path,
            expected: "a mapping",
        });
    }

    let host = display(entry.get("host"), || format!("{}.host", path))?;
    let backend = display(entry.get("backend"), || format!("{}.backend", path))?;

    let strategy =
        text(entry.get("strategy")).unwrap_or_else(|| defaults::STRATEGY.to_string());
    let cache_ping_ttl =
        text(entry.get("cachePingTTL")).unwrap_or_else(|| defaults::CACHE_PING_TTL.to_string());
    let modify_virtual_host = entry
        .get("modifyVirtualHost")
        .and_then(Value::as_bool)
        .unwrap_or(defaults::MODIFY_VIRTUAL_HOST);

    let fallback = match section(entry, "fallback", || format!("{}.fallback", path))? {
        Some(fallback) => Some(load_fallback(fallback, &path)?),
        None => None,
    };

    Ok(RouteRecord {
        host,
        backend,
        strategy,
        cache_ping_ttl,
        modify_virtual_host,
        fallback,
    })
}

fn load_fallback(fallback: &Value, route_path: &str) -> Result<FallbackRecord> {
    let version = section(fallback, "version", || {
        format!("{}.fallback.version", route_path)
    })?;
    let players = section(fallback, "players", || {
        format!("{}.fallback.players", route_path)
    })?;

    Ok(FallbackRecord {
        motd: text(fallback.get("motd")).unwrap_or_else(|| defaults::MOTD.to_string()),
        version_name: text(version.and_then(|v| v.get("name")))
            .unwrap_or_else(|| defaults::VERSION_NAME.to_string()),
        version_protocol: version
            .and_then(|v| v.get("protocol"))
            .and_then(Value::as_i64)
            .unwrap_or(defaults::VERSION_PROTOCOL),
        max_players: players
            .and_then(|p| p.get("max"))
            .and_then(Value::as_i64)
            .unwrap_or(defaults::MAX_PLAYERS),
        online_players: players
            .and_then(|p| p.get("online"))
            .and_then(Value::as_i64)
            .unwrap_or(defaults::ONLINE_PLAYERS),
    })
}

/// A nested section. A key present with no value still counts as present.
fn section<'a>(
    parent: &'a Value,
    key: &str,
    path: impl FnOnce() -> String,
) -> Result<Option<&'a Value>> {
    match parent.get(key) {
        None => Ok(None),
        Some(value @ (Value::Mapping(_) | Value::Null)) => Ok(Some(value)),
        Some(_) => Err(ConfigError::Malformed {
            path: path(),
            expected: "a mapping",
        }),
    }
}

/// Render `host`/`backend` for display, joining lists with the array-literal syntax
fn display(value: Option<&Value>, path: impl Fn() -> String) -> Result<String> {
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::Sequence(items)) => {
            let items = items
                .iter()
                .map(|item| {
                    text(Some(item)).ok_or_else(|| ConfigError::Malformed {
                        path: path(),
                        expected: "a list of strings",
                    })
                })
                .collect::<Result<Vec<String>>>()?;
            Ok(array_literal::encode(&items))
        }
        Some(other) => text(Some(other)).ok_or_else(|| ConfigError::Malformed {
            path: path(),
            expected: "a string or a list of strings",
        }),
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
