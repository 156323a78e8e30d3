use log::debug;
use serde_yaml::Value;

use super::array_literal;
use super::defaults::{self, non_default};
use super::error::{ConfigError, Result};
use super::model::{
    ConfigInput, FallbackInput, FallbackSpec, GateConfig, GateFile, LiteConfig, PlayersSpec,
    RouteEntry, RouteInput, VersionSpec,
};

/// Build the persisted document for the submitted configuration.
/// Optional keys equal to their default are left out.
pub fn save(input: &ConfigInput) -> Result<Value> {
    let routes = input
        .routes
        .iter()
        .enumerate()
        .map(|(index, route)| save_route(index, route))
        .collect::<Result<Vec<RouteEntry>>>()?;

    debug!("Saving {} route(s)", routes.len());

    let file = GateFile {
        config: GateConfig {
            proxy_protocol: input.proxy_protocol.unwrap_or(defaults::PROXY_PROTOCOL),
            lite: LiteConfig {
                enabled: true,
                routes,
            },
        },
    };

    serde_yaml::to_value(&file).map_err(|e| ConfigError::Write(e.into()))
}

fn save_route(index: usize, route: &RouteInput) -> Result<RouteEntry> {
    let host = required(route.host.as_deref(), index, "host")?;
    let backend = required(route.backend.as_deref(), index, "backend")?;

    let strategy = non_default(present(route.strategy.as_deref()), defaults::STRATEGY);
    let cache_ping_ttl = non_default(
        present(route.cache_ping_ttl.as_deref()),
        defaults::CACHE_PING_TTL,
    );
    let modify_virtual_host = non_default(
        route.modify_virtual_host.as_ref(),
        &defaults::MODIFY_VIRTUAL_HOST,
    );

    Ok(RouteEntry {
        host: array_literal::decode(host),
        backend: array_literal::decode(backend),
        strategy: strategy.map(str::to_string),
        cache_ping_ttl: cache_ping_ttl.map(str::to_string),
        modify_virtual_host: modify_virtual_host.copied(),
        fallback: route.fallback.as_ref().and_then(save_fallback),
    })
}

fn save_fallback(fallback: &FallbackInput) -> Option<FallbackSpec> {
    if fallback.is_empty() {
        return None;
    }

    let motd = non_default(fallback.motd.as_deref(), defaults::MOTD).map(str::to_string);

    // A protocol of 0 is treated like an unset one here.
    let version_name = non_default(fallback.version_name.as_deref(), defaults::VERSION_NAME);
    let version_protocol = non_default(
        fallback.version_protocol.as_ref(),
        &defaults::VERSION_PROTOCOL,
    )
    .filter(|protocol| **protocol != 0);
    let version = (version_name.is_some() || version_protocol.is_some()).then(|| VersionSpec {
        name: fallback
            .version_name
            .clone()
            .unwrap_or_else(|| defaults::VERSION_NAME.to_string()),
        protocol: fallback
            .version_protocol
            .unwrap_or(defaults::VERSION_PROTOCOL),
    });

    let max_players = non_default(fallback.max_players.as_ref(), &defaults::MAX_PLAYERS);
    let online_players = non_default(fallback.online_players.as_ref(), &defaults::ONLINE_PLAYERS);
    let players = (max_players.is_some() || online_players.is_some()).then(|| PlayersSpec {
        max: fallback.max_players.unwrap_or(defaults::MAX_PLAYERS),
        online: fallback.online_players.unwrap_or(defaults::ONLINE_PLAYERS),
    });

    if motd.is_none() && version.is_none() && players.is_none() {
        return None;
    }

    Some(FallbackSpec {
        motd,
        version,
        players,
    })
}

fn required<'a>(value: Option<&'a str>, index: usize, field: &'static str) -> Result<&'a str> {
    present(value).ok_or(ConfigError::MissingField { index, field })
}

/// Blank strings count as not sent
fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::error::ErrorKind;

    fn route(host: &str, backend: &str) -> RouteInput {
        RouteInput {
            host: Some(host.to_string()),
            backend: Some(backend.to_string()),
            ..Default::default()
        }
    }

    fn single(route: RouteInput) -> Value {
        let document = save(&ConfigInput {
            proxy_protocol: None,
            routes: vec![route],
        })
        .unwrap();
        document["config"]["lite"]["routes"][0].clone()
    }

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn list_host_and_default_strategy() {
        let entry = single(RouteInput {
            strategy: Some("sequential".into()),
            ..route("[a, b]", "c")
        });
        assert_eq!(entry, yaml("host: [a, b]\nbackend: c\n"));
    }

    #[test]
    fn wraps_routes_in_enabled_lite_section() {
        let document = save(&ConfigInput::default()).unwrap();
        assert_eq!(
            document,
            yaml("config:\n  proxyProtocol: true\n  lite:\n    enabled: true\n    routes: []\n")
        );

        let document = save(&ConfigInput {
            proxy_protocol: Some(false),
            routes: vec![],
        })
        .unwrap();
        assert_eq!(document["config"]["proxyProtocol"], Value::Bool(false));
    }

    #[test]
    fn omits_default_values() {
        let entry = single(RouteInput {
            strategy: Some("sequential".into()),
            cache_ping_ttl: Some("3m".into()),
            modify_virtual_host: Some(false),
            ..route("a", "b")
        });
        let mapping = entry.as_mapping().unwrap();
        assert_eq!(mapping.len(), 2);
        assert!(entry.get("strategy").is_none());
        assert!(entry.get("cachePingTTL").is_none());
        assert!(entry.get("modifyVirtualHost").is_none());
    }

    #[test]
    fn keeps_non_default_values() {
        let entry = single(RouteInput {
            strategy: Some("lowest-latency".into()),
            cache_ping_ttl: Some("10s".into()),
            modify_virtual_host: Some(true),
            ..route("a", "b")
        });
        assert_eq!(
            entry,
            yaml(
                "host: a\nbackend: b\nstrategy: lowest-latency\ncachePingTTL: 10s\nmodifyVirtualHost: true\n"
            )
        );
    }

    #[test]
    fn all_default_fallback_is_dropped() {
        let entry = single(RouteInput {
            fallback: Some(FallbackInput {
                motd: Some(String::new()),
                version_name: Some(String::new()),
                version_protocol: Some(-1),
                max_players: Some(0),
                online_players: Some(0),
            }),
            ..route("a", "b")
        });
        assert!(entry.get("fallback").is_none());

        let entry = single(RouteInput {
            fallback: Some(FallbackInput::default()),
            ..route("a", "b")
        });
        assert!(entry.get("fallback").is_none());
    }

    #[test]
    fn fallback_sections_are_built_independently() {
        let entry = single(RouteInput {
            fallback: Some(FallbackInput {
                motd: Some("Server is restarting".into()),
                online_players: Some(3),
                ..Default::default()
            }),
            ..route("a", "b")
        });
        assert_eq!(
            entry["fallback"],
            yaml("motd: Server is restarting\nplayers:\n  max: 0\n  online: 3\n")
        );
    }

    #[test]
    fn version_defaults_fill_missing_half() {
        let entry = single(RouteInput {
            fallback: Some(FallbackInput {
                version_name: Some("1.20.4".into()),
                ..Default::default()
            }),
            ..route("a", "b")
        });
        assert_eq!(
            entry["fallback"],
            yaml("version:\n  name: 1.20.4\n  protocol: -1\n")
        );

        let entry = single(RouteInput {
            fallback: Some(FallbackInput {
                version_protocol: Some(765),
                ..Default::default()
            }),
            ..route("a", "b")
        });
        assert_eq!(
            entry["fallback"],
            yaml("version:\n  name: ''\n  protocol: 765\n")
        );
    }

    #[test]
    fn zero_protocol_alone_does_not_build_version() {
        let entry = single(RouteInput {
            fallback: Some(FallbackInput {
                version_protocol: Some(0),
                ..Default::default()
            }),
            ..route("a", "b")
        });
        assert!(entry.get("fallback").is_none());

        let entry = single(RouteInput {
            fallback: Some(FallbackInput {
                version_name: Some("beta".into()),
                version_protocol: Some(0),
                ..Default::default()
            }),
            ..route("a", "b")
        });
        assert_eq!(entry["fallback"]["version"]["protocol"], yaml("0"));
    }

    #[test]
    fn missing_required_field_fails_whole_save() {
        let input = ConfigInput {
            proxy_protocol: None,
            routes: vec![
                route("a", "b"),
                RouteInput {
                    host: Some("c".into()),
                    ..Default::default()
                },
            ],
        };
        let err = save(&input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(matches!(
            err,
            ConfigError::MissingField {
                index: 1,
                field: "backend"
            }
        ));

        let err = save(&ConfigInput {
            proxy_protocol: None,
            routes: vec![route("  ", "b")],
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { field: "host", .. }));
    }
}
