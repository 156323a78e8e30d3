// src/services/containers.rs
use std::{collections::HashMap, path::Path};

use anyhow::Result;
use bollard::{API_DEFAULT_VERSION, Docker, container::ListContainersOptions, models::ContainerSummary};
use log::{debug, error};
use serde::Serialize;

/// Docker network the game server containers are attached to
pub const MINECRAFT_NETWORK: &str = "pterodactyl_nw";

/// Port a Minecraft server listens on inside its container
pub const MINECRAFT_PORT: u16 = 25565;

const DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// A container that can be picked as a route backend
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MinecraftContainer {
    pub id: String,
    pub name: String,
    pub has_default_port: bool,
}

pub struct ContainerDiscovery {
    pub docker_client: Docker,
    pub network: String,
    pub default_port: u16,
}

impl ContainerDiscovery {
    pub fn new(endpoint: &str) -> Result<Self> {
        let docker_client = if endpoint.starts_with("unix://") {
            Docker::connect_with_unix(endpoint, 120, API_DEFAULT_VERSION)?
        } else {
            Docker::connect_with_http(endpoint, 120, API_DEFAULT_VERSION)?
        };

        Ok(Self {
            docker_client,
            network: MINECRAFT_NETWORK.to_string(),
            default_port: MINECRAFT_PORT,
        })
    }

    /// List game server containers. Docker errors are logged and yield an empty list.
    pub async fn list_minecraft_containers(&self) -> Vec<MinecraftContainer> {
        match self.fetch_containers().await {
            Ok(containers) => containers,
            Err(e) => {
                error!("Error listing containers via Docker API: {}", e);
                Vec::new()
            }
        }
    }

    async fn fetch_containers(&self) -> Result<Vec<MinecraftContainer>> {
        let mut filters = HashMap::new();
        filters.insert("network", vec![self.network.as_str()]);

        let containers = self
            .docker_client
            .list_containers(Some(ListContainersOptions {
                all: true,
                filters,
                ..Default::default()
            }))
            .await?;

        debug!(
            "Docker reported {} container(s) on {}",
            containers.len(),
            self.network
        );

        Ok(containers
            .into_iter()
            .filter_map(|container| summarize(container, self.default_port))
            .collect())
    }
}

/// Reduce a Docker container summary; containers without an id are skipped
pub fn summarize(container: ContainerSummary, default_port: u16) -> Option<MinecraftContainer> {
    let id = container.id?;

    let name = container
        .names
        .as_ref()
        .and_then(|names| names.first())
        .map(|name| name.trim_start_matches('/').to_string())
        .unwrap_or_else(|| id.clone());

    let has_default_port = container
        .ports
        .unwrap_or_default()
        .iter()
        .any(|port| port.private_port == default_port);

    Some(MinecraftContainer {
        id,
        name,
        has_default_port,
    })
}

/// Pick the Docker endpoint: explicit value, then the local socket, then the host gateway
pub fn resolve_docker_endpoint(explicit: Option<&str>) -> String {
    if let Some(endpoint) = explicit.filter(|e| !e.trim().is_empty()) {
        return endpoint.to_string();
    }

    if cfg!(windows) {
        "tcp://localhost:2375".to_string()
    } else if Path::new(DOCKER_SOCKET).exists() {
        format!("unix://{}", DOCKER_SOCKET)
    } else {
        "tcp://host.docker.internal:2375".to_string()
    }
}
