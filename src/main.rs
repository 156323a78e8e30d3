use std::{path::PathBuf, sync::Arc};

use anyhow::anyhow;
use clap::Parser;
use log::{error, info, warn};
use pingora::server::Server;

use gate_router::config::{YamlFile, get_config, notes::NotesStore};
use gate_router::proxy::ManagerProxy;
use gate_router::services::containers::{ContainerDiscovery, resolve_docker_endpoint};

/// Management API for Gate Lite routes
#[derive(Debug, Parser)]
#[command(name = "gate-router", version)]
struct Args {
    /// Gate configuration file
    #[arg(long, env = "CONFIG_PATH", default_value = "config.yml")]
    config: PathBuf,

    /// File holding per-domain notes
    #[arg(long, env = "NOTES_PATH", default_value = "notes.yml")]
    notes: PathBuf,

    /// Address the management API listens on
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    listen: String,

    /// Docker endpoint used to list backend containers
    #[arg(long, env = "DOCKER_HOST")]
    docker_endpoint: Option<String>,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let store = YamlFile::new(&args.config);

    // Report the current state of the config file once at startup
    match get_config(&store) {
        Ok(snapshot) => info!(
            "Loaded {} route(s) from {}",
            snapshot.routes.len(),
            args.config.display()
        ),
        Err(e) => warn!("Config file {} is not usable yet: {}", args.config.display(), e),
    }

    let docker_endpoint = resolve_docker_endpoint(args.docker_endpoint.as_deref());
    let containers = match ContainerDiscovery::new(&docker_endpoint) {
        Ok(discovery) => {
            info!("Using Docker endpoint {}", docker_endpoint);
            Some(Arc::new(discovery))
        }
        Err(e) => {
            error!("Failed to initialize Docker client ({}): {}", docker_endpoint, e);
            None
        }
    };

    let mut server = Server::new(None).map_err(|e| anyhow!("Failed to create server: {}", e))?;
    server.bootstrap();

    let mut manager_service = pingora_proxy::http_proxy_service(
        &server.configuration,
        ManagerProxy {
            store: Arc::new(store),
            notes: Arc::new(NotesStore::new(&args.notes)),
            containers,
        },
    );
    manager_service.add_tcp(&args.listen);
    info!("Manager service configured on {}", args.listen);

    server.add_service(manager_service);

    info!("Starting server");
    server.run_forever();
}
