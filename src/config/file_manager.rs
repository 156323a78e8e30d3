use std::{
    collections::HashSet,
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use log::{info, warn};
use serde_yaml::Value;

use super::error::{ConfigError, DocumentError, Result};
use super::array_literal::{self, ListOrScalar};
use super::model::{ConfigInput, ConfigSnapshot, RouteInput};
use super::{loader, saver};

/// Read/write access to the persisted Gate configuration document
pub trait DocumentStore: Send + Sync {
    fn read(&self) -> std::result::Result<Value, DocumentError>;
    fn write(&self, document: &Value) -> std::result::Result<(), DocumentError>;
}

/// Gate configuration stored as a YAML file on disk
#[derive(Debug, Clone)]
pub struct YamlFile {
    path: PathBuf,
}

impl YamlFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for YamlFile {
    fn read(&self) -> std::result::Result<Value, DocumentError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(
                    "Config file {} not found, using an empty document",
                    self.path.display()
                );
                return Ok(Value::Null);
            }
            Err(err) => return Err(err.into()),
        };

        if content.trim().is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_yaml::from_str(&content)?)
    }

    fn write(&self, document: &Value) -> std::result::Result<(), DocumentError> {
        let data = serde_yaml::to_string(document)?;

        // Write a sibling temp file, then rename it over the target
        let mut temp_path = self.path.clone().into_os_string();
        temp_path.push(".tmp");
        let temp_path = PathBuf::from(temp_path);

        let result = fs::File::create(&temp_path)
            .and_then(|mut file| {
                file.write_all(data.as_bytes())?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&temp_path, &self.path));

        if let Err(err) = result {
            // The temp file may or may not exist here
            let _ = fs::remove_file(&temp_path);
            return Err(err.into());
        }
        Ok(())
    }
}

/// Load the current routing configuration
pub fn get_config(store: &dyn DocumentStore) -> Result<ConfigSnapshot> {
    let document = store.read().map_err(ConfigError::Read)?;
    loader::load(&document)
}

/// Replace the routing configuration, keeping every unrelated key of the document
pub fn update_config(store: &dyn DocumentStore, input: &ConfigInput) -> Result<()> {
    let produced = saver::save(input)?;

    // Refuse to overwrite a file that cannot be parsed or has an unexpected shape
    let mut document = store.read().map_err(ConfigError::Read)?;
    loader::load(&document)?;
    overlay(&mut document, produced);

    store.write(&document).map_err(ConfigError::Write)?;
    info!("Config updated with {} route(s)", input.routes.len());
    Ok(())
}

/// Append a route for `domain`, keeping every existing route as it is
pub fn add_host(store: &dyn DocumentStore, domain: &str, backend: &str) -> Result<()> {
    let mut input = ConfigInput::from(get_config(store)?);
    input.routes.push(RouteInput {
        host: Some(domain.to_string()),
        backend: Some(backend.to_string()),
        ..Default::default()
    });
    update_config(store, &input)?;
    info!("Added host {} -> {}", domain, backend);
    Ok(())
}

/// Drop every route whose host is exactly `domain`. Returns false when none matched.
pub fn remove_host(store: &dyn DocumentStore, domain: &str) -> Result<bool> {
    let mut input = ConfigInput::from(get_config(store)?);
    let before = input.routes.len();
    input
        .routes
        .retain(|route| route.host.as_deref() != Some(domain));
    if input.routes.len() == before {
        return Ok(false);
    }
    update_config(store, &input)?;
    info!("Removed host {}", domain);
    Ok(true)
}

/// Every domain the routes answer for, with list hosts split into their items
pub fn routed_domains(input: &ConfigInput) -> HashSet<String> {
    input
        .routes
        .iter()
        .filter_map(|route| route.host.as_deref())
        .flat_map(|host| match array_literal::decode(host) {
            ListOrScalar::Scalar(domain) => vec![domain.trim().to_string()],
            ListOrScalar::List(domains) => domains,
        })
        .collect()
}

/// Merge `top` into `base`: mappings merge key by key, anything else is replaced
fn overlay(base: &mut Value, top: Value) {
    match (base, top) {
        (Value::Mapping(base), Value::Mapping(top)) => {
            for (key, value) in top {
                if let Some(slot) = base.get_mut(&key) {
                    overlay(slot, value);
                } else {
                    base.insert(key, value);
                }
            }
        }
        (base, top) => *base = top,
    }
}
