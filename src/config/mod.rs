pub mod array_literal;
pub mod defaults;
pub mod error;
pub mod file_manager;
pub mod loader;
pub mod model;
pub mod notes;
pub mod saver;

pub use error::{ConfigError, DocumentError, ErrorKind};
pub use file_manager::{
    DocumentStore, YamlFile, add_host, get_config, remove_host, routed_domains, update_config,
};
pub use model::{ConfigInput, ConfigSnapshot, FallbackRecord, RouteRecord};
