//! Configuration file loading.

mod file_config;
mod loader;

pub use file_config::{
    CouncilSection, DebateSection, FileConfig, GatewaySection, SearchSection, StorageSection,
};
pub use loader::ConfigLoader;
