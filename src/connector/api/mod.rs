pub mod config;
pub mod container;

pub use config::{load_global_config, load_repo_config};
pub use container::{Container, ContainerConfig};
