pub mod config;
pub mod local;

pub use config::StorageConfig;
pub use local::LocalStorage;
