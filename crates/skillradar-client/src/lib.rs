pub mod cleaner;
pub mod hh;
pub mod http;

pub use cleaner::HtmdCleaner;
pub use hh::{HhConfig, HhFetcher};
pub use http::{ReqwestJsonClient, classify};
