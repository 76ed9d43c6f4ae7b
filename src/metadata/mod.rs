pub mod config;
mod resolver;
mod types;

pub use config::MetadataConfig;
pub use resolver::{HeliusMetadataResolver, MetadataResolver};
#[cfg(test)]
pub use resolver::MockMetadataResolver;
pub use types::{TokenInfo, UNKNOWN_NAME, UNKNOWN_SYMBOL};
