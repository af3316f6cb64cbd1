// Utility modules: directories/config, release-tag versions, checksums, errors

pub mod checksum;
pub mod config;
pub mod error;
pub mod version;
