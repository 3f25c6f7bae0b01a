//! Command-line and environment configuration for the server binary.
//!
//! Every flag has a `ZIPSERVE_*` environment variable counterpart; flags
//! take precedence.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::archive::DEFAULT_MAX_ENTRY_SIZE;
use crate::error::ConfigError;

#[derive(Parser, Debug, Clone)]
#[command(name = "zipserve")]
#[command(version)]
#[command(about = "Serve a directory of ZIP archives over HTTP", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipserve --root ~/comics                 serve every .zip under ~/comics\n  \
  zipserve --bind 127.0.0.1:9000           listen on localhost only\n  \
  zipserve --cache-capacity 0              reopen archives on every request")]
pub struct ServerConfig {
    /// Directory containing the archives
    #[arg(long, env = "ZIPSERVE_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// HTTP bind address
    #[arg(long, env = "ZIPSERVE_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Number of opened archive indexes kept in memory (0 disables caching)
    #[arg(long, env = "ZIPSERVE_CACHE_CAPACITY", default_value_t = 16)]
    pub cache_capacity: usize,

    /// Largest entry, in bytes, that will be decompressed
    #[arg(long, env = "ZIPSERVE_MAX_ENTRY_SIZE", default_value_t = DEFAULT_MAX_ENTRY_SIZE)]
    pub max_entry_size: u64,
}

impl ServerConfig {
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Check that the archive root is a directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.root.is_dir() {
            return Err(ConfigError::RootNotDirectory(self.root.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::try_parse_from(["zipserve"]).unwrap();
        assert_eq!(config.root, PathBuf::from("."));
        assert_eq!(config.bind, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.cache_capacity, 16);
        assert_eq!(config.max_entry_size, DEFAULT_MAX_ENTRY_SIZE);
    }

    #[test]
    fn flags() {
        let config = ServerConfig::try_parse_from([
            "zipserve",
            "--root",
            "/srv/books",
            "--bind",
            "127.0.0.1:9000",
            "--cache-capacity",
            "0",
        ])
        .unwrap();
        assert_eq!(config.root, PathBuf::from("/srv/books"));
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.cache_capacity, 0);
    }

    #[test]
    fn rejects_bad_bind_address() {
        assert!(ServerConfig::try_parse_from(["zipserve", "--bind", "nowhere"]).is_err());
    }

    #[test]
    fn validate_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServerConfig::try_parse_from(["zipserve"]).unwrap();
        config.root = dir.path().to_path_buf();
        assert!(config.validate().is_ok());

        config.root = dir.path().join("missing");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RootNotDirectory(_))
        ));
    }
}
