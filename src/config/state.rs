// Application state module
// Built once at startup, immutable for the process lifetime.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use super::types::Config;

/// Application state shared by every connection task.
///
/// Holds the validated served root and the entry document path, both
/// fixed at startup. No locking is needed anywhere: the state is
/// read-only and the served directory is only ever read.
pub struct AppState {
    pub config: Config,
    /// Directory whose contents are exposed, validated at startup
    pub served_root: PathBuf,
    /// Fallback document path, always subordinate to the served root
    pub entry_document: PathBuf,
}

impl AppState {
    /// Validate the served root and fix the entry document path.
    ///
    /// Fails when the root is missing or not a directory, or when the
    /// configured index is not a bare file name.
    pub fn new(config: &Config) -> Result<Self, String> {
        let served_root = PathBuf::from(&config.site.root);
        let metadata = std::fs::metadata(&served_root).map_err(|e| {
            format!(
                "served root '{}' is not accessible: {e}",
                config.site.root
            )
        })?;
        if !metadata.is_dir() {
            return Err(format!(
                "served root '{}' is not a directory",
                config.site.root
            ));
        }

        // A nested or relative index could point outside the served root
        let index = config.site.index.as_str();
        if Path::new(index).file_name() != Some(OsStr::new(index)) {
            return Err(format!("index '{index}' must be a bare file name"));
        }

        let entry_document = served_root.join(index);

        Ok(Self {
            config: config.clone(),
            served_root,
            entry_document,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::types::{
        HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig, SiteConfig,
    };
    use super::*;
    use std::fs;

    fn test_config(root: &str, index: &str) -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 9001,
                workers: None,
            },
            site: SiteConfig {
                root: root.to_string(),
                index: index.to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                access_log: false,
                access_log_format: "combined".to_string(),
                access_log_file: None,
                error_log_file: None,
            },
            performance: PerformanceConfig {
                keep_alive_timeout: 75,
                read_timeout: 30,
                write_timeout: 30,
                max_connections: None,
            },
            http: HttpConfig {
                enable_cors: false,
                max_body_size: 10_485_760,
            },
        }
    }

    fn setup(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("spaserve-state-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_entry_document_under_root() {
        let root = setup("entry");
        let config = test_config(root.to_str().unwrap(), "index.html");
        let state = AppState::new(&config).unwrap();
        assert_eq!(state.entry_document, root.join("index.html"));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_missing_root_rejected() {
        let config = test_config("/no/such/spaserve/root", "index.html");
        assert!(AppState::new(&config).is_err());
    }

    #[test]
    fn test_nested_index_rejected() {
        let root = setup("nested-index");
        let config = test_config(root.to_str().unwrap(), "sub/index.html");
        assert!(AppState::new(&config).is_err());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_parent_index_rejected() {
        let root = setup("parent-index");
        let config = test_config(root.to_str().unwrap(), "../index.html");
        assert!(AppState::new(&config).is_err());
        let _ = fs::remove_dir_all(&root);
    }
}
