use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// File name of the optional runtime configuration, sibling to the descriptor.
pub const ATTRIBUTES_FILE_NAME: &str = "attributes.yml";

/// attributes.yml configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Container path → `host` or `host:mode`.
    /// `host` is a host path or a named volume.
    #[serde(default)]
    pub volumes: BTreeMap<String, String>,
    /// Ports to publish, as `port/proto` (e.g. `8080/tcp`).
    #[serde(default, alias = "exposedports", alias = "exposed-ports")]
    pub exposed_ports: Vec<String>,
}

impl RuntimeConfig {
    /// Load `attributes.yml` from the service directory.
    ///
    /// Returns `Ok(None)` when the file does not exist; that is not an error.
    /// A path that cannot be checked at all is reported as `ConfigLoad`.
    pub fn load(directory: &Path) -> crate::Result<Option<Self>> {
        let config_path = directory.join(ATTRIBUTES_FILE_NAME);
        let present = config_path
            .try_exists()
            .map_err(|e| crate::Error::ConfigLoad {
                path: config_path.clone(),
                source: e,
            })?;
        if !present {
            return Ok(None);
        }
        tracing::debug!(path = %config_path.display(), "loading runtime config");
        Self::from_file(&config_path).map(Some)
    }

    pub fn from_file(config_path: &Path) -> crate::Result<Self> {
        let content =
            std::fs::read_to_string(config_path).map_err(|e| crate::Error::ConfigLoad {
                path: config_path.to_path_buf(),
                source: e,
            })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
            path: config_path.to_path_buf(),
            source: e,
        })
    }

    /// Container paths declared as (empty) mount points at creation.
    pub fn mount_points(&self) -> impl Iterator<Item = &str> {
        self.volumes.keys().map(String::as_str)
    }

    /// Bind-mount specifications in the daemon's `host:container[:mode]` form.
    ///
    /// # Examples
    ///
    /// ```
    /// use busan_core::RuntimeConfig;
    ///
    /// let mut config = RuntimeConfig::default();
    /// config.volumes.insert("/data".to_owned(), "/srv/data:ro".to_owned());
    /// config.volumes.insert("/logs".to_owned(), "app-logs".to_owned());
    /// assert_eq!(config.binds(), vec!["/srv/data:/data:ro", "app-logs:/logs"]);
    /// ```
    pub fn binds(&self) -> Vec<String> {
        self.volumes
            .iter()
            .map(|(target, source)| bind_spec(target, source))
            .collect()
    }
}

fn bind_spec(target: &str, source: &str) -> String {
    match source.split_once(':') {
        Some((host, mode)) => format!("{host}:{target}:{mode}"),
        None => format!("{source}:{target}"),
    }
}
