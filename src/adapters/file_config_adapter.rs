//! INI file configuration adapter.

use crate::domain::error::SignalError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SignalError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| SignalError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        tracing::debug!(file = %path.display(), "config loaded");
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, SignalError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| SignalError::ConfigParse {
                file: "<inline>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}
