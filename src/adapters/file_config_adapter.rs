//! INI file configuration adapter.

use crate::domain::error::DcaError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DcaError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| DcaError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, DcaError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| DcaError::ConfigParse {
                file: "<string>".into(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn numeric<T>(
        &self,
        section: &str,
        key: &str,
        parsed: Result<Option<T>, String>,
    ) -> Result<Option<T>, DcaError> {
        if self.get_trimmed(section, key).is_none() {
            return Ok(None);
        }
        parsed.map_err(|_| {
            DcaError::config(
                format!("[{}] {}", section, key),
                format!(
                    "'{}' is not a number",
                    self.get_string(section, key).unwrap_or_default().trim()
                ),
            )
        })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, DcaError> {
        self.numeric(section, key, self.config.getint(section, key))
    }

    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, DcaError> {
        self.numeric(section, key, self.config.getfloat(section, key))
    }
}
