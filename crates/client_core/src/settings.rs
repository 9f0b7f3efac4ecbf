use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use url::Url;

use crate::{
    board::{ReferenceZone, SortDirection},
    error::SettingsError,
};

pub const DEFAULT_SETTINGS_FILE: &str = "order_board.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub base_url: String,
    pub orders_path: String,
    pub request_timeout_ms: u64,
    pub reference_utc_offset_minutes: i32,
    pub default_sort: SortDirection,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".into(),
            orders_path: "/orders".into(),
            request_timeout_ms: 10_000,
            reference_utc_offset_minutes: 0,
            default_sort: SortDirection::Newest,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    base_url: Option<String>,
    orders_path: Option<String>,
    request_timeout_ms: Option<u64>,
    reference_utc_offset_minutes: Option<i32>,
    default_sort: Option<String>,
}

impl ClientSettings {
    /// Defaults, then the settings file, then environment overrides.
    ///
    /// An explicit `path` must exist; without one, `order_board.toml` in the
    /// working directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut settings = Self::default();

        let file_path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let candidate = PathBuf::from(DEFAULT_SETTINGS_FILE);
                candidate.exists().then_some(candidate)
            }
        };
        if let Some(file_path) = file_path {
            settings.merge_file(&file_path)?;
        }

        settings.merge_env(|name| std::env::var(name).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    fn merge_file(&mut self, path: &Path) -> Result<(), SettingsError> {
        let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let file_cfg: FileSettings = toml::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        if let Some(v) = file_cfg.base_url {
            self.base_url = v;
        }
        if let Some(v) = file_cfg.orders_path {
            self.orders_path = v;
        }
        if let Some(v) = file_cfg.request_timeout_ms {
            self.request_timeout_ms = v;
        }
        if let Some(v) = file_cfg.reference_utc_offset_minutes {
            self.reference_utc_offset_minutes = v;
        }
        if let Some(v) = file_cfg.default_sort {
            self.default_sort = parse_sort("default_sort", &v)?;
        }
        Ok(())
    }

    pub(crate) fn merge_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), SettingsError> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("ORDER_BOARD_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = non_empty("APP__BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = non_empty("APP__ORDERS_PATH") {
            self.orders_path = v;
        }
        if let Some(v) = non_empty("APP__REQUEST_TIMEOUT_MS") {
            self.request_timeout_ms =
                v.trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| SettingsError::Invalid {
                        key: "APP__REQUEST_TIMEOUT_MS",
                        reason: e.to_string(),
                    })?;
        }
        if let Some(v) = non_empty("APP__REFERENCE_UTC_OFFSET_MINUTES") {
            self.reference_utc_offset_minutes =
                v.trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| SettingsError::Invalid {
                        key: "APP__REFERENCE_UTC_OFFSET_MINUTES",
                        reason: e.to_string(),
                    })?;
        }
        if let Some(v) = non_empty("APP__DEFAULT_SORT") {
            self.default_sort = parse_sort("APP__DEFAULT_SORT", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.orders_url()?;
        self.reference_zone()?;
        if self.request_timeout_ms == 0 {
            return Err(SettingsError::Invalid {
                key: "request_timeout_ms",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// `base_url` joined with `orders_path`, keeping any path prefix the base
    /// already carries.
    pub fn orders_url(&self) -> Result<Url, SettingsError> {
        let mut url = Url::parse(self.base_url.trim()).map_err(|e| SettingsError::Invalid {
            key: "base_url",
            reason: format!("'{}': {e}", self.base_url),
        })?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| SettingsError::Invalid {
                key: "base_url",
                reason: format!("'{}' cannot be used as a base", self.base_url),
            })?;
            segments.pop_if_empty();
            for segment in self.orders_path.split('/').filter(|s| !s.is_empty()) {
                segments.push(segment);
            }
        }
        Ok(url)
    }

    pub fn reference_zone(&self) -> Result<ReferenceZone, SettingsError> {
        ReferenceZone::from_offset_minutes(self.reference_utc_offset_minutes).map_err(|e| {
            SettingsError::Invalid {
                key: "reference_utc_offset_minutes",
                reason: e.to_string(),
            }
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn parse_sort(key: &'static str, raw: &str) -> Result<SortDirection, SettingsError> {
    raw.parse().map_err(|e: crate::board::CriteriaError| SettingsError::Invalid {
        key,
        reason: e.to_string(),
    })
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
