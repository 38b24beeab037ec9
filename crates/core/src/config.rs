//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Environment variables are read by the binaries only; request
//! handling never touches process-wide state.

use crate::constants::DEFAULT_UTC_OFFSET_HOURS;
use crate::permissions::AccessLevelMap;
use crate::{ClinicError, ClinicResult, ClinicTime};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    access_levels: AccessLevelMap,
    clinic_time: ClinicTime,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::InvalidInput` if the access-level map has no resources; such a
    /// map would deny every request.
    pub fn new(
        data_dir: PathBuf,
        access_levels: AccessLevelMap,
        clinic_time: ClinicTime,
    ) -> ClinicResult<Self> {
        if access_levels.is_empty() {
            return Err(ClinicError::InvalidInput(
                "access-level map must configure at least one resource".into(),
            ));
        }

        Ok(Self {
            data_dir,
            access_levels,
            clinic_time,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn access_levels(&self) -> &AccessLevelMap {
        &self.access_levels
    }

    pub fn clinic_time(&self) -> &ClinicTime {
        &self.clinic_time
    }
}

/// Resolve the access-level map without reading environment variables.
///
/// If `override_file` is provided it must be a readable YAML map; otherwise the built-in clinic
/// map is used.
pub fn resolve_access_level_map(override_file: Option<PathBuf>) -> ClinicResult<AccessLevelMap> {
    match override_file {
        Some(path) => {
            if !path.is_file() {
                return Err(ClinicError::InvalidInput(format!(
                    "access-level map override is not a file: {}",
                    path.display()
                )));
            }
            let map = AccessLevelMap::load(&path)?;
            tracing::info!(
                "loaded access-level map from {} ({} resources)",
                path.display(),
                map.resources().count()
            );
            Ok(map)
        }
        None => Ok(AccessLevelMap::default_clinic()),
    }
}

/// Parse the clinic UTC offset from an optional string value such as `"7"` or `"+7"`.
///
/// If `value` is `None` or empty/whitespace, returns UTC+7.
pub fn clinic_time_from_env_value(value: Option<String>) -> ClinicResult<ClinicTime> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let hours = match value {
        Some(v) => v
            .trim_start_matches('+')
            .parse::<i32>()
            .map_err(|_| ClinicError::InvalidInput(format!("invalid UTC offset hours: '{v}'")))?,
        None => DEFAULT_UTC_OFFSET_HOURS,
    };

    ClinicTime::from_offset_hours(hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn rejects_empty_access_map() {
        let err = CoreConfig::new("data".into(), AccessLevelMap::new(), ClinicTime::vietnam())
            .expect_err("should reject empty map");
        assert!(matches!(err, ClinicError::InvalidInput(_)));
    }

    #[test]
    fn default_access_map_when_no_override() {
        let map = resolve_access_level_map(None).expect("default map");
        assert_eq!(map, AccessLevelMap::default_clinic());
    }

    #[test]
    fn loads_access_map_override() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let path = temp_dir.path().join("access.yaml");
        std::fs::write(
            &path,
            "article:\n  manager: [article:delete]\n  editor: [article:update]\n  viewer: [article:read]\n",
        )
        .expect("write map");

        let map = resolve_access_level_map(Some(path)).expect("load override");
        assert_eq!(map.resources().collect::<Vec<_>>(), vec!["article"]);
    }

    #[test]
    fn shipped_access_map_parses() {
        let map = AccessLevelMap::parse_yaml(include_str!("../../../config/access-levels.yaml"))
            .expect("parse shipped map");
        let granted: crate::PermissionSet = ["medicine:update"].into_iter().collect();
        assert_eq!(
            crate::resolve_level(&map, "medicine", &granted),
            Some(crate::Tier::Editor)
        );
    }

    #[test]
    fn missing_override_is_an_error() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let err = resolve_access_level_map(Some(temp_dir.path().join("nope.yaml")))
            .expect_err("should reject missing file");
        assert!(matches!(err, ClinicError::InvalidInput(_)));
    }

    #[test]
    fn clinic_time_defaults_to_utc_plus_seven() {
        assert_eq!(
            clinic_time_from_env_value(None).expect("default"),
            ClinicTime::vietnam()
        );
        assert_eq!(
            clinic_time_from_env_value(Some("  ".into())).expect("blank"),
            ClinicTime::vietnam()
        );
        assert_eq!(
            clinic_time_from_env_value(Some("+7".into())).expect("explicit"),
            ClinicTime::vietnam()
        );
    }

    #[test]
    fn clinic_time_rejects_garbage() {
        assert!(clinic_time_from_env_value(Some("ICT".into())).is_err());
    }
}
