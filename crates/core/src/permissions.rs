//! Role/permission evaluation.
//!
//! Each protected resource (for example `medicine`) lists, per access tier, the permission
//! strings a user must hold. A user's level on a resource is the highest tier whose full list is
//! contained in the user's permission set. Tiers are tried in priority order
//! (manager, editor, viewer), so holding more permissions never lowers the result.
//!
//! Unknown resources and unmatched users resolve to `None` ("no access"); resolution never fails.

use crate::constants::DEFAULT_RESOURCES;
use crate::{ClinicError, ClinicResult, CoreConfig};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

/// Access tier on a resource. Ordered so that `Viewer < Editor < Manager`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Viewer,
    Editor,
    Manager,
}

impl Tier {
    /// Resolution order, highest first.
    pub const PRIORITY: [Tier; 3] = [Tier::Manager, Tier::Editor, Tier::Viewer];

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Viewer => "viewer",
            Tier::Editor => "editor",
            Tier::Manager => "manager",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "viewer" => Ok(Tier::Viewer),
            "editor" => Ok(Tier::Editor),
            "manager" => Ok(Tier::Manager),
            other => Err(ClinicError::InvalidInput(format!("unknown tier '{other}'"))),
        }
    }
}

/// The flat set of permission strings granted to a user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma-separated list such as `"medicine:read, medicine:update"`.
    ///
    /// Blank entries are ignored and duplicates collapse.
    pub fn from_csv(input: &str) -> Self {
        input
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }

    pub fn contains(&self, permission: &str) -> bool {
        self.0.contains(permission)
    }

    /// True if every permission in `required` is held.
    pub fn contains_all(&self, required: &[String]) -> bool {
        required.iter().all(|p| self.contains(p))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Required permissions for each tier of one resource.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TierRequirements {
    pub manager: Vec<String>,
    pub editor: Vec<String>,
    pub viewer: Vec<String>,
}

impl TierRequirements {
    /// The conventional CRUD ladder for `resource`: viewer reads, editor also creates and
    /// updates, manager also deletes.
    pub fn crud(resource: &str) -> Self {
        let read = format!("{resource}:read");
        let create = format!("{resource}:create");
        let update = format!("{resource}:update");
        let delete = format!("{resource}:delete");

        Self {
            manager: vec![read.clone(), create.clone(), update.clone(), delete],
            editor: vec![read.clone(), create, update],
            viewer: vec![read],
        }
    }

    pub fn for_tier(&self, tier: Tier) -> &[String] {
        match tier {
            Tier::Manager => &self.manager,
            Tier::Editor => &self.editor,
            Tier::Viewer => &self.viewer,
        }
    }
}

/// Static resource → tier → required permissions configuration.
///
/// Built once at startup and treated as immutable afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessLevelMap {
    resources: BTreeMap<String, TierRequirements>,
}

impl AccessLevelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in map covering the clinic back-office resources.
    pub fn default_clinic() -> Self {
        DEFAULT_RESOURCES
            .iter()
            .fold(Self::new(), |map, resource| {
                map.with_resource(*resource, TierRequirements::crud(resource))
            })
    }

    pub fn with_resource(mut self, key: impl Into<String>, requirements: TierRequirements) -> Self {
        self.resources.insert(key.into(), requirements);
        self
    }

    /// Parse an access-level map from YAML text.
    ///
    /// The document is a mapping from resource key to `{manager, editor, viewer}` lists:
    ///
    /// ```yaml
    /// medicine:
    ///   manager: [medicine:update, medicine:delete]
    ///   editor: [medicine:update]
    ///   viewer: [medicine:read]
    /// ```
    ///
    /// All three tiers are required for every resource and none may be empty, since an empty
    /// list is held by every user.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::Translation` (with the failing path) if the YAML does not match the
    /// schema or a tier is missing, and `ClinicError::InvalidInput` for blank resource keys,
    /// empty tier lists or blank permission strings.
    pub fn parse_yaml(yaml_text: &str) -> ClinicResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

        let resources = match serde_path_to_error::deserialize::<_, BTreeMap<String, TierRequirements>>(
            deserializer,
        ) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(ClinicError::Translation(format!(
                    "access-level map schema mismatch at {path}: {source}"
                )));
            }
        };

        for (key, requirements) in &resources {
            if key.trim().is_empty() {
                return Err(ClinicError::InvalidInput(
                    "resource key cannot be empty".into(),
                ));
            }
            for tier in Tier::PRIORITY {
                let required = requirements.for_tier(tier);
                if required.iter().any(|p| p.trim().is_empty()) {
                    return Err(ClinicError::InvalidInput(format!(
                        "resource '{key}' has a blank {tier} permission"
                    )));
                }
                if required.is_empty() {
                    return Err(ClinicError::InvalidInput(format!(
                        "resource '{key}' has no {tier} permissions"
                    )));
                }
            }
        }

        Ok(Self { resources })
    }

    /// Load an access-level map from a YAML file.
    pub fn load(path: &Path) -> ClinicResult<Self> {
        let text = std::fs::read_to_string(path).map_err(ClinicError::FileRead)?;
        Self::parse_yaml(&text)
    }

    pub fn get(&self, resource: &str) -> Option<&TierRequirements> {
        self.resources.get(resource)
    }

    /// The permissions required for `tier` on `resource`, if the resource is configured.
    pub fn required(&self, resource: &str, tier: Tier) -> Option<&[String]> {
        self.get(resource).map(|r| r.for_tier(tier))
    }

    /// Configured resource keys in sorted order.
    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Highest tier on `resource` whose full requirement list is held by `granted`.
///
/// Returns `None` for unknown resources and for users that satisfy no tier.
pub fn resolve_level(map: &AccessLevelMap, resource: &str, granted: &PermissionSet) -> Option<Tier> {
    let requirements = map.get(resource)?;
    Tier::PRIORITY
        .into_iter()
        .find(|tier| granted.contains_all(requirements.for_tier(*tier)))
}

/// Resolves access levels against the configured access-level map.
#[derive(Clone, Debug)]
pub struct PermissionResolver {
    cfg: Arc<CoreConfig>,
}

impl PermissionResolver {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    pub fn level(&self, resource: &str, granted: &PermissionSet) -> Option<Tier> {
        let level = resolve_level(self.cfg.access_levels(), resource, granted);
        tracing::debug!(resource, ?level, "resolved access level");
        level
    }

    /// True if the user holds `minimum` or a higher tier on `resource`.
    pub fn has_at_least(&self, resource: &str, granted: &PermissionSet, minimum: Tier) -> bool {
        self.level(resource, granted)
            .is_some_and(|level| level >= minimum)
    }

    /// The user's level on every configured resource.
    pub fn levels(&self, granted: &PermissionSet) -> BTreeMap<String, Option<Tier>> {
        self.cfg
            .access_levels()
            .resources()
            .map(|resource| {
                (
                    resource.to_owned(),
                    resolve_level(self.cfg.access_levels(), resource, granted),
                )
            })
            .collect()
    }
}
