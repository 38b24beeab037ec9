//! Wire types of the REST API.
//!
//! Invoice records and examination snapshots are served in their core serde form; only the small
//! API-specific envelopes live here.

use clinic_core::Tier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// The caller's access level on one resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccessLevelRes {
    pub resource: String,
    /// `manager`, `editor`, `viewer`, or null for no access.
    pub level: Option<String>,
}

impl AccessLevelRes {
    pub fn new(resource: impl Into<String>, level: Option<Tier>) -> Self {
        Self {
            resource: resource.into(),
            level: level.map(|t| t.as_str().to_owned()),
        }
    }
}

/// The caller's access level on every configured resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccessLevelsRes {
    pub levels: Vec<AccessLevelRes>,
}

impl From<BTreeMap<String, Option<Tier>>> for AccessLevelsRes {
    fn from(levels: BTreeMap<String, Option<Tier>>) -> Self {
        Self {
            levels: levels
                .into_iter()
                .map(|(resource, level)| AccessLevelRes::new(resource, level))
                .collect(),
        }
    }
}

/// Error body returned with every non-2xx response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub message: String,
}
