use clinic_core::PermissionSet;

/// Header carrying the shared API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header carrying the caller's comma-separated permission strings, as issued by the session
/// layer in front of this service.
pub const PERMISSIONS_HEADER: &str = "x-permissions";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing API key")]
    MissingApiKey,
    #[error("Invalid API key")]
    InvalidApiKey,
}

/// Validates the provided API key against the key configured at startup.
///
/// When no key is configured every request is accepted.
pub fn validate_api_key(expected: Option<&str>, provided: Option<&str>) -> Result<(), AuthError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    match provided {
        None => Err(AuthError::MissingApiKey),
        Some(key) if key == expected => Ok(()),
        Some(_) => Err(AuthError::InvalidApiKey),
    }
}

/// Permission set carried by the permissions header; a missing header means no permissions.
pub fn permissions_from_header(value: Option<&str>) -> PermissionSet {
    value.map(PermissionSet::from_csv).unwrap_or_default()
}
