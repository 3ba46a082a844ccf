//! OAuth scope policy

use crate::error::{BigtableError, Result};

/// Scope for reading and writing table data
pub const DATA_SCOPE: &str = "https://www.googleapis.com/auth/bigtable.data";

/// Scope for table and instance administration
pub const ADMIN_SCOPE: &str = "https://www.googleapis.com/auth/bigtable.admin";

/// Scope for read-only data access
pub const READ_ONLY_SCOPE: &str = "https://www.googleapis.com/auth/bigtable.data.readonly";

const DEFAULT_SCOPES: &[&str] = &[DATA_SCOPE];
const ADMIN_SCOPES: &[&str] = &[DATA_SCOPE, ADMIN_SCOPE];
const READ_ONLY_SCOPES: &[&str] = &[READ_ONLY_SCOPE];

/// Map the `(admin, read_only)` flags to the scopes a client requests
///
/// Admin access implies data access, so the admin set lists the data scope
/// first.
///
/// # Errors
///
/// `BigtableError::Configuration` when both flags are set.
pub fn resolve_scopes(admin: bool, read_only: bool) -> Result<&'static [&'static str]> {
    match (admin, read_only) {
        (true, true) => Err(BigtableError::Configuration(
            "A read-only client cannot also perform administrative actions \
             (admin and read_only are both set)"
                .to_string(),
        )),
        (false, true) => Ok(READ_ONLY_SCOPES),
        (true, false) => Ok(ADMIN_SCOPES),
        (false, false) => Ok(DEFAULT_SCOPES),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scopes() {
        assert_eq!(resolve_scopes(false, false).unwrap(), &[DATA_SCOPE]);
    }

    #[test]
    fn test_admin_scopes_are_ordered() {
        assert_eq!(resolve_scopes(true, false).unwrap(), &[DATA_SCOPE, ADMIN_SCOPE]);
    }

    #[test]
    fn test_read_only_scopes() {
        assert_eq!(resolve_scopes(false, true).unwrap(), &[READ_ONLY_SCOPE]);
    }

    #[test]
    fn test_admin_and_read_only_rejected() {
        let err = resolve_scopes(true, true).unwrap_err();
        assert!(matches!(err, BigtableError::Configuration(_)));
        assert!(err.to_string().contains("admin and read_only"));
    }
}
