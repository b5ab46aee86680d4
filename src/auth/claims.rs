//! Access-token claim set

use crate::auth::permission::Permission;
use serde::Deserialize;

/// Claims carried by an IAM access token.
///
/// Only the fields the validator consumes are modeled; everything else in
/// the token is ignored. `user_id` mirrors `sub` after decoding so callers
/// never touch the raw subject claim.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,

    #[serde(default)]
    pub iat: i64,

    #[serde(default)]
    pub exp: i64,

    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub permissions: Vec<Permission>,

    #[serde(default)]
    pub roles: Vec<String>,

    #[serde(default)]
    pub namespace_roles: Vec<NamespaceRole>,

    #[serde(skip)]
    pub user_id: Option<String>,
}

/// A role grant scoped to a specific namespace.
#[derive(Debug, Clone, Deserialize)]
pub struct NamespaceRole {
    #[serde(alias = "roleId")]
    pub role_id: String,

    pub namespace: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::permission::ACTION_READ;

    #[test]
    fn test_parses_full_claim_set() {
        let claims: Claims = serde_json::from_str(
            r#"{
                "sub": "user-1",
                "iat": 1700000000,
                "exp": 1700003600,
                "namespace": "game",
                "permissions": [
                    {"resource": "NAMESPACE:game:MATCHMAKING", "action": 2}
                ],
                "roles": ["role-a"],
                "namespace_roles": [
                    {"roleId": "role-b", "namespace": "game"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(claims.sub.as_deref(), Some("user-1"));
        assert_eq!(claims.namespace.as_deref(), Some("game"));
        assert_eq!(claims.permissions[0].action, ACTION_READ);
        assert_eq!(claims.roles, vec!["role-a"]);
        assert_eq!(claims.namespace_roles[0].role_id, "role-b");
        assert!(claims.user_id.is_none());
    }

    #[test]
    fn test_missing_optional_claims_default() {
        let claims: Claims = serde_json::from_str(r#"{"exp": 1700003600}"#).unwrap();
        assert!(claims.sub.is_none());
        assert_eq!(claims.iat, 0);
        assert!(claims.permissions.is_empty());
        assert!(claims.roles.is_empty());
        assert!(claims.namespace_roles.is_empty());
    }
}
