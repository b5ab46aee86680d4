//! Hierarchical permission matching
//!
//! IAM permissions are colon-separated resource paths
//! (`NAMESPACE:{namespace}:MATCHMAKING`) paired with an action bitmask.
//! A granted segment of `*` matches any required segment, and a trailing
//! `*` may cover the remainder of a longer required resource, except
//! directly after a `NAMESPACE` or `USER` marker: `NAMESPACE:*` must not
//! implicitly grant every namespaced resource.

use serde::{Deserialize, Serialize};

pub const ACTION_CREATE: u32 = 1;
pub const ACTION_READ: u32 = 2;
pub const ACTION_UPDATE: u32 = 4;
pub const ACTION_DELETE: u32 = 8;

/// A single granted or required permission.
///
/// IAM serializes these with PascalCase keys in role payloads and
/// lowercase keys inside token claims; aliases accept both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    #[serde(alias = "Resource")]
    pub resource: String,

    #[serde(alias = "Action")]
    pub action: u32,
}

impl Permission {
    pub fn new(resource: impl Into<String>, action: u32) -> Self {
        Self {
            resource: resource.into(),
            action,
        }
    }
}

/// True when any granted permission covers the required resource and the
/// action bitmasks overlap.
pub fn matches(granted: &[Permission], required_resource: &str, required_action: u32) -> bool {
    granted.iter().any(|permission| {
        permission.action & required_action != 0
            && resource_allowed(&permission.resource, required_resource)
    })
}

/// Substitute `{namespace}` and `{userId}` placeholders in a resource
/// template with concrete values, leaving them in place when no value is
/// available.
pub fn resolve_placeholders(
    resource: &str,
    namespace: Option<&str>,
    user_id: Option<&str>,
) -> String {
    let mut resolved = resource.to_string();
    if let Some(namespace) = namespace {
        resolved = resolved.replace("{namespace}", namespace);
    }
    if let Some(user_id) = user_id {
        resolved = resolved.replace("{userId}", user_id);
    }
    resolved
}

fn resource_allowed(granted: &str, required: &str) -> bool {
    let granted: Vec<&str> = granted.split(':').collect();
    let required: Vec<&str> = required.split(':').collect();

    let overlap = granted.len().min(required.len());
    for i in 0..overlap {
        if granted[i] != required[i] && granted[i] != "*" {
            return false;
        }
    }

    if granted.len() > required.len() {
        // extra trailing segments on the grant must all be wildcards
        return granted[required.len()..].iter().all(|s| *s == "*");
    }

    let last = granted[granted.len() - 1];
    if last == "*" {
        // a trailing wildcard stands in for the rest of the resource, but
        // not directly after a NAMESPACE/USER marker
        if granted.len() >= 2 {
            let marker = granted[granted.len() - 2];
            if marker == "NAMESPACE" || marker == "USER" {
                return false;
            }
        }
        return true;
    }

    granted.len() == required.len()
}
