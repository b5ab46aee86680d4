//! Bearer-token authorization
//!
//! Token validation against the IAM service: RS256 signature checks via a
//! periodically refreshed JWKS cache, revocation checks (Bloom-filtered
//! tokens plus exact per-user timestamps), and hierarchical permission
//! matching over claim permissions, namespace roles, and roles.

mod bloom;
mod claims;
mod interceptor;
mod permission;
mod source;
mod validator;

pub use bloom::BloomFilter;
pub use claims::{Claims, NamespaceRole};
pub use interceptor::AuthorizationInterceptor;
pub use permission::{
    ACTION_CREATE, ACTION_DELETE, ACTION_READ, ACTION_UPDATE, Permission, matches,
    resolve_placeholders,
};
pub use source::{
    ClientTokenGrant, HttpIamSource, IamSource, RevocationList, RevokedTokenFilter, RevokedUser,
    Role,
};
pub use validator::TokenValidator;
