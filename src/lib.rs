//! Matchmaking-function gRPC server
//!
//! A match function service for an external matchmaker, with bearer-token
//! authorization against an IAM service.
//!
//! ## What it does
//!
//! - **Ticket validation and enrichment** over unary RPCs
//! - **Streaming match building** - tickets arrive on a client stream and are
//!   grouped into matches under a JSON-configured rule set, with one
//!   `MatchResponse` emitted per match as soon as it forms
//! - **Streaming backfill** - plain tickets are paired onto partially filled
//!   matches, emitting one `BackfillResponse` per proposal
//! - **Token validation** - RS256 JWTs checked against a periodically
//!   refreshed signing-key set, a Bloom-filtered token revocation list, an
//!   exact per-user revocation map, and a hierarchical permission model
//!   (claim permissions, namespace roles, roles)
//!
//! ## Authorization model
//!
//! ```text
//! bearer token → decode (kid → cached JWKS key) → user revoked?
//!              → token revoked? → permission match → handler
//! ```
//!
//! Every RPC requires the `NAMESPACE:{namespace}:{resource}` permission with
//! the read action bit. Validation failures surface as `UNAUTHENTICATED`;
//! unexpected faults as `INTERNAL`; malformed rules as `INVALID_ARGUMENT`.

pub mod auth;
pub mod config;
pub mod error;
pub mod matchmaking;
pub mod observability;
pub mod pb;

// Re-export main types
pub use config::{AppConfig, load_config};
pub use matchmaking::MatchFunctionService;
pub use observability::CallMetrics;
