//! Authorization guard for incoming RPCs
//!
//! gRPC interceptors in tonic are synchronous, but permission resolution
//! may fetch roles over the network. The guard is therefore an async check
//! each handler runs against the request metadata before touching the
//! request body.

use crate::auth::permission::{ACTION_READ, Permission};
use crate::auth::validator::TokenValidator;
use crate::observability::CallMetrics;
use std::sync::Arc;
use tonic::Status;
use tonic::metadata::MetadataMap;
use tracing::debug;

const BEARER_PREFIX: &str = "Bearer ";

pub struct AuthorizationInterceptor {
    validator: Arc<TokenValidator>,
    namespace: String,
    required: Permission,
    metrics: Arc<CallMetrics>,
}

impl AuthorizationInterceptor {
    /// Guard calls with `NAMESPACE:{namespace}:{resource_name}` read
    /// access.
    pub fn new(
        validator: Arc<TokenValidator>,
        namespace: impl Into<String>,
        resource_name: &str,
        metrics: Arc<CallMetrics>,
    ) -> Self {
        let namespace = namespace.into();
        let required = Permission::new(
            format!("NAMESPACE:{namespace}:{resource_name}"),
            ACTION_READ,
        );
        Self {
            validator,
            namespace,
            required,
            metrics,
        }
    }

    /// Authorize a call from its metadata. Returns the status to respond
    /// with on rejection; handlers propagate it with `?`.
    pub async fn authorize(&self, metadata: &MetadataMap) -> Result<(), Status> {
        let result = self.check(metadata).await;
        if let Err(status) = &result {
            self.metrics.record_auth_rejection();
            debug!(code = ?status.code(), message = status.message(), "call rejected");
        }
        result
    }

    async fn check(&self, metadata: &MetadataMap) -> Result<(), Status> {
        let value = metadata
            .get("authorization")
            .ok_or_else(|| Status::unauthenticated("no authorization token found"))?;
        let value = value
            .to_str()
            .map_err(|_| Status::unauthenticated("invalid authorization token format"))?;
        let token = value
            .strip_prefix(BEARER_PREFIX)
            .ok_or_else(|| Status::unauthenticated("invalid authorization token format"))?;

        self.validator
            .validate(token, Some(&self.required), Some(&self.namespace), None)
            .await
            .map(|_| ())
            .map_err(|e| e.into_status())
    }
}
