//! External store primitives consumed by the convergence engine
//!
//! The surrounding platform supplies create/fetch/update/list against the
//! shared declarative store; the engine sees only this trait, which keeps a
//! convergence pass runnable against any backend that honors the contract.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Pod, Service};
use router_api::Router;
use thiserror::Error;

/// Failure reported by a store primitive. Already-exists on create is not a
/// failure; it surfaces as [`CreateOutcome::AlreadyExists`].
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    #[error("{0}")]
    Other(String),
}

/// Outcome of a create call against the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

/// CRUD primitives against the declarative store, scoped to the resource
/// kinds the operator manages. Every call blocks the pass until it completes
/// with a result or a definitive failure.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_deployment(
        &self,
        namespace: &str,
        desired: Deployment,
    ) -> std::result::Result<CreateOutcome, StoreError>;

    async fn get_deployment(
        &self,
        namespace: &str,
        name: &str,
    ) -> std::result::Result<Deployment, StoreError>;

    async fn update_deployment(
        &self,
        namespace: &str,
        deployment: Deployment,
    ) -> std::result::Result<(), StoreError>;

    async fn create_service(
        &self,
        namespace: &str,
        desired: Service,
    ) -> std::result::Result<CreateOutcome, StoreError>;

    async fn get_service(
        &self,
        namespace: &str,
        name: &str,
    ) -> std::result::Result<Service, StoreError>;

    async fn update_service(
        &self,
        namespace: &str,
        service: Service,
    ) -> std::result::Result<(), StoreError>;

    /// List pods in the namespace matching the label selector, in the order
    /// returned by the store.
    async fn list_pods(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> std::result::Result<Vec<Pod>, StoreError>;

    /// Persist the status subresource of the given router.
    async fn update_router_status(&self, router: Router) -> std::result::Result<(), StoreError>;
}
