use thiserror::Error;

use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, CoreError>;

/// A convergence pass aborts on the first store failure; each variant names
/// the step that failed. Nothing applied earlier in the pass is rolled back,
/// the watch machinery is expected to redeliver the notification.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("router object has no name")]
    UnnamedRouter,

    #[error("failed to create deployment: {0}")]
    CreateDeployment(StoreError),

    #[error("failed to get deployment: {0}")]
    GetDeployment(StoreError),

    #[error("failed to update deployment: {0}")]
    UpdateDeployment(StoreError),

    #[error("failed to create service: {0}")]
    CreateService(StoreError),

    #[error("failed to get service: {0}")]
    GetService(StoreError),

    #[error("failed to update service: {0}")]
    UpdateService(StoreError),

    #[error("failed to list pods: {0}")]
    ListPods(StoreError),

    #[error("failed to update router status: {0}")]
    UpdateStatus(StoreError),
}
