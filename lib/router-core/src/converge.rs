//! Convergence of observed cluster state toward a Router's desired state
//!
//! One pass per change notification: default the spec, converge the
//! Deployment, converge the Service, then reconcile status. The order is
//! fixed, the certificate annotation on the Service depends on a flag
//! computed during defaulting and status reads pods selected by the
//! just-converged workload's labels. A store failure aborts the pass; the
//! watch machinery is expected to redeliver.

use k8s_openapi::api::apps::v1::DeploymentSpec;
use k8s_openapi::api::core::v1::{Container, PodSpec, Service, ServiceSpec};
use kube::ResourceExt;
use router_api::{Router, RouterStatus};
use tracing::{debug, info};

use crate::config::router_config;
use crate::defaults::apply_router_defaults;
use crate::error::{CoreError, Result};
use crate::resources::{
    container_for_router, deployment_for_router, selector_for_router, service_for_router,
    CERT_REQUEST_ANNOTATION,
};
use crate::store::Store;

/// A change notification delivered by the surrounding watch machinery.
///
/// Closed set of watched kinds, so dispatch stays exhaustive as kinds are
/// added.
#[derive(Clone, Debug)]
pub enum Notification {
    Router { object: Box<Router>, deleted: bool },
}

/// Entry point for one convergence pass.
///
/// Deletions are ignored: every managed resource carries a controller owner
/// reference and is garbage collected together with its Router.
pub async fn handle_notification(store: &dyn Store, notification: Notification) -> Result<()> {
    match notification {
        Notification::Router { deleted: true, .. } => Ok(()),
        Notification::Router { object, .. } => reconcile_router(store, *object).await,
    }
}

/// Drive one convergence pass for the given router.
pub async fn reconcile_router(store: &dyn Store, mut router: Router) -> Result<()> {
    let name = router.metadata.name.clone().ok_or(CoreError::UnnamedRouter)?;
    let namespace = router.namespace().unwrap_or_else(|| "default".to_string());
    debug!(router = %name, namespace = %namespace, "starting convergence pass");

    let request_cert = apply_router_defaults(&mut router);

    converge_deployment(store, &router, &name, &namespace).await?;
    converge_service(store, &router, &name, &namespace, request_cert).await?;
    converge_status(store, router, &name, &namespace).await?;

    Ok(())
}

async fn converge_deployment(
    store: &dyn Store,
    router: &Router,
    name: &str,
    namespace: &str,
) -> Result<()> {
    let desired = deployment_for_router(router);
    store
        .create_deployment(namespace, desired)
        .await
        .map_err(CoreError::CreateDeployment)?;

    let mut observed = store
        .get_deployment(namespace, name)
        .await
        .map_err(CoreError::GetDeployment)?;

    let config = router_config(&router.spec);
    let desired_container = container_for_router(router, &config);
    let mut drifted = false;

    let spec = observed.spec.get_or_insert_with(DeploymentSpec::default);
    let size = router.spec.size;
    if size != 0 && spec.replicas != Some(size) {
        spec.replicas = Some(size);
        drifted = true;
    }
    let pod_spec = spec.template.spec.get_or_insert_with(PodSpec::default);
    let converged = pod_spec.containers.len() == 1
        && container_converged(&desired_container, &pod_spec.containers[0]);
    if !converged {
        pod_spec.containers = vec![desired_container];
        drifted = true;
    }

    if drifted {
        info!(router = %name, "updating deployment");
        store
            .update_deployment(namespace, observed)
            .await
            .map_err(CoreError::UpdateDeployment)?;
    }
    Ok(())
}

/// Tracked container fields: environment, published ports and volume
/// mounts, each compared as an order-sensitive sequence. The image is
/// externally managed after creation and intentionally not tracked.
fn container_converged(desired: &Container, observed: &Container) -> bool {
    desired.env == observed.env
        && desired.ports == observed.ports
        && desired.volume_mounts == observed.volume_mounts
}

async fn converge_service(
    store: &dyn Store,
    router: &Router,
    name: &str,
    namespace: &str,
    request_cert: bool,
) -> Result<()> {
    let desired = service_for_router(router, request_cert);
    store
        .create_service(namespace, desired.clone())
        .await
        .map_err(CoreError::CreateService)?;

    let mut observed = store
        .get_service(namespace, name)
        .await
        .map_err(CoreError::GetService)?;

    if service_drifted(&desired, &mut observed) {
        info!(router = %name, "updating service");
        store
            .update_service(namespace, observed)
            .await
            .map_err(CoreError::UpdateService)?;
    }
    Ok(())
}

/// Compare the tracked service fields (certificate-request annotation,
/// selector, port sequence) and overwrite any that drifted, leaving fields
/// the operator does not own untouched. Returns whether an update is
/// needed.
fn service_drifted(desired: &Service, observed: &mut Service) -> bool {
    let mut drifted = false;

    let desired_cert = desired
        .metadata
        .annotations
        .as_ref()
        .and_then(|annotations| annotations.get(CERT_REQUEST_ANNOTATION));
    let observed_cert = observed
        .metadata
        .annotations
        .as_ref()
        .and_then(|annotations| annotations.get(CERT_REQUEST_ANNOTATION));
    if desired_cert != observed_cert {
        match desired_cert.cloned() {
            Some(value) => {
                observed
                    .metadata
                    .annotations
                    .get_or_insert_with(Default::default)
                    .insert(CERT_REQUEST_ANNOTATION.to_string(), value);
            }
            None => {
                if let Some(annotations) = observed.metadata.annotations.as_mut() {
                    annotations.remove(CERT_REQUEST_ANNOTATION);
                }
            }
        }
        drifted = true;
    }

    let desired_spec = desired.spec.clone().unwrap_or_default();
    let observed_spec = observed.spec.get_or_insert_with(ServiceSpec::default);
    if observed_spec.selector != desired_spec.selector {
        observed_spec.selector = desired_spec.selector;
        drifted = true;
    }
    if observed_spec.ports != desired_spec.ports {
        observed_spec.ports = desired_spec.ports;
        drifted = true;
    }

    drifted
}

async fn converge_status(
    store: &dyn Store,
    mut router: Router,
    name: &str,
    namespace: &str,
) -> Result<()> {
    let pods = store
        .list_pods(namespace, &selector_for_router(name))
        .await
        .map_err(CoreError::ListPods)?;
    let nodes: Vec<String> = pods.iter().map(|pod| pod.name_any()).collect();

    // Missing status reads as an empty node list; comparison is
    // order-sensitive
    let current: &[String] = router
        .status
        .as_ref()
        .map_or(&[], |status| status.nodes.as_slice());
    if current != nodes.as_slice() {
        debug!(router = %name, nodes = nodes.len(), "recording running pods in status");
        router.status = Some(RouterStatus { nodes });
        store
            .update_router_status(router)
            .await
            .map_err(CoreError::UpdateStatus)?;
    }
    Ok(())
}
