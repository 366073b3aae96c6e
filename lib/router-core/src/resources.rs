//! Synthesis of the managed Deployment and Service for a Router
//!
//! Desired-state construction only; the convergence engine decides whether
//! anything observed needs to change. Every synthesized resource carries a
//! controller owner reference so garbage collection removes it with the
//! Router object.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, EnvVarSource, ObjectFieldSelector, PodSpec, PodTemplateSpec,
    SecretVolumeSource, Service, ServicePort, ServiceSpec, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta, OwnerReference};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::{Resource, ResourceExt};
use router_api::{Listener, Router};

use crate::config::{router_config, CERT_ROOT};

/// Image run by every router container.
pub const ROUTER_IMAGE: &str = "amq-interconnect/amq-interconnect-1.2-openshift:latest";

/// Service annotation requesting serving-certificate material for the
/// router.
pub const CERT_REQUEST_ANNOTATION: &str = "service.alpha.openshift.io/serving-cert-secret-name";

/// Identity labels attached to every resource managed for the named router.
pub fn labels_for_router(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("application".to_string(), name.to_string()),
        ("router_cr".to_string(), name.to_string()),
    ])
}

/// The list selector matching [`labels_for_router`].
pub fn selector_for_router(name: &str) -> String {
    format!("application={name},router_cr={name}")
}

fn name_for_listener(listener: &Listener) -> String {
    if listener.name.is_empty() {
        format!("port-{}", listener.port)
    } else {
        listener.name.clone()
    }
}

fn owner_ref(router: &Router) -> OwnerReference {
    OwnerReference {
        api_version: Router::api_version(&()).into_owned(),
        kind: Router::kind(&()).into_owned(),
        name: router.name_any(),
        uid: router.metadata.uid.clone().unwrap_or_default(),
        controller: Some(true),
        ..OwnerReference::default()
    }
}

fn field_ref(path: &str) -> EnvVarSource {
    EnvVarSource {
        field_ref: Some(ObjectFieldSelector {
            field_path: path.to_string(),
            ..ObjectFieldSelector::default()
        }),
        ..EnvVarSource::default()
    }
}

fn container_ports_for_listeners(listeners: &[Listener]) -> Vec<ContainerPort> {
    listeners
        .iter()
        .map(|listener| ContainerPort {
            name: Some(name_for_listener(listener)),
            container_port: listener.port,
            ..ContainerPort::default()
        })
        .collect()
}

fn container_ports_for_router(router: &Router) -> Vec<ContainerPort> {
    let mut ports = container_ports_for_listeners(&router.spec.listeners);
    ports.extend(container_ports_for_listeners(&router.spec.inter_router_listeners));
    ports
}

fn service_ports_for_listeners(listeners: &[Listener]) -> Vec<ServicePort> {
    listeners
        .iter()
        .map(|listener| ServicePort {
            name: Some(name_for_listener(listener)),
            protocol: Some("TCP".to_string()),
            port: listener.port,
            target_port: Some(IntOrString::Int(listener.port)),
            ..ServicePort::default()
        })
        .collect()
}

fn service_ports_for_router(router: &Router) -> Vec<ServicePort> {
    let mut ports = service_ports_for_listeners(&router.spec.listeners);
    ports.extend(service_ports_for_listeners(&router.spec.inter_router_listeners));
    ports
}

fn volume_mounts_for_router(router: &Router) -> Vec<VolumeMount> {
    let mut mounts = Vec::new();
    for profile in &router.spec.ssl_profiles {
        if !profile.credentials.is_empty() {
            mounts.push(VolumeMount {
                name: profile.credentials.clone(),
                mount_path: format!("{}/{}/{}", CERT_ROOT, profile.name, profile.credentials),
                ..VolumeMount::default()
            });
        }
        // A CA secret shared with the credentials secret is already mounted
        if !profile.ca_cert.is_empty() && profile.ca_cert != profile.credentials {
            mounts.push(VolumeMount {
                name: profile.ca_cert.clone(),
                mount_path: format!("{}/{}/{}", CERT_ROOT, profile.name, profile.ca_cert),
                ..VolumeMount::default()
            });
        }
    }
    mounts
}

fn volumes_for_router(router: &Router) -> Vec<Volume> {
    let mut volumes = Vec::new();
    for profile in &router.spec.ssl_profiles {
        if !profile.credentials.is_empty() {
            volumes.push(secret_volume(&profile.credentials));
        }
        if !profile.ca_cert.is_empty() && profile.ca_cert != profile.credentials {
            volumes.push(secret_volume(&profile.ca_cert));
        }
    }
    volumes
}

fn secret_volume(secret_name: &str) -> Volume {
    Volume {
        name: secret_name.to_string(),
        secret: Some(SecretVolumeSource {
            secret_name: Some(secret_name.to_string()),
            ..SecretVolumeSource::default()
        }),
        ..Volume::default()
    }
}

/// The single router container: fixed image, compiled configuration in the
/// environment, one published port per listener.
pub fn container_for_router(router: &Router, config: &str) -> Container {
    let mut container = Container {
        name: "router".to_string(),
        image: Some(ROUTER_IMAGE.to_string()),
        env: Some(vec![
            EnvVar {
                name: "QDROUTERD_CONF".to_string(),
                value: Some(config.to_string()),
                ..EnvVar::default()
            },
            EnvVar {
                name: "QDROUTERD_AUTO_MESH_DISCOVERY".to_string(),
                value: Some("QUERY".to_string()),
                ..EnvVar::default()
            },
            EnvVar {
                name: "APPLICATION_NAME".to_string(),
                value: Some(router.name_any()),
                ..EnvVar::default()
            },
            EnvVar {
                name: "POD_NAMESPACE".to_string(),
                value_from: Some(field_ref("metadata.namespace")),
                ..EnvVar::default()
            },
            EnvVar {
                name: "POD_IP".to_string(),
                value_from: Some(field_ref("status.podIP")),
                ..EnvVar::default()
            },
        ]),
        ports: Some(container_ports_for_router(router)),
        ..Container::default()
    };
    let mounts = volume_mounts_for_router(router);
    if !mounts.is_empty() {
        container.volume_mounts = Some(mounts);
    }
    container
}

/// The desired workload for a defaulted router.
pub fn deployment_for_router(router: &Router) -> Deployment {
    let name = router.name_any();
    let labels = labels_for_router(&name);
    let config = router_config(&router.spec);
    let volumes = volumes_for_router(router);
    Deployment {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: router.namespace(),
            owner_references: Some(vec![owner_ref(router)]),
            ..ObjectMeta::default()
        },
        spec: Some(DeploymentSpec {
            replicas: (router.spec.size != 0).then_some(router.spec.size),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..LabelSelector::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..ObjectMeta::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![container_for_router(router, &config)],
                    volumes: (!volumes.is_empty()).then_some(volumes),
                    ..PodSpec::default()
                }),
            },
            ..DeploymentSpec::default()
        }),
        ..Deployment::default()
    }
}

/// The desired network exposure for a defaulted router.
pub fn service_for_router(router: &Router, request_cert: bool) -> Service {
    let name = router.name_any();
    let annotations = request_cert.then(|| {
        BTreeMap::from([(
            CERT_REQUEST_ANNOTATION.to_string(),
            format!("{name}-cert"),
        )])
    });
    Service {
        metadata: ObjectMeta {
            name: Some(name.clone()),
            namespace: router.namespace(),
            annotations,
            owner_references: Some(vec![owner_ref(router)]),
            ..ObjectMeta::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(labels_for_router(&name)),
            ports: Some(service_ports_for_router(router)),
            ..ServiceSpec::default()
        }),
        ..Service::default()
    }
}
