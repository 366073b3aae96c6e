//! Router API types and CRD for Kubernetes integration
//!
//! This library defines the custom resource for the interconnect router
//! operator:
//! - Router: a clustered message-router deployment declaring its listeners,
//!   connectors, routing policy entries and TLS profiles

pub mod v1alpha1;

pub use v1alpha1::{
    Address, AutoLink, Connector, LinkRoute, Listener, Router, RouterSpec, RouterStatus,
    SslProfile,
};
