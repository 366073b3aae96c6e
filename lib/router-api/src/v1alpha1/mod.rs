/// API version v1alpha1 for the Router CRD

pub mod router;

pub use router::{
    Address, AutoLink, Connector, LinkRoute, Listener, Router, RouterSpec, RouterStatus,
    SslProfile,
};

/// API group for Router resources
pub const API_GROUP: &str = "messaging.io";
/// API version for Router resources
pub const API_VERSION: &str = "v1alpha1";
