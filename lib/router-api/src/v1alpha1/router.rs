use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Router declares the desired topology of a clustered message-router
/// deployment: its listeners, connectors, routing policy and TLS material.
/// The operator converges a Deployment and a Service toward this declaration.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "messaging.io",
    version = "v1alpha1",
    kind = "Router",
    plural = "routers",
    namespaced,
    derive = "Default",
    status = "RouterStatus",
    printcolumn = r#"{"name":"Size","type":"integer","jsonPath":".spec.size"}"#,
)]
#[serde(rename_all = "camelCase")]
pub struct RouterSpec {
    /// Desired number of router replicas; 0 leaves the replica count under
    /// external control
    #[serde(default)]
    pub size: i32,

    /// Whether a management console is requested for this router. Carried
    /// on the wire for compatibility; the operator attaches no behavior
    #[serde(default)]
    pub console: bool,

    /// Address routing policy entries, in precedence order
    #[serde(default)]
    pub addresses: Vec<Address>,

    /// Auto links attaching local addresses to external containers
    #[serde(default)]
    pub auto_links: Vec<AutoLink>,

    /// Link routes, in precedence order
    #[serde(default)]
    pub link_routes: Vec<LinkRoute>,

    /// Outbound connections to external AMQP containers
    #[serde(default)]
    pub connectors: Vec<Connector>,

    /// Outbound connections to other routers in the mesh
    #[serde(default)]
    pub inter_router_connectors: Vec<Connector>,

    /// Client-facing listeners
    #[serde(default)]
    pub listeners: Vec<Listener>,

    /// Listeners accepting connections from other routers
    #[serde(default)]
    pub inter_router_listeners: Vec<Listener>,

    /// Named TLS configuration bundles referenced by listeners and
    /// connectors
    #[serde(default)]
    pub ssl_profiles: Vec<SslProfile>,
}

/// Observed state of a Router
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RouterStatus {
    /// Names of the pods currently running this router
    #[serde(default)]
    pub nodes: Vec<String>,
}

/// An inbound network endpoint of the router process
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Listener {
    /// Listener name; `port-<port>` is derived where a name is required
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Interface address to bind; the wildcard address when unset
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,

    /// Port to listen on
    #[serde(default)]
    pub port: i32,

    /// Accept route-container connections instead of normal clients
    #[serde(default)]
    pub route_container: bool,

    /// Serve HTTP (console, websockets) on this listener
    #[serde(default)]
    pub http: bool,

    /// Routing cost advertised over this listener
    #[serde(default)]
    pub cost: i32,

    /// Name of the sslProfile securing this listener
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ssl_profile: String,
}

/// An outbound connection the router establishes and maintains
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    /// Connector name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Host to connect to; no default
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,

    /// Port to connect to
    #[serde(default)]
    pub port: i32,

    /// Connect in the route-container role
    #[serde(default)]
    pub route_container: bool,

    /// Routing cost advertised over this connector
    #[serde(default)]
    pub cost: i32,

    /// Name of the sslProfile securing this connector
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ssl_profile: String,
}

/// A named TLS configuration bundle
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SslProfile {
    /// Profile name, referenced from listeners and connectors
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Name of the secret holding the certificate and private key
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub credentials: String,

    /// Name of the secret holding the CA certificate used to verify peers
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ca_cert: String,

    /// Require connecting clients to present a certificate
    #[serde(default)]
    pub require_client_certs: bool,

    /// Permitted cipher list, in OpenSSL syntax
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ciphers: String,

    /// Permitted TLS protocol versions
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub protocols: String,
}

/// An address routing policy entry
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Address prefix to match
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prefix: String,

    /// Address pattern to match; mutually exclusive with prefix
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pattern: String,

    /// Distribution of messages across consumers (closest, balanced,
    /// multicast); forwarded as declared
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub distribution: String,

    /// Treat this address as a waypoint
    #[serde(default)]
    pub waypoint: bool,

    /// Ingress phase override for waypoint addresses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_phase: Option<i32>,

    /// Egress phase override for waypoint addresses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub egress_phase: Option<i32>,
}

/// A link route attaching remote containers through the router
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkRoute {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prefix: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pattern: String,

    /// Direction of the routed links (in, out); forwarded as declared
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub direction: String,

    /// Container id of the destination container
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub container_id: String,

    /// Name of the connector carrying routed links
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub connection: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub add_external_prefix: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub remove_external_prefix: String,
}

/// An auto link binding a local address to an external container
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AutoLink {
    /// Address to attach
    #[serde(default)]
    pub address: String,

    /// Direction of the link (in, out); forwarded as declared
    #[serde(default)]
    pub direction: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub container_id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub connection: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub external_prefix: String,

    /// Phase of the attached address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<i32>,
}
