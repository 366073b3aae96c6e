//! Compilation of a RouterSpec into the router configuration document
//!
//! The router process is order-sensitive: blocks are emitted in declaration
//! order and unset optional fields are omitted entirely rather than written
//! with placeholder values.

use router_api::{Address, AutoLink, Connector, LinkRoute, Listener, RouterSpec, SslProfile};

/// Root under which TLS secret volumes are mounted in the router container.
pub const CERT_ROOT: &str = "/etc/qpid-dispatch-certs";

const HTTP_ROOT_DIR: &str = "/usr/share/qpid-dispatch/console";
const SERVICE_ACCOUNT_CA: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";

/// One configuration block: a named, brace-delimited group of `key: value`
/// lines emitted in insertion order.
struct Block {
    lines: Vec<String>,
}

impl Block {
    fn new(name: &str) -> Self {
        Self {
            lines: vec![format!("{} {{", name)],
        }
    }

    /// Unconditional entry.
    fn entry(mut self, key: &str, value: impl std::fmt::Display) -> Self {
        self.lines.push(format!("    {}: {}", key, value));
        self
    }

    /// Entry emitted only when the value is non-empty.
    fn text(self, key: &str, value: &str) -> Self {
        if value.is_empty() {
            self
        } else {
            self.entry(key, value)
        }
    }

    /// Entry emitted only when the value is nonzero.
    fn nonzero(self, key: &str, value: i32) -> Self {
        if value == 0 {
            self
        } else {
            self.entry(key, value)
        }
    }

    /// Entry emitted only when the flag is set.
    fn flag(self, key: &str, value: bool) -> Self {
        if value {
            self.entry(key, "true")
        } else {
            self
        }
    }

    /// Entry emitted only when a value is present.
    fn optional(self, key: &str, value: Option<i32>) -> Self {
        match value {
            Some(value) => self.entry(key, value),
            None => self,
        }
    }

    fn render(self, out: &mut String) {
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("}\n\n");
    }
}

fn host_or_wildcard(host: &str) -> &str {
    if host.is_empty() {
        "0.0.0.0"
    } else {
        host
    }
}

fn listener_block(listener: &Listener) -> Block {
    let role = if listener.route_container {
        "route-container"
    } else {
        "normal"
    };
    let block = Block::new("listener")
        .text("name", &listener.name)
        .entry("host", host_or_wildcard(&listener.host))
        .nonzero("port", listener.port)
        .entry("role", role);
    let block = if listener.http {
        block
            .entry("http", "true")
            .entry("httpRootDir", HTTP_ROOT_DIR)
    } else {
        block
    };
    block.text("sslProfile", &listener.ssl_profile)
}

fn inter_router_listener_block(listener: &Listener) -> Block {
    Block::new("listener")
        .text("name", &listener.name)
        .entry("role", "inter-router")
        .entry("host", host_or_wildcard(&listener.host))
        .nonzero("port", listener.port)
        .nonzero("cost", listener.cost)
        .text("sslProfile", &listener.ssl_profile)
}

fn ssl_profile_block(profile: &SslProfile) -> Block {
    let mut block = Block::new("sslProfile").text("name", &profile.name);
    if !profile.credentials.is_empty() {
        block = block
            .entry(
                "certFile",
                format!("{}/{}/{}/tls.crt", CERT_ROOT, profile.name, profile.credentials),
            )
            .entry(
                "privateKeyFile",
                format!("{}/{}/{}/tls.key", CERT_ROOT, profile.name, profile.credentials),
            );
    }
    if !profile.ca_cert.is_empty() {
        block = block.entry(
            "caCertFile",
            format!("{}/{}/{}/ca.crt", CERT_ROOT, profile.name, profile.ca_cert),
        );
    } else if profile.require_client_certs {
        block = block.entry("caCertFile", SERVICE_ACCOUNT_CA);
    }
    block
        .text("ciphers", &profile.ciphers)
        .text("protocols", &profile.protocols)
}

fn address_block(address: &Address) -> Block {
    Block::new("address")
        .text("prefix", &address.prefix)
        .text("pattern", &address.pattern)
        .text("distribution", &address.distribution)
        .flag("waypoint", address.waypoint)
        .optional("ingressPhase", address.ingress_phase)
        .optional("egressPhase", address.egress_phase)
}

fn link_route_block(link_route: &LinkRoute) -> Block {
    Block::new("linkRoute")
        .text("prefix", &link_route.prefix)
        .text("pattern", &link_route.pattern)
        .text("direction", &link_route.direction)
        .text("connection", &link_route.connection)
        .text("containerId", &link_route.container_id)
        .text("addExternalPrefix", &link_route.add_external_prefix)
        .text("removeExternalPrefix", &link_route.remove_external_prefix)
}

fn auto_link_block(auto_link: &AutoLink) -> Block {
    Block::new("autoLink")
        .text("addr", &auto_link.address)
        .text("direction", &auto_link.direction)
        .text("containerId", &auto_link.container_id)
        .text("connection", &auto_link.connection)
        .text("externalPrefix", &auto_link.external_prefix)
        .optional("phase", auto_link.phase)
}

fn connector_block(connector: &Connector, inter_router: bool) -> Block {
    let block = Block::new("connector")
        .text("name", &connector.name)
        .text("host", &connector.host)
        .nonzero("port", connector.port);
    let block = if inter_router {
        block.entry("role", "inter-router")
    } else if connector.route_container {
        block.entry("role", "route-container")
    } else {
        block
    };
    block
        .nonzero("cost", connector.cost)
        .text("sslProfile", &connector.ssl_profile)
}

/// Render the configuration document for a defaulted router spec.
///
/// Pure and deterministic: structurally identical specs produce
/// byte-identical documents. Section order is fixed; within a section,
/// blocks follow declaration order, which the router uses for
/// route-matching precedence.
pub fn router_config(spec: &RouterSpec) -> String {
    let mut out = String::new();

    // The router derives its identity from the runtime hostname
    Block::new("router")
        .entry("mode", "interior")
        .entry("id", "${HOSTNAME}")
        .render(&mut out);

    for listener in &spec.listeners {
        listener_block(listener).render(&mut out);
    }
    for listener in &spec.inter_router_listeners {
        inter_router_listener_block(listener).render(&mut out);
    }
    for profile in &spec.ssl_profiles {
        ssl_profile_block(profile).render(&mut out);
    }
    for address in &spec.addresses {
        address_block(address).render(&mut out);
    }
    for link_route in &spec.link_routes {
        link_route_block(link_route).render(&mut out);
    }
    for auto_link in &spec.auto_links {
        auto_link_block(auto_link).render(&mut out);
    }
    for connector in &spec.connectors {
        connector_block(connector, false).render(&mut out);
    }
    for connector in &spec.inter_router_connectors {
        connector_block(connector, true).render(&mut out);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::apply_router_defaults;
    use router_api::Router;

    fn spec_with_listeners(names: &[&str]) -> RouterSpec {
        RouterSpec {
            listeners: names
                .iter()
                .enumerate()
                .map(|(i, name)| Listener {
                    name: name.to_string(),
                    port: 6000 + i as i32,
                    ..Listener::default()
                })
                .collect(),
            ..RouterSpec::default()
        }
    }

    #[test]
    fn test_identity_block_always_present() {
        let config = router_config(&RouterSpec::default());
        assert!(config.starts_with("router {\n"));
        assert!(config.contains("    mode: interior\n"));
        assert!(config.contains("    id: ${HOSTNAME}\n"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let spec = spec_with_listeners(&["a", "b", "c"]);
        assert_eq!(router_config(&spec), router_config(&spec));
    }

    #[test]
    fn test_listener_blocks_follow_declaration_order() {
        let config = router_config(&spec_with_listeners(&["alpha", "beta", "gamma"]));
        let alpha = config.find("name: alpha").unwrap();
        let beta = config.find("name: beta").unwrap();
        let gamma = config.find("name: gamma").unwrap();
        assert!(alpha < beta && beta < gamma);
    }

    #[test]
    fn test_listener_defaults_and_omission() {
        let spec = RouterSpec {
            listeners: vec![Listener {
                port: 5672,
                ..Listener::default()
            }],
            ..RouterSpec::default()
        };
        let config = router_config(&spec);
        assert!(config.contains("    host: 0.0.0.0\n"));
        assert!(config.contains("    port: 5672\n"));
        assert!(config.contains("    role: normal\n"));
        // unset optionals are omitted, not emitted empty
        assert!(!config.contains("name:"));
        assert!(!config.contains("sslProfile:"));
        assert!(!config.contains("cost:"));
    }

    #[test]
    fn test_http_listener_serves_console() {
        let spec = RouterSpec {
            listeners: vec![Listener {
                port: 8672,
                http: true,
                ..Listener::default()
            }],
            ..RouterSpec::default()
        };
        let config = router_config(&spec);
        assert!(config.contains("    http: true\n"));
        assert!(config.contains("    httpRootDir: /usr/share/qpid-dispatch/console\n"));
    }

    #[test]
    fn test_inter_router_listener_role_and_cost() {
        let spec = RouterSpec {
            inter_router_listeners: vec![Listener {
                port: 55672,
                cost: 4,
                ..Listener::default()
            }],
            ..RouterSpec::default()
        };
        let config = router_config(&spec);
        assert!(config.contains("    role: inter-router\n"));
        assert!(config.contains("    cost: 4\n"));
    }

    #[test]
    fn test_ssl_profile_paths() {
        let spec = RouterSpec {
            ssl_profiles: vec![SslProfile {
                name: "default".to_string(),
                credentials: "r1-cert".to_string(),
                ..SslProfile::default()
            }],
            ..RouterSpec::default()
        };
        let config = router_config(&spec);
        assert!(config.contains("    certFile: /etc/qpid-dispatch-certs/default/r1-cert/tls.crt\n"));
        assert!(
            config.contains("    privateKeyFile: /etc/qpid-dispatch-certs/default/r1-cert/tls.key\n")
        );
        assert!(!config.contains("caCertFile:"));
    }

    #[test]
    fn test_ssl_profile_ca_cert_fallback() {
        let spec = RouterSpec {
            ssl_profiles: vec![SslProfile {
                name: "mtls".to_string(),
                credentials: "server-cert".to_string(),
                require_client_certs: true,
                ..SslProfile::default()
            }],
            ..RouterSpec::default()
        };
        let config = router_config(&spec);
        assert!(config
            .contains("    caCertFile: /var/run/secrets/kubernetes.io/serviceaccount/ca.crt\n"));
    }

    #[test]
    fn test_ssl_profile_cipher_policy() {
        let spec = RouterSpec {
            ssl_profiles: vec![SslProfile {
                name: "strict".to_string(),
                credentials: "server-cert".to_string(),
                ciphers: "ECDHE-RSA-AES256-GCM-SHA384".to_string(),
                protocols: "TLSv1.2 TLSv1.3".to_string(),
                ..SslProfile::default()
            }],
            ..RouterSpec::default()
        };
        let config = router_config(&spec);
        assert!(config.contains("    ciphers: ECDHE-RSA-AES256-GCM-SHA384\n"));
        assert!(config.contains("    protocols: TLSv1.2 TLSv1.3\n"));
    }

    #[test]
    fn test_connector_roles() {
        let spec = RouterSpec {
            connectors: vec![Connector {
                name: "broker".to_string(),
                host: "broker.example.com".to_string(),
                port: 5672,
                route_container: true,
                ..Connector::default()
            }],
            inter_router_connectors: vec![Connector {
                host: "hub.example.com".to_string(),
                port: 55672,
                cost: 2,
                ..Connector::default()
            }],
            ..RouterSpec::default()
        };
        let config = router_config(&spec);
        assert!(config.contains("    role: route-container\n"));
        assert!(config.contains("    role: inter-router\n"));
        assert!(config.contains("    host: broker.example.com\n"));
        assert!(config.contains("    cost: 2\n"));
    }

    #[test]
    fn test_routing_policy_blocks() {
        let spec = RouterSpec {
            addresses: vec![Address {
                prefix: "queue".to_string(),
                distribution: "balanced".to_string(),
                waypoint: true,
                ingress_phase: Some(0),
                ..Address::default()
            }],
            link_routes: vec![LinkRoute {
                prefix: "broker.".to_string(),
                direction: "in".to_string(),
                connection: "broker".to_string(),
                ..LinkRoute::default()
            }],
            auto_links: vec![AutoLink {
                address: "orders".to_string(),
                direction: "out".to_string(),
                phase: Some(1),
                ..AutoLink::default()
            }],
            ..RouterSpec::default()
        };
        let config = router_config(&spec);
        assert!(config.contains("address {\n    prefix: queue\n    distribution: balanced\n    waypoint: true\n    ingressPhase: 0\n}"));
        assert!(config.contains("linkRoute {\n    prefix: broker.\n    direction: in\n    connection: broker\n}"));
        assert!(config.contains("autoLink {\n    addr: orders\n    direction: out\n    phase: 1\n}"));
    }

    #[test]
    fn test_defaulted_router_block_census() {
        let mut router = Router::new("r1", RouterSpec::default());
        apply_router_defaults(&mut router);
        let config = router_config(&router.spec);
        assert_eq!(config.matches("router {").count(), 1);
        assert_eq!(config.matches("listener {").count(), 4);
        assert_eq!(config.matches("sslProfile {").count(), 1);
        assert_eq!(config.matches("connector {").count(), 0);
    }
}
