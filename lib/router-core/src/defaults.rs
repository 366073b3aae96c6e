//! Defaulting of Router specifications
//!
//! A router with no declared listeners gets the stock listener set; any
//! listener referencing the "default" sslProfile pulls in a synthesized
//! profile whose credentials name a certificate the operator requests.

use kube::ResourceExt;
use router_api::{Listener, Router, SslProfile};

/// Port for plain AMQP client connections.
pub const DEFAULT_AMQP_PORT: i32 = 5672;
/// Port for TLS-secured AMQP client connections.
pub const DEFAULT_AMQPS_PORT: i32 = 5671;
/// Port for the HTTP console listener.
pub const DEFAULT_HTTP_PORT: i32 = 8672;
/// Port for inter-router links.
pub const DEFAULT_INTER_ROUTER_PORT: i32 = 55672;

const DEFAULT_PROFILE: &str = "default";

fn is_default_ssl_profile_defined(router: &Router) -> bool {
    router
        .spec
        .ssl_profiles
        .iter()
        .any(|profile| profile.name == DEFAULT_PROFILE)
}

fn is_default_ssl_profile_used(router: &Router) -> bool {
    router
        .spec
        .listeners
        .iter()
        .chain(router.spec.inter_router_listeners.iter())
        .any(|listener| listener.ssl_profile == DEFAULT_PROFILE)
}

/// Fill unset fields of the router spec with their defaults.
///
/// Returns true when certificate material must be requested for the router,
/// i.e. when some sslProfile ended up with operator-assigned credentials.
/// Purely structural and idempotent: a second application leaves the spec
/// unchanged.
pub fn apply_router_defaults(router: &mut Router) -> bool {
    let cert_name = format!("{}-cert", router.name_any());
    let mut request_cert = false;

    if router.spec.listeners.is_empty() {
        router.spec.listeners.extend([
            Listener {
                port: DEFAULT_AMQP_PORT,
                ..Listener::default()
            },
            Listener {
                port: DEFAULT_AMQPS_PORT,
                ssl_profile: DEFAULT_PROFILE.to_string(),
                ..Listener::default()
            },
            Listener {
                port: DEFAULT_HTTP_PORT,
                http: true,
                ssl_profile: DEFAULT_PROFILE.to_string(),
                ..Listener::default()
            },
        ]);
    }

    if router.spec.inter_router_listeners.is_empty() {
        router.spec.inter_router_listeners.push(Listener {
            port: DEFAULT_INTER_ROUTER_PORT,
            ..Listener::default()
        });
    }

    if !is_default_ssl_profile_defined(router) && is_default_ssl_profile_used(router) {
        router.spec.ssl_profiles.push(SslProfile {
            name: DEFAULT_PROFILE.to_string(),
            credentials: cert_name.clone(),
            ..SslProfile::default()
        });
        request_cert = true;
    }

    // Mutate the stored profiles, not copies of them
    for profile in router.spec.ssl_profiles.iter_mut() {
        if profile.credentials.is_empty() {
            profile.credentials = cert_name.clone();
            request_cert = true;
        }
    }

    request_cert
}

#[cfg(test)]
mod tests {
    use super::*;
    use router_api::RouterSpec;

    fn router(name: &str, spec: RouterSpec) -> Router {
        Router::new(name, spec)
    }

    #[test]
    fn test_default_listener_synthesis() {
        let mut r = router("r1", RouterSpec::default());
        apply_router_defaults(&mut r);

        let ports: Vec<i32> = r.spec.listeners.iter().map(|l| l.port).collect();
        assert_eq!(ports, vec![5672, 5671, 8672]);
        assert!(r.spec.listeners[0].ssl_profile.is_empty());
        assert_eq!(r.spec.listeners[1].ssl_profile, "default");
        assert_eq!(r.spec.listeners[2].ssl_profile, "default");
        assert!(r.spec.listeners[2].http);

        let inter_ports: Vec<i32> = r.spec.inter_router_listeners.iter().map(|l| l.port).collect();
        assert_eq!(inter_ports, vec![55672]);
        assert!(r.spec.inter_router_listeners[0].ssl_profile.is_empty());
    }

    #[test]
    fn test_default_profile_synthesized_for_stock_listeners() {
        // The stock 5671/8672 listeners reference "default", so defaulting
        // an empty spec also pulls in the synthesized profile
        let mut r = router("r1", RouterSpec::default());
        let request_cert = apply_router_defaults(&mut r);

        assert!(request_cert);
        assert_eq!(r.spec.ssl_profiles.len(), 1);
        assert_eq!(r.spec.ssl_profiles[0].name, "default");
        assert_eq!(r.spec.ssl_profiles[0].credentials, "r1-cert");
    }

    #[test]
    fn test_declared_listeners_are_kept() {
        let spec = RouterSpec {
            listeners: vec![Listener {
                port: 9000,
                ssl_profile: "default".to_string(),
                ..Listener::default()
            }],
            ..RouterSpec::default()
        };
        let mut r = router("r1", spec);
        let request_cert = apply_router_defaults(&mut r);

        assert!(request_cert);
        assert_eq!(r.spec.listeners.len(), 1);
        assert_eq!(r.spec.listeners[0].port, 9000);
        assert_eq!(r.spec.inter_router_listeners.len(), 1);
        assert_eq!(r.spec.ssl_profiles[0].credentials, "r1-cert");
    }

    #[test]
    fn test_empty_credentials_filled_on_declared_profile() {
        let spec = RouterSpec {
            listeners: vec![Listener {
                port: 9000,
                ssl_profile: "custom".to_string(),
                ..Listener::default()
            }],
            ssl_profiles: vec![SslProfile {
                name: "custom".to_string(),
                ..SslProfile::default()
            }],
            ..RouterSpec::default()
        };
        let mut r = router("r1", spec);
        let request_cert = apply_router_defaults(&mut r);

        assert!(request_cert);
        assert_eq!(r.spec.ssl_profiles.len(), 1);
        assert_eq!(r.spec.ssl_profiles[0].credentials, "r1-cert");
    }

    #[test]
    fn test_no_cert_request_for_complete_profiles() {
        let spec = RouterSpec {
            listeners: vec![Listener {
                port: 9000,
                ssl_profile: "custom".to_string(),
                ..Listener::default()
            }],
            ssl_profiles: vec![SslProfile {
                name: "custom".to_string(),
                credentials: "my-secret".to_string(),
                ..SslProfile::default()
            }],
            ..RouterSpec::default()
        };
        let mut r = router("r1", spec);
        let request_cert = apply_router_defaults(&mut r);

        assert!(!request_cert);
        assert_eq!(r.spec.ssl_profiles.len(), 1);
        assert_eq!(r.spec.ssl_profiles[0].credentials, "my-secret");
    }

    #[test]
    fn test_defaulting_is_idempotent() {
        let mut once = router("r1", RouterSpec::default());
        apply_router_defaults(&mut once);

        let mut twice = once.clone();
        apply_router_defaults(&mut twice);

        assert_eq!(once.spec, twice.spec);
    }
}
