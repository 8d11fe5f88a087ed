//! Advertise peer URL parsing.
//!
//! A PD replica announces itself with the peer URL its startup script
//! derived from the pod's in-cluster DNS name:
//!
//! ```text
//! <cluster>-pd-<ord>.<peer-svc>.<namespace>.svc:<peer-port>
//! ```
//!
//! Both bare `host:port` and full URL forms are accepted.

use std::env;

use http::Uri;

use super::error::DiscoverError;

/// Environment variable naming the namespace this instance serves.
pub const NAMESPACE_ENV: &str = "MY_POD_NAMESPACE";

/// Marker segment between the cluster name and the ordinal in a PD
/// pod name (`<cluster>-pd-<ord>`).
const PD_SEGMENT: &str = "pd";

/// Parses an advertise peer URL. The hostname and an explicit port
/// must both be present.
pub fn parse_address(advertise_peer_url: &str) -> Result<Uri, DiscoverError> {
    let uri: Uri = advertise_peer_url
        .parse()
        .map_err(|_| DiscoverError::BadUrl(advertise_peer_url.to_string()))?;
    if uri.host().is_none() || uri.port_u16().is_none() {
        return Err(DiscoverError::BadUrl(advertise_peer_url.to_string()));
    }
    Ok(uri)
}

/// Parses the advertise peer URL of a PD pod and returns
/// `(peer name, cluster id, parsed URL)`, where the cluster id is
/// `<namespace>/<cluster>`.
///
/// The namespace segment must match `MY_POD_NAMESPACE`; a discovery
/// instance only answers for its own namespace.
pub fn parse_k8s_address(advertise_peer_url: &str) -> Result<(String, String, Uri), DiscoverError> {
    let discovery_ns = env::var(NAMESPACE_ENV).unwrap_or_default();
    parse_k8s_address_in(advertise_peer_url, &discovery_ns)
}

/// Same as [`parse_k8s_address`] with the discovery namespace passed
/// explicitly instead of read from the process environment.
pub fn parse_k8s_address_in(
    advertise_peer_url: &str,
    discovery_ns: &str,
) -> Result<(String, String, Uri), DiscoverError> {
    let bad = || DiscoverError::BadUrl(advertise_peer_url.to_string());

    let uri = parse_address(advertise_peer_url)?;
    let host = uri.host().ok_or_else(|| bad())?.to_string();

    // <pod>.<peer-svc>.<namespace>.svc, optionally followed by the
    // cluster domain.
    let segments: Vec<&str> = host.split('.').collect();
    if segments.len() < 4 || segments[3] != "svc" {
        return Err(bad());
    }
    let (pod, peer_ns) = (segments[0], segments[2]);

    // <cluster>-pd-<ord>
    let tokens: Vec<&str> = pod.split('-').collect();
    if tokens.len() != 3 || tokens[1] != PD_SEGMENT {
        return Err(bad());
    }
    if tokens[2].is_empty() || !tokens[2].bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }

    if peer_ns != discovery_ns {
        return Err(DiscoverError::NamespaceMismatch {
            peer_ns: peer_ns.to_string(),
            discovery_ns: discovery_ns.to_string(),
        });
    }

    Ok((
        pod.to_string(),
        format!("{}/{}", peer_ns, tokens[0]),
        uri,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address_host_port() {
        let parsed = parse_address("host:80").unwrap();
        assert_eq!(parsed.host(), Some("host"));
        assert_eq!(parsed.port_u16(), Some(80));
    }

    #[test]
    fn test_parse_address_ip_port() {
        let parsed = parse_address("1.2.3.4:80").unwrap();
        assert_eq!(parsed.host(), Some("1.2.3.4"));
        assert_eq!(parsed.port_u16(), Some(80));
    }

    #[test]
    fn test_parse_address_full_url() {
        let parsed = parse_address("https://demo-pd-0.demo-pd-peer.default.svc:2380").unwrap();
        assert_eq!(parsed.scheme_str(), Some("https"));
        assert_eq!(parsed.host(), Some("demo-pd-0.demo-pd-peer.default.svc"));
        assert_eq!(parsed.port_u16(), Some(2380));
    }

    #[test]
    fn test_parse_address_missing_port() {
        let err = parse_address("http://host").unwrap_err();
        assert!(err
            .to_string()
            .contains("advertisePeerURL format is wrong:"));
    }

    #[test]
    fn test_parse_address_empty() {
        let err = parse_address("").unwrap_err();
        assert!(err
            .to_string()
            .contains("advertisePeerURL format is wrong:"));
    }

    #[test]
    fn test_parse_k8s_address_ok() {
        let (peer, cluster_id, uri) =
            parse_k8s_address_in("demo-pd-0.demo-pd-peer.default.svc:2380", "default").unwrap();
        assert_eq!(peer, "demo-pd-0");
        assert_eq!(cluster_id, "default/demo");
        assert_eq!(uri.port_u16(), Some(2380));
    }

    #[test]
    fn test_parse_k8s_address_cluster_domain_suffix() {
        let (peer, cluster_id, _) = parse_k8s_address_in(
            "demo-pd-2.demo-pd-peer.default.svc.cluster.local:2380",
            "default",
        )
        .unwrap();
        assert_eq!(peer, "demo-pd-2");
        assert_eq!(cluster_id, "default/demo");
    }

    #[test]
    fn test_parse_k8s_address_missing_svc_segment() {
        let err =
            parse_k8s_address_in("demo-pd-0.demo-pd-peer.default:2380", "default").unwrap_err();
        assert!(err
            .to_string()
            .contains("advertisePeerURL format is wrong:"));
    }

    #[test]
    fn test_parse_k8s_address_pod_name_shapes() {
        // Four dash-separated tokens, ordinal missing, non-numeric ordinal.
        for url in [
            "demo-1-pd-0.demo-pd-peer.default.svc:2380",
            "demo-pd.demo-pd-peer.default.svc:2380",
            "demo-pd-x.demo-pd-peer.default.svc:2380",
        ] {
            let err = parse_k8s_address_in(url, "default").unwrap_err();
            assert!(
                err.to_string()
                    .contains("advertisePeerURL format is wrong:"),
                "expected BadUrl for {url}"
            );
        }
    }

    #[test]
    fn test_parse_k8s_address_namespace_mismatch() {
        let err =
            parse_k8s_address_in("demo-pd-0.demo-pd-peer.default.svc:2380", "default1").unwrap_err();
        assert!(err
            .to_string()
            .contains("is not equal to discovery namespace:"));
    }

    #[test]
    fn test_parse_k8s_address_reads_namespace_env() {
        std::env::set_var(NAMESPACE_ENV, "default");
        let (peer, cluster_id, _) =
            parse_k8s_address("demo-pd-1.demo-pd-peer.default.svc:2380").unwrap();
        assert_eq!(peer, "demo-pd-1");
        assert_eq!(cluster_id, "default/demo");
    }
}
