//! PdCluster CRD
//!
//! Defines the PdCluster custom resource for the PD (placement /
//! metadata) tier of a managed database cluster.
//!
//! The discovery service reads `spec.replicas` to know how many
//! founding members to wait for and `spec.scheme` to address the PD
//! members API. `metadata.resourceVersion` doubles as the bootstrap
//! generation token: whenever the record changes, founder
//! registrations accumulated for the previous generation are
//! discarded.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// PdCluster describes one PD tier.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "dbops.io",
    version = "v1alpha1",
    kind = "PdCluster",
    namespaced,
    printcolumn = r#"{"name":"Replicas", "type":"integer", "jsonPath":".spec.replicas"}"#,
    printcolumn = r#"{"name":"Scheme", "type":"string", "jsonPath":".spec.scheme"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PdClusterSpec {
    /// Number of PD replicas that found the cluster together.
    pub replicas: i32,

    /// URL scheme the PD processes serve their peer and client ports on.
    #[serde(default)]
    pub scheme: PeerScheme,
}

/// Scheme of PD peer and client URLs.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PeerScheme {
    #[default]
    Http,
    Https,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_scheme_display() {
        assert_eq!(PeerScheme::Http.to_string(), "http");
        assert_eq!(PeerScheme::Https.to_string(), "https");
    }

    #[test]
    fn test_spec_deserialize_defaults_scheme() {
        let json = r#"{ "replicas": 3 }"#;
        let spec: PdClusterSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.replicas, 3);
        assert_eq!(spec.scheme, PeerScheme::Http);
    }

    #[test]
    fn test_spec_serialize_scheme_lowercase() {
        let spec = PdClusterSpec {
            replicas: 5,
            scheme: PeerScheme::Https,
        };
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains(r#""scheme":"https""#));
    }
}
