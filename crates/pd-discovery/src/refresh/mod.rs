//! Cluster directory and PD membership lookups.
//!
//! The discovery engine observes external state through the
//! [`ClusterRefresher`] seam: the cluster record comes from the
//! Kubernetes API, the membership snapshot from the PD members API.
//! Tests substitute both with canned responses.

mod kube;

pub use self::kube::KubeRefresher;

use async_trait::async_trait;
use serde::Deserialize;

use crate::crds::PeerScheme;

/// Desired shape of one PD tier, from its `PdCluster` record.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub replicas: i32,
    pub scheme: PeerScheme,
    /// Opaque generation token. Any change invalidates the founders
    /// registered so far.
    pub resource_version: String,
}

/// Snapshot returned by the PD members API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Members {
    #[serde(default)]
    pub members: Vec<Member>,
}

/// One PD member record. Discovery only consults the first peer URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub member_id: u64,
    #[serde(default)]
    pub peer_urls: Vec<String>,
    #[serde(default)]
    pub client_urls: Vec<String>,
}

/// External state consulted while deciding a bootstrap argument.
#[async_trait]
pub trait ClusterRefresher: Send + Sync {
    /// Fetch the cluster record for `"<namespace>/<name>"`.
    async fn get_cluster(&self, cluster_id: &str) -> anyhow::Result<Cluster>;

    /// Fetch the live membership of the consensus tier. An error
    /// means the tier is not formed yet or currently unreachable;
    /// the two are indistinguishable and handled identically.
    async fn get_members(&self, cluster_id: &str) -> anyhow::Result<Members>;
}
