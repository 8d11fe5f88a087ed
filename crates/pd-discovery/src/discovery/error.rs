//! Discovery error types.

use thiserror::Error;

/// Errors surfaced to a replica asking for its bootstrap argument.
///
/// None of these are fatal to the service. The replica's startup
/// script retries on any failure, and [`MembersLookup`] /
/// [`WaitingForPeers`] are the expected answers while the founding
/// set is still accumulating.
///
/// [`MembersLookup`]: DiscoverError::MembersLookup
/// [`WaitingForPeers`]: DiscoverError::WaitingForPeers
#[derive(Debug, Error)]
pub enum DiscoverError {
    /// The advertise peer URL is missing a host or port, or its
    /// hostname does not have the in-cluster DNS shape
    /// `<cluster>-pd-<ord>.<peer-svc>.<namespace>.svc`.
    #[error("advertisePeerURL format is wrong: {0}")]
    BadUrl(String),

    /// The URL names a namespace this instance does not serve.
    #[error("the peer's namespace: {peer_ns} is not equal to discovery namespace: {discovery_ns}")]
    NamespaceMismatch {
        peer_ns: String,
        discovery_ns: String,
    },

    /// Cluster record lookup failed. Nothing was recorded.
    #[error("failed to get cluster {cluster_id}: {source}")]
    ClusterLookup {
        cluster_id: String,
        #[source]
        source: anyhow::Error,
    },

    /// Members probe failed while the founding set was incomplete.
    /// The caller stays registered as a founder and retries.
    #[error("failed to get members of cluster {cluster_id}: {source}")]
    MembersLookup {
        cluster_id: String,
        #[source]
        source: anyhow::Error,
    },

    /// The consensus tier reported no members and not every founder
    /// has registered yet.
    #[error("waiting for peers of cluster {cluster_id} to register: {registered}/{replicas}")]
    WaitingForPeers {
        cluster_id: String,
        registered: usize,
        replicas: i32,
    },
}
