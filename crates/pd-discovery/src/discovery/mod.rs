//! Bootstrap discovery engine.
//!
//! Decides, for each PD replica that calls in, whether it founds the
//! cluster (`--initial-cluster=...`) or joins the already formed one
//! (`--join=...`). Founders accumulate in an in-memory store keyed by
//! cluster id; the store resets whenever the cluster record's
//! resource version moves. All state is lost on restart by design:
//! decisions defer to the live members snapshot, so a restarted
//! instance converges again.

mod address;
mod error;

pub use address::{parse_address, parse_k8s_address, parse_k8s_address_in, NAMESPACE_ENV};
pub use error::DiscoverError;

use std::collections::HashMap;

use anyhow::anyhow;
use http::Uri;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::refresh::{ClusterRefresher, Member};

/// Founders registered for one cluster generation.
#[derive(Debug, Default)]
struct ClusterInfo {
    resource_version: String,
    peers: HashMap<String, Uri>,
}

/// The discovery engine. One per process, shared across requests.
pub struct Discovery<R> {
    refresh: R,
    clusters: Mutex<HashMap<String, ClusterInfo>>,
}

impl<R: ClusterRefresher> Discovery<R> {
    pub fn new(refresh: R) -> Self {
        Self {
            refresh,
            clusters: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the bootstrap argument for `peer_name` of `cluster_id`.
    ///
    /// The store lock is held across both external lookups, so
    /// requests are fully serialized. Discovery sees a few requests
    /// per replica per minute during bootstrap; the coarse lock keeps
    /// every peer-set transition atomic without further ceremony.
    pub async fn discover(
        &self,
        peer_name: &str,
        cluster_id: &str,
        advertised: &Uri,
    ) -> Result<String, DiscoverError> {
        let authority = advertised
            .authority()
            .ok_or_else(|| DiscoverError::BadUrl(advertised.to_string()))?;
        let peer_port = advertised
            .port_u16()
            .ok_or_else(|| DiscoverError::BadUrl(advertised.to_string()))?;

        let mut clusters = self.clusters.lock().await;

        let cluster =
            self.refresh
                .get_cluster(cluster_id)
                .await
                .map_err(|source| DiscoverError::ClusterLookup {
                    cluster_id: cluster_id.to_string(),
                    source,
                })?;

        let info = clusters.entry(cluster_id.to_string()).or_default();
        if info.resource_version != cluster.resource_version {
            if !info.peers.is_empty() {
                info!(
                    cluster = %cluster_id,
                    resource_version = %cluster.resource_version,
                    dropped = info.peers.len(),
                    "cluster generation changed, discarding registered founders"
                );
            }
            info.resource_version = cluster.resource_version.clone();
            info.peers.clear();
        }

        let probe = self.refresh.get_members(cluster_id).await;
        match probe {
            // The tier is live: the caller joins it. Whatever it may
            // have registered as a founder before is obsolete.
            Ok(members) if !members.members.is_empty() => {
                let client_port = peer_port.saturating_sub(1);
                let mut urls = Vec::with_capacity(members.members.len());
                for member in &members.members {
                    let url = client_url(member, client_port).map_err(|source| {
                        DiscoverError::MembersLookup {
                            cluster_id: cluster_id.to_string(),
                            source,
                        }
                    })?;
                    urls.push(url);
                }
                info.peers.remove(peer_name);
                info!(
                    cluster = %cluster_id,
                    peer = %peer_name,
                    members = members.members.len(),
                    "cluster already formed, replica joins"
                );
                Ok(format!("--join={}", urls.join(",")))
            }

            // No members observed, whether because the tier is not
            // formed yet (probe error: nothing is listening) or the
            // snapshot came back empty. Either way the caller counts
            // as a founder; once the whole set has registered, each
            // caller is told to bootstrap with itself.
            probe => {
                info.peers
                    .insert(peer_name.to_string(), advertised.clone());
                debug!(
                    cluster = %cluster_id,
                    peer = %peer_name,
                    registered = info.peers.len(),
                    replicas = cluster.replicas,
                    "caller registered as founding peer"
                );

                if (info.peers.len() as i32) >= cluster.replicas {
                    let scheme = advertised
                        .scheme_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| cluster.scheme.to_string());
                    info!(
                        cluster = %cluster_id,
                        peer = %peer_name,
                        "founding set complete, replica bootstraps"
                    );
                    return Ok(format!(
                        "--initial-cluster={peer_name}={scheme}://{authority}"
                    ));
                }

                match probe {
                    Err(source) => Err(DiscoverError::MembersLookup {
                        cluster_id: cluster_id.to_string(),
                        source,
                    }),
                    Ok(_) => Err(DiscoverError::WaitingForPeers {
                        cluster_id: cluster_id.to_string(),
                        registered: info.peers.len(),
                        replicas: cluster.replicas,
                    }),
                }
            }
        }
    }
}

/// Rewrites a member's first peer URL into the client URL served next
/// to it: same host, same scheme (kept verbatim, also when absent),
/// client port one below the peer port.
fn client_url(member: &Member, client_port: u16) -> anyhow::Result<String> {
    let raw = member
        .peer_urls
        .first()
        .ok_or_else(|| anyhow!("member {:?} has no peer URL", member.name))?;
    let uri = parse_address(raw).map_err(|err| anyhow!("member peer URL {raw:?}: {err}"))?;
    let host = uri
        .host()
        .ok_or_else(|| anyhow!("member peer URL {raw:?} has no host"))?;
    Ok(match uri.scheme_str() {
        Some(scheme) => format!("{scheme}://{host}:{client_port}"),
        None => format!("{host}:{client_port}"),
    })
}
