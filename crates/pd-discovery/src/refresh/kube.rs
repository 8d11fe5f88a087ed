//! Kubernetes-backed refresher.
//!
//! `get_cluster` reads the `PdCluster` record through the Kubernetes
//! API; `get_members` asks the PD members endpoint behind the
//! cluster's client service.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use kube::{api::Api, Client};

use crate::crds::PdCluster;

use super::{Cluster, ClusterRefresher, Members};

/// Port PD serves its client HTTP API on.
const PD_CLIENT_PORT: u16 = 2379;

/// Path of the members endpoint on the PD client port.
const PD_MEMBERS_PATH: &str = "/pd/api/v1/members";

pub struct KubeRefresher {
    kube: Client,
    http: reqwest::Client,
}

impl KubeRefresher {
    /// `cluster_ca` is the PEM bundle to trust when the PD tier
    /// serves https; without it only http clusters are reachable.
    pub fn new(
        kube: Client,
        members_timeout: Duration,
        cluster_ca: Option<&[u8]>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(members_timeout);
        if let Some(pem) = cluster_ca {
            let cert =
                reqwest::Certificate::from_pem(pem).context("invalid cluster CA bundle")?;
            builder = builder.add_root_certificate(cert);
        }
        let http = builder
            .build()
            .context("failed to build members API client")?;
        Ok(Self { kube, http })
    }

    async fn fetch_record(&self, cluster_id: &str) -> Result<(String, String, PdCluster)> {
        let (ns, name) = split_cluster_id(cluster_id)?;
        let api: Api<PdCluster> = Api::namespaced(self.kube.clone(), &ns);
        let record = api
            .get(&name)
            .await
            .with_context(|| format!("failed to get PdCluster {cluster_id}"))?;
        Ok((ns, name, record))
    }
}

fn split_cluster_id(cluster_id: &str) -> Result<(String, String)> {
    match cluster_id.split_once('/') {
        Some((ns, name)) if !ns.is_empty() && !name.is_empty() => {
            Ok((ns.to_string(), name.to_string()))
        }
        _ => Err(anyhow!(
            "cluster id {cluster_id:?} is not of the form <namespace>/<name>"
        )),
    }
}

#[async_trait]
impl ClusterRefresher for KubeRefresher {
    async fn get_cluster(&self, cluster_id: &str) -> Result<Cluster> {
        let (_, _, record) = self.fetch_record(cluster_id).await?;
        Ok(Cluster {
            replicas: record.spec.replicas,
            scheme: record.spec.scheme,
            resource_version: record.metadata.resource_version.unwrap_or_default(),
        })
    }

    async fn get_members(&self, cluster_id: &str) -> Result<Members> {
        // The scheme lives on the cluster record, so resolve that first.
        let (ns, name, record) = self.fetch_record(cluster_id).await?;
        let url = format!(
            "{}://{}-pd.{}.svc:{}{}",
            record.spec.scheme, name, ns, PD_CLIENT_PORT, PD_MEMBERS_PATH
        );
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("members request to {url} failed"))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("members request to {url} returned {status}"));
        }
        let members: Members = resp
            .json()
            .await
            .with_context(|| format!("members response from {url} is not valid JSON"))?;
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_cluster_id() {
        assert_eq!(
            split_cluster_id("default/demo").unwrap(),
            ("default".to_string(), "demo".to_string())
        );
    }

    #[test]
    fn test_split_cluster_id_rejects_malformed() {
        for id in ["", "demo", "/demo", "default/"] {
            assert!(split_cluster_id(id).is_err(), "expected error for {id:?}");
        }
    }

    #[test]
    fn test_members_snapshot_deserializes_pd_json() {
        // Shape of a real members response; unknown fields are ignored.
        let json = r#"{
            "header": {"cluster_id": 6794881412980566645},
            "members": [
                {
                    "name": "demo-pd-0",
                    "member_id": 1047572043554241807,
                    "peer_urls": ["http://demo-pd-0.demo-pd-peer.default.svc:2380"],
                    "client_urls": ["http://demo-pd-0.demo-pd-peer.default.svc:2379"]
                },
                {
                    "name": "demo-pd-1",
                    "member_id": 2234243254789,
                    "peer_urls": ["http://demo-pd-1.demo-pd-peer.default.svc:2380"],
                    "client_urls": ["http://demo-pd-1.demo-pd-peer.default.svc:2379"]
                }
            ]
        }"#;
        let snapshot: Members = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.members.len(), 2);
        assert_eq!(
            snapshot.members[0].peer_urls[0],
            "http://demo-pd-0.demo-pd-peer.default.svc:2380"
        );
    }

    #[test]
    fn test_members_snapshot_tolerates_missing_fields() {
        let snapshot: Members = serde_json::from_str(r#"{"members": [{}]}"#).unwrap();
        assert_eq!(snapshot.members.len(), 1);
        assert!(snapshot.members[0].peer_urls.is_empty());
    }
}
