//! Custom Resource Definitions
//!
//! The `PdCluster` resource describing the desired PD tier of one
//! database cluster.

pub mod pd_cluster;

pub use pd_cluster::{PdCluster, PdClusterSpec, PeerScheme};
