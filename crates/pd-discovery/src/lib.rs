//! PD bootstrap discovery
//!
//! Operator-side oracle that hands every PD replica of a managed
//! database cluster its startup argument: `--initial-cluster=...`
//! while the cluster is still founding, `--join=...` once it has
//! formed. Replicas call in over HTTP, retrying until they get an
//! answer; the service converges from partial, concurrent and
//! retried observations without persisting anything.

pub mod crds;
pub mod discovery;
pub mod refresh;
pub mod server;

pub use crds::PdCluster;
pub use discovery::Discovery;
