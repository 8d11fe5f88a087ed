//! The discovery endpoint.
//!
//! `GET /new/{advertise-peer-url}` with the path segment base64
//! encoded; the advertise URL carries dots, colons and possibly a
//! scheme, so the startup script ships it encoded.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::{info, warn};

use crate::discovery::{parse_k8s_address, DiscoverError};
use crate::refresh::ClusterRefresher;

use super::state::AppState;

/// Answers a replica's bootstrap request. 200 carries the argument
/// string verbatim; any failure becomes a non-2xx with the error
/// message as body, and the replica's startup script retries.
pub async fn new_peer<R: ClusterRefresher>(
    State(state): State<AppState<R>>,
    Path(encoded): Path<String>,
) -> Result<String, (StatusCode, String)> {
    let advertise = BASE64
        .decode(encoded.as_bytes())
        .ok()
        .and_then(|raw| String::from_utf8(raw).ok())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                "advertise peer URL is not valid base64".to_string(),
            )
        })?;
    // Shell pipelines tend to leave a trailing newline in the encoding.
    let advertise = advertise.trim();

    let (peer_name, cluster_id, advertised) = parse_k8s_address(advertise).map_err(|err| {
        warn!(advertise = %advertise, error = %err, "rejecting malformed discovery request");
        (StatusCode::BAD_REQUEST, err.to_string())
    })?;

    match state
        .discovery
        .discover(&peer_name, &cluster_id, &advertised)
        .await
    {
        Ok(arg) => {
            info!(cluster = %cluster_id, peer = %peer_name, arg = %arg, "bootstrap argument issued");
            Ok(arg)
        }
        Err(
            err @ (DiscoverError::MembersLookup { .. } | DiscoverError::WaitingForPeers { .. }),
        ) => {
            // Routine while the founding set accumulates.
            info!(cluster = %cluster_id, peer = %peer_name, error = %err, "replica told to retry");
            Err((StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))
        }
        Err(err) => {
            warn!(cluster = %cluster_id, peer = %peer_name, error = %err, "discovery failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))
        }
    }
}
