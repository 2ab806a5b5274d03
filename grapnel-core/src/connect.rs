//! # Channel Factory
//!
//! Users type hosts the way they remember them: `grpcb.in`, `https://api.example.com`,
//! `localhost:9090`. None of those say whether the endpoint speaks TLS or which port the
//! gRPC server actually listens on. This module turns such a free-form host into a
//! *verified* [`Channel`] by deriving an ordered list of connection strategies and
//! probing them until one answers a reflection `ListServices` call.
//!
//! Public gRPC endpoints almost universally live at `:443` behind TLS; self-hosted
//! services typically sit on `:9090`, `:50051` or `:8080` in plaintext. The strategy
//! order biases towards whichever family the host string hints at.

use crate::reflection::client::ReflectionClient;
use crate::{BoxError, DIAL_TIMEOUT};
use std::fmt;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tracing::{debug, warn};

/// Hostnames that are known to serve gRPC over TLS on 443, tried TLS-first.
const KNOWN_SECURE_HOSTS: [&str; 4] = ["grpcb.in", "buf.build", "connect.build", "grpc.dev"];

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("Failed to connect to '{host}': last attempt {strategy} failed: {source}")]
    Exhausted {
        host: String,
        strategy: Strategy,
        source: BoxError,
    },
}

/// One entry of the ordered connection-attempt list derived from a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    /// `host:port` to dial.
    pub target: String,
    /// Whether to wrap the connection in TLS (native roots) or stay in plaintext.
    pub tls: bool,
}

impl Strategy {
    fn tls(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            tls: true,
        }
    }

    fn insecure(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            tls: false,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let security = if self.tls { "TLS" } else { "insecure" };
        write!(f, "{} ({})", self.target, security)
    }
}

/// Strips any scheme prefix (`http://`, `https://`, `grpc://`, `grpcs://`) from a
/// user-supplied host. Idempotent.
pub fn normalize_host(host: &str) -> &str {
    let mut host = host;
    'strip: loop {
        for scheme in ["http://", "https://", "grpc://", "grpcs://"] {
            if let Some(rest) = host.strip_prefix(scheme) {
                host = rest;
                continue 'strip;
            }
        }
        return host;
    }
}

/// Splits `host:port` into its parts, if the host carries an explicit valid port.
fn split_port(host: &str) -> Option<(&str, u16)> {
    let (name, port) = host.rsplit_once(':')?;
    let port: u16 = port.parse().ok()?;
    if port == 0 { None } else { Some((name, port)) }
}

/// Derives the ordered list of connection strategies for a (normalized) host.
///
/// Never empty: every host yields at least a TLS and an insecure attempt.
pub fn strategies(host: &str) -> Vec<Strategy> {
    let host = normalize_host(host);
    let mut list = Vec::new();

    match split_port(host) {
        Some((_, 443)) => {
            list.push(Strategy::tls(host));
            list.push(Strategy::insecure(host));
        }
        Some((name, _)) => {
            list.push(Strategy::insecure(host));
            list.push(Strategy::tls(host));
            list.push(Strategy::tls(format!("{name}:443")));
            list.push(Strategy::insecure(format!("{name}:443")));
        }
        None => {
            if KNOWN_SECURE_HOSTS.iter().any(|known| host.contains(known)) {
                list.push(Strategy::tls(format!("{host}:443")));
            }
            let https = Strategy::tls(format!("{host}:443"));
            if list.last() != Some(&https) {
                list.push(https);
            }
            list.push(Strategy::insecure(format!("{host}:9090")));
            list.push(Strategy::insecure(format!("{host}:443")));
            list.push(Strategy::insecure(format!("{host}:50051")));
            list.push(Strategy::insecure(format!("{host}:8080")));
            list.push(Strategy::insecure(format!("{host}:80")));
        }
    }

    list
}

/// Opens a channel to `host`, trying each strategy in order.
///
/// A strategy succeeds only once the dialed endpoint has answered a reflection
/// `ListServices` probe, so the returned channel is known to be useful for schema
/// discovery and dynamic calls. On exhaustion the error names the last strategy and
/// carries its underlying cause.
pub async fn connect(host: &str) -> Result<Channel, ConnectError> {
    let host = normalize_host(host);
    let mut last: Option<(Strategy, BoxError)> = None;

    for strategy in strategies(host) {
        debug!(%strategy, "attempting connection");
        match try_strategy(&strategy).await {
            Ok(channel) => {
                debug!(%strategy, "connection verified");
                return Ok(channel);
            }
            Err(source) => {
                warn!(%strategy, error = %source, "connection attempt failed");
                last = Some((strategy, source));
            }
        }
    }

    // `strategies` always yields at least two entries, so the loop recorded a failure.
    let (strategy, source) = last.expect("strategy list is never empty");
    Err(ConnectError::Exhausted {
        host: host.to_string(),
        strategy,
        source,
    })
}

/// Dials one strategy and runs the reflection verification probe on the result.
async fn try_strategy(strategy: &Strategy) -> Result<Channel, BoxError> {
    let scheme = if strategy.tls { "https" } else { "http" };
    let mut endpoint = Endpoint::new(format!("{scheme}://{}", strategy.target))?
        .connect_timeout(DIAL_TIMEOUT);

    if strategy.tls {
        endpoint = endpoint.tls_config(ClientTlsConfig::new().with_native_roots())?;
    }

    let channel = endpoint.connect().await?;

    let mut probe = ReflectionClient::new(channel.clone());
    let services = probe.list_services().await?;
    debug!(services = services.len(), "reflection probe succeeded");

    Ok(channel)
}
