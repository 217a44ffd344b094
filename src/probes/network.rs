//! Network probes: TCP port binding and HTTP health checks.

use super::ProbeOutcome;
use crate::error::{HostprepError, Result};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Probe whether something is listening on a local TCP port.
pub fn check_port_bound(port: u16) -> ProbeOutcome {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
        Ok(_) => ProbeOutcome::satisfied(format!("Port bound: {}", port)),
        Err(e) => ProbeOutcome::unsatisfied(
            format!("Port not bound: {}", port),
            format!("Connect to 127.0.0.1:{} failed: {}", port, e),
        ),
    }
}

/// Probe whether an HTTP GET to `url` returns a 2xx status.
///
/// A connection failure is a clean "unsatisfied" verdict, not a probe
/// error: a service that has not come up yet is the normal case this
/// probe exists to poll for.
pub fn check_http_ok(url: &str) -> Result<ProbeOutcome> {
    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| HostprepError::ProbeError {
            probe: "http_ok".to_string(),
            message: e.to_string(),
        })?;

    match client.get(url).send() {
        Ok(response) => {
            let status = response.status();
            if status.is_success() {
                Ok(ProbeOutcome::satisfied(format!("HTTP {}: {}", status.as_u16(), url)))
            } else {
                Ok(ProbeOutcome::unsatisfied(
                    format!("HTTP {}: {}", status.as_u16(), url),
                    "Expected a 2xx status".to_string(),
                ))
            }
        }
        Err(e) => Ok(ProbeOutcome::unsatisfied(
            format!("HTTP unreachable: {}", url),
            e.to_string(),
        )),
    }
}
