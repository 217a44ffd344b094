//! System service probe.

use super::ProbeOutcome;
use crate::exec::run_check;

/// Probe whether a service unit is active.
///
/// Uses `systemctl is-active`, which exits non-zero for inactive, failed,
/// and unknown units alike; on hosts without systemd the command itself
/// fails, which also reads as "not active".
pub fn check_active(service: &str) -> ProbeOutcome {
    let command = format!("systemctl is-active --quiet {}", shell_quote(service));
    if run_check(&command, None) {
        ProbeOutcome::satisfied(format!("Service active: {}", service))
    } else {
        ProbeOutcome::unsatisfied(
            format!("Service not active: {}", service),
            "systemctl is-active exited non-zero".to_string(),
        )
    }
}

/// Minimal single-quoting for unit names interpolated into a shell command.
pub(crate) fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
