use k8s_openapi::api::core::v1::{Container, EphemeralContainer, Probe};

use super::{exec_action, http_action, tcp_action};
use crate::Result;
use crate::lib::builder::{BuilderInformation, Looper, Row};
use crate::lib::cell::Cell;

// Kubernetes defaults for unset probe timings
const DEFAULT_DELAY: i32 = 0;
const DEFAULT_PERIOD: i32 = 10;
const DEFAULT_TIMEOUT: i32 = 1;
const DEFAULT_SUCCESS: i32 = 1;
const DEFAULT_FAILURE: i32 = 3;

/// Liveness, readiness and startup probes, one row per configured probe
pub struct Probes;

fn seconds(value: Option<i32>, default: i32) -> Cell {
    Cell::count(i64::from(value.unwrap_or(default)))
}

fn probe_row(name: &str, probe: &Probe) -> Row {
    let (check, action) = if let Some(exec) = &probe.exec {
        ("exec", exec_action(exec))
    } else if let Some(http) = &probe.http_get {
        ("httpGet", http_action(http))
    } else if let Some(tcp) = &probe.tcp_socket {
        ("tcpSocket", tcp_action(tcp))
    } else if let Some(grpc) = &probe.grpc {
        let service = grpc.service.as_deref().unwrap_or("");
        ("grpc", Cell::text(format!("grpc://:{}{service}", grpc.port)))
    } else {
        ("", Cell::empty())
    };

    vec![
        Cell::text(name),
        seconds(probe.initial_delay_seconds, DEFAULT_DELAY),
        seconds(probe.period_seconds, DEFAULT_PERIOD),
        seconds(probe.timeout_seconds, DEFAULT_TIMEOUT),
        seconds(probe.success_threshold, DEFAULT_SUCCESS),
        seconds(probe.failure_threshold, DEFAULT_FAILURE),
        Cell::text(check),
        action,
    ]
}

fn probe_rows(liveness: Option<&Probe>, readiness: Option<&Probe>, startup: Option<&Probe>) -> Vec<Row> {
    [("liveness", liveness), ("readiness", readiness), ("startup", startup)]
        .into_iter()
        .filter_map(|(name, probe)| probe.map(|p| probe_row(name, p)))
        .collect()
}

impl Looper for Probes {
    fn headers(&self) -> Vec<&'static str> {
        vec![
            "PROBE", "DELAY", "PERIOD", "TIMEOUT", "SUCCESS", "FAILURE", "CHECK", "ACTION",
        ]
    }

    fn build_container_spec(
        &self,
        container: &Container,
        _info: &BuilderInformation,
    ) -> Result<Vec<Row>> {
        Ok(probe_rows(
            container.liveness_probe.as_ref(),
            container.readiness_probe.as_ref(),
            container.startup_probe.as_ref(),
        ))
    }

    fn build_ephemeral_container_spec(
        &self,
        container: &EphemeralContainer,
        _info: &BuilderInformation,
    ) -> Result<Vec<Row>> {
        Ok(probe_rows(
            container.liveness_probe.as_ref(),
            container.readiness_probe.as_ref(),
            container.startup_probe.as_ref(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unset_timings_use_kubernetes_defaults() {
        let container: Container = serde_json::from_value(json!({
            "name": "app",
            "livenessProbe": { "tcpSocket": { "port": 5432 } },
            "startupProbe": {
                "grpc": { "port": 9090 },
                "initialDelaySeconds": 5,
                "failureThreshold": 30
            }
        }))
        .unwrap();
        let rows = Probes
            .build_container_spec(&container, &BuilderInformation::default())
            .unwrap();

        assert_eq!(rows.len(), 2);
        let liveness: Vec<&str> = rows[0].iter().map(Cell::as_str).collect();
        assert_eq!(
            liveness,
            ["liveness", "0", "10", "1", "1", "3", "tcpSocket", "tcp://:5432"]
        );
        assert_eq!(rows[1][0].as_str(), "startup");
        assert_eq!(rows[1][1].number(), 5);
        assert_eq!(rows[1][5].number(), 30);
        assert_eq!(rows[1][7].as_str(), "grpc://:9090");
    }
}
