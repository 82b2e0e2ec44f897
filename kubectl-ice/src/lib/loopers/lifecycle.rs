use k8s_openapi::api::core::v1::{Container, EphemeralContainer, LifecycleHandler};

use super::{exec_action, http_action, tcp_action};
use crate::Result;
use crate::lib::builder::{BuilderInformation, Looper, Row};
use crate::lib::cell::Cell;

/// postStart and preStop hooks, one row per configured hook
pub struct Lifecycle;

fn handler_row(hook: &str, handler: &LifecycleHandler) -> Row {
    let (kind, action) = if let Some(exec) = &handler.exec {
        ("exec", exec_action(exec))
    } else if let Some(http) = &handler.http_get {
        ("httpGet", http_action(http))
    } else if let Some(tcp) = &handler.tcp_socket {
        ("tcpSocket", tcp_action(tcp))
    } else if let Some(sleep) = &handler.sleep {
        ("sleep", Cell::int(format!("{}s", sleep.seconds), sleep.seconds))
    } else {
        ("", Cell::empty())
    };
    vec![Cell::text(hook), Cell::text(kind), action]
}

fn lifecycle_rows(lifecycle: Option<&k8s_openapi::api::core::v1::Lifecycle>) -> Vec<Row> {
    let Some(lifecycle) = lifecycle else {
        return Vec::new();
    };
    let mut rows = Vec::new();
    if let Some(handler) = &lifecycle.post_start {
        rows.push(handler_row("PostStart", handler));
    }
    if let Some(handler) = &lifecycle.pre_stop {
        rows.push(handler_row("PreStop", handler));
    }
    rows
}

impl Looper for Lifecycle {
    fn headers(&self) -> Vec<&'static str> {
        vec!["LIFECYCLE", "HANDLER", "ACTION"]
    }

    fn build_container_spec(
        &self,
        container: &Container,
        _info: &BuilderInformation,
    ) -> Result<Vec<Row>> {
        Ok(lifecycle_rows(container.lifecycle.as_ref()))
    }

    fn build_ephemeral_container_spec(
        &self,
        container: &EphemeralContainer,
        _info: &BuilderInformation,
    ) -> Result<Vec<Row>> {
        Ok(lifecycle_rows(container.lifecycle.as_ref()))
    }
}
