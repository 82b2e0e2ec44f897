use k8s_openapi::api::core::v1::{Container, ContainerPort, EphemeralContainer};

use crate::Result;
use crate::lib::builder::{BuilderInformation, Looper, Row};
use crate::lib::cell::Cell;

pub struct Ports;

fn port_rows(ports: Option<&Vec<ContainerPort>>) -> Vec<Row> {
    ports
        .into_iter()
        .flatten()
        .map(|port| {
            let host_port = match port.host_port {
                Some(host_port) => Cell::count(i64::from(host_port)),
                None => Cell::empty(),
            };
            vec![
                Cell::text(port.name.clone().unwrap_or_default()),
                Cell::count(i64::from(port.container_port)),
                Cell::text(port.protocol.clone().unwrap_or_else(|| "TCP".to_string())),
                host_port,
            ]
        })
        .collect()
}

impl Looper for Ports {
    fn headers(&self) -> Vec<&'static str> {
        vec!["PORTNAME", "PORT", "PROTO", "HOSTPORT"]
    }

    fn build_container_spec(
        &self,
        container: &Container,
        _info: &BuilderInformation,
    ) -> Result<Vec<Row>> {
        Ok(port_rows(container.ports.as_ref()))
    }

    fn build_ephemeral_container_spec(
        &self,
        container: &EphemeralContainer,
        _info: &BuilderInformation,
    ) -> Result<Vec<Row>> {
        Ok(port_rows(container.ports.as_ref()))
    }
}
