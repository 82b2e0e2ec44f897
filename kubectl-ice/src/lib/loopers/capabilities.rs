use k8s_openapi::api::core::v1::{Container, EphemeralContainer, SecurityContext};

use crate::Result;
use crate::lib::builder::{BuilderInformation, Looper, Row};
use crate::lib::cell::Cell;

/// Linux capabilities added and dropped by each container's security context
pub struct Capabilities;

fn capability_row(context: Option<&SecurityContext>) -> Row {
    let capabilities = context.and_then(|c| c.capabilities.as_ref());
    let add = capabilities.and_then(|c| c.add.as_ref());
    let drop = capabilities.and_then(|c| c.drop.as_ref());
    vec![
        Cell::text(add.map(|a| a.join(",")).unwrap_or_default()),
        Cell::text(drop.map(|d| d.join(",")).unwrap_or_default()),
    ]
}

impl Looper for Capabilities {
    fn headers(&self) -> Vec<&'static str> {
        vec!["ADD", "DROP"]
    }

    fn build_container_spec(
        &self,
        container: &Container,
        _info: &BuilderInformation,
    ) -> Result<Vec<Row>> {
        Ok(vec![capability_row(container.security_context.as_ref())])
    }

    fn build_ephemeral_container_spec(
        &self,
        container: &EphemeralContainer,
        _info: &BuilderInformation,
    ) -> Result<Vec<Row>> {
        Ok(vec![capability_row(container.security_context.as_ref())])
    }
}
