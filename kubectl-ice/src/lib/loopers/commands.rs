use k8s_openapi::api::core::v1::{Container, EphemeralContainer};

use super::join_words;
use crate::Result;
use crate::lib::builder::{BuilderInformation, Looper, Row};
use crate::lib::cell::Cell;

/// Entrypoint command and arguments of each container
pub struct Commands;

fn command_row(command: Option<&Vec<String>>, args: Option<&Vec<String>>) -> Row {
    vec![
        Cell::text(join_words(command)),
        Cell::text(join_words(args)),
    ]
}

impl Looper for Commands {
    fn headers(&self) -> Vec<&'static str> {
        vec!["COMMAND", "ARGUMENTS"]
    }

    fn build_container_spec(
        &self,
        container: &Container,
        _info: &BuilderInformation,
    ) -> Result<Vec<Row>> {
        Ok(vec![command_row(
            container.command.as_ref(),
            container.args.as_ref(),
        )])
    }

    fn build_ephemeral_container_spec(
        &self,
        container: &EphemeralContainer,
        _info: &BuilderInformation,
    ) -> Result<Vec<Row>> {
        Ok(vec![command_row(
            container.command.as_ref(),
            container.args.as_ref(),
        )])
    }
}
