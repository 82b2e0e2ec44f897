use k8s_openapi::api::core::v1::{Container, EphemeralContainer};

use crate::Result;
use crate::lib::builder::{BuilderInformation, Looper, Row};
use crate::lib::cell::Cell;

pub struct Image;

fn image_row(pull_policy: Option<&String>, image: Option<&String>) -> Row {
    vec![
        Cell::text(pull_policy.cloned().unwrap_or_default()),
        Cell::text(image.cloned().unwrap_or_default()),
    ]
}

impl Looper for Image {
    fn headers(&self) -> Vec<&'static str> {
        vec!["PULL", "IMAGE"]
    }

    fn build_container_spec(
        &self,
        container: &Container,
        _info: &BuilderInformation,
    ) -> Result<Vec<Row>> {
        Ok(vec![image_row(
            container.image_pull_policy.as_ref(),
            container.image.as_ref(),
        )])
    }

    fn build_ephemeral_container_spec(
        &self,
        container: &EphemeralContainer,
        _info: &BuilderInformation,
    ) -> Result<Vec<Row>> {
        Ok(vec![image_row(
            container.image_pull_policy.as_ref(),
            container.image.as_ref(),
        )])
    }
}
