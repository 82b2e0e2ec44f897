use k8s_openapi::api::core::v1::{Container, EnvVar, EnvVarSource, EphemeralContainer};

use crate::Result;
use crate::lib::builder::{BuilderInformation, Looper, Row};
use crate::lib::cell::Cell;

/// Environment variables set on each container, one row per variable
pub struct Environment;

fn describe_source(source: &EnvVarSource) -> String {
    if let Some(selector) = &source.config_map_key_ref {
        format!("configMapKeyRef({})", selector.key)
    } else if let Some(selector) = &source.secret_key_ref {
        format!("secretKeyRef({})", selector.key)
    } else if let Some(selector) = &source.field_ref {
        format!("fieldRef({})", selector.field_path)
    } else if let Some(selector) = &source.resource_field_ref {
        format!("resourceFieldRef({})", selector.resource)
    } else {
        String::new()
    }
}

fn environment_rows(env: Option<&Vec<EnvVar>>) -> Vec<Row> {
    env.into_iter()
        .flatten()
        .map(|var| {
            let value = match (&var.value, &var.value_from) {
                (Some(value), _) => value.clone(),
                (None, Some(source)) => describe_source(source),
                (None, None) => String::new(),
            };
            vec![Cell::text(var.name.as_str()), Cell::text(value)]
        })
        .collect()
}

impl Looper for Environment {
    fn headers(&self) -> Vec<&'static str> {
        vec!["NAME", "VALUE"]
    }

    fn build_container_spec(
        &self,
        container: &Container,
        _info: &BuilderInformation,
    ) -> Result<Vec<Row>> {
        Ok(environment_rows(container.env.as_ref()))
    }

    fn build_ephemeral_container_spec(
        &self,
        container: &EphemeralContainer,
        _info: &BuilderInformation,
    ) -> Result<Vec<Row>> {
        Ok(environment_rows(container.env.as_ref()))
    }
}
