use k8s_openapi::api::core::v1::ContainerStatus;

use super::column_sum;
use crate::Result;
use crate::lib::builder::{BuilderInformation, Looper, Row};
use crate::lib::cell::Cell;

pub const COLUMN_RESTARTS: &str = "RESTARTS";

/// Restart count of every container; the tree branch carries the pod total
pub struct Restarts;

fn restart_row(status: &ContainerStatus) -> Row {
    vec![Cell::count(i64::from(status.restart_count))]
}

impl Looper for Restarts {
    fn headers(&self) -> Vec<&'static str> {
        vec![COLUMN_RESTARTS]
    }

    fn build_container_status(
        &self,
        status: &ContainerStatus,
        _info: &BuilderInformation,
    ) -> Result<Vec<Row>> {
        Ok(vec![restart_row(status)])
    }

    fn build_ephemeral_container_status(
        &self,
        status: &ContainerStatus,
        _info: &BuilderInformation,
    ) -> Result<Vec<Row>> {
        Ok(vec![restart_row(status)])
    }

    fn build_branch(&self, _info: &BuilderInformation, rows: &[Row]) -> Result<Option<Row>> {
        let total = column_sum(rows, 0).unwrap_or_default();
        Ok(Some(vec![Cell::count(total)]))
    }
}
