use k8s_openapi::api::core::v1::Pod;

use crate::Result;
use crate::lib::builder::{BuilderInformation, Looper, Row};
use crate::lib::cell::Cell;

/// Pod level report: one row per pod with its addresses
pub struct PodIp;

impl Looper for PodIp {
    fn headers(&self) -> Vec<&'static str> {
        vec!["IP"]
    }

    fn build_pod(&self, pod: &Pod, _info: &BuilderInformation) -> Result<Vec<Row>> {
        let status = pod.status.as_ref();
        let addresses: Vec<&str> = match status.and_then(|s| s.pod_ips.as_ref()) {
            Some(ips) => ips.iter().map(|ip| ip.ip.as_str()).collect(),
            None => status.and_then(|s| s.pod_ip.as_deref()).into_iter().collect(),
        };
        Ok(vec![vec![Cell::text(addresses.join(","))]])
    }
}
