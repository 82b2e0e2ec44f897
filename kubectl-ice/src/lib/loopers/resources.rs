use std::collections::{BTreeMap, HashMap};

use k8s_openapi::api::core::v1::{Container, EphemeralContainer, ResourceRequirements};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

use super::column_sum;
use crate::Result;
use crate::lib::builder::{BuilderInformation, Looper, Row};
use crate::lib::cell::{Cell, ColourRank, finite_or_zero};
use crate::lib::quantity::{cpu_millicores, format_cpu, format_memory, memory_bytes};

pub const COLUMN_USED: &str = "USED";

const USED: usize = 0;
const REQUEST: usize = 1;
const LIMIT: usize = 2;
const PERCENT_REQUEST: usize = 3;
const PERCENT_LIMIT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Cpu,
    Memory,
}

impl ResourceKind {
    fn key(&self) -> &'static str {
        match self {
            ResourceKind::Cpu => "cpu",
            ResourceKind::Memory => "memory",
        }
    }

    fn parse(&self, quantity: &Quantity) -> Option<i64> {
        match self {
            ResourceKind::Cpu => cpu_millicores(quantity),
            ResourceKind::Memory => memory_bytes(quantity),
        }
    }

    fn format(&self, value: i64) -> String {
        match self {
            ResourceKind::Cpu => format_cpu(value),
            ResourceKind::Memory => format_memory(value),
        }
    }
}

/// Live usage of one container as reported by the metrics API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContainerUsage {
    pub cpu_millicores: i64,
    pub memory_bytes: i64,
}

impl ContainerUsage {
    fn get(&self, kind: ResourceKind) -> i64 {
        match kind {
            ResourceKind::Cpu => self.cpu_millicores,
            ResourceKind::Memory => self.memory_bytes,
        }
    }
}

/// Container usage keyed by namespace, pod and container name
#[derive(Debug, Clone, Default)]
pub struct UsageIndex {
    entries: HashMap<(String, String, String), ContainerUsage>,
}

impl UsageIndex {
    pub fn insert(
        &mut self,
        namespace: impl Into<String>,
        pod: impl Into<String>,
        container: impl Into<String>,
        usage: ContainerUsage,
    ) {
        self.entries
            .insert((namespace.into(), pod.into(), container.into()), usage);
    }

    pub fn get(&self, namespace: &str, pod: &str, container: &str) -> Option<ContainerUsage> {
        self.entries
            .get(&(namespace.to_string(), pod.to_string(), container.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// CPU or memory usage against the requests and limits of each container
pub struct Resources {
    kind: ResourceKind,
    raw: bool,
    usage: UsageIndex,
}

impl Resources {
    pub fn new(kind: ResourceKind, raw: bool, usage: UsageIndex) -> Self {
        Self { kind, raw, usage }
    }

    fn value_cell(&self, value: Option<i64>) -> Cell {
        match value {
            Some(value) if self.raw => Cell::count(value),
            Some(value) => Cell::int(self.kind.format(value), value),
            None => Cell::empty(),
        }
    }

    fn lookup(&self, requirements: Option<&BTreeMap<String, Quantity>>) -> Option<i64> {
        requirements
            .and_then(|values| values.get(self.kind.key()))
            .and_then(|quantity| self.kind.parse(quantity))
    }

    fn row(&self, used: Option<i64>, request: Option<i64>, limit: Option<i64>) -> Row {
        vec![
            self.value_cell(used),
            self.value_cell(request),
            self.value_cell(limit),
            percentage(used, request),
            percentage(used, limit),
        ]
    }

    fn container_row(&self, resources: Option<&ResourceRequirements>, info: &BuilderInformation) -> Row {
        let used = self
            .usage
            .get(&info.namespace, &info.pod_name, &info.container_name)
            .map(|usage| usage.get(self.kind));
        let request = self.lookup(resources.and_then(|r| r.requests.as_ref()));
        let limit = self.lookup(resources.and_then(|r| r.limits.as_ref()));
        self.row(used, request, limit)
    }
}

/// Share of `of` taken by `used`, coloured by how close it is to the whole
fn percentage(used: Option<i64>, of: Option<i64>) -> Cell {
    let (Some(used), Some(of)) = (used, of) else {
        return Cell::empty();
    };
    let share = finite_or_zero(used as f64 / of as f64 * 100.0);
    Cell::coloured(ColourRank::for_percentage(share), format!("{share:.2}"), share)
}

impl Looper for Resources {
    fn headers(&self) -> Vec<&'static str> {
        vec![COLUMN_USED, "REQUEST", "LIMIT", "%REQ", "%LIMIT"]
    }

    fn build_container_spec(
        &self,
        container: &Container,
        info: &BuilderInformation,
    ) -> Result<Vec<Row>> {
        Ok(vec![self.container_row(container.resources.as_ref(), info)])
    }

    fn build_ephemeral_container_spec(
        &self,
        container: &EphemeralContainer,
        info: &BuilderInformation,
    ) -> Result<Vec<Row>> {
        Ok(vec![self.container_row(container.resources.as_ref(), info)])
    }

    fn build_branch(&self, _info: &BuilderInformation, rows: &[Row]) -> Result<Option<Row>> {
        Ok(Some(self.row(
            column_sum(rows, USED),
            column_sum(rows, REQUEST),
            column_sum(rows, LIMIT),
        )))
    }

    fn hide_columns(&self, _info: &BuilderInformation) -> Vec<usize> {
        if self.usage.is_empty() {
            vec![USED, PERCENT_REQUEST, PERCENT_LIMIT]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info(container: &str) -> BuilderInformation {
        BuilderInformation {
            namespace: "default".to_string(),
            pod_name: "web".to_string(),
            container_name: container.to_string(),
            ..Default::default()
        }
    }

    fn container() -> Container {
        serde_json::from_value(json!({
            "name": "app",
            "resources": {
                "requests": { "cpu": "200m", "memory": "128Mi" },
                "limits": { "cpu": "1", "memory": "950Mi" }
            }
        }))
        .unwrap()
    }

    fn usage() -> UsageIndex {
        let mut usage = UsageIndex::default();
        usage.insert(
            "default",
            "web",
            "app",
            ContainerUsage {
                cpu_millicores: 190,
                memory_bytes: 64 * 1024 * 1024,
            },
        );
        usage
    }

    #[test]
    fn cpu_row_with_usage() {
        let looper = Resources::new(ResourceKind::Cpu, false, usage());
        let rows = looper.build_container_spec(&container(), &info("app")).unwrap();
        let text: Vec<&str> = rows[0].iter().map(Cell::as_str).collect();

        assert_eq!(text, ["190m", "200m", "1", "95.00", "19.00"]);
        assert_eq!(rows[0][PERCENT_REQUEST].colour(), ColourRank::Bad);
        assert_eq!(rows[0][PERCENT_LIMIT].colour(), ColourRank::None);
        assert!(looper.hide_columns(&info("app")).is_empty());
    }

    #[test]
    fn memory_formatting_and_raw_values() {
        let looper = Resources::new(ResourceKind::Memory, false, UsageIndex::default());
        let rows = looper.build_container_spec(&container(), &info("app")).unwrap();
        assert_eq!(rows[0][REQUEST].as_str(), "128Mi");
        assert_eq!(rows[0][LIMIT].as_str(), "0.93Gi");
        assert_eq!(rows[0][USED].as_str(), "");
        assert_eq!(rows[0][PERCENT_REQUEST].as_str(), "");

        let raw = Resources::new(ResourceKind::Memory, true, UsageIndex::default());
        let rows = raw.build_container_spec(&container(), &info("app")).unwrap();
        assert_eq!(rows[0][REQUEST].as_str(), "134217728");
    }

    #[test]
    fn usage_columns_hidden_without_metrics() {
        let looper = Resources::new(ResourceKind::Cpu, false, UsageIndex::default());
        assert_eq!(
            looper.hide_columns(&info("")),
            vec![USED, PERCENT_REQUEST, PERCENT_LIMIT]
        );
    }

    #[test]
    fn zero_request_reports_zero_percent() {
        let cell = percentage(Some(50), Some(0));
        assert_eq!(cell.float_value(), 0.0);
        assert_eq!(cell.colour(), ColourRank::None);
    }

    #[test]
    fn branch_sums_and_recomputes_percentages() {
        let looper = Resources::new(ResourceKind::Cpu, false, UsageIndex::default());
        let rows = vec![
            looper.row(Some(100), Some(200), None),
            looper.row(Some(50), Some(100), Some(500)),
        ];
        let branch = looper.build_branch(&info(""), &rows).unwrap().unwrap();
        assert_eq!(branch[USED].number(), 150);
        assert_eq!(branch[REQUEST].number(), 300);
        assert_eq!(branch[LIMIT].number(), 500);
        assert_eq!(branch[PERCENT_REQUEST].as_str(), "50.00");
        assert_eq!(branch[PERCENT_LIMIT].as_str(), "30.00");
    }
}
