//! Walks pods and their containers, asks the active [`Looper`] for rows and
//! feeds them, prefixed with identity columns, into a [`Table`].

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Container, ContainerStatus, EphemeralContainer, Pod};
use log::{debug, info, warn};

use crate::Result;
use crate::lib::cell::Cell;
use crate::lib::table::Table;

/// One table row as produced by a looper
pub type Row = Vec<Cell>;

/// Identity columns stored in front of every report
pub const IDENTITY_HEADERS: [&str; 5] = ["T", "NAMESPACE", "NODE", "PODNAME", "CONTAINER"];

pub const COLUMN_TYPE: usize = 0;
pub const COLUMN_NAMESPACE: usize = 1;
pub const COLUMN_NODE: usize = 2;
pub const COLUMN_POD: usize = 3;
pub const COLUMN_CONTAINER: usize = 4;

/// Title of the container column in tree view
pub const TREE_NAME_HEADER: &str = "NAME";

const TREE_BRANCH: &str = "├─";
const TREE_LAST: &str = "└─";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainerType {
    #[default]
    Pod,
    Standard,
    Init,
    Ephemeral,
}

impl ContainerType {
    pub fn tag(&self) -> &'static str {
        match self {
            ContainerType::Pod => "P",
            ContainerType::Standard => "S",
            ContainerType::Init => "I",
            ContainerType::Ephemeral => "E",
        }
    }
}

/// Context handed to a looper for the entity being built
#[derive(Debug, Clone, Default)]
pub struct BuilderInformation {
    pub namespace: String,
    pub node_name: String,
    pub pod_name: String,
    pub phase: String,
    pub container_name: String,
    pub container_type: ContainerType,
    pub tree_view: bool,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
}

impl BuilderInformation {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    fn enter_pod(&mut self, pod: &Pod) {
        let metadata = &pod.metadata;
        self.namespace = metadata.namespace.clone().unwrap_or_default();
        self.pod_name = metadata.name.clone().unwrap_or_default();
        self.labels = metadata.labels.clone().unwrap_or_default();
        self.annotations = metadata.annotations.clone().unwrap_or_default();
        self.node_name = pod
            .spec
            .as_ref()
            .and_then(|s| s.node_name.clone())
            .unwrap_or_default();
        self.phase = pod
            .status
            .as_ref()
            .and_then(|s| s.phase.clone())
            .unwrap_or_default();
        self.enter_container("", ContainerType::Pod);
    }

    fn enter_container(&mut self, name: &str, container_type: ContainerType) {
        self.container_name.clear();
        self.container_name.push_str(name);
        self.container_type = container_type;
    }
}

/// One report's semantics: which columns it has and how an entity becomes rows.
///
/// Every builder defaults to producing nothing, so a report only implements
/// the entity kinds it reads.
pub trait Looper {
    fn headers(&self) -> Vec<&'static str>;

    fn build_pod(&self, _pod: &Pod, _info: &BuilderInformation) -> Result<Vec<Row>> {
        Ok(Vec::new())
    }

    fn build_container_spec(
        &self,
        _container: &Container,
        _info: &BuilderInformation,
    ) -> Result<Vec<Row>> {
        Ok(Vec::new())
    }

    fn build_ephemeral_container_spec(
        &self,
        _container: &EphemeralContainer,
        _info: &BuilderInformation,
    ) -> Result<Vec<Row>> {
        Ok(Vec::new())
    }

    fn build_container_status(
        &self,
        _status: &ContainerStatus,
        _info: &BuilderInformation,
    ) -> Result<Vec<Row>> {
        Ok(Vec::new())
    }

    fn build_ephemeral_container_status(
        &self,
        _status: &ContainerStatus,
        _info: &BuilderInformation,
    ) -> Result<Vec<Row>> {
        Ok(Vec::new())
    }

    /// Summary row shown above a pod's children in tree view
    fn build_branch(&self, _info: &BuilderInformation, _rows: &[Row]) -> Result<Option<Row>> {
        Ok(None)
    }

    /// Indices into [`Looper::headers`] that should not be displayed
    fn hide_columns(&self, _info: &BuilderInformation) -> Vec<usize> {
        Vec::new()
    }
}

/// Traversal switches shared by every report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuilderOptions {
    pub tree_view: bool,
    pub show_namespace: bool,
    pub show_node: bool,
    pub show_type: bool,
    pub container_name: Option<String>,
    pub exclude_init: bool,
    pub exclude_ephemeral: bool,
}

fn each<T>(list: Option<&Vec<T>>) -> impl Iterator<Item = &T> {
    list.into_iter().flatten()
}

/// Rows of one pod with the container each came from
#[derive(Default)]
struct Collected {
    children: Vec<(ContainerType, String)>,
    rows: Vec<Row>,
}

pub struct RowBuilder {
    options: BuilderOptions,
    info: BuilderInformation,
}

impl RowBuilder {
    pub fn new(options: BuilderOptions) -> Self {
        let info = BuilderInformation {
            tree_view: options.tree_view,
            ..Default::default()
        };
        Self { options, info }
    }

    /// Build every row for `pods` into `table`, replacing its headers.
    ///
    /// Rows arrive in pod order, then standard, init and ephemeral
    /// containers, then container order within each group.
    pub fn build(&mut self, pods: &[Pod], looper: &dyn Looper, table: &mut Table) -> Result<()> {
        let mut headers = IDENTITY_HEADERS.to_vec();
        if self.options.tree_view {
            headers[COLUMN_CONTAINER] = TREE_NAME_HEADER;
        }
        let data_columns = looper.headers();
        headers.extend(data_columns.iter().copied());
        table.set_header(headers);

        self.hide_identity_columns(table);
        for index in looper.hide_columns(&self.info) {
            table.hide_column(IDENTITY_HEADERS.len() + index);
        }

        for pod in pods {
            self.build_pod(pod, looper, table);
        }

        info!(
            "Built {} rows from {} pods",
            table.row_count(),
            pods.len()
        );
        Ok(())
    }

    fn hide_identity_columns(&self, table: &mut Table) {
        if !self.options.show_type {
            table.hide_column(COLUMN_TYPE);
        }
        if !self.options.show_namespace {
            table.hide_column(COLUMN_NAMESPACE);
        }
        if !self.options.show_node {
            table.hide_column(COLUMN_NODE);
        }
        if self.options.tree_view {
            table.hide_column(COLUMN_POD);
        }
    }

    fn build_pod(&mut self, pod: &Pod, looper: &dyn Looper, table: &mut Table) {
        self.info.enter_pod(pod);
        debug!("Building rows for pod {}/{}", self.info.namespace, self.info.pod_name);

        let mut out = Collected::default();
        let pod_rows = looper.build_pod(pod, &self.info);
        self.collect("", ContainerType::Pod, pod_rows, &mut out);

        let spec = pod.spec.as_ref();
        let status = pod.status.as_ref();

        for container in each(spec.map(|s| &s.containers)) {
            self.visit(&container.name, ContainerType::Standard, &mut out, |info| {
                looper.build_container_spec(container, info)
            });
        }
        for cs in each(status.and_then(|s| s.container_statuses.as_ref())) {
            self.visit(&cs.name, ContainerType::Standard, &mut out, |info| {
                looper.build_container_status(cs, info)
            });
        }

        if !self.options.exclude_init {
            for container in each(spec.and_then(|s| s.init_containers.as_ref())) {
                self.visit(&container.name, ContainerType::Init, &mut out, |info| {
                    looper.build_container_spec(container, info)
                });
            }
            for cs in each(status.and_then(|s| s.init_container_statuses.as_ref())) {
                self.visit(&cs.name, ContainerType::Init, &mut out, |info| {
                    looper.build_container_status(cs, info)
                });
            }
        }

        if !self.options.exclude_ephemeral {
            for container in each(spec.and_then(|s| s.ephemeral_containers.as_ref())) {
                self.visit(&container.name, ContainerType::Ephemeral, &mut out, |info| {
                    looper.build_ephemeral_container_spec(container, info)
                });
            }
            for cs in each(status.and_then(|s| s.ephemeral_container_statuses.as_ref())) {
                self.visit(&cs.name, ContainerType::Ephemeral, &mut out, |info| {
                    looper.build_ephemeral_container_status(cs, info)
                });
            }
        }

        self.emit(looper, out, table);
    }

    fn wants(&self, name: &str) -> bool {
        self.options
            .container_name
            .as_deref()
            .is_none_or(|wanted| wanted == name)
    }

    fn visit<F>(&mut self, name: &str, container_type: ContainerType, out: &mut Collected, build: F)
    where
        F: FnOnce(&BuilderInformation) -> Result<Vec<Row>>,
    {
        if !self.wants(name) {
            return;
        }
        self.info.enter_container(name, container_type);
        let built = build(&self.info);
        self.collect(name, container_type, built, out);
    }

    /// A failing entity degrades to one row of empty data cells.
    fn collect(
        &self,
        name: &str,
        container_type: ContainerType,
        built: Result<Vec<Row>>,
        out: &mut Collected,
    ) {
        let built = built.unwrap_or_else(|e| {
            warn!(
                "Unable to build rows for {}/{} {}: {}",
                self.info.namespace, self.info.pod_name, name, e
            );
            vec![Row::new()]
        });
        for row in built {
            out.children.push((container_type, name.to_string()));
            out.rows.push(row);
        }
    }

    /// In tree view pod level rows stand in for the branch row; a pod that
    /// produced no rows at all is left out.
    fn emit(&mut self, looper: &dyn Looper, out: Collected, table: &mut Table) {
        let Collected { children, rows } = out;
        if !self.options.tree_view {
            for ((container_type, name), row) in children.iter().zip(rows) {
                table.add_row(self.prefix(*container_type, name, row));
            }
            return;
        }
        if children.is_empty() {
            debug!("No rows for pod {}/{}", self.info.namespace, self.info.pod_name);
            return;
        }

        let mut pod_rows = Vec::new();
        let mut containers = Vec::new();
        let mut container_rows = Vec::new();
        for ((container_type, name), row) in children.into_iter().zip(rows) {
            if container_type == ContainerType::Pod {
                pod_rows.push(row);
            } else {
                containers.push((container_type, name));
                container_rows.push(row);
            }
        }

        self.info.enter_container("", ContainerType::Pod);
        if pod_rows.is_empty() {
            pod_rows.push(self.branch(looper, &container_rows));
        }
        let title = format!("Pod/{}", self.info.pod_name);
        for row in pod_rows {
            table.add_row(self.prefix(ContainerType::Pod, &title, row));
        }

        let last = containers.len().saturating_sub(1);
        for (position, ((container_type, name), row)) in
            containers.iter().zip(container_rows).enumerate()
        {
            let glyph = if position == last { TREE_LAST } else { TREE_BRANCH };
            table.add_row(self.prefix(*container_type, &format!("{glyph}{name}"), row));
        }
    }

    fn branch(&self, looper: &dyn Looper, rows: &[Row]) -> Row {
        looper
            .build_branch(&self.info, rows)
            .unwrap_or_else(|e| {
                warn!(
                    "Unable to summarise pod {}/{}: {}",
                    self.info.namespace, self.info.pod_name, e
                );
                None
            })
            .unwrap_or_default()
    }

    fn prefix(&self, container_type: ContainerType, name: &str, data: Row) -> Row {
        let mut row = Vec::with_capacity(IDENTITY_HEADERS.len() + data.len());
        row.push(Cell::text(container_type.tag()));
        row.push(Cell::text(self.info.namespace.as_str()));
        row.push(Cell::text(self.info.node_name.as_str()));
        row.push(Cell::text(self.info.pod_name.as_str()));
        row.push(Cell::text(name));
        row.extend(data);
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IceError;
    use crate::lib::error::ConfigError;
    use serde_json::json;

    /// Reports the image of every spec container, failing on `broken`
    struct ImageNames;

    impl Looper for ImageNames {
        fn headers(&self) -> Vec<&'static str> {
            vec!["IMAGE"]
        }

        fn build_container_spec(&self, container: &Container, _info: &BuilderInformation) -> Result<Vec<Row>> {
            if container.name == "broken" {
                return Err(IceError::Config(ConfigError::InvalidValue("broken".to_string())));
            }
            Ok(vec![vec![Cell::text(container.image.clone().unwrap_or_default())]])
        }

        fn build_branch(&self, _info: &BuilderInformation, rows: &[Row]) -> Result<Option<Row>> {
            Ok(Some(vec![Cell::count(rows.len() as i64)]))
        }
    }

    /// One pod level row carrying the pod phase
    struct PodPhase;

    impl Looper for PodPhase {
        fn headers(&self) -> Vec<&'static str> {
            vec!["PHASE"]
        }

        fn build_pod(&self, _pod: &Pod, info: &BuilderInformation) -> Result<Vec<Row>> {
            Ok(vec![vec![Cell::text(info.phase.as_str())]])
        }
    }

    fn pod(name: &str, containers: serde_json::Value, init: serde_json::Value) -> Pod {
        serde_json::from_value(json!({
            "metadata": { "name": name, "namespace": "default" },
            "spec": { "nodeName": "node-1", "containers": containers, "initContainers": init }
        }))
        .unwrap()
    }

    fn cells(table: &Table, column: usize) -> Vec<String> {
        (0..table.row_count())
            .map(|r| table.row(r).unwrap()[column].to_string())
            .collect()
    }

    #[test]
    fn rows_follow_pod_then_container_group_order() {
        let pods = vec![
            pod(
                "web",
                json!([{ "name": "app", "image": "nginx" }]),
                json!([{ "name": "setup", "image": "busybox" }]),
            ),
            pod("db", json!([{ "name": "pg", "image": "postgres" }]), json!([])),
        ];
        let mut table = Table::new();
        RowBuilder::new(BuilderOptions::default())
            .build(&pods, &ImageNames, &mut table)
            .unwrap();

        assert_eq!(cells(&table, COLUMN_TYPE), ["S", "I", "S"]);
        assert_eq!(cells(&table, COLUMN_POD), ["web", "web", "db"]);
        assert_eq!(cells(&table, 5), ["nginx", "busybox", "postgres"]);
        assert_eq!(table.visible_columns(), [COLUMN_POD, COLUMN_CONTAINER, 5]);
    }

    #[test]
    fn failing_container_degrades_to_empty_cells() {
        let pods = vec![pod(
            "web",
            json!([{ "name": "broken", "image": "x" }, { "name": "app", "image": "nginx" }]),
            json!([]),
        )];
        let mut table = Table::new();
        RowBuilder::new(BuilderOptions::default())
            .build(&pods, &ImageNames, &mut table)
            .unwrap();

        assert_eq!(cells(&table, COLUMN_CONTAINER), ["broken", "app"]);
        assert_eq!(cells(&table, 5), ["", "nginx"]);
    }

    #[test]
    fn container_name_and_group_filters() {
        let pods = vec![pod(
            "web",
            json!([{ "name": "app", "image": "nginx" }]),
            json!([{ "name": "app", "image": "busybox" }]),
        )];

        let mut table = Table::new();
        let options = BuilderOptions {
            exclude_init: true,
            container_name: Some("app".to_string()),
            ..Default::default()
        };
        RowBuilder::new(options).build(&pods, &ImageNames, &mut table).unwrap();
        assert_eq!(cells(&table, 5), ["nginx"]);

        let mut table = Table::new();
        let options = BuilderOptions {
            container_name: Some("other".to_string()),
            ..Default::default()
        };
        RowBuilder::new(options).build(&pods, &ImageNames, &mut table).unwrap();
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn tree_view_puts_branch_ahead_of_children() {
        let pods = vec![pod(
            "web",
            json!([{ "name": "app", "image": "nginx" }, { "name": "log", "image": "fluentd" }]),
            json!([]),
        )];
        let mut table = Table::new();
        let options = BuilderOptions {
            tree_view: true,
            ..Default::default()
        };
        RowBuilder::new(options).build(&pods, &ImageNames, &mut table).unwrap();

        assert_eq!(table.headers()[COLUMN_CONTAINER].title(), TREE_NAME_HEADER);
        assert!(table.headers()[COLUMN_POD].is_hidden());
        assert_eq!(cells(&table, COLUMN_CONTAINER), ["Pod/web", "├─app", "└─log"]);
        assert_eq!(cells(&table, 5), ["2", "nginx", "fluentd"]);
    }

    #[test]
    fn tree_view_uses_pod_rows_as_the_branch() {
        let mut web = pod("web", json!([{ "name": "app", "image": "nginx" }]), json!([]));
        web.status = serde_json::from_value(json!({ "phase": "Running" })).unwrap();
        let mut table = Table::new();
        let options = BuilderOptions {
            tree_view: true,
            ..Default::default()
        };
        RowBuilder::new(options).build(&[web], &PodPhase, &mut table).unwrap();

        assert_eq!(cells(&table, COLUMN_TYPE), ["P"]);
        assert_eq!(cells(&table, COLUMN_CONTAINER), ["Pod/web"]);
        assert_eq!(cells(&table, 5), ["Running"]);
    }

    #[test]
    fn tree_view_skips_pods_without_rows() {
        let pods = vec![
            pod("web", json!([{ "name": "app", "image": "nginx" }]), json!([])),
            pod("db", json!([{ "name": "pg", "image": "postgres" }]), json!([])),
        ];
        let mut table = Table::new();
        let options = BuilderOptions {
            tree_view: true,
            container_name: Some("app".to_string()),
            ..Default::default()
        };
        RowBuilder::new(options).build(&pods, &ImageNames, &mut table).unwrap();

        assert_eq!(cells(&table, COLUMN_CONTAINER), ["Pod/web", "└─app"]);
        assert_eq!(cells(&table, 5), ["1", "nginx"]);
    }

    #[test]
    fn any_column_can_be_hidden() {
        let pods = vec![pod("web", json!([{ "name": "app", "image": "nginx" }]), json!([]))];
        let options = BuilderOptions {
            show_type: true,
            show_namespace: true,
            show_node: true,
            ..Default::default()
        };
        let titles = ["T", "NAMESPACE", "NODE", "PODNAME", "CONTAINER", "IMAGE"];
        for hidden in 0..titles.len() {
            let mut table = Table::new();
            RowBuilder::new(options.clone()).build(&pods, &ImageNames, &mut table).unwrap();
            table.hide_column(hidden);

            let shown: Vec<&str> = table.records()[0].fields.iter().map(|(t, _)| *t).collect();
            let expected: Vec<&str> = titles
                .iter()
                .enumerate()
                .filter(|(index, _)| *index != hidden)
                .map(|(_, title)| *title)
                .collect();
            assert_eq!(shown, expected);
        }
    }
}
