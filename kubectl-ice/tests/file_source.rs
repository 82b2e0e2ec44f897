use std::io::Write;

use ice::{
    LooperSettings, PodQuery, ReportConfig, ReportKind, build_report, ensure_found,
    load_pods_from_file,
};

const PODS: &str = r#"
apiVersion: v1
kind: Pod
metadata:
  name: web-1
  namespace: shop
  labels:
    app: web
spec:
  containers:
    - name: nginx
      image: nginx:1.27
      imagePullPolicy: IfNotPresent
      ports:
        - name: http
          containerPort: 80
---
apiVersion: v1
kind: Pod
metadata:
  name: cache-1
  namespace: shop
  labels:
    app: cache
spec:
  containers:
    - name: redis
      image: redis:7
      ports:
        - containerPort: 6379
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: settings
"#;

fn write_pods() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(PODS.as_bytes()).unwrap();
    file
}

#[test]
fn reads_every_pod_in_the_stream() {
    let file = write_pods();
    let pods = load_pods_from_file(file.path()).unwrap();
    assert_eq!(pods.len(), 2);

    let table = build_report(&ReportConfig::new(ReportKind::Image), &pods, LooperSettings::default()).unwrap();
    let image = table.find_column("IMAGE").unwrap();
    let images: Vec<&str> = table
        .visible_row_indices()
        .into_iter()
        .map(|r| table.row(r).unwrap()[image].as_str())
        .collect();
    assert_eq!(images, ["nginx:1.27", "redis:7"]);
}

#[test]
fn selector_narrows_file_input() {
    let file = write_pods();
    let query = PodQuery {
        selector: Some("app in (web)".to_string()),
        namespace: Some("shop".to_string()),
        ..Default::default()
    };
    let pods = query.filter(load_pods_from_file(file.path()).unwrap()).unwrap();
    ensure_found(&pods, &query).unwrap();

    let table = build_report(&ReportConfig::new(ReportKind::Ports), &pods, LooperSettings::default()).unwrap();
    assert_eq!(table.row_count(), 1);
    let port = table.find_column("PORT").unwrap();
    assert_eq!(table.row(0).unwrap()[port].number(), 80);
}

#[test]
fn wrong_namespace_finds_nothing() {
    let file = write_pods();
    let query = PodQuery {
        namespace: Some("default".to_string()),
        ..Default::default()
    };
    let pods = query.filter(load_pods_from_file(file.path()).unwrap()).unwrap();
    let error = ensure_found(&pods, &query).unwrap_err();
    assert_eq!(
        error.to_string(),
        "Kubernetes error: No resources found in default namespace"
    );
}

#[test]
fn missing_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let error = load_pods_from_file(&dir.path().join("absent.yaml")).unwrap_err();
    assert!(error.to_string().starts_with("Configuration error: File error: Failed to read"));
}
