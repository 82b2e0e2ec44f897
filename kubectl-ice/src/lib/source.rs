//! Where pods come from and which of them a query selects.
//!
//! The cluster loader lets the API server apply namespace and selector; pods
//! read from a file are narrowed down here with the same rules.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use k8s_openapi::api::core::v1::Pod;
use log::{debug, warn};
use serde::Deserialize;

use crate::Result;
use crate::lib::error::{ConfigError, KubernetesError};

/// Which pods a report covers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodQuery {
    pub names: Vec<String>,
    pub selector: Option<String>,
    pub namespace: Option<String>,
    pub all_namespaces: bool,
}

impl PodQuery {
    /// Reject combinations kubectl rejects too
    pub fn validate(&self) -> Result<()> {
        if !self.names.is_empty() && self.selector.is_some() {
            return Err(ConfigError::Conflict(
                "pod names".to_string(),
                "--selector".to_string(),
            )
            .into());
        }
        if let Some(selector) = &self.selector {
            LabelSelector::parse(selector)?;
        }
        Ok(())
    }

    pub fn matches_name(&self, pod: &Pod) -> bool {
        self.names.is_empty()
            || pod
                .metadata
                .name
                .as_ref()
                .is_some_and(|name| self.names.contains(name))
    }

    /// Namespace the query is scoped to, `None` for every namespace
    pub fn scope(&self) -> Option<&str> {
        if self.all_namespaces {
            None
        } else {
            self.namespace.as_deref()
        }
    }

    /// Apply name, namespace and selector rules to pods the API did not filter
    pub fn filter(&self, pods: Vec<Pod>) -> Result<Vec<Pod>> {
        let selector = self
            .selector
            .as_deref()
            .map(LabelSelector::parse)
            .transpose()?;
        let scope = self.scope();

        Ok(pods
            .into_iter()
            .filter(|pod| self.matches_name(pod))
            .filter(|pod| {
                scope.is_none_or(|ns| pod.metadata.namespace.as_deref().unwrap_or("default") == ns)
            })
            .filter(|pod| {
                selector.as_ref().is_none_or(|s| {
                    let empty = BTreeMap::new();
                    s.matches(pod.metadata.labels.as_ref().unwrap_or(&empty))
                })
            })
            .collect())
    }
}

/// Fail when nothing was found or a named pod is missing
pub fn ensure_found(pods: &[Pod], query: &PodQuery) -> Result<()> {
    for name in &query.names {
        let found = pods
            .iter()
            .any(|pod| pod.metadata.name.as_deref() == Some(name.as_str()));
        if !found {
            return Err(KubernetesError::ResourceNotFound(name.clone()).into());
        }
    }
    if pods.is_empty() {
        let suffix = match query.scope() {
            Some(namespace) => format!(" in {namespace} namespace"),
            None => String::new(),
        };
        return Err(KubernetesError::NoResources(suffix).into());
    }
    Ok(())
}

/// Read pods from a YAML or JSON file.
///
/// Accepts a single `Pod`, a `PodList`/`List`, or a stream of YAML documents
/// of either. Objects of other kinds are skipped.
pub fn load_pods_from_file(path: &Path) -> Result<Vec<Pod>> {
    let text = fs::read_to_string(path).map_err(|e| {
        ConfigError::FileError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let pods = parse_pods(&text)?;
    debug!("Loaded {} pods from {}", pods.len(), path.display());
    Ok(pods)
}

pub fn parse_pods(text: &str) -> Result<Vec<Pod>> {
    let mut pods = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = serde_yaml::Value::deserialize(document)?;
        collect_pods(value, &mut pods)?;
    }
    Ok(pods)
}

fn collect_pods(value: serde_yaml::Value, pods: &mut Vec<Pod>) -> Result<()> {
    if value.is_null() {
        return Ok(());
    }
    let kind = value
        .get("kind")
        .and_then(serde_yaml::Value::as_str)
        .unwrap_or("Pod")
        .to_string();

    match kind.as_str() {
        "Pod" => pods.push(serde_yaml::from_value(value)?),
        "PodList" | "List" => {
            let items = value
                .get("items")
                .and_then(serde_yaml::Value::as_sequence)
                .cloned()
                .unwrap_or_default();
            for item in items {
                collect_pods(item, pods)?;
            }
        }
        other => warn!("Skipping {other} object, only pods are reported"),
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Requirement {
    Equals(String, String),
    NotEquals(String, String),
    In(String, Vec<String>),
    NotIn(String, Vec<String>),
    Exists(String),
    DoesNotExist(String),
}

impl Requirement {
    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        match self {
            Requirement::Equals(key, value) => labels.get(key) == Some(value),
            Requirement::NotEquals(key, value) => labels.get(key) != Some(value),
            Requirement::In(key, values) => labels.get(key).is_some_and(|v| values.contains(v)),
            Requirement::NotIn(key, values) => labels.get(key).is_none_or(|v| !values.contains(v)),
            Requirement::Exists(key) => labels.contains_key(key),
            Requirement::DoesNotExist(key) => !labels.contains_key(key),
        }
    }
}

/// Equality and set based label selector, all requirements ANDed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelSelector {
    requirements: Vec<Requirement>,
}

impl LabelSelector {
    pub fn parse(expression: &str) -> Result<Self> {
        let requirements = split_requirements(expression)
            .into_iter()
            .map(|part| parse_requirement(expression, part))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { requirements })
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }
}

/// Split on commas that are not inside a `( )` value set
fn split_requirements(expression: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (position, c) in expression.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&expression[start..position]);
                start = position + 1;
            }
            _ => {}
        }
    }
    parts.push(&expression[start..]);
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

fn parse_requirement(expression: &str, part: &str) -> Result<Requirement> {
    let invalid = |reason: &str| {
        ConfigError::InvalidExpression(expression.to_string(), reason.to_string())
    };

    if let Some((key, value)) = part.split_once("!=") {
        return Ok(Requirement::NotEquals(
            label_key(key).ok_or_else(|| invalid("missing label key"))?,
            value.trim().to_string(),
        ));
    }
    if let Some((key, value)) = part.split_once("==").or_else(|| part.split_once('=')) {
        return Ok(Requirement::Equals(
            label_key(key).ok_or_else(|| invalid("missing label key"))?,
            value.trim().to_string(),
        ));
    }

    let words: Vec<&str> = part.splitn(3, char::is_whitespace).collect();
    if let [key, operator, values] = words.as_slice() {
        let key = label_key(key).ok_or_else(|| invalid("missing label key"))?;
        let values = value_set(values).ok_or_else(|| invalid("expected a value set like (a,b)"))?;
        return match operator.to_ascii_lowercase().as_str() {
            "in" => Ok(Requirement::In(key, values)),
            "notin" => Ok(Requirement::NotIn(key, values)),
            _ => Err(invalid("unknown operator").into()),
        };
    }

    match part.strip_prefix('!') {
        Some(key) => Ok(Requirement::DoesNotExist(
            label_key(key).ok_or_else(|| invalid("missing label key"))?,
        )),
        None => Ok(Requirement::Exists(
            label_key(part).ok_or_else(|| invalid("missing label key"))?,
        )),
    }
}

fn label_key(key: &str) -> Option<String> {
    let key = key.trim();
    let valid = !key.is_empty() && !key.contains(char::is_whitespace);
    valid.then(|| key.to_string())
}

fn value_set(text: &str) -> Option<Vec<String>> {
    let inner = text.trim().strip_prefix('(')?.strip_suffix(')')?;
    Some(
        inner
            .split(',')
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect(),
    )
}
