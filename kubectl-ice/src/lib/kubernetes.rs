use k8s_openapi::api::core::v1::Pod;
use kube::api::ListParams;
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use kube::{Api, Client, Config, ResourceExt, config::KubeConfigOptions};
use log::{debug, info};
use serde_json::Value;

use crate::lib::loopers::{ContainerUsage, UsageIndex};
use crate::lib::quantity::{parse_cpu_millicores, parse_memory_bytes};
use crate::lib::source::PodQuery;
use crate::{
    ConfigError::InvalidValue, KubernetesError::ApiError, KubernetesError::ConnectionFailed,
    Result,
};

pub struct KubernetesLoader {
    client: Client,
}

impl KubernetesLoader {
    pub async fn new(context: Option<&str>) -> Result<Self> {
        let client = if let Some(context) = context {
            debug!("Using custom context for Kubeconfig");
            let custom_config = Config::from_kubeconfig(&KubeConfigOptions {
                context: Some(context.to_string()),
                ..Default::default()
            })
            .await
            .map_err(|e| InvalidValue(e.to_string()))?;

            debug!("Creating a Kubernetes client using custom Kubeconfig");
            Client::try_from(custom_config).map_err(|e| ConnectionFailed(e.to_string()))?
        } else {
            debug!("Creating a Kubernetes client using default Kubeconfig");
            Client::try_default()
                .await
                .map_err(|e| ConnectionFailed(e.to_string()))?
        };

        info!("Successfully created Kubernetes client");
        Ok(Self { client })
    }

    /// Namespace a query reads from when it is not cluster wide
    fn namespace(&self, query: &PodQuery) -> String {
        query
            .namespace
            .clone()
            .unwrap_or_else(|| self.client.default_namespace().to_string())
    }

    /// Pods selected by `query`; missing named pods are left for the caller to report
    pub async fn get_pods(&self, query: &PodQuery) -> Result<Vec<Pod>> {
        let api: Api<Pod> = if query.all_namespaces {
            Api::all(self.client.clone())
        } else {
            Api::namespaced(self.client.clone(), &self.namespace(query))
        };

        if !query.names.is_empty() && !query.all_namespaces {
            let mut pods = Vec::new();
            for name in &query.names {
                debug!("Getting pod {name}");
                match api.get_opt(name).await.map_err(|e| ApiError(e.to_string()))? {
                    Some(pod) => pods.push(pod),
                    None => debug!("Pod {name} does not exist"),
                }
            }
            return Ok(pods);
        }

        let mut lp = ListParams::default();
        if let Some(selector) = query.selector.as_deref() {
            lp = lp.labels(selector);
        }
        debug!(
            "Listing pods in {}",
            query.scope().map_or("all namespaces".to_string(), |ns| format!("{ns} namespace"))
        );
        let pods = api.list(&lp).await.map_err(|e| ApiError(e.to_string()))?;
        let pods: Vec<Pod> = pods
            .items
            .into_iter()
            .filter(|pod| query.matches_name(pod))
            .collect();

        info!("Retrieved {} pods", pods.len());
        Ok(pods)
    }

    /// Live container usage from the metrics API
    pub async fn get_pod_usage(&self, query: &PodQuery) -> Result<UsageIndex> {
        let gvk = GroupVersionKind::gvk("metrics.k8s.io", "v1beta1", "PodMetrics");
        let resource = ApiResource::from_gvk_with_plural(&gvk, "pods");
        let api: Api<DynamicObject> = if query.all_namespaces {
            Api::all_with(self.client.clone(), &resource)
        } else {
            Api::namespaced_with(self.client.clone(), &self.namespace(query), &resource)
        };

        let mut lp = ListParams::default();
        if let Some(selector) = query.selector.as_deref() {
            lp = lp.labels(selector);
        }
        let metrics = api.list(&lp).await.map_err(|e| ApiError(e.to_string()))?;

        let mut usage = UsageIndex::default();
        for pod_metric in metrics {
            let namespace = pod_metric.namespace().unwrap_or_default();
            let pod = pod_metric.name_any();
            for (container, container_usage) in container_usage(&pod_metric.data) {
                usage.insert(namespace.as_str(), pod.as_str(), container, container_usage);
            }
        }

        info!("Retrieved usage for {} containers", usage.len());
        Ok(usage)
    }
}

/// Per container usage from a PodMetrics object body
pub fn container_usage(data: &Value) -> Vec<(String, ContainerUsage)> {
    let Some(containers) = data.get("containers").and_then(Value::as_array) else {
        return Vec::new();
    };

    containers
        .iter()
        .filter_map(|container| {
            let name = container.get("name")?.as_str()?.to_string();
            let usage = container.get("usage");
            let read = |key: &str| usage.and_then(|u| u.get(key)).and_then(Value::as_str);
            Some((
                name,
                ContainerUsage {
                    cpu_millicores: read("cpu").and_then(parse_cpu_millicores).unwrap_or_default(),
                    memory_bytes: read("memory").and_then(parse_memory_bytes).unwrap_or_default(),
                },
            ))
        })
        .collect()
}
