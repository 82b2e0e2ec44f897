//! One [`Looper`] per report.

pub mod capabilities;
pub mod commands;
pub mod environment;
pub mod image;
pub mod ip;
pub mod lifecycle;
pub mod ports;
pub mod probes;
pub mod resources;
pub mod restarts;
pub mod status;

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{ExecAction, HTTPGetAction, TCPSocketAction};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use crate::lib::builder::Looper;
use crate::lib::cell::Cell;

pub use resources::{ContainerUsage, ResourceKind, UsageIndex};

/// The reports the plugin can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Capabilities,
    Commands,
    Cpu,
    Environment,
    Image,
    Ip,
    Lifecycle,
    Memory,
    Ports,
    Probes,
    Restarts,
    Status,
}

impl ReportKind {
    /// Column scanned by `--oddities`, if the report has a meaningful one
    pub fn oddity_column(&self) -> Option<&'static str> {
        match self {
            ReportKind::Cpu | ReportKind::Memory => Some(resources::COLUMN_USED),
            ReportKind::Restarts | ReportKind::Status => Some(restarts::COLUMN_RESTARTS),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReportKind::Capabilities => "capabilities",
            ReportKind::Commands => "commands",
            ReportKind::Cpu => "cpu",
            ReportKind::Environment => "environment",
            ReportKind::Image => "image",
            ReportKind::Ip => "ip",
            ReportKind::Lifecycle => "lifecycle",
            ReportKind::Memory => "memory",
            ReportKind::Ports => "ports",
            ReportKind::Probes => "probes",
            ReportKind::Restarts => "restarts",
            ReportKind::Status => "status",
        }
    }

    /// Whether the report reads live usage from the metrics API
    pub fn needs_metrics(&self) -> bool {
        matches!(self, ReportKind::Cpu | ReportKind::Memory)
    }
}

/// Report specific switches
#[derive(Debug, Clone, Default)]
pub struct LooperSettings {
    /// Show raw millicores and bytes instead of formatted units
    pub raw: bool,
    /// Show the last terminated state instead of the current one
    pub previous: bool,
    pub usage: UsageIndex,
    /// Reference time for ages; defaults to the time of the call
    pub now: Option<DateTime<Utc>>,
}

pub fn looper_for(kind: ReportKind, settings: LooperSettings) -> Box<dyn Looper> {
    match kind {
        ReportKind::Capabilities => Box::new(capabilities::Capabilities),
        ReportKind::Commands => Box::new(commands::Commands),
        ReportKind::Cpu => Box::new(resources::Resources::new(
            ResourceKind::Cpu,
            settings.raw,
            settings.usage,
        )),
        ReportKind::Environment => Box::new(environment::Environment),
        ReportKind::Image => Box::new(image::Image),
        ReportKind::Ip => Box::new(ip::PodIp),
        ReportKind::Lifecycle => Box::new(lifecycle::Lifecycle),
        ReportKind::Memory => Box::new(resources::Resources::new(
            ResourceKind::Memory,
            settings.raw,
            settings.usage,
        )),
        ReportKind::Ports => Box::new(ports::Ports),
        ReportKind::Probes => Box::new(probes::Probes),
        ReportKind::Restarts => Box::new(restarts::Restarts),
        ReportKind::Status => Box::new(status::Status::new(
            settings.previous,
            settings.now.unwrap_or_else(Utc::now),
        )),
    }
}

/// Space separated words, empty when absent
fn join_words(words: Option<&Vec<String>>) -> String {
    words.map(|w| w.join(" ")).unwrap_or_default()
}

fn port_text(port: &IntOrString) -> String {
    match port {
        IntOrString::Int(number) => number.to_string(),
        IntOrString::String(name) => name.clone(),
    }
}

fn exec_action(action: &ExecAction) -> Cell {
    Cell::text(join_words(action.command.as_ref()))
}

fn http_action(action: &HTTPGetAction) -> Cell {
    let scheme = action.scheme.as_deref().unwrap_or("HTTP").to_ascii_lowercase();
    let host = action.host.as_deref().unwrap_or("");
    let path = action.path.as_deref().unwrap_or("");
    Cell::text(format!("{scheme}://{host}:{}{path}", port_text(&action.port)))
}

fn tcp_action(action: &TCPSocketAction) -> Cell {
    let host = action.host.as_deref().unwrap_or("");
    Cell::text(format!("tcp://{host}:{}", port_text(&action.port)))
}

/// Sum of the numeric cells in one column, `None` when there are none
fn column_sum(rows: &[Vec<Cell>], column: usize) -> Option<i64> {
    let mut numeric = rows
        .iter()
        .filter_map(|row| row.get(column))
        .filter(|cell| cell.is_numeric())
        .peekable();
    numeric.peek()?;
    Some(numeric.map(Cell::number).sum())
}
