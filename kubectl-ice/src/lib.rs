//! Container level reports for Kubernetes pods.
//!
//! Pods are walked container by container, each report turns what it finds
//! into table rows, and the table takes care of filtering, sorting, outlier
//! detection and rendering.

pub mod lib {
    pub mod builder;
    pub mod cell;
    pub mod cli;
    pub mod config;
    pub mod error;
    pub mod filter;
    pub mod kubernetes;
    pub mod logger;
    pub mod loopers;
    pub mod outlier;
    pub mod quantity;
    pub mod report;
    pub mod source;
    pub mod table;
}

// Re-export commonly used types at the root level for convenience
pub use lib::builder::{BuilderInformation, BuilderOptions, ContainerType, Looper, Row, RowBuilder};
pub use lib::cell::{Cell, ColourRank};
pub use lib::cli::{Cli, ColourMode, Command, OutputFormat};
pub use lib::config::ReportConfig;
pub use lib::error::{ConfigError, IceError, KubernetesError, Result, TableError};
pub use lib::filter::{MatchFilter, Operator};
pub use lib::kubernetes::KubernetesLoader;
pub use lib::logger::init_logger;
pub use lib::loopers::{ContainerUsage, LooperSettings, ReportKind, UsageIndex, looper_for};
pub use lib::outlier::OutlierPolicy;
pub use lib::report::{build_report, render};
pub use lib::source::{LabelSelector, PodQuery, ensure_found, load_pods_from_file};
pub use lib::table::{RenderOptions, Table};
