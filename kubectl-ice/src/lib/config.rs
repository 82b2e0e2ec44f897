use std::io::IsTerminal;
use std::path::PathBuf;

use crate::Result;
use crate::lib::builder::BuilderOptions;
use crate::lib::cli::{ColourMode, Command, Common, OutputFormat};
use crate::lib::error::ConfigError;
use crate::lib::loopers::{LooperSettings, ReportKind};
use crate::lib::source::PodQuery;

/// Everything a report run needs, validated and free of CLI types
#[derive(Clone, Debug)]
pub struct ReportConfig {
    pub kind: ReportKind,
    pub query: PodQuery,
    pub context: Option<String>,
    pub filename: Option<PathBuf>,
    pub builder: BuilderOptions,
    pub filters: Vec<String>,
    pub sort: Vec<String>,
    pub oddities: bool,
    pub output: OutputFormat,
    pub colour: bool,
    pub raw: bool,
    pub previous: bool,
}

impl ReportConfig {
    pub fn new(kind: ReportKind) -> Self {
        Self {
            kind,
            query: PodQuery::default(),
            context: None,
            filename: None,
            builder: BuilderOptions::default(),
            filters: Vec::new(),
            sort: Vec::new(),
            oddities: false,
            output: OutputFormat::Table,
            colour: false,
            raw: false,
            previous: false,
        }
    }

    pub fn from_cli(command: &Command) -> Result<Self> {
        let (kind, raw, previous) = match command {
            Command::Capabilities(_) => (ReportKind::Capabilities, false, false),
            Command::Commands(_) => (ReportKind::Commands, false, false),
            Command::Cpu(r) => (ReportKind::Cpu, r.raw, false),
            Command::Environment(_) => (ReportKind::Environment, false, false),
            Command::Image(_) => (ReportKind::Image, false, false),
            Command::Ip(_) => (ReportKind::Ip, false, false),
            Command::Lifecycle(_) => (ReportKind::Lifecycle, false, false),
            Command::Memory(r) => (ReportKind::Memory, r.raw, false),
            Command::Ports(_) => (ReportKind::Ports, false, false),
            Command::Probes(_) => (ReportKind::Probes, false, false),
            Command::Restarts(_) => (ReportKind::Restarts, false, false),
            Command::Status(r) => (ReportKind::Status, false, r.previous),
        };
        let common: &Common = command.common();

        let config = Self {
            kind,
            query: PodQuery {
                names: common.pods.clone(),
                selector: common.selector.clone(),
                namespace: common.namespace.clone(),
                all_namespaces: common.all_namespaces,
            },
            context: common.context.clone(),
            filename: common.filename.clone(),
            builder: BuilderOptions {
                tree_view: common.tree,
                show_namespace: common.show_namespace || common.all_namespaces,
                show_node: common.show_node,
                show_type: common.show_type,
                container_name: common.container.clone(),
                exclude_init: common.exclude_init,
                exclude_ephemeral: common.exclude_ephemeral,
            },
            filters: common.matches.clone(),
            sort: common.sort.clone(),
            oddities: common.oddities,
            output: common.output,
            colour: resolve_colour(common.colour, std::io::stdout().is_terminal()),
            raw,
            previous,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject option combinations that cannot produce a meaningful report
    pub fn validate(&self) -> Result<()> {
        self.query.validate()?;

        let conflict = |a: &str, b: &str| -> Result<()> {
            Err(ConfigError::Conflict(a.to_string(), b.to_string()).into())
        };
        if self.builder.tree_view && !self.sort.is_empty() {
            return conflict("--sort", "--tree");
        }
        if self.oddities {
            if self.builder.tree_view {
                return conflict("--oddities", "--tree");
            }
            if self.kind.oddity_column().is_none() {
                return Err(ConfigError::InvalidValue(format!(
                    "--oddities is not supported by the {} report",
                    self.kind.name()
                ))
                .into());
            }
        }
        Ok(())
    }

    pub fn looper_settings(&self) -> LooperSettings {
        LooperSettings {
            raw: self.raw,
            previous: self.previous,
            ..Default::default()
        }
    }
}

pub fn resolve_colour(mode: ColourMode, terminal: bool) -> bool {
    match mode {
        ColourMode::Always => true,
        ColourMode::Never => false,
        ColourMode::Auto => terminal,
    }
}
