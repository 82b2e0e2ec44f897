use clap::{Args, Parser, Subcommand, ValueEnum};

/// Inspect the containers of your pods
///
/// Each subcommand prints one report with a row per container, built from
/// the pod spec and status. Reports can be filtered, sorted and reduced to
/// their outliers.
#[derive(Parser, Debug)]
#[command(name = "kubectl-ice", author, version, about, styles=get_styles())]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Security context capabilities added and dropped
    #[command(visible_alias = "caps")]
    Capabilities(Report),

    /// Entrypoint commands and arguments
    #[command(visible_alias = "cmd")]
    Commands(Report),

    /// CPU usage, requests and limits
    Cpu(UsageReport),

    /// Environment variables
    #[command(visible_alias = "env")]
    Environment(Report),

    /// Images and pull policies
    #[command(visible_alias = "im")]
    Image(Report),

    /// Pod IP addresses
    Ip(Report),

    /// postStart and preStop hooks
    Lifecycle(Report),

    /// Memory usage, requests and limits
    #[command(visible_alias = "mem")]
    Memory(UsageReport),

    /// Container ports
    #[command(visible_alias = "port")]
    Ports(Report),

    /// Liveness, readiness and startup probes
    #[command(visible_alias = "probe")]
    Probes(Report),

    /// Restart counts
    #[command(visible_alias = "restart")]
    Restarts(Report),

    /// Container state, exit codes and age
    #[command(visible_alias = "st")]
    Status(StatusReport),
}

impl Command {
    pub fn common(&self) -> &Common {
        match self {
            Command::Capabilities(r)
            | Command::Commands(r)
            | Command::Environment(r)
            | Command::Image(r)
            | Command::Ip(r)
            | Command::Lifecycle(r)
            | Command::Ports(r)
            | Command::Probes(r)
            | Command::Restarts(r) => &r.common,
            Command::Cpu(r) | Command::Memory(r) => &r.common,
            Command::Status(r) => &r.common,
        }
    }
}

#[derive(Args, Debug)]
pub struct Report {
    #[command(flatten)]
    pub common: Common,
}

#[derive(Args, Debug)]
pub struct UsageReport {
    #[command(flatten)]
    pub common: Common,

    /// Show raw millicores and bytes instead of formatted units
    #[arg(short, long)]
    pub raw: bool,
}

#[derive(Args, Debug)]
pub struct StatusReport {
    #[command(flatten)]
    pub common: Common,

    /// Show the previous (last terminated) state of each container
    #[arg(short, long)]
    pub previous: bool,
}

/// Flags shared by every report
#[derive(Args, Debug, Default)]
pub struct Common {
    /// Pod names to report on
    pub pods: Vec<String>,

    /// Namespace to read pods from
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Read pods from every namespace
    #[arg(short = 'A', long)]
    pub all_namespaces: bool,

    /// Label selector, e.g. `app=web,tier!=cache`
    #[arg(short = 'l', long)]
    pub selector: Option<String>,

    /// Provide context name
    ///
    /// Use if you have multiple clusters in your kubeconfig
    #[arg(long)]
    pub context: Option<String>,

    /// Read pods from a YAML or JSON file instead of the cluster
    #[arg(short = 'f', long, value_name = "FILE")]
    pub filename: Option<std::path::PathBuf>,

    /// Only show containers with this name
    #[arg(short, long)]
    pub container: Option<String>,

    /// Only show rows matching `COLUMN<op>VALUE`, e.g. `restarts>2`
    #[arg(short, long = "match", value_name = "FILTER")]
    pub matches: Vec<String>,

    /// Comma separated columns to sort by, prefix with `!` for descending
    #[arg(long, value_delimiter = ',')]
    pub sort: Vec<String>,

    /// Group containers under their pod
    #[arg(short, long)]
    pub tree: bool,

    /// Show the namespace column
    #[arg(long)]
    pub show_namespace: bool,

    /// Show the node column
    #[arg(long)]
    pub show_node: bool,

    /// Show the container type column (S, I, E, P)
    #[arg(short = 'T', long)]
    pub show_type: bool,

    /// Leave out init containers
    #[arg(long)]
    pub exclude_init: bool,

    /// Leave out ephemeral containers
    #[arg(long)]
    pub exclude_ephemeral: bool,

    /// Only show rows whose usage or restarts stand out from the rest
    #[arg(long)]
    pub oddities: bool,

    /// Output format
    #[arg(short, long, value_name = "FORMAT", default_value = "table")]
    pub output: OutputFormat,

    /// When to colour table output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub colour: ColourMode,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress log output on stderr (logs still written to file)
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text columns
    #[default]
    Table,
    /// A JSON array with one object per row
    Json,
    /// A YAML sequence with one mapping per row
    Yaml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColourMode {
    /// Colour when stdout is a terminal
    #[default]
    Auto,
    Always,
    Never,
}

/// Set color and variants for help description
///
/// Thanks to [Praveen Perera](https://stackoverflow.com/a/76916424)
fn get_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .usage(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
        )
        .header(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
        )
        .literal(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
        .invalid(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
        )
        .error(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
        )
        .valid(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
        .placeholder(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn aliases_and_shared_flags() {
        let cli = Cli::try_parse_from([
            "kubectl-ice", "restart", "web-1", "-n", "prod", "-m", "restarts>1", "-m",
            "container!=sidecar", "--sort", "!restarts,podname", "-T",
        ])
        .unwrap();

        assert!(matches!(cli.command, Command::Restarts(_)));
        let common = cli.command.common();
        assert_eq!(common.pods, ["web-1"]);
        assert_eq!(common.namespace.as_deref(), Some("prod"));
        assert_eq!(common.matches, ["restarts>1", "container!=sidecar"]);
        assert_eq!(common.sort, ["!restarts", "podname"]);
        assert!(common.show_type);
        assert_eq!(common.output, OutputFormat::Table);
    }

    #[test]
    fn report_specific_flags() {
        let cli = Cli::try_parse_from(["kubectl-ice", "mem", "--raw", "-o", "json"]).unwrap();
        match cli.command {
            Command::Memory(report) => {
                assert!(report.raw);
                assert_eq!(report.common.output, OutputFormat::Json);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["kubectl-ice", "st", "--previous"]).unwrap();
        assert!(matches!(cli.command, Command::Status(StatusReport { previous: true, .. })));
    }
}
