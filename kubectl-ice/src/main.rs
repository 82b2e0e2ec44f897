use clap::Parser;
use log::{debug, error, info, warn};

use ice::{
    Cli, KubernetesLoader, ReportConfig, Result, UsageIndex, build_report, ensure_found,
    init_logger, load_pods_from_file, render,
};

async fn run(config: &ReportConfig) -> Result<()> {
    let mut settings = config.looper_settings();

    let pods = if let Some(path) = config.filename.as_deref() {
        info!("Reading pods from {}", path.display());
        config.query.filter(load_pods_from_file(path)?)?
    } else {
        let loader = KubernetesLoader::new(config.context.as_deref()).await?;
        let pods = loader.get_pods(&config.query).await?;
        if config.kind.needs_metrics() {
            settings.usage = loader.get_pod_usage(&config.query).await.unwrap_or_else(|e| {
                warn!("Unable to read pod metrics, usage columns are hidden: {}", e);
                UsageIndex::default()
            });
        }
        pods
    };
    ensure_found(&pods, &config.query)?;

    let table = build_report(config, &pods, settings)?;
    let mut stdout = std::io::stdout().lock();
    render(&table, config.output, config.colour, &mut stdout)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let common = cli.command.common();

    init_logger(common.verbose, common.quiet)?;
    debug!("Parsed arguments: {:?}", cli);

    let result = match ReportConfig::from_cli(&cli.command) {
        Ok(config) => {
            info!("Running {} report", config.kind.name());
            run(&config).await
        }
        Err(e) => Err(e),
    };
    if let Err(e) = &result {
        error!("{}", e);
    }
    result
}
