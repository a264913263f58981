//! Region Ping - benchmarking CLI
//!
//! Probes every region in the endpoint directory over HTTP and prints the
//! regions ranked by median round-trip latency.

use clap::Parser;
use regionping::{
    cli::Cli,
    config::{display_config_summary, load_config},
    defaults,
    directory,
    error::{ErrorReporter, Result},
    logging::Logger,
    output::PROBE_CSV_HEADER,
    Config, DirectorySource, EndpointDirectory, HttpProber, OutputMode, PoolConfig, ProbePlan,
    RemoteDirectory, Reporter, SampleAggregator, WorkerPool, PKG_NAME, VERSION,
};
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(99);
    }));

    let cli = Cli::parse();
    let reporter = ErrorReporter::new(cli.use_colors(), cli.verbose);

    if let Err(e) = run_application(cli).await {
        reporter.report_error(&e);
        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run_application(cli: Cli) -> Result<()> {
    let config = load_config(cli)?;
    let logger = Arc::new(Logger::for_cli(&config));

    if config.verbose {
        println!("{} v{}", PKG_NAME, VERSION);
        println!("{}", display_config_summary(&config));
        println!();
    }

    let directory = load_directory(&config).await?;
    let plan = ProbePlan::for_config(&directory, &config)?;

    logger.info("Starting probes")
        .field("regions", directory.len())
        .field("probes", plan.expected())
        .field("concurrency", config.concurrency)
        .log()
        .await;

    let prober = Arc::new(HttpProber::new(config.timeout)?);
    let pool = WorkerPool::new(PoolConfig::from_config(&config), prober, logger.clone())?;

    let mode = config.effective_output_mode();
    let aggregator = SampleAggregator::new(plan.expected());
    let mut results = pool.spawn(plan);

    let aggregates = if mode == OutputMode::Csv {
        println!("{}", PROBE_CSV_HEADER);
        aggregator
            .collect(&mut results, |result| println!("{}", Reporter::format_probe_row(result)))
            .await?
    } else {
        aggregator.collect(&mut results, |_| {}).await?
    };

    let output = Reporter::new(config.enable_color).render(mode, aggregates)?;
    print!("{}", output);

    Ok(())
}

/// Remote directory when one is configured, the builtin table otherwise
async fn load_directory(config: &Config) -> Result<EndpointDirectory> {
    match &config.endpoints_url {
        Some(url) => {
            let source = RemoteDirectory::new(url, defaults::DEFAULT_REFRESH_TIMEOUT)?;
            source.fetch().await
        }
        None => Ok(directory::builtin()),
    }
}
