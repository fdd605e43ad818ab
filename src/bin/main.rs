use std::env;
use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use cpma::config::Config;
use cpma::fetch::cached::CachedFetcher;
use cpma::fetch::local::LocalRootFetcher;
use cpma::parameters::ConfigOverrides;
use cpma::transform::sink::DirSink;
use cpma::transform::{Runner, UnitState, all_units};
use tracing::{Level, info, warn};

#[derive(Parser, Debug)]
#[command(name = "cpma", about = "Migrates OCP3 cluster configuration to OCP4 manifests")]
struct Cli {
    /// Configuration file, `./cpma.yaml` is used when present
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: ConfigOverrides,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?.try_with_env_overrides()?;
    let config = cli.overrides.apply(config);

    let level = if config.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let fetcher = CachedFetcher::new(
        LocalRootFetcher::new(&config.source_root),
        config.cache_dir(),
    );
    let env_var = |name: &str| env::var(name);
    let units = all_units(&config, &fetcher, &env_var);

    let mut sink = DirSink::new(&config.output_dir);
    let summary = Runner::new(config.output_options()).run(&units, &mut sink);
    sink.finish()
        .map_err(|e| format!("error writing reports: {}", e))?;

    for (unit, state) in summary.units() {
        match state {
            UnitState::Skipped { stage, reason } => warn!("{unit}: skipped at {stage}: {reason}"),
            _ => info!("{unit}: done"),
        }
    }
    info!(
        "Migration finished, output written to {}",
        config.output_dir.display()
    );
    Ok(())
}
