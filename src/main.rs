use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oraclient::commands::install::{FailurePolicy, InstallOptions, Installer};
use oraclient::commands::uninstall::uninstall;
use oraclient::core::config::{Platform, PlatformTable};
use oraclient::core::http::ReqwestClient;

#[derive(Parser)]
#[clap(name = "oraclient")]
#[clap(about = "Install the Oracle Instant Client (basic + SDK archives)")]
#[clap(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Installation root directory
    #[clap(default_value = ".oracle")]
    root: PathBuf,
    /// Platform whose archives are installed (default: this machine)
    #[clap(long, value_enum)]
    platform: Option<Platform>,
    /// Download the archives from this base URL instead
    #[clap(long)]
    base_url: Option<String>,
    /// JSON file replacing the built-in archive table
    #[clap(long)]
    mirror_config: Option<PathBuf>,
    /// Directory the archives are downloaded to
    #[clap(long, default_value = ".")]
    work_dir: PathBuf,
    /// Keep going after a failed download, or stop at the first failing stage
    #[clap(long, value_enum, default_value_t = FailurePolicy::Lenient)]
    policy: FailurePolicy,
    /// Abort a download after this many seconds
    #[clap(long)]
    timeout: Option<u64>,
    /// Only remove the installation root
    #[clap(long)]
    uninstall: bool,
    /// Show debug logs on stderr
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "oraclient=debug"
    } else {
        "oraclient=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    if cli.uninstall {
        uninstall(&cli.root)?;
        println!("Removed {}", cli.root.display());
        return Ok(0);
    }

    let platform = match cli.platform {
        Some(platform) => platform,
        None => Platform::current()?,
    };

    let mut table = match &cli.mirror_config {
        Some(path) => PlatformTable::load(path)?,
        None => PlatformTable::default(),
    };
    if let Some(base_url) = cli.base_url {
        table = table.with_base_url(base_url);
    }

    let client = ReqwestClient::with_timeout(cli.timeout.map(Duration::from_secs))?;
    let options = InstallOptions::new(cli.root, platform)
        .with_work_dir(cli.work_dir)
        .with_table(table)
        .with_policy(cli.policy);

    let outcome = Installer::new(client, options).run();
    let code = outcome.exit_code();
    if let Err(e) = outcome.into_result() {
        eprintln!("Error: {e}");
    }
    Ok(code)
}
