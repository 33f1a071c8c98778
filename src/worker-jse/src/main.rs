use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use core_jse::browser::{BrowserProcess, LaunchOptions};
use core_jse::{get_db_pool, setup_logging};
use data_model_jse::{PgLinkStore, Site};
use worker_jse::{PipelineContext, run_site};

#[derive(Parser)]
#[command(name = "worker-jse")]
#[command(about = "Capture descriptions and application links for a site's unprocessed jobs", long_about = None)]
struct WorkerCli {
    /// Site whose job links are processed: linkedin or xing
    #[arg(short, long)]
    site: Site,

    /// Launch Chromium with remote debugging before the run and stop it afterwards
    #[arg(long)]
    launch_browser: bool,

    /// Seconds to wait for a launched browser's debugger
    #[arg(long, default_value_t = 15)]
    launch_wait_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file., if it exists
    dotenvy::dotenv().ok();

    setup_logging("worker_jse=debug,core_jse=debug");

    let cli = WorkerCli::parse();

    let browser_process = if cli.launch_browser {
        let process = BrowserProcess::start(&LaunchOptions::from_env()?)?;
        process.wait_ready(Duration::from_secs(cli.launch_wait_secs)).await?;
        Some(process)
    } else {
        None
    };

    let pool = get_db_pool().await?;
    let store = Arc::new(PgLinkStore::new(pool));

    let result = match PipelineContext::connect(store).await {
        Ok(ctx) => run_site(Arc::new(ctx), cli.site).await,
        Err(e) => Err(e),
    };

    if let Some(process) = browser_process
        && let Err(e) = process.stop().await
    {
        tracing::warn!("Failed to stop browser: {}", e);
    }

    let summary = result?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
