use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use core_jse::browser::{BrowserProcess, LaunchOptions, wait_for_debugger};
use core_jse::{BrowserSettings, Summarizer, normalize_description, setup_logging};

#[derive(Parser)]
#[command(name = "core-jse")]
#[command(about = "One-off runs of the job-link pipeline's building blocks", long_about = None)]
struct CoreCli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a file's text normalized the way stored descriptions are
    Normalize {
        #[arg(short, long, value_parser = validate_input_file)]
        file: PathBuf,
    },

    /// Summarize a job description file with the configured backends and print the JSON
    Summarize {
        #[arg(short, long, value_parser = validate_input_file)]
        file: PathBuf,
    },

    /// Check that the browser's DevTools endpoint answers
    Browser {
        /// Launch Chromium with remote debugging first (CHROMIUM_PATH, CHROMIUM_PROFILE)
        #[arg(long)]
        launch: bool,
        /// Seconds to wait for the endpoint
        #[arg(long, default_value_t = 10)]
        wait_secs: u64,
    },
}

fn validate_input_file(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);

    if !path.exists() {
        return Err(format!("Input path does not exist: {}", path.display()));
    }

    if !path.is_file() {
        return Err(format!("Input path is not a file: {}", path.display()));
    }

    Ok(path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_logging("core_jse=info");

    let cli = CoreCli::parse();

    match cli.command {
        Commands::Normalize { file } => {
            let content = std::fs::read_to_string(&file)?;
            println!("{}", normalize_description(&content));
        }

        Commands::Summarize { file } => {
            let content = std::fs::read_to_string(&file)?;
            let summarizer = Summarizer::from_env()?;
            let summary = summarizer.summarize(&normalize_description(&content)).await?;
            let json = serde_json::json!({
                "job_type": summary.job_type.as_str(),
                "skills": summary.skills,
                "description": summary.description,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }

        Commands::Browser { launch, wait_secs } => {
            let timeout = Duration::from_secs(wait_secs);
            if launch {
                let process = BrowserProcess::start(&LaunchOptions::from_env()?)?;
                let ws_url = process.wait_ready(timeout).await?;
                println!("Browser is up at {} (DevTools: {})", process.endpoint(), ws_url);
                println!("Press Ctrl-C to stop it");
                tokio::signal::ctrl_c().await?;
                process.stop().await?;
            } else {
                let settings = BrowserSettings::from_env()?;
                let ws_url = wait_for_debugger(&settings.endpoint, timeout).await?;
                println!("Browser debugger at {} is reachable: {}", settings.endpoint, ws_url);
            }
        }
    }

    Ok(())
}
