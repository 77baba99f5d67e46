//! 🚀 s3df-cli — the front door, the bouncer, the maitre d' of s3df.
//!
//! 🎬 *[narrator voice]* "It all started with a simple main() function..."
//! 📦 This binary crate is the thin CLI wrapper that loads config, sets up logging,
//! scans the bucket, and prints a table about it. Like a manager. 🦆

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// 🪣 Scan an object-storage prefix as a partitioned data source.
#[derive(Debug, Parser)]
#[command(name = "s3df-cli", version, about)]
struct Cli {
    /// 🔧 TOML config file. If it doesn't exist, config comes from S3DF_* env vars alone.
    #[arg(default_value = "s3df.toml")]
    config: PathBuf,

    /// 🙈 No spinner. For CI logs and other places that hate carriage returns.
    #[arg(long)]
    quiet: bool,
}

/// 🚀 main() — where it all begins. The "I pressed F5 and held my breath" moment.
///
/// 🔧 Steps:
/// 1. Init tracing (so we can see what goes wrong, and when)
/// 2. Parse args
/// 3. Load config (the moment of truth)
/// 4. Scan (send it and pray 🙏)
/// 5. Print the table, or the error chain
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // 🔒 A missing file is fine (env-only mode). An unreadable path is not.
    let config_file_exists = cli.config.try_exists().context(format!(
        "💀 Couldn't check whether the configuration file exists. If it's a relative path, \
         try an absolute one. Was checking here: '{}'",
        cli.config.display()
    ))?;
    let config_file = config_file_exists.then_some(cli.config.as_path());

    let app_config = s3df::app_config::load_config(config_file).context(
        "💀 In s3df-cli, main, we couldn't load the config. Make sure there's a [source] \
         with a bucket and a [store.S3] or [store.InMemory] table",
    )?;

    let the_label = format!(
        "s3://{}/{}",
        app_config.source.bucket, app_config.source.prefix
    );
    let progress = if cli.quiet {
        s3df::ScanProgress::hidden(the_label)
    } else {
        s3df::ScanProgress::new(the_label)
    };
    let elapsed_clock = progress.clone();

    match s3df::run(app_config, progress).await {
        Ok(summary) => {
            println!(
                "{}",
                s3df::progress::render_summary(&summary, elapsed_clock.elapsed())
            );
            Ok(())
        }
        Err(err) => {
            error!("💀 error: {}", err);
            // -- 🧅 peel the onion of sadness, one layer at a time
            let mut the_vibes_are_giving_credential_issues = false;
            for cause in err.chain().skip(1) {
                error!("⚠️  cause: {}", cause);
                let cause_str = cause.to_string();
                if cause_str.contains("AccessDenied")
                    || cause_str.contains("InvalidAccessKeyId")
                    || cause_str.contains("credentials")
                {
                    the_vibes_are_giving_credential_issues = true;
                }
            }

            if the_vibes_are_giving_credential_issues {
                error!(
                    "🔧 hint: this smells like credentials. Check AWS_PROFILE / AWS_ACCESS_KEY_ID, \
                     and whether the bucket needs request_payer = \"requester\"."
                );
            }

            // 🗑️ Exit with prejudice. Process exitus maximus.
            std::process::exit(1);
        }
    }
}
