//! CLI for the Plazmer download core: a headless host for desktop and CI use.

mod commands;
mod host;

use anyhow::Result;
use clap::{Parser, Subcommand};
use plazmer_core::config;

use commands::{
    run_age, run_cache, run_classify, run_cleanup, run_download_start, run_open, run_save_blob,
    run_script,
};

/// Top-level CLI for the Plazmer shell's download core.
#[derive(Debug, Parser)]
#[command(name = "plazmer")]
#[command(about = "Plazmer: download interception, blob extraction and offline cache", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Show how a navigation to URL would be treated (ignorable, blob, file).
    Classify {
        /// URL as the web view would report it.
        url: String,
    },

    /// Navigate to URL as the web view would: classify, confirm, download.
    Open {
        url: String,
        /// Accept the confirmation prompt without asking.
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Replay a native download-start event.
    DownloadStart {
        url: String,
        /// Raw Content-Disposition header.
        #[arg(long, value_name = "HEADER")]
        content_disposition: Option<String>,
        /// Reported MIME type.
        #[arg(long)]
        mime: Option<String>,
        /// Reported content length in bytes (0 = unknown).
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        length: i64,
        /// User agent of the page.
        #[arg(long)]
        user_agent: Option<String>,
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Deliver a blob payload as the page's bridge callback would.
    SaveBlob {
        /// Base64 payload (no data: prefix).
        base64: String,
        /// MIME type reported by the page.
        mime: String,
        /// Size reported by the page.
        #[arg(allow_negative_numbers = true)]
        size: i64,
    },

    /// Print the extraction script injected for a blob URL.
    Script {
        blob_url: String,
    },

    /// Inspect or maintain the offline cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Read or set the age-gate answer (content stays blocked until true).
    Age {
        #[arg(long, value_name = "true|false")]
        set: Option<bool>,
    },

    /// Remove leftover `.part` files and staged transfers from interrupted runs.
    Cleanup,
}

#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Look up URL; write the body to --output or print a summary.
    Get {
        url: String,
        #[arg(long, short = 'o')]
        output: Option<String>,
    },

    /// Store a file's contents for URL.
    Put {
        url: String,
        path: String,
        /// MIME type; guessed from the file extension when omitted.
        #[arg(long)]
        mime: Option<String>,
    },

    /// Evict entries not accessed within the retention window.
    Sweep {
        /// Override the configured retention (days).
        #[arg(long)]
        days: Option<u64>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Classify { url } => run_classify(&cfg, &url),
            CliCommand::Open { url, yes } => run_open(cfg, &url, yes).await?,
            CliCommand::DownloadStart {
                url,
                content_disposition,
                mime,
                length,
                user_agent,
                yes,
            } => {
                let event = plazmer_core::intercept::DownloadStart {
                    url,
                    user_agent,
                    content_disposition,
                    mime_type: mime,
                    content_length: length,
                };
                run_download_start(cfg, event, yes).await?;
            }
            CliCommand::SaveBlob { base64, mime, size } => {
                run_save_blob(cfg, &base64, &mime, size).await?
            }
            CliCommand::Script { blob_url } => run_script(&cfg, &blob_url),
            CliCommand::Cache { action } => run_cache(&cfg, action).await?,
            CliCommand::Age { set } => run_age(set)?,
            CliCommand::Cleanup => run_cleanup(&cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
