//! btc-jornal CLI: watch the chain for `/BJ` messages, or list the saved journal.
use std::path::PathBuf;

use anyhow::Context;
use btc_jornal::{
    config::Config,
    i18n::Language,
    ledger::{Ledger, SqliteLedger},
    presenter::prompt_line,
    walker::BlockWalker,
    EsploraSource, TerminalPresenter,
};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Follow the Bitcoin chain and journal OP_RETURN messages starting with /BJ.
#[derive(Parser)]
#[command(name = "btc-jornal", version, about)]
struct Cli {
    /// JSON config file; flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite journal file.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Operator language (pt or en). Prompted for when omitted.
    #[arg(long, global = true)]
    lang: Option<Language>,

    /// Log filter, e.g. `info` or `btc_jornal=debug`. `RUST_LOG` wins when set.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Replay recent blocks, then follow the tip (default).
    Watch {
        /// Esplora API base URL.
        #[arg(long)]
        api: Option<String>,
        /// Blocks replayed on startup.
        #[arg(long)]
        window: Option<u32>,
        /// Seconds between tip polls.
        #[arg(long)]
        poll_interval: Option<u64>,
        /// Seconds to wait after a provider error.
        #[arg(long)]
        error_backoff: Option<u64>,
        /// Block fetches kept in flight during catch-up.
        #[arg(long)]
        prefetch: Option<usize>,
        /// Do not prompt between blocks.
        #[arg(long)]
        follow: bool,
    },
    /// Print the most recent journal records.
    History {
        /// Number of records.
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let mut cfg = Config::load_or_default(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        cfg.db_path = db;
    }
    if let Some(lang) = cli.lang {
        cfg.language = Some(lang);
    }

    match cli.command.unwrap_or(Command::Watch {
        api: None,
        window: None,
        poll_interval: None,
        error_backoff: None,
        prefetch: None,
        follow: false,
    }) {
        Command::Watch {
            api,
            window,
            poll_interval,
            error_backoff,
            prefetch,
            follow,
        } => {
            if let Some(api) = api {
                cfg.api_base = api;
            }
            if let Some(w) = window {
                cfg.window = w;
            }
            if let Some(s) = poll_interval {
                cfg.poll_interval_secs = s;
            }
            if let Some(s) = error_backoff {
                cfg.error_backoff_secs = s;
            }
            if let Some(n) = prefetch {
                cfg.prefetch = n;
            }
            cfg.auto_advance |= follow;
            watch_chain(cfg).await
        }
        Command::History { limit } => history(cfg, limit).await,
    }
}

async fn choose_language(preset: Option<Language>) -> anyhow::Result<Language> {
    if let Some(lang) = preset {
        return Ok(lang);
    }
    let prompt = Language::En.messages().choose_lang;
    loop {
        let Some(answer) = prompt_line(prompt).await? else {
            anyhow::bail!("stdin closed before a language was chosen");
        };
        if let Ok(lang) = answer.parse() {
            return Ok(lang);
        }
    }
}

async fn watch_chain(cfg: Config) -> anyhow::Result<()> {
    let lang = choose_language(cfg.language).await?;
    let presenter = TerminalPresenter::new(lang, cfg.auto_advance);
    presenter.intro();

    let ledger = SqliteLedger::new(&cfg.db_path)
        .with_context(|| format!("open journal at {}", cfg.db_path.display()))?;
    let source = EsploraSource::with_timeout(&cfg.api_base, cfg.request_timeout())?;
    tracing::info!(api = source.base(), db = %cfg.db_path.display(), "btc-jornal starting");

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping at next block boundary");
            let _ = stop_tx.send(true);
        }
    });

    let mut walker = BlockWalker::new(source, ledger, presenter)
        .with_config(cfg.walker())
        .with_shutdown(stop_rx);
    walker.run().await?;
    // an abandoned stdin prompt would otherwise keep the runtime from shutting down
    std::process::exit(0)
}

async fn history(cfg: Config, limit: usize) -> anyhow::Result<()> {
    let msgs = cfg.language.unwrap_or(Language::En).messages();
    let ledger = SqliteLedger::new(&cfg.db_path)
        .with_context(|| format!("open journal at {}", cfg.db_path.display()))?;
    let records = ledger.recent(limit).await?;
    if records.is_empty() {
        println!("{}", msgs.history_empty);
        return Ok(());
    }
    for r in records.iter().rev() {
        println!(
            "#{:<5} {}  {:>7}  {}  {}",
            r.id, r.recorded_at, r.block_height, r.txid, r.message
        );
    }
    Ok(())
}
