//! Operator glue: display walker events and pace the backlog replay.
use std::io::{self, Write};

use async_trait::async_trait;
use colored::Colorize;
use tokio::task;

use crate::chain_source::Block;
use crate::decoder::DecodedMessage;
use crate::i18n::{Language, Messages};

/// Operator answer after each processed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Go on with the next block.
    Continue,
    /// Stop the walker for good.
    Quit,
}

/// Receives everything the walker wants the operator to see.
///
/// Errors returned from these methods are treated as unrecoverable.
#[async_trait]
pub trait Presenter: Send + Sync {
    /// A block is about to be scanned.
    async fn on_block(&self, block: &Block) -> anyhow::Result<()>;
    /// A `/BJ` message was found (called before it is saved).
    async fn on_journal(&self, msg: &DecodedMessage) -> anyhow::Result<()>;
    /// Any other OP_RETURN text.
    async fn on_note(&self, msg: &DecodedMessage) -> anyhow::Result<()>;
    /// The ledger stored `msg` under `id`.
    async fn on_saved(&self, msg: &DecodedMessage, id: i64) -> anyhow::Result<()>;
    /// A recoverable error: fetch failure before a retry, or a dropped record.
    async fn on_error(&self, error: &str) -> anyhow::Result<()>;
    /// Asked after every fully processed block.
    async fn pace(&self) -> anyhow::Result<Pacing>;

    /// The backlog is done and the walker is now following the tip.
    async fn on_live(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once when the walker terminates.
    async fn on_exit(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Localized stdout presenter with a stdin Enter/`q` prompt.
pub struct TerminalPresenter {
    msgs: &'static Messages,
    auto_advance: bool,
}

impl TerminalPresenter {
    /// Presenter speaking `lang`. With `auto_advance` it never prompts.
    pub fn new(lang: Language, auto_advance: bool) -> Self {
        Self {
            msgs: lang.messages(),
            auto_advance,
        }
    }

    /// Print the localized intro banner.
    pub fn intro(&self) {
        println!("{}", self.msgs.intro_text(!self.auto_advance));
    }

    fn highlight(&self, text: &str) {
        let mut lines = vec![self.msgs.banner, ""];
        lines.extend(text.trim().split('\n'));
        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let border = "*".repeat(width + 6);

        println!();
        println!("{}", border.on_yellow().black().bold());
        for line in lines {
            let padded = format!("** {line:<width$} **");
            println!("{}", padded.on_yellow().black().bold());
        }
        println!("{}", border.on_yellow().black().bold());
        println!();
    }
}

/// Ask on stdout, read one line from stdin. `None` on EOF.
pub async fn prompt_line(prompt: &str) -> anyhow::Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    task::spawn_blocking(|| -> anyhow::Result<Option<String>> {
        let mut line = String::new();
        let n = io::stdin().read_line(&mut line)?;
        Ok(if n == 0 { None } else { Some(line) })
    })
    .await?
}

#[async_trait]
impl Presenter for TerminalPresenter {
    async fn on_block(&self, block: &Block) -> anyhow::Result<()> {
        println!("{}", self.msgs.block_line(block.height, &block.hash.to_string()));
        Ok(())
    }

    async fn on_journal(&self, msg: &DecodedMessage) -> anyhow::Result<()> {
        self.highlight(&msg.text);
        println!("{}", self.msgs.saving);
        Ok(())
    }

    async fn on_note(&self, msg: &DecodedMessage) -> anyhow::Result<()> {
        println!("📝 {}", msg.text);
        Ok(())
    }

    async fn on_saved(&self, _msg: &DecodedMessage, id: i64) -> anyhow::Result<()> {
        println!("{}", self.msgs.saved_line(id).green());
        Ok(())
    }

    async fn on_error(&self, error: &str) -> anyhow::Result<()> {
        eprintln!("{}", self.msgs.error_line(error).red());
        Ok(())
    }

    async fn pace(&self) -> anyhow::Result<Pacing> {
        if self.auto_advance {
            return Ok(Pacing::Continue);
        }
        match prompt_line(self.msgs.prompt_next).await? {
            Some(answer) if answer.trim().eq_ignore_ascii_case("q") => Ok(Pacing::Quit),
            Some(_) => Ok(Pacing::Continue),
            None => Ok(Pacing::Quit),
        }
    }

    async fn on_live(&self) -> anyhow::Result<()> {
        println!("{}", self.msgs.live);
        Ok(())
    }

    async fn on_exit(&self) -> anyhow::Result<()> {
        println!("{}", self.msgs.exit);
        println!("{}", self.msgs.support);
        println!("{}", self.msgs.btc_addr);
        io::stdout().flush()?;
        Ok(())
    }
}
