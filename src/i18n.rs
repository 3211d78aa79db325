//! Localized operator strings, resolved once per run.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Languages the operator can pick at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Portuguese (`pt`).
    Pt,
    /// English (`en`).
    En,
}

impl Language {
    /// Template set for this language.
    pub fn messages(self) -> &'static Messages {
        match self {
            Language::Pt => &PT,
            Language::En => &EN,
        }
    }
}

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pt" => Ok(Language::Pt),
            "en" => Ok(Language::En),
            other => Err(UnknownLanguage(other.to_owned())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Language::Pt => "pt",
            Language::En => "en",
        })
    }
}

/// Returned when a language code is neither `pt` nor `en`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown language {0:?} (expected pt or en)")]
pub struct UnknownLanguage(pub String);

/// One language's operator-facing templates.
///
/// Placeholders: `{height}`, `{hash}`, `{error}`, `{id}`.
#[derive(Debug)]
pub struct Messages {
    /// Asked before any language is known, so it is bilingual.
    pub choose_lang: &'static str,
    /// Shown once after the language is chosen.
    pub intro: &'static str,
    /// Appended to the intro when the operator paces the blocks.
    pub keys_hint: &'static str,
    /// Block header line.
    pub block: &'static str,
    /// Shown under a highlighted journal message.
    pub saving: &'static str,
    /// Save confirmation.
    pub saved: &'static str,
    /// Farewell line.
    pub exit: &'static str,
    /// Printed after the farewell.
    pub support: &'static str,
    /// Donation address under [`Messages::support`].
    pub btc_addr: &'static str,
    /// Error report line.
    pub error: &'static str,
    /// Per-block pacing prompt.
    pub prompt_next: &'static str,
    /// Title line of the journal highlight box.
    pub banner: &'static str,
    /// Shown when the backlog is done.
    pub live: &'static str,
    /// `history` with an empty journal.
    pub history_empty: &'static str,
}

impl Messages {
    /// Intro banner; the key hint only when a prompt will follow each block.
    pub fn intro_text(&self, interactive: bool) -> String {
        if interactive {
            format!("{}\n{}", self.intro, self.keys_hint)
        } else {
            self.intro.to_owned()
        }
    }

    /// `📦 Block 840000 (hash)`.
    pub fn block_line(&self, height: u32, hash: &str) -> String {
        self.block
            .replace("{height}", &height.to_string())
            .replace("{hash}", hash)
    }

    /// Save confirmation carrying the new record id.
    pub fn saved_line(&self, id: i64) -> String {
        self.saved.replace("{id}", &id.to_string())
    }

    /// Error report line.
    pub fn error_line(&self, error: &str) -> String {
        self.error.replace("{error}", error)
    }
}

const CHOOSE_LANG: &str = "Escolha idioma / Choose language: [pt/en] ";
const BTC_ADDR: &str = "   BTC: bc1qfvh7lwy7rrazsxdmdtjpx70ytjg3shgh6rtlm0";

static PT: Messages = Messages {
    choose_lang: CHOOSE_LANG,
    intro: "📡 BTC Jornal CLI iniciado\n\n\
            Este programa busca mensagens OP_RETURN na blockchain Bitcoin\n\
            que começam com '/BJ' e as destaca como mensagens do BTC Jornal Mundial.\n\
            As mensagens podem conter qualquer conteúdo, incluindo links.\n\
            ⚠️ Atenção: cuidado com links maliciosos e conteúdos não verificados.\n\
            Use com responsabilidade.\n",
    keys_hint: "Pressione Enter para avançar para o próximo bloco, ou 'q' para sair.\n",
    block: "📦 Bloco {height} ({hash})\n",
    saving: "💾 Salvando mensagem /BJ no banco de dados.",
    saved: "💾 Mensagem /BJ salva (#{id}).",
    exit: "\n👋 Encerrando BTC Jornal CLI.",
    support: "💡 Motive o desenvolvedor / Support the developer",
    btc_addr: BTC_ADDR,
    error: "⚠️ Erro: {error}",
    prompt_next: "Pressione Enter para próximo bloco, ou 'q' para sair: ",
    banner: "/BJ BTC Jornal Mundial",
    live: "⏳ Acompanhando novos blocos...",
    history_empty: "Nenhuma mensagem /BJ registrada ainda.",
};

static EN: Messages = Messages {
    choose_lang: CHOOSE_LANG,
    intro: "📡 BTC Jornal CLI started\n\n\
            This program fetches OP_RETURN messages from the Bitcoin blockchain\n\
            that start with '/BJ' and highlights them as BTC World Journal messages.\n\
            Messages may contain any content, including links.\n\
            ⚠️ Warning: be careful with malicious links and unverified content.\n\
            Use responsibly.\n",
    keys_hint: "Press Enter to move to the next block, or 'q' to quit.\n",
    block: "📦 Block {height} ({hash})\n",
    saving: "💾 Saving /BJ message to database.",
    saved: "💾 /BJ message saved (#{id}).",
    exit: "\n👋 Exiting BTC Jornal CLI.",
    support: "💡 Support the developer",
    btc_addr: BTC_ADDR,
    error: "⚠️ Error: {error}",
    prompt_next: "Press Enter for next block, or 'q' to quit: ",
    banner: "/BJ BTC World Journal",
    live: "⏳ Following new blocks...",
    history_empty: "No /BJ messages recorded yet.",
};
