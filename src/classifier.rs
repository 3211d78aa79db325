/// Marker that turns an OP_RETURN payload into a journal entry.
pub const JOURNAL_PREFIX: &str = "/BJ";

/// How a decoded payload is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Starts with [`JOURNAL_PREFIX`]: highlighted and persisted.
    Journal,
    /// Anything else: displayed only.
    Note,
}

/// `true` iff `text` starts with `/BJ`. Case-sensitive, no trimming.
pub fn is_tracked(text: &str) -> bool {
    text.starts_with(JOURNAL_PREFIX)
}

/// Route a decoded payload.
pub fn classify(text: &str) -> MessageKind {
    if is_tracked(text) {
        MessageKind::Journal
    } else {
        MessageKind::Note
    }
}
