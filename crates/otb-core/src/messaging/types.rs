/// How the receiving client should interpret message text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TextFormat {
    #[default]
    Plain,
    /// Telegram HTML subset (`<b>`, `<i>`, `<code>`, ...). Content must be escaped.
    Html,
}

/// Outgoing "chat action" (typing indicator).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatAction {
    Typing,
}

/// Capabilities / feature flags of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_chat_actions: bool,
    pub max_message_len: usize,
}
