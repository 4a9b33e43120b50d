use std::sync::Arc;

use otb_core::{
    commands::{BotCommand, BotServices},
    domain::ChatId,
    formatting::html_to_plain,
    messaging::{
        port::MessagingPort,
        types::{ChatAction, TextFormat},
    },
    utils::truncate_text,
};

use crate::router::AppState;

const INTERNAL_ERROR: &str = "Произошла ошибка. Попробуйте позже.";

pub(super) async fn handle_command(chat_id: i64, text: &str, state: Arc<AppState>) {
    respond(
        &state.services,
        state.messenger.as_ref(),
        ChatId(chat_id),
        text,
    )
    .await;
}

/// Parse, execute and answer a single command. Failures are logged, never propagated.
async fn respond(services: &BotServices, messenger: &dyn MessagingPort, chat_id: ChatId, text: &str) {
    let Some(command) = BotCommand::parse(text) else {
        return;
    };
    tracing::info!(chat_id = chat_id.0, ?command, "command received");

    if command.shows_typing() && messenger.capabilities().supports_chat_actions {
        let _ = messenger.send_chat_action(chat_id, ChatAction::Typing).await;
    }

    // Command execution touches files; keep it off the async workers.
    let exec = {
        let services = services.clone();
        let command = command.clone();
        tokio::task::spawn_blocking(move || services.execute(chat_id, &command)).await
    };

    let reply = match exec {
        Ok(Ok(reply)) => reply,
        Ok(Err(e)) => {
            tracing::error!(chat_id = chat_id.0, ?command, error = %e, "command failed");
            let _ = messenger
                .send_text(chat_id, INTERNAL_ERROR, TextFormat::Plain)
                .await;
            return;
        }
        Err(e) => {
            tracing::error!(chat_id = chat_id.0, ?command, error = %e, "command task panicked");
            return;
        }
    };

    // A cut can land inside a tag or entity, so oversized replies go out as plain text.
    let limit = messenger.capabilities().max_message_len;
    let (body, format) = if reply.text.chars().count() > limit {
        let plain = match reply.format {
            TextFormat::Html => html_to_plain(&reply.text),
            TextFormat::Plain => reply.text,
        };
        (truncate_text(&plain, limit.saturating_sub(3)), TextFormat::Plain)
    } else {
        (reply.text, reply.format)
    };

    if let Err(e) = messenger.send_text(chat_id, &body, format).await {
        tracing::warn!(chat_id = chat_id.0, error = %e, "reply not delivered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use otb_core::{
        bible::{CorpusPaths, VerseSource},
        calendar::HolidayCalendar,
        catalog::ContentCatalog,
        content::ContentSelector,
        domain::{MessageId, MessageRef},
        messaging::types::MessagingCapabilities,
        picker::RandomPicker,
        subscribers::SubscriberRegistry,
        Result,
    };
    use std::sync::Mutex;

    struct FakeMessenger {
        max_len: usize,
        actions: Mutex<Vec<ChatAction>>,
        texts: Mutex<Vec<(String, TextFormat)>>,
    }

    impl Default for FakeMessenger {
        fn default() -> Self {
            Self::with_limit(4096)
        }
    }

    impl FakeMessenger {
        fn with_limit(max_len: usize) -> Self {
            Self {
                max_len,
                actions: Mutex::new(Vec::new()),
                texts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MessagingPort for FakeMessenger {
        fn capabilities(&self) -> MessagingCapabilities {
            MessagingCapabilities {
                supports_chat_actions: true,
                max_message_len: self.max_len,
            }
        }

        async fn send_text(
            &self,
            chat_id: ChatId,
            text: &str,
            format: TextFormat,
        ) -> Result<MessageRef> {
            self.texts.lock().unwrap().push((text.to_string(), format));
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(1),
            })
        }

        async fn send_chat_action(&self, _chat_id: ChatId, action: ChatAction) -> Result<()> {
            self.actions.lock().unwrap().push(action);
            Ok(())
        }
    }

    fn services(dir: &std::path::Path) -> BotServices {
        let catalog = Arc::new(ContentCatalog::default());
        let paths = CorpusPaths::new(
            dir.join("missing.xml"),
            dir.join("bible_verses.jsonl"),
            dir.join("bible_index.json"),
        );
        BotServices {
            content: Arc::new(ContentSelector::new(
                catalog.clone(),
                VerseSource::new(paths),
                Arc::new(RandomPicker::seeded(1)),
            )),
            calendar: Arc::new(HolidayCalendar::new(catalog)),
            subscribers: Arc::new(
                SubscriberRegistry::open(dir.join("subscribers.json")).unwrap(),
            ),
        }
    }

    #[tokio::test]
    async fn quote_sends_typing_then_html_reply() {
        let dir = tempfile::tempdir().unwrap();
        let m = FakeMessenger::default();
        respond(&services(dir.path()), &m, ChatId(5), "/quote").await;

        assert_eq!(*m.actions.lock().unwrap(), vec![ChatAction::Typing]);
        let texts = m.texts.lock().unwrap();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].0, "📖 Файл Библии не найден.");
        assert_eq!(texts[0].1, TextFormat::Html);
    }

    #[tokio::test]
    async fn start_subscribes_chat() {
        let dir = tempfile::tempdir().unwrap();
        let s = services(dir.path());
        let m = FakeMessenger::default();
        respond(&s, &m, ChatId(-100500), "/start@orthodox_bot").await;

        assert_eq!(s.subscribers.list().unwrap(), vec![ChatId(-100500)]);
        assert!(m.actions.lock().unwrap().is_empty());
        assert_eq!(m.texts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn plain_text_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let m = FakeMessenger::default();
        respond(&services(dir.path()), &m, ChatId(1), "привет").await;
        assert!(m.texts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn registry_failure_gets_generic_reply() {
        let dir = tempfile::tempdir().unwrap();
        let s = services(dir.path());
        std::fs::write(s.subscribers.path(), "{broken").unwrap();
        let m = FakeMessenger::default();
        respond(&s, &m, ChatId(1), "/subscribe").await;

        let texts = m.texts.lock().unwrap();
        assert_eq!(texts[0].0, INTERNAL_ERROR);
        assert_eq!(texts[0].1, TextFormat::Plain);
    }

    #[tokio::test]
    async fn saint_sends_typing() {
        let dir = tempfile::tempdir().unwrap();
        let m = FakeMessenger::default();
        respond(&services(dir.path()), &m, ChatId(5), "/saint Серафим").await;

        assert_eq!(*m.actions.lock().unwrap(), vec![ChatAction::Typing]);
        assert_eq!(m.texts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn oversized_html_reply_is_sent_as_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let m = FakeMessenger::with_limit(20);
        respond(&services(dir.path()), &m, ChatId(5), "/help").await;

        let texts = m.texts.lock().unwrap();
        let (body, format) = &texts[0];
        assert_eq!(*format, TextFormat::Plain);
        assert_eq!(body.chars().count(), 20);
        assert!(body.ends_with("..."));
        assert!(!body.contains('<'));
        assert!(!body.contains('&'));
    }

    #[tokio::test]
    async fn short_html_reply_keeps_its_format() {
        let dir = tempfile::tempdir().unwrap();
        let m = FakeMessenger::default();
        respond(&services(dir.path()), &m, ChatId(5), "/help").await;

        let texts = m.texts.lock().unwrap();
        assert!(texts[0].0.contains("<b>Команды:</b>"));
        assert_eq!(texts[0].1, TextFormat::Html);
    }
}
