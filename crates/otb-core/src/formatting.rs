//! Message rendering for Telegram HTML parse mode.

use crate::domain::{PrayerText, Quote};

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Drop tags and decode the entities `escape_html` produces, for sending
/// rendered HTML as plain text.
pub fn html_to_plain(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

pub fn welcome() -> String {
    "Мир вам! 🙏\n\
Я буду уведомлять вас о православных праздниках.\n\n\
<b>Команды:</b>\n\
/pray — Случайная молитва (/pray цс — на церковнославянском)\n\
/quote — Цитата из Библии\n\
/saint — Цитата святого (/saint Имя — конкретного святого)\n\
/holiday — Какой сегодня праздник?\n\
/subscribe — Подписаться на ежедневные уведомления\n\
/unsubscribe — Отписаться от уведомлений"
        .to_string()
}

pub fn holiday_reply(holiday: Option<&str>) -> String {
    match holiday {
        Some(name) => format!("📅 Сегодня: <b>{}</b>", escape_html(name)),
        None => "Сегодня нет великих двунадесятых праздников.".to_string(),
    }
}

pub fn prayer(p: &PrayerText) -> String {
    match &p.title {
        Some(title) => format!(
            "🙏 <b>{}</b>\n\n{}",
            escape_html(title),
            escape_html(&p.text)
        ),
        None => escape_html(&p.text),
    }
}

/// Quote body with an optional `— <author>` line.
pub fn quote_body(q: &Quote) -> String {
    let mut out = escape_html(&q.text);
    if let Some(author) = &q.author {
        out.push_str(&format!("\n\n— <b>{}</b>", escape_html(author)));
    }
    out
}

pub fn quote(q: &Quote) -> String {
    format!("📖 {}", quote_body(q))
}

pub fn saint_not_found(message: &str, saints: &[String]) -> String {
    let mut out = format!("❌ {}", escape_html(message));
    if !saints.is_empty() {
        out.push_str("\n\n📿 Доступные святые:\n");
        let lines = saints
            .iter()
            .map(|s| format!("• {}", escape_html(s)))
            .collect::<Vec<_>>()
            .join("\n");
        out.push_str(&lines);
    }
    out
}

/// Newsletter message: bold header line, blank line, body (already HTML).
pub fn newsletter(header: &str, body_html: &str) -> String {
    format!("<b>{}</b>\n\n{body_html}", escape_html(header))
}

pub fn holiday_newsletter(holiday: &str) -> String {
    format!(
        "🔔 Православный календарь\n\nСегодня праздник: <b>{}</b>",
        escape_html(holiday)
    )
}
