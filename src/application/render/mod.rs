//! HTML page rendering
//!
//! Produces the guestbook page from the full message sequence. Output depends
//! only on the input and the page title, so two renders of the same store
//! state are byte-identical.

use crate::domain::entities::Message;

pub const DEFAULT_TITLE: &str = "Guestbook";

/// Renders the message listing, newest first
#[derive(Debug, Clone)]
pub struct PageRenderer {
    title: String,
}

impl PageRenderer {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Render `messages` (oldest first, as returned by the store)
    pub fn render(&self, messages: &[Message]) -> String {
        let title = escape_html(&self.title);
        let mut html = String::with_capacity(512 + messages.len() * 128);

        html.push_str("<!DOCTYPE html>\n");
        html.push_str("<html lang=\"en\">\n<head>\n");
        html.push_str("<meta charset=\"utf-8\">\n");
        html.push_str(&format!("<title>{}</title>\n", title));
        html.push_str("</head>\n<body>\n");
        html.push_str(&format!("<h1>{}</h1>\n", title));

        html.push_str("<form method=\"post\" action=\"/\">\n");
        html.push_str("<textarea name=\"message\" rows=\"4\" cols=\"60\" required></textarea>\n");
        html.push_str("<button type=\"submit\">Sign the guestbook</button>\n");
        html.push_str("</form>\n");

        if messages.is_empty() {
            html.push_str("<p class=\"empty\">No messages yet.</p>\n");
        } else {
            html.push_str("<ul class=\"messages\">\n");
            for message in messages.iter().rev() {
                html.push_str(&format!(
                    "<li id=\"m{}\"><time datetime=\"{}\">{}</time><p>{}</p></li>\n",
                    message.identity,
                    message.received_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                    message.received_at.format("%Y-%m-%d %H:%M:%S UTC"),
                    escape_html(&message.content),
                ));
            }
            html.push_str("</ul>\n");
        }

        html.push_str("</body>\n</html>\n");
        html
    }
}

impl Default for PageRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE)
    }
}

/// Escape text for use in HTML element content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Identity, MessageContent};
    use chrono::{TimeZone, Utc};

    fn message(seq: u64, text: &str) -> Message {
        let at = Utc.timestamp_millis_opt(1_760_000_000_000 + seq as i64).unwrap();
        Message::new(Identity::new(seq, at), MessageContent::parse(text).unwrap())
    }

    #[test]
    fn test_newest_first() {
        let renderer = PageRenderer::default();
        let html = renderer.render(&[
            message(1, "First test message"),
            message(2, "Second test message"),
        ]);

        let first = html.find("First test message").unwrap();
        let second = html.find("Second test message").unwrap();
        assert!(second < first, "newest message should come first");
    }

    #[test]
    fn test_content_is_escaped() {
        let html = PageRenderer::default().render(&[message(1, "<script>alert('x')</script> & co")]);

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; co"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let renderer = PageRenderer::new("Visitors");
        let messages = vec![message(1, "a"), message(2, "b")];
        assert_eq!(renderer.render(&messages), renderer.render(&messages));
    }

    #[test]
    fn test_empty_page() {
        let html = PageRenderer::default().render(&[]);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("No messages yet."));
        assert!(html.contains("name=\"message\""));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_title_is_escaped() {
        let html = PageRenderer::new("Tom & Jerry").render(&[]);
        assert!(html.contains("<title>Tom &amp; Jerry</title>"));
    }
}
