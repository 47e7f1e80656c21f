//! Incoming mail as seen by mail handlers.

use crate::db::tickets::Tickets;
use crate::libs::error::Result;
use crate::libs::ticket::Ticket;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;

static TICKET_REFERENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#([0-9]+)").unwrap());
static ANGLE_ADDRESS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<([^>]+)>").unwrap());

/// One MIME part. Containers hold `parts` and no body.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailPart {
    pub content_type: String,
    pub disposition: Option<String>,
    pub body: String,
    pub parts: Vec<EmailPart>,
}

impl EmailPart {
    pub fn text(body: &str) -> Self {
        EmailPart {
            content_type: "text/plain".to_string(),
            disposition: None,
            body: body.to_string(),
            parts: Vec::new(),
        }
    }

    pub fn multipart(parts: Vec<EmailPart>) -> Self {
        EmailPart {
            content_type: "multipart/mixed".to_string(),
            disposition: None,
            body: String::new(),
            parts,
        }
    }

    /// Text shown in the message body rather than attached.
    pub fn is_inline_text(&self) -> bool {
        let inline = self.disposition.as_deref().map_or(true, |d| d.eq_ignore_ascii_case("inline"));
        inline && self.content_type.to_ascii_lowercase().starts_with("text/")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub from: String,
    pub subject: String,
    pub parts: Vec<EmailPart>,
}

impl EmailMessage {
    /// The sender's address, without any display name.
    pub fn sender(&self) -> &str {
        ANGLE_ADDRESS
            .captures(&self.from)
            .and_then(|c| c.get(1))
            .map_or(self.from.trim(), |m| m.as_str().trim())
    }

    /// The existing ticket this message replies to, from a `#<id>` in the
    /// subject.
    pub fn reply_ticket(&self, conn: &Connection) -> Result<Option<Ticket>> {
        let Some(id) = TICKET_REFERENCE
            .captures(&self.subject)
            .and_then(|c| c[1].parse::<i64>().ok())
        else {
            return Ok(None);
        };
        Tickets::new(conn).get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_drops_display_name() {
        let message = EmailMessage {
            from: "Joe Worker <joe@example.com>".to_string(),
            subject: "Re: [proj] #3: broken".to_string(),
            parts: vec![],
        };
        assert_eq!(message.sender(), "joe@example.com");
    }

    #[test]
    fn attachments_are_not_inline_text() {
        let mut part = EmailPart::text("2 hours");
        assert!(part.is_inline_text());
        part.disposition = Some("attachment".to_string());
        assert!(!part.is_inline_text());
        assert!(!EmailPart::multipart(vec![]).is_inline_text());
    }
}
