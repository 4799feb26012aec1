//! Interactive card payload posted to the webhook

use super::{AlertEvent, AlertKind, Severity};
use serde::Serialize;

/// Top-level webhook message
#[derive(Debug, Serialize)]
pub struct CardMessage {
    pub msg_type: &'static str,
    pub card: Card,
}

#[derive(Debug, Serialize)]
pub struct Card {
    pub config: CardConfig,
    pub header: CardHeader,
    pub elements: Vec<CardElement>,
}

#[derive(Debug, Serialize)]
pub struct CardConfig {
    pub wide_screen_mode: bool,
}

#[derive(Debug, Serialize)]
pub struct CardHeader {
    pub title: CardText,
    /// Header color
    pub template: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CardText {
    pub tag: &'static str,
    pub content: String,
}

impl CardText {
    fn plain(content: String) -> Self {
        Self {
            tag: "plain_text",
            content,
        }
    }

    fn markdown(content: String) -> Self {
        Self {
            tag: "lark_md",
            content,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CardField {
    pub is_short: bool,
    pub text: CardText,
}

#[derive(Debug, Serialize)]
#[serde(tag = "tag", rename_all = "lowercase")]
pub enum CardElement {
    Div { fields: Vec<CardField> },
    Hr,
    Note { elements: Vec<CardText> },
}

fn header_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "red",
        Severity::Warning => "orange",
        Severity::Info => "blue",
    }
}

fn kind_emoji(kind: AlertKind) -> &'static str {
    match kind {
        AlertKind::Jump => "🚨",
        AlertKind::Trend => "📈",
        AlertKind::Health => "⚠️",
        AlertKind::Volatility => "⚡",
    }
}

impl AlertEvent {
    /// Render the alert as a webhook card
    pub fn to_card(&self) -> CardMessage {
        let title = format!("{} {} Alert - {}", kind_emoji(self.kind), self.kind, self.symbol);

        let fields = vec![
            CardField {
                is_short: true,
                text: CardText::markdown(format!("**Severity**\n{}", self.severity)),
            },
            CardField {
                is_short: true,
                text: CardText::markdown(format!(
                    "**Time**\n{}",
                    self.timestamp.format("%H:%M:%S")
                )),
            },
            CardField {
                is_short: false,
                text: CardText::markdown(format!("**Message**\n{}", self.message)),
            },
        ];

        CardMessage {
            msg_type: "interactive",
            card: Card {
                config: CardConfig {
                    wide_screen_mode: true,
                },
                header: CardHeader {
                    title: CardText::plain(title),
                    template: header_color(self.severity),
                },
                elements: vec![
                    CardElement::Div { fields },
                    CardElement::Hr,
                    CardElement::Note {
                        elements: vec![CardText::plain(format!("Alert ID: {}", self.alert_id()))],
                    },
                ],
            },
        }
    }
}
