//! Message envelopes exchanged with the harness: inbound user messages,
//! outbound bot responses, and the rich-content parts either side may carry
//! (buttons, media, cards, forms, attachments, NLP data).
//!
//! All wire-facing types serialize with camelCase names and omit absent
//! fields, since the harness compares envelopes as JSON.

use serde::{Deserialize, Serialize};

/// A button offered by the bot, or pressed by the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Button {
    /// Display text. When absent on an inbound press, the payload stands in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Opaque payload identifier forwarded by the channel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

/// A media item (image, audio, video) by URI, optionally with inline bytes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Media {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Raw bytes when the media travels inline rather than by reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer: Option<Vec<u8>>,
}

impl Media {
    /// The URI a receiver would fetch: downloadUri when set, else mediaUri.
    pub fn uri(&self) -> Option<&str> {
        self.download_uri.as_deref().or(self.media_uri.as_deref())
    }
}

/// A rich card: text plus optional subtext, image, and buttons.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Card {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtext: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Media>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
}

/// A form field the bot asks the user to fill in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormField {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

/// A file attachment carried inline as base64.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Attachment {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub base64: String,
}

/// Recognized intent with confidence; `intents` lists lower-ranked
/// alternates, best first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NlpIntent {
    pub name: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub intents: Vec<NlpIntentAlternate>,
}

/// One lower-ranked intent alternate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NlpIntentAlternate {
    pub name: String,
    pub confidence: f64,
}

/// An extracted entity with confidence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NlpEntity {
    pub name: String,
    pub value: String,
    pub confidence: f64,
}

/// Mock NLP block a rule may attach to its response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Nlp {
    pub intent: NlpIntent,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<NlpEntity>,
}

/// A message from the harness to the bot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InboundMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<Media>,
}

impl InboundMessage {
    /// Text-only inbound message.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            message_text: Some(text.into()),
            ..Default::default()
        }
    }
}

/// A partial response: what a rule producer yields before the envelope is
/// assembled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponsePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<Media>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cards: Vec<Card>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub forms: Vec<FormField>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nlp: Option<Nlp>,
}

impl ResponsePayload {
    /// Text-only payload.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            message_text: Some(text.into()),
            ..Default::default()
        }
    }
}

/// The assembled outbound envelope delivered to the harness.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotMessage {
    /// Always "bot".
    pub sender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<Media>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cards: Vec<Card>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forms: Vec<FormField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nlp: Option<Nlp>,
    pub source_data: SourceData,
}

/// Diagnostic source data attached to every envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceData {
    /// Structural echo of the inbound message that produced this response.
    pub request: InboundMessage,
    /// Point-in-time deep copy of the session state at synthesis time.
    pub session: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_uri_prefers_download_uri() {
        let media = Media {
            media_uri: Some("http://example.com/a.png".to_string()),
            download_uri: Some("http://cdn.example.com/a.png".to_string()),
            ..Default::default()
        };
        assert_eq!(media.uri(), Some("http://cdn.example.com/a.png"));

        let media = Media {
            media_uri: Some("http://example.com/a.png".to_string()),
            ..Default::default()
        };
        assert_eq!(media.uri(), Some("http://example.com/a.png"));
    }

    #[test]
    fn inbound_message_parses_camel_case() {
        let msg: InboundMessage = serde_json::from_str(
            r#"{ "messageText": "hi", "buttons": [{ "text": "Yes", "payload": "YES" }] }"#,
        )
        .expect("parse inbound");
        assert_eq!(msg.message_text.as_deref(), Some("hi"));
        assert_eq!(msg.buttons.len(), 1);
        assert_eq!(msg.buttons[0].text.as_deref(), Some("Yes"));
    }

    #[test]
    fn payload_serialization_skips_empty_fields() {
        let payload = ResponsePayload::text("hello");
        let json = serde_json::to_value(&payload).expect("serialize payload");
        assert_eq!(json, serde_json::json!({ "messageText": "hello" }));
    }
}
