//! Response synthesis: dispatch the matched rule's producer (or the
//! fallback behaviors for unmatched input) and assemble the outbound
//! envelope with diagnostic source data.

use base64::Engine as _;
use percent_encoding::percent_decode_str;

use crate::message::{
    Attachment, BotMessage, InboundMessage, Media, ResponsePayload, SourceData,
};
use crate::rules::{Producer, ProducerError, Rule};
use crate::session::SessionState;

/// Synthesize the response for one inbound message.
///
/// A computed producer may mutate the session and may fail; failures
/// propagate to the caller as a failed send. The session snapshot in the
/// envelope is taken after any producer mutation.
pub fn synthesize(
    msg: &InboundMessage,
    matched: Option<&Rule>,
    session: &mut SessionState,
) -> Result<BotMessage, ProducerError> {
    let payload = match matched {
        Some(rule) => match &rule.producer {
            Producer::Static(payload) => payload.clone(),
            Producer::Computed(produce) => produce(msg, session)?,
        },
        None => unmatched_payload(msg),
    };
    Ok(assemble(msg, payload, session))
}

/// Merge a payload into a full envelope: sender, payload fields, request
/// echo, and a deep session snapshot.
pub fn assemble(
    msg: &InboundMessage,
    payload: ResponsePayload,
    session: &SessionState,
) -> BotMessage {
    BotMessage {
        sender: "bot".to_string(),
        message_text: payload.message_text,
        buttons: payload.buttons,
        media: payload.media,
        cards: payload.cards,
        forms: payload.forms,
        attachments: payload.attachments,
        nlp: payload.nlp,
        source_data: SourceData {
            request: msg.clone(),
            session: session.snapshot(),
        },
    }
}

fn unmatched_payload(msg: &InboundMessage) -> ResponsePayload {
    if let Some(button) = msg.buttons.first() {
        let label = button
            .text
            .clone()
            .or_else(|| button.payload.as_ref().map(payload_label))
            .unwrap_or_else(|| "-".to_string());
        return ResponsePayload::text(format!("BUTTON PRESSED: {}", label));
    }
    if let Some(media) = msg.media.first() {
        return received_file_payload(media);
    }
    let text = msg.message_text.as_deref().unwrap_or("-");
    ResponsePayload::text(format!("You said: {}", text))
}

/// Render a button payload value as its identifier string.
fn payload_label(payload: &serde_json::Value) -> String {
    match payload {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Acknowledge an unmatched media item: name the file, echo the item back,
/// and attach its raw bytes as base64 when they are present.
fn received_file_payload(media: &Media) -> ResponsePayload {
    let uri = media.uri().unwrap_or("-");
    let name = decoded_basename(uri);
    let mut payload = ResponsePayload::text(format!("RECEIVED FILE: {}", name));
    payload.media = vec![media.clone()];
    if let Some(bytes) = &media.buffer {
        payload.attachments = vec![Attachment {
            name,
            mime_type: media.mime_type.clone(),
            base64: base64::engine::general_purpose::STANDARD.encode(bytes),
        }];
    }
    payload
}

/// Percent-decoded final path segment of a URI, without query or fragment.
fn decoded_basename(uri: &str) -> String {
    let tail = uri.rsplit('/').next().unwrap_or(uri);
    let tail = tail.split(['?', '#']).next().unwrap_or(tail);
    percent_decode_str(tail).decode_utf8_lossy().into_owned()
}
