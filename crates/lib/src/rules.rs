//! The rule table: ordered trigger-phrase sets paired with response
//! producers. Table order is significant (first match wins) and the table
//! is immutable after build. Producers are either fixed payloads or
//! functions that see the inbound message, may mutate the session, and may
//! fail on purpose to simulate delivery failures.

use base64::Engine as _;

use crate::assets::{self, AssetError};
use crate::matcher::MatchMode;
use crate::message::{
    Attachment, Button, Card, FormField, InboundMessage, Media, Nlp, NlpEntity, NlpIntent,
    NlpIntentAlternate, ResponsePayload,
};
use crate::session::SessionState;

/// Error raised by a rule producer. Surfaces to the caller of the handling
/// entry point as a failed send, never converted into a normal envelope.
#[derive(Debug, thiserror::Error)]
pub enum ProducerError {
    #[error("simulated delivery failure: {0}")]
    Simulated(String),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("entropy source unavailable: {0}")]
    Entropy(String),
}

/// Function form of a producer.
pub type ProducerFn =
    fn(&InboundMessage, &mut SessionState) -> Result<ResponsePayload, ProducerError>;

/// What a rule yields: a fixed payload or a computed one. Dispatch is
/// explicit; there is no runtime type inspection.
#[derive(Debug, Clone)]
pub enum Producer {
    Static(ResponsePayload),
    Computed(ProducerFn),
}

/// A single rule: trigger phrases and the producer they select.
#[derive(Debug, Clone)]
pub struct Rule {
    pub triggers: Vec<String>,
    pub producer: Producer,
}

impl Rule {
    /// Rule with already-owned triggers. Triggers must be non-empty.
    pub fn new(triggers: Vec<String>, producer: Producer) -> Self {
        debug_assert!(!triggers.is_empty());
        Self { triggers, producer }
    }

    fn fixed(triggers: &[&str], payload: ResponsePayload) -> Self {
        Self::new(
            triggers.iter().map(|t| t.to_string()).collect(),
            Producer::Static(payload),
        )
    }

    fn computed(triggers: &[&str], produce: ProducerFn) -> Self {
        Self::new(
            triggers.iter().map(|t| t.to_string()).collect(),
            Producer::Computed(produce),
        )
    }
}

/// Ordered, immutable-after-build rule table with its matching mode.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
    mode: MatchMode,
}

impl RuleTable {
    /// Built-in rules, then `extra` in order, then the trigger directory
    /// ("help"/"list") whose text enumerates every registered phrase. The
    /// directory rule means the table is never empty.
    pub fn build(extra: Vec<Rule>) -> Self {
        let mut rules = builtin_rules();
        rules.extend(extra);

        let mut phrases: Vec<&str> = rules
            .iter()
            .flat_map(|r| r.triggers.iter().map(String::as_str))
            .collect();
        phrases.push("help");
        phrases.push("list");
        let listing = format!("You can say: {}", phrases.join(", "));
        rules.push(Rule::fixed(&["help", "list"], ResponsePayload::text(listing)));

        Self {
            rules,
            mode: MatchMode::default(),
        }
    }

    /// Use a different exact-phase comparison.
    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }
}

fn builtin_rules() -> Vec<Rule> {
    vec![
        Rule::computed(&["fail"], fail_on_purpose),
        Rule::computed(&["random fail"], fail_sometimes),
        Rule::fixed(&["buttons", "show me buttons"], buttons_payload()),
        Rule::fixed(&["picture", "show me a picture"], picture_payload()),
        Rule::fixed(&["card", "show me a card"], card_payload()),
        Rule::fixed(&["form", "show me a form"], form_payload()),
        Rule::fixed(&["intent", "what is my intent"], intent_payload()),
        Rule::computed(&["audio", "play some audio"], bundled_audio),
        Rule::computed(&["video", "play some video"], bundled_video),
        Rule::computed(&["add to cart"], add_to_cart),
        Rule::computed(&["show cart"], show_cart),
        Rule::computed(&["clear cart"], clear_cart),
    ]
}

fn buttons_payload() -> ResponsePayload {
    ResponsePayload {
        message_text: Some("Here are some buttons".to_string()),
        buttons: vec![
            Button {
                text: Some("Button 1".to_string()),
                payload: Some(serde_json::json!("BUTTON_1")),
            },
            Button {
                text: Some("Button 2".to_string()),
                payload: Some(serde_json::json!("BUTTON_2")),
            },
        ],
        ..Default::default()
    }
}

fn picture_payload() -> ResponsePayload {
    ResponsePayload {
        message_text: Some("Here is a picture".to_string()),
        media: vec![Media {
            media_uri: Some(
                "https://dummyimage.com/300x200/ff00ff/fff.png&text=mockingbird".to_string(),
            ),
            mime_type: Some("image/png".to_string()),
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn card_payload() -> ResponsePayload {
    ResponsePayload {
        message_text: Some("Here is a card".to_string()),
        cards: vec![Card {
            text: Some("Sample Card".to_string()),
            subtext: Some("A card from the canned rule table".to_string()),
            image: Some(Media {
                media_uri: Some(
                    "https://dummyimage.com/300x200/ff00ff/fff.png&text=card".to_string(),
                ),
                mime_type: Some("image/png".to_string()),
                ..Default::default()
            }),
            buttons: vec![Button {
                text: Some("Card Button".to_string()),
                payload: Some(serde_json::json!("CARD_BUTTON")),
            }],
        }],
        ..Default::default()
    }
}

fn form_payload() -> ResponsePayload {
    ResponsePayload {
        message_text: Some("Please fill in the form".to_string()),
        forms: vec![
            FormField {
                name: "email".to_string(),
                label: Some("E-Mail".to_string()),
                typ: Some("text".to_string()),
            },
            FormField {
                name: "password".to_string(),
                label: Some("Password".to_string()),
                typ: Some("password".to_string()),
            },
        ],
        ..Default::default()
    }
}

fn intent_payload() -> ResponsePayload {
    ResponsePayload {
        message_text: Some("I understood you".to_string()),
        nlp: Some(Nlp {
            intent: NlpIntent {
                name: "greeting".to_string(),
                confidence: 0.9,
                intents: vec![
                    NlpIntentAlternate {
                        name: "smalltalk".to_string(),
                        confidence: 0.3,
                    },
                    NlpIntentAlternate {
                        name: "order".to_string(),
                        confidence: 0.1,
                    },
                ],
            },
            entities: vec![NlpEntity {
                name: "product".to_string(),
                value: "bird".to_string(),
                confidence: 0.7,
            }],
        }),
        ..Default::default()
    }
}

fn fail_on_purpose(
    _msg: &InboundMessage,
    _session: &mut SessionState,
) -> Result<ResponsePayload, ProducerError> {
    Err(ProducerError::Simulated(
        "the fail trigger always fails".to_string(),
    ))
}

/// Chance that `random fail` raises, out of 256.
const RANDOM_FAIL_CHANCE: u8 = 128;

fn fail_sometimes(
    _msg: &InboundMessage,
    _session: &mut SessionState,
) -> Result<ResponsePayload, ProducerError> {
    let mut byte = [0u8; 1];
    getrandom::getrandom(&mut byte).map_err(|e| ProducerError::Entropy(e.to_string()))?;
    if byte[0] < RANDOM_FAIL_CHANCE {
        return Err(ProducerError::Simulated("the coin came up tails".to_string()));
    }
    Ok(ResponsePayload::text("You got lucky, no failure this time"))
}

fn add_to_cart(
    msg: &InboundMessage,
    session: &mut SessionState,
) -> Result<ResponsePayload, ProducerError> {
    let text = msg.message_text.as_deref().unwrap_or("");
    let item = item_argument(text, "add to cart");
    if item.is_empty() {
        return Ok(ResponsePayload::text("Nothing to add"));
    }
    session.cart_add(item.clone());
    log::debug!("session {}: cart now has {} items", session.id(), session.cart().len());
    Ok(ResponsePayload::text(format!("Added {} to your cart", item)))
}

fn show_cart(
    _msg: &InboundMessage,
    session: &mut SessionState,
) -> Result<ResponsePayload, ProducerError> {
    let items = session.cart();
    let text = if items.is_empty() {
        "Your cart is empty".to_string()
    } else {
        format!("In your cart: {}", items.join(", "))
    };
    Ok(ResponsePayload::text(text))
}

fn clear_cart(
    _msg: &InboundMessage,
    session: &mut SessionState,
) -> Result<ResponsePayload, ProducerError> {
    session.cart_clear();
    Ok(ResponsePayload::text("Your cart is empty again"))
}

/// The argument after the trigger phrase when the text starts with it
/// (ignoring ASCII case), else everything after the first token. The
/// fallback matching phase can select this rule on the first token alone.
fn item_argument(text: &str, trigger: &str) -> String {
    let rest = match text.get(..trigger.len()) {
        Some(head) if head.eq_ignore_ascii_case(trigger) => &text[trigger.len()..],
        _ => text
            .split_once(char::is_whitespace)
            .map(|(_, rest)| rest)
            .unwrap_or(""),
    };
    rest.trim().to_string()
}

fn bundled_audio(
    _msg: &InboundMessage,
    _session: &mut SessionState,
) -> Result<ResponsePayload, ProducerError> {
    bundled_media_payload("test.wav", "audio/wav")
}

fn bundled_video(
    _msg: &InboundMessage,
    _session: &mut SessionState,
) -> Result<ResponsePayload, ProducerError> {
    bundled_media_payload("test.mp4", "video/mp4")
}

fn bundled_media_payload(name: &str, mime: &str) -> Result<ResponsePayload, ProducerError> {
    let bytes = assets::load(name)?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
    Ok(ResponsePayload {
        message_text: Some(format!("Here is {}", name)),
        media: vec![Media {
            download_uri: Some(name.to_string()),
            mime_type: Some(mime.to_string()),
            buffer: Some(bytes),
            ..Default::default()
        }],
        attachments: vec![Attachment {
            name: name.to_string(),
            mime_type: Some(mime.to_string()),
            base64: encoded,
        }],
        ..Default::default()
    })
}
