//! Canned conversation scripts and utterance groups for harness import,
//! plus the identity export hook.
//!
//! The import catalogue is fixed data consumable by a test-generation
//! tool; export reports counts through a progress callback and performs no
//! transformation.

use serde::{Deserialize, Serialize};

/// One scripted step: who speaks and what they say.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvoStep {
    pub sender: String,
    pub text: String,
}

impl ConvoStep {
    fn me(text: &str) -> Self {
        Self {
            sender: "me".to_string(),
            text: text.to_string(),
        }
    }

    fn bot(text: &str) -> Self {
        Self {
            sender: "bot".to_string(),
            text: text.to_string(),
        }
    }
}

/// A canned conversation script.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Convo {
    pub name: String,
    pub steps: Vec<ConvoStep>,
}

/// A named group of utterances that mean the same thing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtteranceGroup {
    pub name: String,
    pub utterances: Vec<String>,
}

/// The fixed import catalogue.
pub fn import_fixtures() -> (Vec<Convo>, Vec<UtteranceGroup>) {
    let convos = vec![
        Convo {
            name: "echo".to_string(),
            steps: vec![
                ConvoStep::me("hello bot"),
                ConvoStep::bot("You said: hello bot"),
            ],
        },
        Convo {
            name: "buttons".to_string(),
            steps: vec![
                ConvoStep::me("UTT_BUTTONS"),
                ConvoStep::bot("Here are some buttons"),
            ],
        },
        Convo {
            name: "cart round trip".to_string(),
            steps: vec![
                ConvoStep::me("add to cart item-a"),
                ConvoStep::bot("Added item-a to your cart"),
                ConvoStep::me("show cart"),
                ConvoStep::bot("In your cart: item-a"),
                ConvoStep::me("clear cart"),
                ConvoStep::bot("Your cart is empty again"),
            ],
        },
    ];

    let utterances = vec![
        UtteranceGroup {
            name: "UTT_BUTTONS".to_string(),
            utterances: vec!["buttons".to_string(), "show me buttons".to_string()],
        },
        UtteranceGroup {
            name: "UTT_PICTURE".to_string(),
            utterances: vec!["picture".to_string(), "show me a picture".to_string()],
        },
    ];

    (convos, utterances)
}

/// Export hook: report counts through `progress`, transform nothing.
pub fn export_fixtures(
    convos: &[Convo],
    utterances: &[UtteranceGroup],
    progress: &mut dyn FnMut(&str),
) -> (usize, usize) {
    progress(&format!(
        "exporting {} convos and {} utterance groups",
        convos.len(),
        utterances.len()
    ));
    (convos.len(), utterances.len())
}
