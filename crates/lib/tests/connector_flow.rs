//! Integration tests: drive a full connector through a queue sink and
//! observe the deferred deliveries. Each user_says is awaited before the
//! next so deliveries arrive one at a time.

use lib::config::Capabilities;
use lib::connector::MockConnector;
use lib::delay::{QueueSink, Slowdown};
use lib::message::{BotMessage, Button, InboundMessage, Media};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn connector_with(caps: Capabilities) -> (MockConnector, mpsc::Receiver<BotMessage>) {
    let (tx, rx) = mpsc::channel(16);
    (MockConnector::new(Arc::new(QueueSink::new(tx)), caps), rx)
}

fn built_connector(caps: Capabilities) -> (MockConnector, mpsc::Receiver<BotMessage>) {
    let (mut connector, rx) = connector_with(caps);
    connector.validate().expect("validate capabilities");
    connector.build().expect("build connector");
    (connector, rx)
}

async fn next_message(rx: &mut mpsc::Receiver<BotMessage>) -> BotMessage {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for a delivery")
        .expect("delivery channel closed")
}

#[tokio::test]
async fn unmatched_text_is_echoed() {
    let (mut connector, mut rx) = built_connector(Capabilities::default());
    connector.start().await.expect("start");

    connector
        .user_says(InboundMessage::text("hello there"))
        .expect("user_says");

    let msg = next_message(&mut rx).await;
    assert_eq!(msg.sender, "bot");
    assert_eq!(msg.message_text.as_deref(), Some("You said: hello there"));
    assert_eq!(
        msg.source_data.request.message_text.as_deref(),
        Some("hello there")
    );
}

#[tokio::test]
async fn exact_trigger_returns_the_rule_payload() {
    let (mut connector, mut rx) = built_connector(Capabilities::default());
    connector.start().await.expect("start");

    connector
        .user_says(InboundMessage::text("BUTTONS"))
        .expect("user_says");

    let msg = next_message(&mut rx).await;
    assert_eq!(msg.message_text.as_deref(), Some("Here are some buttons"));
    assert_eq!(msg.buttons.len(), 2);
}

#[tokio::test]
async fn button_press_is_acknowledged() {
    let (mut connector, mut rx) = built_connector(Capabilities::default());
    connector.start().await.expect("start");

    let msg = InboundMessage {
        buttons: vec![Button {
            text: None,
            payload: Some(serde_json::json!("BTN_7")),
        }],
        ..Default::default()
    };
    connector.user_says(msg).expect("user_says");

    let msg = next_message(&mut rx).await;
    assert_eq!(msg.message_text.as_deref(), Some("BUTTON PRESSED: BTN_7"));
}

#[tokio::test]
async fn received_media_names_the_decoded_file() {
    let (mut connector, mut rx) = built_connector(Capabilities::default());
    connector.start().await.expect("start");

    let msg = InboundMessage {
        media: vec![Media {
            download_uri: Some("http://files.example.com/photo%20of%20me.png".to_string()),
            mime_type: Some("image/png".to_string()),
            ..Default::default()
        }],
        ..Default::default()
    };
    connector.user_says(msg).expect("user_says");

    let msg = next_message(&mut rx).await;
    assert_eq!(
        msg.message_text.as_deref(),
        Some("RECEIVED FILE: photo of me.png")
    );
    assert_eq!(msg.media.len(), 1);
    assert_eq!(
        msg.media[0].download_uri.as_deref(),
        Some("http://files.example.com/photo%20of%20me.png")
    );
}

#[tokio::test]
async fn cart_round_trip_within_one_session() {
    let (mut connector, mut rx) = built_connector(Capabilities::default());
    connector.start().await.expect("start");

    connector
        .user_says(InboundMessage::text("add to cart item-a"))
        .expect("add");
    let msg = next_message(&mut rx).await;
    assert_eq!(msg.message_text.as_deref(), Some("Added item-a to your cart"));

    connector
        .user_says(InboundMessage::text("show cart"))
        .expect("show");
    let msg = next_message(&mut rx).await;
    assert!(msg.message_text.as_deref().unwrap().contains("item-a"));

    connector
        .user_says(InboundMessage::text("clear cart"))
        .expect("clear");
    next_message(&mut rx).await;

    connector
        .user_says(InboundMessage::text("show cart"))
        .expect("show again");
    let msg = next_message(&mut rx).await;
    assert_eq!(msg.message_text.as_deref(), Some("Your cart is empty"));
}

#[tokio::test]
async fn session_resets_on_start() {
    let (mut connector, mut rx) = built_connector(Capabilities::default());
    connector.start().await.expect("start");

    connector
        .user_says(InboundMessage::text("add to cart item-a"))
        .expect("add");
    next_message(&mut rx).await;

    connector.stop().await.expect("stop");
    connector.start().await.expect("restart");

    connector
        .user_says(InboundMessage::text("show cart"))
        .expect("show");
    let msg = next_message(&mut rx).await;
    assert_eq!(msg.message_text.as_deref(), Some("Your cart is empty"));
}

#[tokio::test]
async fn queued_envelope_keeps_its_session_snapshot() {
    let (mut connector, mut rx) = built_connector(Capabilities::default());
    connector.start().await.expect("start");

    connector
        .user_says(InboundMessage::text("add to cart item-a"))
        .expect("add");
    let first = next_message(&mut rx).await;
    assert_eq!(
        first.source_data.session["cart"],
        serde_json::json!(["item-a"])
    );

    connector
        .user_says(InboundMessage::text("clear cart"))
        .expect("clear");
    let second = next_message(&mut rx).await;

    // the earlier envelope still shows the cart as it was
    assert_eq!(
        first.source_data.session["cart"],
        serde_json::json!(["item-a"])
    );
    assert_eq!(second.source_data.session["cart"], serde_json::json!([]));
}

#[tokio::test]
async fn welcome_messages_arrive_at_session_start() {
    let caps = Capabilities {
        welcome_messages: Some(serde_json::json!([
            "Hi there",
            { "messageText": "Second welcome" }
        ])),
        ..Default::default()
    };
    let (mut connector, mut rx) = built_connector(caps);
    connector.start().await.expect("start");

    let mut texts = vec![
        next_message(&mut rx).await.message_text.unwrap(),
        next_message(&mut rx).await.message_text.unwrap(),
    ];
    texts.sort();
    assert_eq!(texts, vec!["Hi there", "Second welcome"]);
}

fn greet_by_session(
    _msg: &InboundMessage,
    session: &mut lib::session::SessionState,
) -> Result<lib::message::ResponsePayload, lib::rules::ProducerError> {
    session.set("greeted", serde_json::json!(true));
    Ok(lib::message::ResponsePayload::text(format!(
        "Welcome to {}",
        session.id()
    )))
}

#[tokio::test]
async fn function_welcome_sees_the_fresh_session() {
    let (mut connector, mut rx) = built_connector(Capabilities::default());
    connector
        .add_welcome(lib::rules::Producer::Computed(greet_by_session))
        .expect("add welcome");
    connector.start().await.expect("start");

    let msg = next_message(&mut rx).await;
    assert!(msg.message_text.unwrap().starts_with("Welcome to sess-"));
    assert_eq!(msg.source_data.session["greeted"], serde_json::json!(true));
}

#[tokio::test]
async fn configured_answers_extend_the_table_and_the_directory() {
    let caps = Capabilities {
        answers: Some(serde_json::json!([
            { "input": "ping", "output": "pong" }
        ])),
        ..Default::default()
    };
    let (mut connector, mut rx) = built_connector(caps);
    connector.start().await.expect("start");

    connector
        .user_says(InboundMessage::text("ping"))
        .expect("ping");
    let msg = next_message(&mut rx).await;
    assert_eq!(msg.message_text.as_deref(), Some("pong"));

    connector
        .user_says(InboundMessage::text("help"))
        .expect("help");
    let msg = next_message(&mut rx).await;
    let listing = msg.message_text.unwrap();
    assert!(listing.contains("ping"));
    assert!(listing.contains("buttons"));
}

#[tokio::test]
async fn serialized_answers_string_is_parsed_at_build() {
    let caps = Capabilities {
        answers: Some(serde_json::json!(
            r#"[{ "input": ["hi", "hey"], "output": "hello" }]"#
        )),
        ..Default::default()
    };
    let (mut connector, mut rx) = built_connector(caps);
    connector.start().await.expect("start");

    connector.user_says(InboundMessage::text("hey")).expect("hey");
    let msg = next_message(&mut rx).await;
    assert_eq!(msg.message_text.as_deref(), Some("hello"));
}

#[tokio::test]
async fn malformed_answers_fail_validate_and_build() {
    let caps = Capabilities {
        answers: Some(serde_json::json!("definitely not a json array")),
        ..Default::default()
    };
    let (mut connector, _rx) = connector_with(caps);
    assert!(connector.validate().is_err());
    assert!(connector.build().is_err());
}

#[tokio::test]
async fn fail_trigger_surfaces_an_error_and_delivers_nothing() {
    let (mut connector, mut rx) = built_connector(Capabilities::default());
    connector.start().await.expect("start");

    let err = connector
        .user_says(InboundMessage::text("fail"))
        .expect_err("fail trigger must surface");
    assert!(err.to_string().contains("simulated delivery failure"));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn missing_bundled_asset_surfaces_an_error() {
    // no assets directory in the test working directory
    let (mut connector, _rx) = built_connector(Capabilities::default());
    connector.start().await.expect("start");

    let err = connector
        .user_says(InboundMessage::text("audio"))
        .expect_err("missing asset must surface");
    assert!(err.to_string().contains("not found"));
}

#[tokio::test]
async fn prefix_mode_matches_in_the_exact_phase() {
    let (tx, mut rx) = mpsc::channel(16);
    let mut connector = MockConnector::new(
        Arc::new(QueueSink::new(tx)),
        Capabilities::default(),
    )
    .with_match_mode(lib::matcher::MatchMode::Prefix);
    connector.build().expect("build");
    connector.start().await.expect("start");

    // single token, so only the prefix comparison can select the rule
    connector
        .user_says(InboundMessage::text("buttonsplease"))
        .expect("user_says");
    let msg = next_message(&mut rx).await;
    assert_eq!(msg.message_text.as_deref(), Some("Here are some buttons"));
}

#[tokio::test]
async fn clean_drops_the_applied_configuration() {
    let (mut connector, _rx) = built_connector(Capabilities::default());
    connector.start().await.expect("start");
    connector.stop().await.expect("stop");
    connector.clean().await.expect("clean");

    assert!(connector.user_says(InboundMessage::text("hi there")).is_err());
    assert!(connector.start().await.is_err());
}

#[tokio::test]
async fn slowdown_advances_once_per_handled_message() {
    let before = Slowdown::global().current_ms();

    let caps = Capabilities {
        response_delay_increase_ms: 10,
        ..Default::default()
    };
    let (mut connector, mut rx) = built_connector(caps);
    connector.start().await.expect("start");

    connector.user_says(InboundMessage::text("one")).expect("one");
    next_message(&mut rx).await;
    connector.user_says(InboundMessage::text("two")).expect("two");
    next_message(&mut rx).await;

    let after = Slowdown::global().current_ms();
    assert_eq!(after - before, 20);
}
