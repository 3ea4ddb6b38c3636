//! Connector lifecycle shell around the core.
//!
//! The harness constructs the connector with a delivery sink and a
//! capability bag, then drives it: validate, build, start, user_says per
//! inbound message, stop, clean. Synthesis happens synchronously inside
//! user_says; only delivery is deferred.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::{self, Capabilities};
use crate::delay::{DelayScheduler, DeliverySink};
use crate::matcher::{self, MatchMode};
use crate::message::InboundMessage;
use crate::rules::{Producer, RuleTable};
use crate::session::SessionState;
use crate::synth;

/// Mock responder with a harness-driven lifecycle.
pub struct MockConnector {
    sink: Arc<dyn DeliverySink>,
    capabilities: Capabilities,
    match_mode: MatchMode,
    built: Option<Built>,
    session: SessionState,
}

/// State that exists once capabilities have been applied.
struct Built {
    table: RuleTable,
    welcome: Vec<Producer>,
    scheduler: DelayScheduler,
}

impl MockConnector {
    pub fn new(sink: Arc<dyn DeliverySink>, capabilities: Capabilities) -> Self {
        Self {
            sink,
            capabilities,
            match_mode: MatchMode::default(),
            built: None,
            session: SessionState::new(),
        }
    }

    /// Use a different exact-phase comparison (takes effect at build).
    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    /// Parse-check the capability bag without applying anything.
    pub fn validate(&self) -> Result<()> {
        log::debug!("validate: checking capabilities");
        config::validate(&self.capabilities)
    }

    /// Apply capabilities: rule table, welcome entries, scheduler. Fails as
    /// a whole on malformed configuration; nothing is partially applied.
    pub fn build(&mut self) -> Result<()> {
        let extra = config::parse_extra_rules(&self.capabilities)?;
        let welcome = config::parse_welcome_producers(&self.capabilities)?;
        let table = RuleTable::build(extra).with_mode(self.match_mode);
        log::info!("built rule table with {} rules", table.rules().len());
        self.built = Some(Built {
            table,
            welcome,
            scheduler: DelayScheduler::new(
                self.capabilities.response_delay_ms,
                self.capabilities.response_delay_increase_ms,
            ),
        });
        Ok(())
    }

    /// Add a welcome entry programmatically; the function form cannot come
    /// from the JSON capability bag. Takes effect at the next start.
    pub fn add_welcome(&mut self, producer: Producer) -> Result<()> {
        let built = self.built.as_mut().context("add_welcome called before build")?;
        built.welcome.push(producer);
        Ok(())
    }

    /// Start a session: replace the state with a fresh instance, then send
    /// each welcome message with zero delay, bypassing the matcher.
    pub async fn start(&mut self) -> Result<()> {
        let built = self.built.as_ref().context("start called before build")?;
        self.session = SessionState::new();
        log::info!("session {} started", self.session.id());

        let empty = InboundMessage::default();
        for producer in &built.welcome {
            let payload = match producer {
                Producer::Static(payload) => payload.clone(),
                Producer::Computed(produce) => produce(&empty, &mut self.session)?,
            };
            let envelope = synth::assemble(&empty, payload, &self.session);
            built.scheduler.schedule_immediate(envelope, self.sink.clone());
        }
        Ok(())
    }

    /// Core entry point: match, synthesize, defer delivery. A producer
    /// error surfaces here as a failed send; nothing is delivered for it.
    pub fn user_says(&mut self, msg: InboundMessage) -> Result<()> {
        let built = self.built.as_ref().context("user_says called before build")?;
        let matched = matcher::match_rule(&built.table, msg.message_text.as_deref());
        match matched {
            Some(rule) => log::debug!("matched rule with triggers {:?}", rule.triggers),
            None => log::debug!("no rule matched, using fallback response"),
        }
        let envelope = synth::synthesize(&msg, matched, &mut self.session)?;
        built.scheduler.schedule(envelope, self.sink.clone());
        Ok(())
    }

    /// No remote resources to release; completes immediately.
    pub async fn stop(&mut self) -> Result<()> {
        log::info!("session {} stopped", self.session.id());
        Ok(())
    }

    /// Drop applied configuration; the connector needs another build before
    /// the next start.
    pub async fn clean(&mut self) -> Result<()> {
        self.built = None;
        log::debug!("clean: applied configuration dropped");
        Ok(())
    }

    /// Id of the current session (diagnostics).
    pub fn session_id(&self) -> &str {
        self.session.id()
    }
}
