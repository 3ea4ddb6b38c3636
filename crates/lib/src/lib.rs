//! Mockingbird core library — message envelopes, rule table, matcher,
//! response synthesis, delay scheduling, and the connector lifecycle shell
//! used by chatbot test harnesses.

pub mod assets;
pub mod config;
pub mod connector;
pub mod delay;
pub mod fixtures;
pub mod matcher;
pub mod message;
pub mod rules;
pub mod session;
pub mod synth;
