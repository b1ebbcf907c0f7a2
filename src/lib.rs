//! model-route: a model-aware routing proxy.
//!
//! Sits in front of an OpenAI-compatible upstream and rewrites
//! chat-completions requests that target configured models onto the
//! responses endpoint, collapsing the `messages` list into a single
//! `input` string along the way. Everything else is forwarded untouched.

pub mod config;
pub mod proxy;
