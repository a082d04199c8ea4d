//! TripBot - Conversational Trip Planning Assistant
//!
//! This crate implements a multi-turn trip-planning dialogue driven by a
//! pluggable LLM backend, with a validated and retried flight-search client
//! invoked as a tool once enough trip parameters have been collected.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
