//! II Kaspa Wallet - a terminal client for a Kaspa wallet canister on the Internet Computer.
//!
//! This library provides:
//! - Internet Identity login with a persisted delegation
//! - Authorized handles to the wallet canister
//! - Address, balance and transfer workflows
//! - Session state and status messages for the terminal UI

pub mod config;
pub mod domain;
pub mod infra;
pub mod workflow;
