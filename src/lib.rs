//! Command-line client for the Alibaba ICBU open platform.
//!
//! Every remote call follows the same pipeline: build a flat parameter map,
//! sign it ([`sign`]), attach the signature, POST it through the gateway
//! ([`gateway`]) and persist the response ([`logsink`]). The two signing
//! variants in [`sign`] are the load-bearing part; the remote verifier
//! silently rejects anything that is not bit-exact.

pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http_client;
pub mod logsink;
pub mod sign;
