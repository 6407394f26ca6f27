//! Conformance and load harness for WebSocket echo/chat servers.
//!
//! The harness opens one or more WebSocket connections to a target endpoint, runs
//! scripted exchanges in strict lock-step (send one message, await its response,
//! then send the next) and checks every response against the endpoint's expected
//! transform: identity for an echo route, a prefix or template for a chat route.
//!
//! Two drivers sit on top of a single-connection [`driver::ConnectionDriver`]:
//! the sequential echo+chat [`suite`] and the concurrent [`runner::LoadRunner`],
//! which fans out N connections at once and aggregates a [`report::RunReport`].
//! A small [`server::ReferenceServer`] implements the contract and can be used
//! as a stand-in target.
//!
pub mod attempt;
pub mod config;
pub mod driver;
pub mod endpoint;
pub mod error;
pub mod interactive;
pub mod message;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod server;
pub mod suite;
