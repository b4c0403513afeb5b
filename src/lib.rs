//! Black-box test harness for the messaging example programs.
//!
//! The harness launches the example binaries (broker, senders, receivers,
//! request/response pairs, SSL variants) as child processes, discovers the
//! broker's dynamically assigned port from its early output, wires that
//! address into dependent clients and compares captured output against
//! golden text. It never speaks the messaging protocol itself; every
//! example binary is treated as an opaque correctness oracle.

pub type Result<T> = color_eyre::eyre::Result<T>;

pub mod broker;
pub mod cli;
pub mod expect;
pub mod process;
pub mod sasl;
pub mod scenarios;
pub mod suite;
