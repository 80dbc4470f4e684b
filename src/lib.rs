//! Terminal client for the LoDeFROLL lottery on Viction.

pub mod allowance;
pub mod bet_form;
pub mod client;
pub mod decoder;
pub mod deployment;
pub mod error;
pub mod events;
pub mod fees;
pub mod gateway;
pub mod lucky;
pub mod network;
pub mod preflight;
pub mod session;
pub mod submission;
pub mod ui;
pub mod units;
pub mod wallets;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
