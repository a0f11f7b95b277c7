//! # officemail-core
//!
//! Sends HTML mail through Microsoft Graph using access tokens from
//! `officemail-oauth`.
//!
//! This crate provides:
//! - `OutgoingMessage`: recipient, subject and HTML body
//! - `MailClient`: posts a message to the Graph `sendMail` endpoint
//! - `send_mail`: refresh-then-send in one step

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod service;

pub use error::{Error, Result};
pub use service::{GRAPH_SEND_MAIL_URL, MailClient, OutgoingMessage, send_mail};
