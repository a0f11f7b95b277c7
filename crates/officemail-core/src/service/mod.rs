//! Mail services.
//!
//! Bridges the token lifecycle with the Graph send-mail endpoint.

pub mod mail;

pub use mail::{GRAPH_SEND_MAIL_URL, MailClient, OutgoingMessage, send_mail};
