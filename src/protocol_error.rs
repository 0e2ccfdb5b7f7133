//! Classified AMQP protocol errors.
//!
//! Every protocol violation ends in either a `connection.close` or a
//! `channel.close`. [`ProtocolError`] carries what goes into that close
//! method together with an [`ErrorScope`] telling the caller which one to
//! send.
//!
//! # Example
//!
//! ```
//! use amqp_core::protocol::constants::{CLASS_BASIC, NOT_FOUND};
//! use amqp_core::{ErrorScope, ProtocolError};
//!
//! let err = ProtocolError::channel(NOT_FOUND, "no exchange 'logs'", CLASS_BASIC, 40);
//! assert_eq!(err.scope(), ErrorScope::Channel);
//! assert_eq!(err.reply_text(), "NOT_FOUND - no exchange 'logs'");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::constants::reply_code_name;

/// What has to be torn down when an error is raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorScope {
    /// The whole connection and all of its channels.
    Connection,
    /// Only the offending channel.
    Channel,
}

/// A protocol violation ready to be sent in a close method.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reply_text}")]
pub struct ProtocolError {
    reply_code: u16,
    reply_text: String,
    class_id: u16,
    method_id: u16,
    scope: ErrorScope,
}

impl ProtocolError {
    /// Error that closes the whole connection.
    pub fn connection(code: u16, detail: &str, class_id: u16, method_id: u16) -> Self {
        Self::classify(ErrorScope::Connection, code, detail, class_id, method_id)
    }

    /// Error that closes only the channel it occurred on.
    pub fn channel(code: u16, detail: &str, class_id: u16, method_id: u16) -> Self {
        Self::classify(ErrorScope::Channel, code, detail, class_id, method_id)
    }

    fn classify(scope: ErrorScope, code: u16, detail: &str, class_id: u16, method_id: u16) -> Self {
        let reply_text = match reply_code_name(code) {
            Some(name) => format!("{name} - {detail}"),
            None => format!("REPLY_CODE_{code} - {detail}"),
        };
        tracing::debug!(
            reply_code = code,
            ?scope,
            class_id,
            method_id,
            "{}",
            reply_text
        );

        Self {
            reply_code: code,
            reply_text,
            class_id,
            method_id,
            scope,
        }
    }

    #[inline]
    pub fn reply_code(&self) -> u16 {
        self.reply_code
    }

    /// Canonical code name followed by the detail.
    #[inline]
    pub fn reply_text(&self) -> &str {
        &self.reply_text
    }

    /// Class of the method that caused the error.
    #[inline]
    pub fn class_id(&self) -> u16 {
        self.class_id
    }

    /// Method that caused the error.
    #[inline]
    pub fn method_id(&self) -> u16 {
        self.method_id
    }

    #[inline]
    pub fn scope(&self) -> ErrorScope {
        self.scope
    }

    #[inline]
    pub fn is_connection_error(&self) -> bool {
        self.scope == ErrorScope::Connection
    }

    #[inline]
    pub fn is_channel_error(&self) -> bool {
        self.scope == ErrorScope::Channel
    }
}
