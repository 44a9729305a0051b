//! Error types for fast-session.

use std::collections::TryReserveError;

use thiserror::Error;

use crate::codec::CodecError;

/// Main error type for all session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// I/O error reported by the transport while sending.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// One of the session-owned buffers or the template arena could not be allocated.
    #[error("failed to allocate {what} ({size} entries): {source}")]
    Alloc {
        /// Which resource was being allocated.
        what: &'static str,
        /// Requested capacity.
        size: usize,
        /// Allocator failure.
        #[source]
        source: TryReserveError,
    },

    /// Configured preamble is longer than the protocol allows.
    #[error("preamble of {requested} bytes exceeds maximum {max}")]
    PreambleTooLarge {
        /// Requested preamble byte count.
        requested: usize,
        /// Absolute maximum.
        max: usize,
    },

    /// The descriptor kind could not be determined.
    #[error("failed to query descriptor kind: {0}")]
    DescriptorKind(#[source] std::io::Error),

    /// Receive buffer cannot hold a maximal message after compaction.
    #[error("receive capacity {capacity} must be at least twice the max message size {max_message_size}")]
    UndersizedReceiveBuffer {
        /// Configured receive buffer capacity.
        capacity: usize,
        /// Configured max message size.
        max_message_size: usize,
    },

    /// A max message size of zero leaves no room for any read.
    #[error("max message size must be greater than zero")]
    ZeroMaxMessageSize,

    /// Buffered bytes are not a valid message.
    #[error("decode error: {0}")]
    Decode(#[source] CodecError),

    /// Message could not be serialized into the transmit buffers.
    #[error("encode error: {0}")]
    Encode(#[source] CodecError),

    /// Template arena is full.
    #[error("template limit of {max} reached")]
    TemplateLimit {
        /// Arena capacity.
        max: usize,
    },

    /// A template with this id is already tracked.
    #[error("template {0} already registered")]
    DuplicateTemplate(u32),

    /// Session options could not be parsed.
    #[error("invalid session options: {0}")]
    Options(#[from] serde_json::Error),
}

/// Result type alias using SessionError.
pub type Result<T> = std::result::Result<T, SessionError>;
