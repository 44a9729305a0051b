//! Session builder and options.
//!
//! [`SessionOptions`] holds the tunables and can be loaded from JSON.
//! [`SessionBuilder`] takes the descriptor plus options and performs the
//! construction sequence.
//!
//! # Example
//!
//! ```
//! # use fast_session::codec::{Codec, CodecError, DecodeContext, Decoded, EncodeBuffers, Template};
//! # struct Heartbeat;
//! # impl Template for Heartbeat {
//! #     fn template_id(&self) -> u32 { 1 }
//! #     fn reset(&mut self) {}
//! # }
//! # struct HeartbeatCodec;
//! # impl Codec for HeartbeatCodec {
//! #     type Message = Heartbeat;
//! #     fn decode(&mut self, _: &mut &[u8], _: &mut DecodeContext<'_, Heartbeat>) -> Result<Decoded, CodecError> {
//! #         Ok(Decoded::Incomplete)
//! #     }
//! #     fn encode(&mut self, _: &mut Heartbeat, _: EncodeBuffers<'_>) -> Result<(), CodecError> {
//! #         Ok(())
//! #     }
//! # }
//! use std::os::fd::AsFd;
//! use std::os::unix::net::UnixStream;
//! use fast_session::{SessionBuilder, SessionOptions};
//!
//! let (stream, _peer) = UnixStream::pair()?;
//! let options = SessionOptions::from_json(r#"{ "preamble_bytes": 4 }"#)?;
//! let mut session = SessionBuilder::new(stream.as_fd())
//!     .options(options)
//!     .reset(true)
//!     .build(HeartbeatCodec)?;
//! session.register_template(Heartbeat)?;
//!
//! assert_eq!(session.preamble_bytes(), 4);
//! assert!(session.reset_on_connect());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::os::fd::BorrowedFd;

use serde::{Deserialize, Serialize};

use super::{Session, SessionStats};
use crate::codec::Codec;
use crate::error::{Result, SessionError};
use crate::protocol::{
    receive_capacity_is_sufficient, Buffer, MAX_MESSAGE_SIZE, MAX_TEMPLATES, PREAMBLE_MAX_BYTES,
    RECEIVE_BUFFER_SIZE, TRANSMIT_BUFFER_SIZE,
};
use crate::transport::Transport;

/// Session tunables.
///
/// Every field has a default, so a partial JSON document is enough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Framing bytes before each message (at most `PREAMBLE_MAX_BYTES`).
    pub preamble_bytes: usize,
    /// Reset flag handed to the codec on every decode.
    pub reset: bool,
    /// Receive buffer capacity.
    pub receive_capacity: usize,
    /// Capacity of each transmit buffer.
    pub transmit_capacity: usize,
    /// Largest message framed; also the size of each read.
    pub max_message_size: usize,
    /// Number of template slots.
    pub max_templates: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            preamble_bytes: 0,
            reset: false,
            receive_capacity: RECEIVE_BUFFER_SIZE,
            transmit_capacity: TRANSMIT_BUFFER_SIZE,
            max_message_size: MAX_MESSAGE_SIZE,
            max_templates: MAX_TEMPLATES,
        }
    }
}

impl SessionOptions {
    /// Parse options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Builder for a [`Session`] over a borrowed descriptor.
pub struct SessionBuilder<'fd> {
    fd: BorrowedFd<'fd>,
    options: SessionOptions,
}

impl<'fd> SessionBuilder<'fd> {
    /// Create a builder over `fd` with default options.
    ///
    /// The caller keeps ownership of the descriptor and closes it after the
    /// session is dropped.
    pub fn new(fd: BorrowedFd<'fd>) -> Self {
        Self {
            fd,
            options: SessionOptions::default(),
        }
    }

    /// Replace all options.
    pub fn options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the preamble byte count.
    pub fn preamble_bytes(mut self, preamble_bytes: usize) -> Self {
        self.options.preamble_bytes = preamble_bytes;
        self
    }

    /// Set the reset flag.
    pub fn reset(mut self, reset: bool) -> Self {
        self.options.reset = reset;
        self
    }

    /// Set the receive buffer capacity.
    pub fn receive_capacity(mut self, capacity: usize) -> Self {
        self.options.receive_capacity = capacity;
        self
    }

    /// Set the capacity of each transmit buffer.
    pub fn transmit_capacity(mut self, capacity: usize) -> Self {
        self.options.transmit_capacity = capacity;
        self
    }

    /// Set the max message size.
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.options.max_message_size = size;
        self
    }

    /// Set the number of template slots.
    pub fn max_templates(mut self, count: usize) -> Self {
        self.options.max_templates = count;
        self
    }

    /// Acquire every resource and build the session.
    ///
    /// Each step either succeeds or returns early; whatever was acquired
    /// before the failing step is dropped on the way out.
    pub fn build<C: Codec>(self, codec: C) -> Result<Session<'fd, C>> {
        let options = self.options;

        if options.max_message_size == 0 {
            return Err(SessionError::ZeroMaxMessageSize);
        }
        if !receive_capacity_is_sufficient(options.receive_capacity, options.max_message_size) {
            return Err(SessionError::UndersizedReceiveBuffer {
                capacity: options.receive_capacity,
                max_message_size: options.max_message_size,
            });
        }

        let rx = alloc_buffer("receive buffer", options.receive_capacity)?;
        let tx_payload = alloc_transmit("payload buffer", options.transmit_capacity)?;
        let tx_pmap = alloc_transmit("presence map buffer", options.transmit_capacity)?;

        let mut templates = Vec::new();
        templates
            .try_reserve_exact(options.max_templates)
            .map_err(|source| SessionError::Alloc {
                what: "template slots",
                size: options.max_templates,
                source,
            })?;

        if options.preamble_bytes > PREAMBLE_MAX_BYTES {
            return Err(SessionError::PreambleTooLarge {
                requested: options.preamble_bytes,
                max: PREAMBLE_MAX_BYTES,
            });
        }

        let transport = Transport::detect(self.fd).map_err(SessionError::DescriptorKind)?;

        tracing::debug!(
            transport = transport.name(),
            preamble_bytes = options.preamble_bytes,
            receive_capacity = options.receive_capacity,
            max_templates = options.max_templates,
            "session created"
        );

        Ok(Session {
            codec,
            fd: self.fd,
            transport,
            rx,
            tx_payload,
            tx_pmap,
            transmit_capacity: options.transmit_capacity,
            templates,
            max_templates: options.max_templates,
            max_message_size: options.max_message_size,
            preamble_bytes: options.preamble_bytes,
            reset: options.reset,
            last_template_id: None,
            stats: SessionStats::default(),
        })
    }
}

fn alloc_buffer(what: &'static str, size: usize) -> Result<Buffer> {
    Buffer::with_capacity(size).map_err(|source| SessionError::Alloc { what, size, source })
}

fn alloc_transmit(what: &'static str, size: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(size)
        .map_err(|source| SessionError::Alloc { what, size, source })?;
    Ok(buf)
}
