//! Codec seam - the message codec the session drives.
//!
//! The session never interprets field bytes. It hands the codec the unread
//! receive bytes and the template slots, and gets back either a decoded slot,
//! a request for more data, or an error. For sending, it hands the codec two
//! empty transmit buffers and writes whatever the codec put in them.
//!
//! # Design
//!
//! Each template slot doubles as the decoded message: decoding a message for
//! template `T` overwrites the fields of `T`'s slot in place, which is also
//! where FAST keeps the values retained for the copy/delta/increment operators.
//! The session returns a shared borrow of that slot, so a message is only
//! valid until the next call on the session.
//!
//! # Example
//!
//! ```
//! use bytes::{Buf, BufMut};
//! use fast_session::codec::{Codec, CodecError, DecodeContext, Decoded, EncodeBuffers, Template};
//!
//! struct Heartbeat { seq: u8 }
//!
//! impl Template for Heartbeat {
//!     fn template_id(&self) -> u32 { 1 }
//!     fn reset(&mut self) { self.seq = 0; }
//! }
//!
//! struct OneByte;
//!
//! impl Codec for OneByte {
//!     type Message = Heartbeat;
//!
//!     fn decode(
//!         &mut self,
//!         input: &mut &[u8],
//!         cx: &mut DecodeContext<'_, Heartbeat>,
//!     ) -> Result<Decoded, CodecError> {
//!         if !input.has_remaining() {
//!             return Ok(Decoded::Incomplete);
//!         }
//!         let slot = cx.find(1).ok_or(CodecError::UnknownTemplate(1))?;
//!         cx.templates_mut()[slot].seq = input.get_u8();
//!         Ok(Decoded::Complete(slot))
//!     }
//!
//!     fn encode(&mut self, msg: &mut Heartbeat, mut out: EncodeBuffers<'_>) -> Result<(), CodecError> {
//!         if !out.payload.has_remaining_mut() {
//!             return Err(CodecError::BufferFull { needed: 1, available: 0 });
//!         }
//!         out.payload.put_u8(msg.seq);
//!         Ok(())
//!     }
//! }
//! ```

use bytes::buf::Limit;
use thiserror::Error;

/// Errors a codec reports back to the session.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Bytes cannot be decoded as a message of any known template.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// Template id is not tracked by this session.
    #[error("unknown template id {0}")]
    UnknownTemplate(u32),

    /// Transmit buffer is too small for the encoded message.
    #[error("buffer full: need {needed} bytes, {available} available")]
    BufferFull {
        /// Bytes the codec tried to write.
        needed: usize,
        /// Bytes left in the buffer.
        available: usize,
    },
}

/// Per-template decode state.
///
/// Opaque to the session apart from its id and reset.
pub trait Template {
    /// Template id this slot decodes.
    fn template_id(&self) -> u32;

    /// Forget all retained field values, as if no message had been seen.
    fn reset(&mut self);
}

/// Outcome of a single decode attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// A whole message was decoded into the template slot at this index.
    Complete(usize),
    /// The buffered bytes end before the message does.
    Incomplete,
}

/// Session state visible to the codec while decoding.
pub struct DecodeContext<'a, M> {
    templates: &'a mut [M],
    last_template_id: Option<u32>,
    preamble_bytes: usize,
    reset: bool,
}

impl<'a, M: Template> DecodeContext<'a, M> {
    pub(crate) fn new(
        templates: &'a mut [M],
        last_template_id: Option<u32>,
        preamble_bytes: usize,
        reset: bool,
    ) -> Self {
        Self {
            templates,
            last_template_id,
            preamble_bytes,
            reset,
        }
    }

    /// Number of preamble bytes preceding each message.
    #[inline]
    pub fn preamble_bytes(&self) -> usize {
        self.preamble_bytes
    }

    /// Reset flag the session was configured with.
    #[inline]
    pub fn reset_enabled(&self) -> bool {
        self.reset
    }

    /// Template id of the last decoded message, used when a presence map
    /// omits the template id.
    #[inline]
    pub fn last_template_id(&self) -> Option<u32> {
        self.last_template_id
    }

    /// Slot index of the template with this id.
    pub fn find(&self, template_id: u32) -> Option<usize> {
        self.templates
            .iter()
            .position(|t| t.template_id() == template_id)
    }

    /// Tracked template slots.
    #[inline]
    pub fn templates(&self) -> &[M] {
        self.templates
    }

    /// Tracked template slots, mutable.
    #[inline]
    pub fn templates_mut(&mut self) -> &mut [M] {
        self.templates
    }
}

/// A transmit buffer as seen by the codec.
///
/// Storage is reserved up front; the limit stops writes at the configured
/// capacity, so `put_*` never reallocates. Check
/// [`remaining_mut`](bytes::BufMut::remaining_mut) before writing.
pub type TransmitBuf<'a> = Limit<&'a mut Vec<u8>>;

/// The two transmit buffers handed to [`Codec::encode`], both empty.
///
/// The preamble and presence map go into `pmap`, and the template id and
/// field bytes go into `payload`. The session transmits `pmap` first.
pub struct EncodeBuffers<'a> {
    /// Preamble and presence-map bytes.
    pub pmap: TransmitBuf<'a>,
    /// Template id and field bytes.
    pub payload: TransmitBuf<'a>,
    /// Preamble length the session was configured with.
    pub preamble_bytes: usize,
}

/// Message codec driven by the session.
pub trait Codec {
    /// Template slot type, which is also the decoded message.
    type Message: Template;

    /// Decode one message from `input`.
    ///
    /// On [`Decoded::Complete`] the codec must have advanced `input` past the
    /// message (preamble included); the session consumes exactly that many
    /// bytes. On [`Decoded::Incomplete`] the codec must leave the template
    /// slots as they were, because the same bytes will be offered again once
    /// more data arrives.
    fn decode(
        &mut self,
        input: &mut &[u8],
        cx: &mut DecodeContext<'_, Self::Message>,
    ) -> Result<Decoded, CodecError>;

    /// Serialize `message` into the transmit buffers.
    ///
    /// Takes the message mutably so encoder-side retained values can be
    /// updated.
    fn encode(
        &mut self,
        message: &mut Self::Message,
        out: EncodeBuffers<'_>,
    ) -> Result<(), CodecError>;
}
