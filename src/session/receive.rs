//! Receive side: decode-before-read framing.
//!
//! One `receive` call does at most one transport read:
//!
//! 1. Decode from what is already buffered. Several messages that arrived in
//!    one read are handed out one per call without touching the descriptor.
//! 2. Otherwise compact the buffer if its free tail is no bigger than a
//!    maximal message.
//! 3. Read up to `max_message_size` bytes.
//! 4. Decode again.

use nix::sys::socket::MsgFlags;

use super::Session;
use crate::codec::{Codec, DecodeContext, Decoded, Template};
use crate::error::{Result, SessionError};

impl<'fd, C: Codec> Session<'fd, C> {
    /// Receive the next message.
    ///
    /// Returns:
    /// - `Ok(Some(message))` - a borrow of the decoded template slot, valid
    ///   until the next call on this session
    /// - `Ok(None)` - no complete message this call (end of stream, read
    ///   error, or not enough bytes yet); inspect the descriptor to tell
    ///   them apart
    /// - `Err(SessionError::Decode(..))` - buffered bytes are malformed
    ///
    /// `flags` are passed to `recv` on sockets and ignored otherwise.
    pub fn receive(&mut self, flags: MsgFlags) -> Result<Option<&C::Message>> {
        if let Some(slot) = self.decode_buffered()? {
            return Ok(Some(&self.templates[slot]));
        }

        if self.rx.remaining() <= self.max_message_size {
            let reclaimed = self.rx.compact();
            if reclaimed > 0 {
                self.stats.compactions += 1;
                tracing::trace!(reclaimed, unread = self.rx.len(), "receive buffer compacted");
            }
        }

        let spare = self.rx.spare_mut(self.max_message_size);
        self.stats.reads += 1;

        match self.transport.recv(self.fd, spare, flags) {
            Ok(0) => {
                self.stats.eof += 1;
                tracing::debug!(unread = self.rx.len(), "end of stream");
                return Ok(None);
            }
            Ok(n) => {
                self.rx.commit(n);
                self.stats.bytes_received += n as u64;
                tracing::trace!(bytes = n, "read");
            }
            Err(e) => {
                self.stats.read_errors += 1;
                tracing::debug!(error = %e, "read failed");
                return Ok(None);
            }
        }

        let slot = self.decode_buffered()?;
        Ok(slot.map(|slot| &self.templates[slot]))
    }

    /// Run the codec once over the unread bytes.
    ///
    /// Consumes the decoded message's bytes and moves the last-template
    /// cursor on success.
    fn decode_buffered(&mut self) -> Result<Option<usize>> {
        if self.rx.is_empty() {
            return Ok(None);
        }

        self.stats.decode_attempts += 1;

        let mut input = self.rx.unread();
        let available = input.len();
        let mut cx = DecodeContext::new(
            &mut self.templates,
            self.last_template_id,
            self.preamble_bytes,
            self.reset,
        );

        let slot = match self.codec.decode(&mut input, &mut cx) {
            Ok(Decoded::Complete(slot)) => slot,
            Ok(Decoded::Incomplete) => return Ok(None),
            Err(e) => {
                tracing::warn!(error = %e, unread = available, "malformed message");
                return Err(SessionError::Decode(e));
            }
        };
        let consumed = available - input.len();

        let template_id = match self.templates.get(slot) {
            Some(template) => template.template_id(),
            None => {
                return Err(SessionError::Decode(crate::codec::CodecError::Malformed(
                    format!(
                        "codec returned slot {} with {} templates tracked",
                        slot,
                        self.templates.len()
                    ),
                )))
            }
        };

        self.rx.consume(consumed);
        self.last_template_id = Some(template_id);
        self.stats.messages_received += 1;
        tracing::trace!(template_id, bytes = consumed, "message decoded");

        Ok(Some(slot))
    }
}
