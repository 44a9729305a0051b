//! Send side: two transmit buffers, one gathered write.
//!
//! ```text
//! Codec::encode ─┬─► tx pmap    (preamble + presence map) ─┐
//!                └─► tx payload (template id + fields)    ─┴─► [iov; 2] ─► Transport
//! ```

use std::io::IoSlice;

use bytes::BufMut;
use nix::sys::socket::MsgFlags;

use super::Session;
use crate::codec::{Codec, EncodeBuffers, Template};
use crate::error::{Result, SessionError};

impl<'fd, C: Codec> Session<'fd, C> {
    /// Serialize and transmit one message.
    ///
    /// Both transmit buffers are emptied before the codec runs, so nothing
    /// from a previous send can leak into this one. Returns the number of
    /// bytes handed to the transport.
    ///
    /// `flags` are passed to `sendmsg` on sockets and ignored otherwise.
    pub fn send(&mut self, message: &mut C::Message, flags: MsgFlags) -> Result<usize> {
        self.tx_pmap.clear();
        self.tx_payload.clear();

        let out = EncodeBuffers {
            pmap: (&mut self.tx_pmap).limit(self.transmit_capacity),
            payload: (&mut self.tx_payload).limit(self.transmit_capacity),
            preamble_bytes: self.preamble_bytes,
        };
        if let Err(e) = self.codec.encode(message, out) {
            tracing::warn!(template_id = message.template_id(), error = %e, "encode failed");
            return Err(SessionError::Encode(e));
        }

        let iov = [
            IoSlice::new(&self.tx_pmap),
            IoSlice::new(&self.tx_payload),
        ];
        let sent = self.transport.send(self.fd, &iov, flags)?;

        self.stats.messages_sent += 1;
        self.stats.bytes_sent += sent as u64;
        tracing::trace!(
            template_id = message.template_id(),
            pmap = self.tx_pmap.len(),
            payload = self.tx_payload.len(),
            sent,
            "message sent"
        );

        Ok(sent)
    }
}
