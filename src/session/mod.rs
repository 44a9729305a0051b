//! FAST session - buffering, framing and per-template state for one connection.
//!
//! A [`Session`] borrows an open descriptor and owns everything else:
//!
//! ```text
//!                 ┌───────────────────────── Session ─────────────────────────┐
//!  descriptor ──► │ Transport ─► rx Buffer ─► Codec::decode ─► template slots │ ──► &Message
//!                 │                                                           │
//!  &mut Message ─►│ Codec::encode ─► tx pmap + tx payload ─► Transport (iov)  │ ──► descriptor
//!                 └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything is synchronous: `receive` and `send` block on the descriptor and
//! return when done. Both take `&mut self`, so the borrow returned by
//! `receive` has to be dropped before the session can be used again.

mod builder;
mod receive;
mod send;
mod stats;

use std::os::fd::BorrowedFd;

pub use builder::{SessionBuilder, SessionOptions};
pub use stats::SessionStats;

use crate::codec::{Codec, Template};
use crate::error::{Result, SessionError};
use crate::protocol::Buffer;
use crate::transport::Transport;

/// One FAST connection.
pub struct Session<'fd, C: Codec> {
    codec: C,
    fd: BorrowedFd<'fd>,
    transport: Transport,
    rx: Buffer,
    tx_payload: Vec<u8>,
    tx_pmap: Vec<u8>,
    /// Write limit of each transmit buffer.
    transmit_capacity: usize,
    /// Tracked template slots; `len()` is the tracked count.
    templates: Vec<C::Message>,
    max_templates: usize,
    max_message_size: usize,
    preamble_bytes: usize,
    reset: bool,
    last_template_id: Option<u32>,
    stats: SessionStats,
}

impl<'fd, C: Codec> Session<'fd, C> {
    /// Track a template slot.
    ///
    /// Returns the slot index.
    pub fn register_template(&mut self, template: C::Message) -> Result<usize> {
        let id = template.template_id();

        if self.templates.iter().any(|t| t.template_id() == id) {
            return Err(SessionError::DuplicateTemplate(id));
        }
        if self.templates.len() >= self.max_templates {
            return Err(SessionError::TemplateLimit {
                max: self.max_templates,
            });
        }

        self.templates.push(template);
        tracing::trace!(template_id = id, slot = self.templates.len() - 1, "template registered");
        Ok(self.templates.len() - 1)
    }

    /// Clear retained field state of every tracked template.
    ///
    /// Slots stay allocated and registered.
    pub fn reset(&mut self) {
        for template in &mut self.templates {
            template.reset();
        }
        self.stats.resets += 1;
        tracing::debug!(templates = self.templates.len(), "session reset");
    }

    /// Template slot with this id.
    pub fn template(&self, template_id: u32) -> Option<&C::Message> {
        self.templates
            .iter()
            .find(|t| t.template_id() == template_id)
    }

    /// Template slot with this id, mutable.
    pub fn template_mut(&mut self, template_id: u32) -> Option<&mut C::Message> {
        self.templates
            .iter_mut()
            .find(|t| t.template_id() == template_id)
    }

    /// All tracked template slots, in registration order.
    #[inline]
    pub fn templates(&self) -> &[C::Message] {
        &self.templates
    }

    /// Number of tracked templates.
    #[inline]
    pub fn tracked_templates(&self) -> usize {
        self.templates.len()
    }

    /// Template slot capacity.
    #[inline]
    pub fn max_templates(&self) -> usize {
        self.max_templates
    }

    /// Template id of the last decoded message.
    #[inline]
    pub fn last_template_id(&self) -> Option<u32> {
        self.last_template_id
    }

    /// Configured preamble length.
    #[inline]
    pub fn preamble_bytes(&self) -> usize {
        self.preamble_bytes
    }

    /// Configured reset flag.
    #[inline]
    pub fn reset_on_connect(&self) -> bool {
        self.reset
    }

    /// Largest message framed by this session.
    #[inline]
    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// Transport selected at construction.
    #[inline]
    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// Borrowed descriptor.
    #[inline]
    pub fn fd(&self) -> BorrowedFd<'fd> {
        self.fd
    }

    /// Receive buffer (read-only view).
    #[inline]
    pub fn receive_buffer(&self) -> &Buffer {
        &self.rx
    }

    /// Presence-map and payload transmit buffers, as left by the last send.
    #[inline]
    pub fn transmit_buffers(&self) -> (&[u8], &[u8]) {
        (&self.tx_pmap, &self.tx_payload)
    }

    /// Write limit of each transmit buffer.
    #[inline]
    pub fn transmit_capacity(&self) -> usize {
        self.transmit_capacity
    }

    /// I/O and framing counters.
    #[inline]
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// The codec driving this session.
    #[inline]
    pub fn codec(&self) -> &C {
        &self.codec
    }
}

impl<C: Codec> Drop for Session<'_, C> {
    fn drop(&mut self) {
        tracing::debug!(
            transport = self.transport.name(),
            messages_received = self.stats.messages_received,
            messages_sent = self.stats.messages_sent,
            "session released"
        );
    }
}

impl<C: Codec> std::fmt::Debug for Session<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("transport", &self.transport)
            .field("rx", &self.rx)
            .field("tracked_templates", &self.templates.len())
            .field("last_template_id", &self.last_template_id)
            .field("preamble_bytes", &self.preamble_bytes)
            .field("reset", &self.reset)
            .finish()
    }
}
