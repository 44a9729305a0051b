//! Protocol limits and default buffer sizing.
//!
//! ```text
//! ┌──────────┬──────────────┬─────────────┬──────────────────┐
//! │ Preamble │ Presence map │ Template ID │ Fields           │
//! │ 0-4 bytes│ stop-bit     │ stop-bit    │ per template     │
//! └──────────┴──────────────┴─────────────┴──────────────────┘
//! ```
//!
//! The session only cares about the sizes below; everything right of the
//! preamble is the codec's business.

/// Largest encoded message (preamble included) the session will frame.
pub const MAX_MESSAGE_SIZE: usize = 1024;

/// Default receive buffer capacity.
///
/// Must stay at least `2 * MAX_MESSAGE_SIZE` so a compacted buffer always has
/// room for one more maximal read.
pub const RECEIVE_BUFFER_SIZE: usize = 2 * MAX_MESSAGE_SIZE;

/// Default capacity of each transmit buffer (presence map and payload).
pub const TRANSMIT_BUFFER_SIZE: usize = MAX_MESSAGE_SIZE;

/// Default number of template slots per session.
pub const MAX_TEMPLATES: usize = 128;

/// Absolute maximum number of preamble bytes.
pub const PREAMBLE_MAX_BYTES: usize = 4;

/// Check that a receive buffer can always fit a maximal read after compaction.
#[inline]
pub fn receive_capacity_is_sufficient(capacity: usize, max_message_size: usize) -> bool {
    max_message_size
        .checked_mul(2)
        .is_some_and(|needed| capacity >= needed)
}
