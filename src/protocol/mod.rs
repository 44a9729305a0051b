//! Protocol module - limits and the session byte buffer.
//!
//! This module provides the pieces of the wire contract the session itself
//! relies on:
//! - Message, preamble and template limits
//! - Fixed-capacity buffer with explicit compaction

mod buffer;
mod limits;

pub use buffer::Buffer;
pub use limits::{
    receive_capacity_is_sufficient, MAX_MESSAGE_SIZE, MAX_TEMPLATES, PREAMBLE_MAX_BYTES,
    RECEIVE_BUFFER_SIZE, TRANSMIT_BUFFER_SIZE,
};
