//! Transport module - socket vs. plain stream I/O.
//!
//! Provides abstraction over:
//! - Sockets (`sendmsg` / `recv`, flags honoured)
//! - Everything else: files, pipes, ttys (`writev` / `read`, flags ignored)

mod kind;

pub use kind::{remaining_slices, Transport};
