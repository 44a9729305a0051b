//! # fast-session
//!
//! Session and framing layer for the FAST market-data protocol.
//!
//! This crate sits between a byte-stream descriptor and a FAST message codec.
//! It owns the connection-scoped buffers, finds message boundaries, and keeps
//! the per-template state that FAST field retention needs.
//!
//! ## Architecture
//!
//! - **Transport**: socket (`sendmsg`/`recv`) or plain stream (`writev`/`read`),
//!   picked once from the descriptor kind
//! - **Receive**: decode buffered bytes first, read only when needed, compact
//!   before the buffer runs short
//! - **Send**: presence map and payload in separate buffers, one gathered write
//! - **Codec**: pluggable, see [`codec::Codec`]; the session never looks at
//!   field bytes
//!
//! ## Example
//!
//! ```ignore
//! use std::os::fd::AsFd;
//! use fast_session::{MsgFlags, SessionBuilder};
//!
//! let stream = std::net::TcpStream::connect("feed.example:9000")?;
//! let mut session = SessionBuilder::new(stream.as_fd())
//!     .preamble_bytes(4)
//!     .build(MyCodec::new())?;
//! session.register_template(Quote::new())?;
//!
//! while let Some(msg) = session.receive(MsgFlags::empty())? {
//!     handle(msg);
//! }
//! ```

pub mod codec;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;

pub use codec::{Codec, CodecError, Decoded, Template};
pub use error::{Result, SessionError};
pub use nix::sys::socket::MsgFlags;
pub use session::{Session, SessionBuilder, SessionOptions, SessionStats};
