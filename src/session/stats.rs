//! Per-session counters.

/// Counters for I/O and framing activity on one session.
///
/// Plain integers: a session is single-threaded and the counters are only
/// read through `&Session`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Transport reads issued by `receive`.
    pub reads: u64,
    /// Reads that hit end of stream.
    pub eof: u64,
    /// Reads that failed.
    pub read_errors: u64,
    /// Bytes appended to the receive buffer.
    pub bytes_received: u64,
    /// Times the codec was asked to decode.
    pub decode_attempts: u64,
    /// Messages returned by `receive`.
    pub messages_received: u64,
    /// Compactions that moved unread bytes to the front.
    ///
    /// A threshold hit with nothing consumed yet is not counted.
    pub compactions: u64,
    /// Messages transmitted by `send`.
    pub messages_sent: u64,
    /// Bytes transmitted by `send`.
    pub bytes_sent: u64,
    /// Calls to `reset`.
    pub resets: u64,
}
