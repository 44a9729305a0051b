//! Descriptor-kind based transport selection.
//!
//! The kind is resolved once with `fstat` when the session is built:
//!
//! - `S_IFSOCK`: [`Transport::Socket`] - scatter/gather `sendmsg`, `recv`
//! - anything else: [`Transport::Stream`] - `writev`, `read`
//!
//! The stream variant is what lets a session replay a recorded capture file
//! with exactly the same framing logic that runs against a live socket.
//!
//! # Example
//!
//! ```
//! use std::os::fd::AsFd;
//! use std::os::unix::net::UnixStream;
//! use fast_session::transport::Transport;
//!
//! let (a, _b) = UnixStream::pair().unwrap();
//! assert_eq!(Transport::detect(a.as_fd()).unwrap(), Transport::Socket);
//! ```

use std::io::{self, IoSlice};
use std::os::fd::{AsRawFd, BorrowedFd};

use nix::errno::Errno;
use nix::sys::socket::{self, MsgFlags};
use nix::sys::stat::{fstat, SFlag};
use nix::sys::uio::writev;
use nix::unistd;

/// Send/receive strategy, chosen once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Network or Unix domain socket.
    Socket,
    /// Any other stream-like descriptor (file, pipe, tty).
    Stream,
}

impl Transport {
    /// Inspect the descriptor kind.
    pub fn detect(fd: BorrowedFd<'_>) -> io::Result<Self> {
        let stat = fstat(fd.as_raw_fd())?;
        let format = SFlag::from_bits_truncate(stat.st_mode & SFlag::S_IFMT.bits());

        if format == SFlag::S_IFSOCK {
            Ok(Transport::Socket)
        } else {
            Ok(Transport::Stream)
        }
    }

    /// Human-readable name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Transport::Socket => "socket",
            Transport::Stream => "stream",
        }
    }

    /// Transmit `iov` as one gathered write.
    ///
    /// Sockets get a single `sendmsg` and its byte count. Streams keep
    /// writing until every byte is out, so a replay file never holds half a
    /// message.
    pub fn send(&self, fd: BorrowedFd<'_>, iov: &[IoSlice<'_>], flags: MsgFlags) -> io::Result<usize> {
        match self {
            Transport::Socket => retry_eintr(|| {
                socket::sendmsg::<()>(fd.as_raw_fd(), iov, &[], flags, None)
            }),
            Transport::Stream => write_all_vectored(fd, iov),
        }
    }

    /// Read up to `buf.len()` bytes.
    ///
    /// Returns 0 on end of stream.
    pub fn recv(&self, fd: BorrowedFd<'_>, buf: &mut [u8], flags: MsgFlags) -> io::Result<usize> {
        match self {
            Transport::Socket => retry_eintr(|| socket::recv(fd.as_raw_fd(), buf, flags)),
            Transport::Stream => retry_eintr(|| unistd::read(fd.as_raw_fd(), buf)),
        }
    }
}

/// Run a syscall wrapper until it stops failing with `EINTR`.
fn retry_eintr<F>(mut op: F) -> io::Result<usize>
where
    F: FnMut() -> nix::Result<usize>,
{
    loop {
        match op() {
            Err(Errno::EINTR) => continue,
            result => return result.map_err(io::Error::from),
        }
    }
}

/// `writev` until all segments are written.
fn write_all_vectored(fd: BorrowedFd<'_>, iov: &[IoSlice<'_>]) -> io::Result<usize> {
    let total_size: usize = iov.iter().map(|s| s.len()).sum();

    // Fast path: the whole message goes out in one syscall
    let written = retry_eintr(|| writev(fd, iov))?;
    if written == total_size {
        return Ok(written);
    }

    let segments: Vec<&[u8]> = iov.iter().map(|s| &s[..]).collect();
    let mut total_written = written;

    while total_written < total_size {
        if total_written == 0 {
            return Err(write_zero());
        }

        let remaining = remaining_slices(&segments, total_written);
        let written = retry_eintr(|| writev(fd, &remaining))?;
        if written == 0 {
            return Err(write_zero());
        }

        total_written += written;
    }

    Ok(total_written)
}

fn write_zero() -> io::Error {
    io::Error::new(io::ErrorKind::WriteZero, "writev returned 0")
}

/// Build IoSlice array for the data left after `skip_bytes` were written.
pub fn remaining_slices<'a>(segments: &[&'a [u8]], skip_bytes: usize) -> Vec<IoSlice<'a>> {
    let mut slices = Vec::with_capacity(segments.len());
    let mut skipped = 0;

    for segment in segments {
        let segment_start = skipped;
        let segment_end = skipped + segment.len();

        if skip_bytes < segment_end && !segment.is_empty() {
            let start_in_segment = skip_bytes.saturating_sub(segment_start);
            slices.push(IoSlice::new(&segment[start_in_segment..]));
        }
        skipped = segment_end;
    }

    slices
}
