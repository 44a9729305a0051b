//! Shared test support: a small FAST-style codec and capture files.
//!
//! Wire layout produced and accepted by [`StopBitCodec`]:
//!
//! ```text
//! [preamble: N bytes][pmap: 1 byte, stop bit set][tid: stop-bit, if pmap 0x40][field: stop-bit, if pmap bit]...
//! ```
//!
//! Field `i` is present when pmap bit `0x20 >> i` is set. An absent field
//! takes the value retained from the previous message of the same template
//! (FAST copy operator); with nothing retained, the message is malformed.

#![allow(dead_code)]

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::{Buf, BufMut};
use fast_session::codec::{
    Codec, CodecError, DecodeContext, Decoded, EncodeBuffers, Template, TransmitBuf,
};

const STOP_BIT: u8 = 0x80;
const PMAP_TID: u8 = 0x40;
const MAX_FIELDS: usize = 6;

/// Template with up to six unsigned integer fields using the copy operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub id: u32,
    /// Current field values (decoded, or to be encoded).
    pub fields: Vec<Option<u64>>,
    /// Encoder dictionary: values last sent for this template.
    sent: Vec<Option<u64>>,
}

impl Quote {
    pub fn new(id: u32, field_count: usize) -> Self {
        assert!(field_count <= MAX_FIELDS);
        Self {
            id,
            fields: vec![None; field_count],
            sent: vec![None; field_count],
        }
    }

    pub fn with_values(id: u32, values: &[u64]) -> Self {
        let mut quote = Self::new(id, values.len());
        quote.set(values);
        quote
    }

    pub fn set(&mut self, values: &[u64]) {
        assert_eq!(values.len(), self.fields.len());
        self.fields = values.iter().copied().map(Some).collect();
    }

    pub fn values(&self) -> Vec<u64> {
        self.fields.iter().map(|v| v.unwrap_or_default()).collect()
    }
}

impl Template for Quote {
    fn template_id(&self) -> u32 {
        self.id
    }

    fn reset(&mut self) {
        self.fields.iter_mut().for_each(|v| *v = None);
        self.sent.iter_mut().for_each(|v| *v = None);
    }
}

/// Decode one stop-bit encoded integer. `None` means the input ran out.
fn get_stop_bit(input: &mut &[u8]) -> Result<Option<u64>, CodecError> {
    let mut value: u64 = 0;
    for _ in 0..10 {
        if !input.has_remaining() {
            return Ok(None);
        }
        let byte = input.get_u8();
        value = (value << 7) | u64::from(byte & 0x7F);
        if byte & STOP_BIT != 0 {
            return Ok(Some(value));
        }
    }
    Err(CodecError::Malformed("stop-bit integer overlong".to_string()))
}

fn put_stop_bit(out: &mut TransmitBuf<'_>, value: u64) -> Result<(), CodecError> {
    let mut groups = [0u8; 10];
    let mut n = 0;
    let mut v = value;
    loop {
        groups[n] = (v & 0x7F) as u8;
        n += 1;
        v >>= 7;
        if v == 0 {
            break;
        }
    }
    if out.remaining_mut() < n {
        return Err(CodecError::BufferFull {
            needed: n,
            available: out.remaining_mut(),
        });
    }
    for i in (0..n).rev() {
        let stop = if i == 0 { STOP_BIT } else { 0 };
        out.put_u8(groups[i] | stop);
    }
    Ok(())
}

/// Minimal FAST-style codec used by the integration tests.
#[derive(Debug, Default)]
pub struct StopBitCodec {
    /// Sequence number written into the preamble.
    seq: u32,
}

impl Codec for StopBitCodec {
    type Message = Quote;

    fn decode(
        &mut self,
        input: &mut &[u8],
        cx: &mut DecodeContext<'_, Quote>,
    ) -> Result<Decoded, CodecError> {
        let mut cur = *input;

        if cur.remaining() < cx.preamble_bytes() + 1 {
            return Ok(Decoded::Incomplete);
        }
        cur.advance(cx.preamble_bytes());

        let pmap = cur.get_u8();
        if pmap & STOP_BIT == 0 {
            return Err(CodecError::Malformed(
                "presence map longer than one byte".to_string(),
            ));
        }

        let tid = if pmap & PMAP_TID != 0 {
            match get_stop_bit(&mut cur)? {
                Some(tid) => tid as u32,
                None => return Ok(Decoded::Incomplete),
            }
        } else {
            cx.last_template_id()
                .ok_or_else(|| CodecError::Malformed("no previous template id".to_string()))?
        };
        let slot = cx.find(tid).ok_or(CodecError::UnknownTemplate(tid))?;

        let retained = &cx.templates()[slot].fields;
        let mut values = Vec::with_capacity(retained.len());
        for (i, previous) in retained.iter().enumerate() {
            if pmap & (0x20 >> i) != 0 {
                match get_stop_bit(&mut cur)? {
                    Some(v) => values.push(Some(v)),
                    None => return Ok(Decoded::Incomplete),
                }
            } else if previous.is_some() {
                values.push(*previous);
            } else {
                return Err(CodecError::Malformed(format!(
                    "template {} field {} absent with nothing retained",
                    tid, i
                )));
            }
        }

        cx.templates_mut()[slot].fields = values;
        *input = cur;
        Ok(Decoded::Complete(slot))
    }

    fn encode(&mut self, message: &mut Quote, mut out: EncodeBuffers<'_>) -> Result<(), CodecError> {
        if out.pmap.remaining_mut() < out.preamble_bytes + 1 {
            return Err(CodecError::BufferFull {
                needed: out.preamble_bytes + 1,
                available: out.pmap.remaining_mut(),
            });
        }
        let preamble = self.seq.to_be_bytes();
        out.pmap
            .put_slice(&preamble[preamble.len() - out.preamble_bytes..]);
        self.seq = self.seq.wrapping_add(1);

        put_stop_bit(&mut out.payload, u64::from(message.id))?;

        let mut pmap = STOP_BIT | PMAP_TID;
        for i in 0..message.fields.len() {
            let value = message.fields[i].ok_or_else(|| {
                CodecError::Malformed(format!("field {} has no value", i))
            })?;
            if message.sent[i] != Some(value) {
                pmap |= 0x20 >> i;
                put_stop_bit(&mut out.payload, value)?;
                message.sent[i] = Some(value);
            }
        }
        out.pmap.put_u8(pmap);
        Ok(())
    }
}

/// Encode `messages` back to back, the way a peer session would send them.
///
/// `messages` share one encoder dictionary per template id, so repeated
/// values are omitted exactly like on a live connection.
pub fn encode_messages(messages: &[(u32, &[u64])], preamble_bytes: usize) -> Vec<u8> {
    let mut codec = StopBitCodec::default();
    let mut dictionaries: Vec<Quote> = Vec::new();
    let mut wire = Vec::new();

    for (id, values) in messages {
        let position = match dictionaries.iter().position(|q| q.id == *id) {
            Some(p) => p,
            None => {
                dictionaries.push(Quote::new(*id, values.len()));
                dictionaries.len() - 1
            }
        };
        let quote = &mut dictionaries[position];
        quote.set(values);

        let mut pmap = Vec::with_capacity(64);
        let mut payload = Vec::with_capacity(256);
        codec
            .encode(
                quote,
                EncodeBuffers {
                    pmap: (&mut pmap).limit(64),
                    payload: (&mut payload).limit(256),
                    preamble_bytes,
                },
            )
            .unwrap();
        wire.extend_from_slice(&pmap);
        wire.extend_from_slice(&payload);
    }

    wire
}

/// Recorded byte stream on disk, removed on drop.
pub struct Capture {
    path: PathBuf,
    pub file: File,
}

impl Capture {
    pub fn with_bytes(bytes: &[u8]) -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);

        let path = std::env::temp_dir().join(format!(
            "fast-session-capture-{}-{}",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::Relaxed)
        ));
        let mut writer = File::create(&path).unwrap();
        writer.write_all(bytes).unwrap();
        drop(writer);

        let file = OpenOptions::new().read(true).open(&path).unwrap();
        Self { path, file }
    }
}

impl Drop for Capture {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
