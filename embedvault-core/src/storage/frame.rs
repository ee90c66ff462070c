//! Framed record encoding for the vector log.
//!
//! # Format
//!
//! Each frame has the format:
//! ```text
//! [checksum:u32][length:u32][body:length]
//! ```
//!
//! The CRC-32 covers the length field and the body, so a damaged length is
//! caught like a damaged body. The body is:
//! ```text
//! [coll_len:u32][collection][id_len:u32][id][dim:u32][vector:f32*dim][meta_len:u32][meta:json]
//! ```
//!
//! All integers and floats are little-endian.

use std::io::{self, Read};

use crate::error::{Error, Result};
use crate::metadata::Metadata;
use crate::vector::{decode_vector, encode_vector, VectorRecord, ELEMENT_WIDTH};

/// Bytes in the `[checksum][length]` header.
pub const HEADER_LEN: u64 = 8;

/// A record together with the collection it was stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub collection: String,
    pub record: VectorRecord,
}

/// Result of reading one frame from a log.
#[derive(Debug)]
pub enum ReadOutcome {
    /// A complete frame of `frame_len` bytes (header included).
    Frame {
        stored: StoredRecord,
        frame_len: u64,
    },
    /// Clean end of the log.
    End,
    /// The log ends inside a frame: an append was cut short.
    Torn,
    /// The body did not match its checksum.
    BadChecksum { frame_len: u64 },
}

fn u32_len(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::InvalidRecord(format!("{what} too long: {len} bytes")))
}

/// Encodes a full frame, header included.
pub fn encode(collection: &str, record: &VectorRecord) -> Result<Vec<u8>> {
    let vector = encode_vector(&record.values);
    let metadata = record.metadata.to_json()?;

    let coll_len = u32_len(collection.len(), "collection name")?;
    let id_len = u32_len(record.id.len(), "record id")?;
    let dim = u32_len(record.values.len(), "vector")?;
    let meta_len = u32_len(metadata.len(), "metadata")?;

    let body_len = 4 + collection.len() + 4 + record.id.len() + 4 + vector.len() + 4 + metadata.len();
    let length = u32_len(body_len, "record")?;

    let mut frame = Vec::with_capacity(HEADER_LEN as usize + body_len);
    frame.extend_from_slice(&[0u8; 4]);
    frame.extend_from_slice(&length.to_le_bytes());
    frame.extend_from_slice(&coll_len.to_le_bytes());
    frame.extend_from_slice(collection.as_bytes());
    frame.extend_from_slice(&id_len.to_le_bytes());
    frame.extend_from_slice(record.id.as_bytes());
    frame.extend_from_slice(&dim.to_le_bytes());
    frame.extend_from_slice(&vector);
    frame.extend_from_slice(&meta_len.to_le_bytes());
    frame.extend_from_slice(metadata.as_bytes());

    let checksum = crc32fast::hash(&frame[4..]);
    frame[..4].copy_from_slice(&checksum.to_le_bytes());

    Ok(frame)
}

/// Reads the next frame starting at `offset`.
///
/// `remaining` is the number of bytes between `offset` and the end of the log;
/// a declared length beyond it is reported as [`ReadOutcome::Torn`] without
/// allocating.
pub fn read_frame<R: Read>(reader: &mut R, offset: u64, remaining: u64) -> Result<ReadOutcome> {
    if remaining == 0 {
        return Ok(ReadOutcome::End);
    }
    if remaining < HEADER_LEN {
        return Ok(ReadOutcome::Torn);
    }

    let mut header = [0u8; HEADER_LEN as usize];
    match reader.read_exact(&mut header) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(ReadOutcome::Torn),
        Err(e) => return Err(Error::Storage(format!("read frame header failed: {}", e))),
    }
    let expected = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let length = u64::from(u32::from_le_bytes([header[4], header[5], header[6], header[7]]));

    if length > remaining - HEADER_LEN {
        return Ok(ReadOutcome::Torn);
    }

    let mut body = vec![0u8; length as usize];
    match reader.read_exact(&mut body) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(ReadOutcome::Torn),
        Err(e) => return Err(Error::Storage(format!("read frame body failed: {}", e))),
    }

    let frame_len = HEADER_LEN + length;
    if checksum(&header[4..], &body) != expected {
        return Ok(ReadOutcome::BadChecksum { frame_len });
    }

    let stored = decode_body(&body).map_err(|reason| Error::Corrupted { offset, reason })?;
    Ok(ReadOutcome::Frame { stored, frame_len })
}

fn checksum(length: &[u8], body: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(length);
    hasher.update(body);
    hasher.finalize()
}

/// Returns true if a complete frame with a valid checksum starts anywhere in
/// `bytes`.
///
/// Used to tell an interrupted final append, whose bytes hold no further
/// frame, from a damaged length field with intact records behind it.
pub fn contains_frame(bytes: &[u8]) -> bool {
    let header = HEADER_LEN as usize;
    (0..bytes.len().saturating_sub(header)).any(|start| {
        let candidate = &bytes[start..];
        let expected = u32::from_le_bytes([candidate[0], candidate[1], candidate[2], candidate[3]]);
        let length = u32::from_le_bytes([candidate[4], candidate[5], candidate[6], candidate[7]]) as usize;
        candidate.len() - header >= length
            && checksum(&candidate[4..header], &candidate[header..header + length]) == expected
    })
}

/// Cursor over a checksummed frame body.
struct Body<'a> {
    bytes: &'a [u8],
}

impl<'a> Body<'a> {
    fn take(&mut self, len: usize, what: &str) -> std::result::Result<&'a [u8], String> {
        if self.bytes.len() < len {
            return Err(format!("{what} overruns frame"));
        }
        let (head, tail) = self.bytes.split_at(len);
        self.bytes = tail;
        Ok(head)
    }

    fn take_u32(&mut self, what: &str) -> std::result::Result<usize, String> {
        let raw = self.take(4, what)?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize)
    }

    fn take_str(&mut self, what: &str) -> std::result::Result<&'a str, String> {
        let len = self.take_u32(what)?;
        let raw = self.take(len, what)?;
        std::str::from_utf8(raw).map_err(|e| format!("{what} is not utf-8: {e}"))
    }
}

fn decode_body(bytes: &[u8]) -> std::result::Result<StoredRecord, String> {
    let mut body = Body { bytes };

    let collection = body.take_str("collection")?.to_owned();
    let id = body.take_str("id")?.to_owned();

    let dim = body.take_u32("dimension")?;
    let byte_len = dim
        .checked_mul(ELEMENT_WIDTH)
        .ok_or_else(|| "dimension overflows".to_string())?;
    let values = decode_vector(body.take(byte_len, "vector")?).map_err(|e| e.to_string())?;

    let metadata = Metadata::from_json(body.take_str("metadata")?).map_err(|e| e.to_string())?;

    if !body.bytes.is_empty() {
        return Err(format!("{} trailing bytes", body.bytes.len()));
    }

    Ok(StoredRecord {
        collection,
        record: VectorRecord {
            id,
            values,
            metadata,
        },
    })
}
