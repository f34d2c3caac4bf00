//! Self-delimiting wire frames
//!
//! Wire format:
//!
//! ```text
//! +----------------+------------------+
//! | length         | payload          |
//! | uvarint        | variable         |
//! +----------------+------------------+
//! ```
//!
//! The length prefix is an unsigned LEB128 varint: 7 bits per byte, high bit
//! set on every byte except the last. Frames carry no other delimiters, so
//! any number of them can share one stream; decoding consumes exactly one
//! frame per call.

use std::io::{self, Read, Write};

/// Upper bound on a declared payload length. Whole files travel in a single
/// frame, but a prefix beyond this means a corrupt stream, not a file.
pub const MAX_FRAME_LEN: u32 = 256 * 1024 * 1024;

/// Write one frame: length prefix plus payload. Does not flush.
///
/// # Errors
/// Returns an error if the payload exceeds [`MAX_FRAME_LEN`] or the write
/// fails.
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> io::Result<()> {
    if payload.len() as u64 > u64::from(MAX_FRAME_LEN) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("payload of {} bytes exceeds frame limit", payload.len()),
        ));
    }
    write_uvarint(writer, payload.len() as u32)?;
    writer.write_all(payload)
}

/// Read one frame's payload.
///
/// `Ok(None)` means the stream closed cleanly at a frame boundary. EOF
/// anywhere inside a frame, an over-wide varint, or an over-limit length is
/// an error.
///
/// # Errors
/// Returns an error on truncated or malformed frames.
pub fn read_frame<R: Read>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let Some(len) = read_uvarint(reader)? else {
        return Ok(None);
    };
    if len > MAX_FRAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("declared frame length {len} exceeds limit"),
        ));
    }
    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload)?;
    Ok(Some(payload))
}

fn write_uvarint<W: Write>(writer: &mut W, mut value: u32) -> io::Result<()> {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            return writer.write_all(&[byte]);
        }
        writer.write_all(&[byte | 0x80])?;
    }
}

/// `Ok(None)` only when EOF hits before the first prefix byte.
fn read_uvarint<R: Read>(reader: &mut R) -> io::Result<Option<u32>> {
    let mut value: u32 = 0;
    let mut shift: u32 = 0;
    loop {
        let mut byte = [0u8; 1];
        match reader.read_exact(&mut byte) {
            Ok(()) => {}
            Err(err) if shift == 0 && err.kind() == io::ErrorKind::UnexpectedEof => {
                return Ok(None);
            }
            Err(err) => return Err(err),
        }
        let b = byte[0];
        // The fifth byte may only carry the top four bits of a u32.
        if shift == 28 && b > 0x0f {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "length prefix overflows 32 bits",
            ));
        }
        value |= u32::from(b & 0x7f) << shift;
        if b & 0x80 == 0 {
            return Ok(Some(value));
        }
        shift += 7;
        if shift > 28 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "length prefix longer than five bytes",
            ));
        }
    }
}
