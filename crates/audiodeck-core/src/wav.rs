//! WAV encoding for raw PCM returned by the TTS service.
//!
//! Pure functions — no I/O, no async runtime.

/// Kokoro PCM streaming format: 24 kHz mono 16-bit signed LE.
pub const PCM_SAMPLE_RATE: u32 = 24_000;

/// Write a minimal WAV file (16-bit mono PCM) from raw samples.
pub fn write_wav(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let file_len = 36 + data_len;
    let mut buf = Vec::with_capacity(44 + data_len as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_len.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&1u16.to_le_bytes()); // mono
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&(sample_rate * 2).to_le_bytes()); // byte rate
    buf.extend_from_slice(&2u16.to_le_bytes()); // block align
    buf.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

    // data chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_len.to_le_bytes());
    for &sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    buf
}

/// Convert raw bytes to i16 PCM samples (little-endian).
///
/// `leftover` is an odd byte carried over from the previous chunk; the odd
/// byte at the end of this chunk, if any, is returned for the next call.
pub fn bytes_to_i16(bytes: &[u8], leftover: Option<u8>) -> (Vec<i16>, Option<u8>) {
    let mut data: Vec<u8>;
    let slice = if let Some(lo) = leftover {
        data = Vec::with_capacity(1 + bytes.len());
        data.push(lo);
        data.extend_from_slice(bytes);
        &data[..]
    } else {
        bytes
    };

    let mut samples = Vec::with_capacity(slice.len() / 2);
    for pair in slice.chunks_exact(2) {
        samples.push(i16::from_le_bytes([pair[0], pair[1]]));
    }

    let remainder = if slice.len() % 2 == 1 {
        slice.last().copied()
    } else {
        None
    };

    (samples, remainder)
}
