//! D-STAR voice and header
//!
//! D-STAR is a binary (GMSK) mode: each symbol carries one bit
//! in its sign. A voice transmission after the sync consists of
//! twenty voice frames, each followed by three bytes of *slow
//! data*, and one final voice frame.
//!
//! Slow data is scrambled with a fixed three-byte sequence and
//! sent least-significant bit first. Pairs of slow data blocks
//! may carry one fifth of a 20-character text message, marked
//! by a header byte of `0x40` through `0x43`.

use crate::dibit::{dibits_to_bits, read_dibits, DibitSource, SourceExhausted};
use crate::frame::{VoiceCodec, VoiceFrame};

/// Symbols consumed by a voice transmission after its sync
pub const VOICE_SYMBOLS: usize = SLOW_DATA_BLOCKS * (VOICE_BITS + SLOW_DATA_BITS) + VOICE_BITS;

/// Symbols consumed by a radio header after its sync
pub const HEADER_SYMBOLS: usize = 660;

/// Length of the text message, in characters
pub const MESSAGE_LEN: usize = 20;

const VOICE_BITS: usize = 72;
const SLOW_DATA_BITS: usize = 24;
const SLOW_DATA_BLOCKS: usize = 20;
const SCRAMBLER: [u8; 3] = [0x70, 0x4f, 0x93];

/// Decoded voice transmission
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DstarVoice {
    /// 21 AMBE voice frames
    pub voice: Vec<VoiceFrame>,

    /// Descrambled slow data bytes
    pub slow_data: Vec<u8>,

    /// Text message, if all of it was received
    pub message: Option<String>,
}

/// Decode a voice transmission
pub fn decode_voice<S>(source: &mut S) -> Result<DstarVoice, SourceExhausted>
where
    S: DibitSource + ?Sized,
{
    let bits = dibits_to_bits(&read_dibits(source, VOICE_SYMBOLS)?);
    let mut voice = Vec::with_capacity(SLOW_DATA_BLOCKS + 1);
    let mut slow_data = Vec::with_capacity(3 * SLOW_DATA_BLOCKS);

    // voice and slow data alternate; the final chunk is voice only
    for block in bits.chunks(VOICE_BITS + SLOW_DATA_BITS) {
        let (vbits, sbits) = block.split_at(VOICE_BITS);
        voice.push(VoiceFrame::new(VoiceCodec::Ambe3600x2400, vbits));
        for (chunk, key) in sbits.chunks(8).zip(SCRAMBLER.iter()) {
            slow_data.push(lsb_first_byte(chunk) ^ key);
        }
    }

    let message = text_message(&slow_data);
    Ok(DstarVoice {
        voice,
        slow_data,
        message,
    })
}

/// Read a radio header, as raw bits
pub fn decode_header<S>(source: &mut S) -> Result<Vec<u8>, SourceExhausted>
where
    S: DibitSource + ?Sized,
{
    Ok(dibits_to_bits(&read_dibits(source, HEADER_SYMBOLS)?))
}

fn lsb_first_byte(bits: &[u8]) -> u8 {
    bits.iter()
        .enumerate()
        .fold(0u8, |acc, (i, b)| acc | ((b & 0x1) << i))
}

// Assemble the text message from slow data block pairs
fn text_message(slow_data: &[u8]) -> Option<String> {
    let mut msg = [b' '; MESSAGE_LEN];
    let mut seen = [false; 4];

    for pair in slow_data.chunks_exact(6) {
        if (0x40..=0x43).contains(&pair[0]) {
            let idx = (pair[0] & 0x3) as usize;
            msg[idx * 5..idx * 5 + 5].copy_from_slice(&pair[1..6]);
            seen[idx] = true;
        }
    }

    if seen.iter().all(|s| *s) {
        Some(String::from_utf8_lossy(&msg).trim_end().to_owned())
    } else {
        None
    }
}
