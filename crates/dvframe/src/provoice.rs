//! EDACS ProVoice
//!
//! ProVoice is a binary mode. After the sync, each frame
//! carries a 16-bit logical ID and two IMBE (7100x4400) voice
//! frames separated by a 16-bit spacer.

use crate::dibit::{bits_to_u64, dibits_to_bits, read_dibits, DibitSource, SourceExhausted};
use crate::frame::{VoiceCodec, VoiceFrame};

/// Symbols consumed by a frame after its sync
pub const FRAME_SYMBOLS: usize = LID_BITS + 2 * IMBE_BITS + SPACER_BITS;

const LID_BITS: usize = 16;
const IMBE_BITS: usize = 142;
const SPACER_BITS: usize = 16;

/// Decoded ProVoice frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProVoiceFrame {
    /// Logical ID
    pub lid: u16,

    /// Two IMBE voice frames
    pub voice: Vec<VoiceFrame>,
}

/// Decode a frame
pub fn decode<S>(source: &mut S) -> Result<ProVoiceFrame, SourceExhausted>
where
    S: DibitSource + ?Sized,
{
    let bits = dibits_to_bits(&read_dibits(source, FRAME_SYMBOLS)?);
    let (lid_bits, rest) = bits.split_at(LID_BITS);
    let (first, rest) = rest.split_at(IMBE_BITS);
    let second = &rest[SPACER_BITS..];

    Ok(ProVoiceFrame {
        lid: bits_to_u64(lid_bits, 0, LID_BITS) as u16,
        voice: vec![
            VoiceFrame::new(VoiceCodec::Imbe7100, first),
            VoiceFrame::new(VoiceCodec::Imbe7100, second),
        ],
    })
}
