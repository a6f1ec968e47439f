//! NXDN voice and data frames
//!
//! The NXDN sync word as detected includes the eight-symbol
//! Link Information Channel (LICH), which identifies the
//! channel type. The LICH is recovered from the source's
//! history. Each LICH symbol carries one bit in its sign.

use crate::dibit::{dibits_to_bits, read_dibits, Dibit, DibitSource, SourceExhausted};
use crate::frame::{NxdnLich, VoiceCodec, VoiceFrame};

/// Symbols consumed by a frame after its sync
pub const FRAME_SYMBOLS: usize = SACCH_DIBITS + AMBE_FRAMES * AMBE_DIBITS;

/// LICH length, in symbols
pub const LICH_DIBITS: usize = 8;

const SACCH_DIBITS: usize = 30;
const AMBE_FRAMES: usize = 4;
const AMBE_DIBITS: usize = 36;

/// Decoded voice frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NxdnVoice {
    /// Link information, if history was available
    pub lich: Option<NxdnLich>,

    /// Slow associated control channel dibits
    pub sacch: Vec<Dibit>,

    /// Four AMBE voice frames
    pub voice: Vec<VoiceFrame>,
}

/// Decoded data frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NxdnData {
    /// Link information, if history was available
    pub lich: Option<NxdnLich>,

    /// Frame payload dibits
    pub payload: Vec<Dibit>,
}

/// Recover the LICH which ended the sync word
pub fn read_lich<S>(source: &S) -> Option<NxdnLich>
where
    S: DibitSource + ?Sized,
{
    let dibits = source.lookback(0, LICH_DIBITS)?;
    NxdnLich::from_bits(&dibits_to_bits(&dibits))
}

/// Decode a voice frame
pub fn decode_voice<S>(source: &mut S) -> Result<NxdnVoice, SourceExhausted>
where
    S: DibitSource + ?Sized,
{
    let lich = read_lich(source);
    let sacch = read_dibits(source, SACCH_DIBITS)?;
    let mut voice = Vec::with_capacity(AMBE_FRAMES);
    for _i in 0..AMBE_FRAMES {
        voice.push(VoiceFrame::from_dibits(
            VoiceCodec::Ambe3600x2450,
            &read_dibits(source, AMBE_DIBITS)?,
        ));
    }
    Ok(NxdnVoice { lich, sacch, voice })
}

/// Decode a data frame
pub fn decode_data<S>(source: &mut S) -> Result<NxdnData, SourceExhausted>
where
    S: DibitSource + ?Sized,
{
    let lich = read_lich(source);
    let payload = read_dibits(source, FRAME_SYMBOLS)?;
    Ok(NxdnData { lich, payload })
}
