//! DMR and X2-TDMA bursts
//!
//! Both protocols share the same two-slot TDMA burst. The sync
//! word (or embedded signaling) occupies the middle of each
//! burst:
//!
//! ```txt
//! +------+-----------+---------------+-----------+
//! | CACH |  payload  | sync / EMB    |  payload  |
//! |  12  |    54     |      24       |    54     |
//! +------+-----------+---------------+-----------+
//! ```
//!
//! Sizes are in dibits. Since the sync word is detected only
//! after it has passed, the first half of the synchronizing
//! burst is recovered from the source's history with
//! [`lookback()`](DibitSource::lookback).

#[cfg(not(test))]
use log::debug;

#[cfg(test)]
use std::println as debug;

use crate::dibit::{read_dibits, unpack_dibits, Dibit, DibitSource, SourceExhausted};
use crate::frame::{TdmaBurst, VoiceCodec, VoiceFrame};

/// Payload half-burst length, in dibits
pub const HALF_BURST: usize = 54;

/// Sync or embedded signaling length, in dibits
pub const SYNC_DIBITS: usize = 24;

/// Common Announcement Channel length, in dibits
pub const CACH_DIBITS: usize = 12;

/// Dibits consumed by a voice superframe after its sync
pub const VOICE_SYMBOLS: usize = HALF_BURST + VOICE_BURSTS * BURST_DIBITS;

/// Dibits consumed by a data burst after its sync
pub const DATA_SYMBOLS: usize = HALF_BURST;

const VOICE_BURSTS: usize = 5;
const BURST_DIBITS: usize = CACH_DIBITS + 2 * HALF_BURST + SYNC_DIBITS;
const AMBE_DIBITS: usize = 36;
const SLOT_TYPE_HALF: usize = 5;

// Bit positions of the TACT within the CACH
const TACT_BITS: [usize; 7] = [0, 4, 8, 12, 14, 18, 22];

/// Decode a voice superframe
///
/// Returns eighteen AMBE frames, or sixteen if the source has
/// no history before the sync.
pub fn decode_voice<S>(source: &mut S) -> Result<Vec<VoiceFrame>, SourceExhausted>
where
    S: DibitSource + ?Sized,
{
    let mut voice = Vec::with_capacity(3 * (VOICE_BURSTS + 1));

    let (slot, pre) = match source.lookback(SYNC_DIBITS, CACH_DIBITS + HALF_BURST) {
        Some(hist) => (
            Some(cach_slot(&hist[0..CACH_DIBITS])),
            Some(hist[CACH_DIBITS..].to_vec()),
        ),
        None => (None, source.lookback(SYNC_DIBITS, HALF_BURST)),
    };
    let raw = read_dibits(source, VOICE_SYMBOLS)?;
    let (post, rest) = raw.split_at(HALF_BURST);
    if pre.is_none() {
        debug!("tdma: no history before sync; first voice frames lost");
    }
    push_burst(&mut voice, pre.as_deref(), post, slot);

    for burst in rest.chunks_exact(BURST_DIBITS) {
        let (cach, payload) = burst.split_at(CACH_DIBITS);
        let first = &payload[0..HALF_BURST];
        let second = &payload[HALF_BURST + SYNC_DIBITS..];
        push_burst(&mut voice, Some(first), second, Some(cach_slot(cach)));
    }

    Ok(voice)
}

/// Decode a data burst
///
/// With enough history, the slot type and the full 98-dibit
/// info field are recovered. Otherwise only the post-sync half
/// of the info field is available.
pub fn decode_data<S>(source: &mut S) -> Result<TdmaBurst, SourceExhausted>
where
    S: DibitSource + ?Sized,
{
    let hist = source.lookback(SYNC_DIBITS, CACH_DIBITS + HALF_BURST);
    let post = read_dibits(source, DATA_SYMBOLS)?;

    let burst = match hist {
        Some(hist) => {
            let pre = &hist[CACH_DIBITS..];
            let split = HALF_BURST - SLOT_TYPE_HALF;
            let slot_type = unpack_dibits(&pre[split..]);
            let mut info = pre[0..split].to_vec();
            info.extend_from_slice(&post[SLOT_TYPE_HALF..]);
            TdmaBurst {
                slot: Some(cach_slot(&hist[0..CACH_DIBITS])),
                color_code: Some(nibble(&slot_type[0..4])),
                data_type: Some(nibble(&slot_type[4..8])),
                info,
            }
        }
        None => TdmaBurst {
            slot: None,
            color_code: None,
            data_type: None,
            info: post[SLOT_TYPE_HALF..].to_vec(),
        },
    };

    debug!(
        "tdma: data burst slot {:?} cc {:?}: {}",
        burst.slot,
        burst.color_code,
        burst.data_type_name().unwrap_or("unknown")
    );
    Ok(burst)
}

// Three AMBE frames from the two halves of a burst; the middle
// frame straddles the sync
fn push_burst(out: &mut Vec<VoiceFrame>, pre: Option<&[Dibit]>, post: &[Dibit], slot: Option<u8>) {
    let straddle = HALF_BURST - AMBE_DIBITS;
    if let Some(pre) = pre {
        out.push(ambe(&pre[0..AMBE_DIBITS], slot));
        let mut mid = pre[AMBE_DIBITS..].to_vec();
        mid.extend_from_slice(&post[0..straddle]);
        out.push(ambe(&mid, slot));
    }
    out.push(ambe(&post[straddle..], slot));
}

fn ambe(dibits: &[Dibit], slot: Option<u8>) -> VoiceFrame {
    VoiceFrame::from_dibits(VoiceCodec::Ambe3600x2450, dibits).with_slot(slot)
}

// Timeslot from the TC bit of the TACT
fn cach_slot(cach: &[Dibit]) -> u8 {
    let bits = unpack_dibits(cach);
    bits[TACT_BITS[1]]
}

fn nibble(bits: &[u8]) -> u8 {
    bits.iter().fold(0u8, |acc, b| (acc << 1) | (b & 0x1))
}
