//! Frame classification
//!
//! Classification is a pure function of the sync type and,
//! for P25, the Data Unit ID and the continuity memory. It
//! never touches the decode state. Dispatch, and every side
//! effect that goes with it, happens afterwards in the
//! [`FrameDecoder`](crate::FrameDecoder).

use std::fmt;

use crate::dibit::{Dibit, DibitSource, SourceExhausted};
use crate::state::LastP25Type;
use crate::synctype::SyncType;

/// Number of dibits in the P25 Network Access Code
pub const NAC_DIBITS: usize = 6;

/// Number of dibits in the P25 Data Unit ID
pub const DUID_DIBITS: usize = 2;

/// P25 Phase 1 data unit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::EnumIter)]
pub enum Duid {
    /// Header Data Unit
    Hdu,

    /// Logical Data Unit 1 (voice + link control)
    Ldu1,

    /// Logical Data Unit 2 (voice + encryption sync)
    Ldu2,

    /// Terminator with Link Control
    Tdulc,

    /// Terminator Data Unit
    Tdu,

    /// Trunking Signaling Data Unit
    Tsdu,

    /// Packet Data Unit
    Pdu,
}

impl Duid {
    /// Match a received DUID code against the known data units
    ///
    /// There are no partial matches.
    pub fn from_code(code: DuidCode) -> Option<Self> {
        match &code.0 {
            b"00" => Some(Duid::Hdu),
            b"11" => Some(Duid::Ldu1),
            b"22" => Some(Duid::Ldu2),
            b"33" => Some(Duid::Tdulc),
            b"03" => Some(Duid::Tdu),
            b"13" => Some(Duid::Tsdu),
            b"30" => Some(Duid::Pdu),
            _ => None,
        }
    }

    /// The two-character code for this data unit
    pub fn code(&self) -> DuidCode {
        DuidCode(*match self {
            Duid::Hdu => b"00",
            Duid::Ldu1 => b"11",
            Duid::Ldu2 => b"22",
            Duid::Tdulc => b"33",
            Duid::Tdu => b"03",
            Duid::Tsdu => b"13",
            Duid::Pdu => b"30",
        })
    }
}

/// A received Data Unit ID, as two characters
///
/// Each of the two DUID dibits is rendered as the ASCII
/// character `'0' + dibit`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DuidCode(pub [u8; 2]);

impl DuidCode {
    /// Render from two dibits
    pub fn from_dibits(d0: Dibit, d1: Dibit) -> Self {
        Self([b'0' + (d0 & 0x3), b'0' + (d1 & 0x3)])
    }

    /// As a string slice, like "`13`"
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("??")
    }
}

impl fmt::Display for DuidCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of frame to decode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// P25 Phase 1 data unit
    P25(Duid),

    /// X2-TDMA voice burst
    X2TdmaVoice,

    /// X2-TDMA data burst
    X2TdmaData,

    /// D-STAR voice
    DstarVoice,

    /// D-STAR radio header
    DstarHeader,

    /// NXDN voice
    NxdnVoice,

    /// NXDN data
    NxdnData,

    /// DMR voice superframe
    DmrVoice,

    /// DMR data burst
    DmrData,

    /// EDACS ProVoice
    ProVoice,
}

impl FrameKind {
    /// True for the P25 family
    pub fn is_p25(&self) -> bool {
        matches!(self, FrameKind::P25(_))
    }
}

/// Result of P25 classification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Classification {
    /// The DUID was read and matched
    Frame(Duid),

    /// The DUID did not match, and the frame type was inferred
    /// from the previous one
    Inferred(Duid),

    /// The DUID did not match, and there is nothing to infer from
    Unknown(DuidCode),
}

/// Classify a frame by its sync type
///
/// Returns `None` for P25-class sync, which requires a
/// Network ID to classify further.
pub fn classify_sync(sync: SyncType) -> Option<FrameKind> {
    match sync {
        SyncType::P25Phase1 | SyncType::InvP25Phase1 => None,
        SyncType::InvX2TdmaVoice | SyncType::X2TdmaVoice => Some(FrameKind::X2TdmaVoice),
        SyncType::X2TdmaData | SyncType::InvX2TdmaData => Some(FrameKind::X2TdmaData),
        SyncType::Dstar | SyncType::InvDstar => Some(FrameKind::DstarVoice),
        SyncType::NxdnVoice | SyncType::InvNxdnVoice => Some(FrameKind::NxdnVoice),
        SyncType::InvDmrVoice | SyncType::DmrVoice => Some(FrameKind::DmrVoice),
        SyncType::DmrData | SyncType::InvDmrData => Some(FrameKind::DmrData),
        SyncType::ProVoice | SyncType::InvProVoice => Some(FrameKind::ProVoice),
        SyncType::NxdnData | SyncType::InvNxdnData => Some(FrameKind::NxdnData),
        SyncType::DstarHeader | SyncType::InvDstarHeader => Some(FrameKind::DstarHeader),
    }
}

/// Classify a P25 frame by its DUID
///
/// An explicit match always wins. Otherwise the frame type is
/// inferred from `last`:
///
/// | `last` | inferred |
/// |--------|----------|
/// | LDU1   | LDU2     |
/// | LDU2   | LDU1     |
/// | TSDU   | TSDU     |
/// | PDU    | PDU      |
/// | None   | unknown  |
///
/// ```
/// use dvframe::{classify_duid, Classification, Duid, DuidCode, LastP25Type};
///
/// let garbled = DuidCode(*b"12");
/// assert_eq!(
///     Classification::Inferred(Duid::Ldu2),
///     classify_duid(garbled, LastP25Type::Ldu1)
/// );
/// assert_eq!(
///     Classification::Frame(Duid::Ldu1),
///     classify_duid(DuidCode(*b"11"), LastP25Type::Ldu1)
/// );
/// ```
pub fn classify_duid(duid: DuidCode, last: LastP25Type) -> Classification {
    if let Some(du) = Duid::from_code(duid) {
        return Classification::Frame(du);
    }

    match last {
        LastP25Type::Ldu1 => Classification::Inferred(Duid::Ldu2),
        LastP25Type::Ldu2 => Classification::Inferred(Duid::Ldu1),
        LastP25Type::Tsdu => Classification::Inferred(Duid::Tsdu),
        LastP25Type::Pdu => Classification::Inferred(Duid::Pdu),
        LastP25Type::None => Classification::Unknown(duid),
    }
}

/// Read the P25 Network Access Code
///
/// Reads [`NAC_DIBITS`] dibits and packs them MSB-first into a
/// 12-bit integer.
pub fn read_nac<S>(source: &mut S) -> Result<u16, SourceExhausted>
where
    S: DibitSource + ?Sized,
{
    let mut nac = 0u16;
    for _i in 0..NAC_DIBITS {
        nac = (nac << 2) | (source.get_dibit()? & 0x3) as u16;
    }
    Ok(nac)
}

/// Read the P25 Data Unit ID
pub fn read_duid<S>(source: &mut S) -> Result<DuidCode, SourceExhausted>
where
    S: DibitSource + ?Sized,
{
    let d0 = source.get_dibit()?;
    let d1 = source.get_dibit()?;
    Ok(DuidCode::from_dibits(d0, d1))
}
