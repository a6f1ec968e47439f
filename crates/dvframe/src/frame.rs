//! Decoder output

use std::fmt;

use arrayvec::ArrayVec;

use crate::classify::{DuidCode, FrameKind};
use crate::state::FrameSubtype;
use crate::synctype::{SyncFamily, SyncType};

/// Longest voice codeword, in bits
pub const MAX_VOICE_BITS: usize = 144;

/// Voice codec
///
/// Identifies which MBE variant a [`VoiceFrame`] must be
/// decoded with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::EnumMessage)]
pub enum VoiceCodec {
    /// IMBE 7200x4400 (P25 Phase 1)
    #[strum(message = ".imb")]
    Imbe7200,

    /// AMBE+2 3600x2450 (DMR, X2-TDMA, NXDN)
    #[strum(message = ".amb")]
    Ambe3600x2450,

    /// AMBE 3600x2400 (D-STAR)
    #[strum(message = ".amb")]
    Ambe3600x2400,

    /// IMBE 7100x4400 (ProVoice)
    #[strum(message = ".imb")]
    Imbe7100,
}

impl VoiceCodec {
    /// Codeword length, in bits
    pub fn codeword_bits(&self) -> usize {
        match self {
            VoiceCodec::Imbe7200 => 144,
            VoiceCodec::Ambe3600x2450 => 72,
            VoiceCodec::Ambe3600x2400 => 72,
            VoiceCodec::Imbe7100 => 142,
        }
    }

    /// MBE file magic, which is also the file extension
    pub fn file_magic(&self) -> &'static str {
        use strum::EnumMessage;
        self.get_message().expect("missing definition")
    }
}

/// One voice codec frame
///
/// Carries the raw, still-interleaved codeword bits exactly as
/// received. Error correction and parameter decoding are the
/// codec's job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoiceFrame {
    /// Codec to decode with
    pub codec: VoiceCodec,

    /// TDMA timeslot, if known
    pub slot: Option<u8>,

    /// Codeword bits, one per element
    pub bits: ArrayVec<u8, MAX_VOICE_BITS>,
}

impl VoiceFrame {
    /// New frame from `bits`, one bit per element
    ///
    /// Bits beyond [`MAX_VOICE_BITS`] are discarded.
    pub fn new(codec: VoiceCodec, bits: &[u8]) -> Self {
        Self {
            codec,
            slot: None,
            bits: bits.iter().map(|b| b & 0x1).take(MAX_VOICE_BITS).collect(),
        }
    }

    /// New frame from dibits, two bits per element, MSB first
    pub fn from_dibits(codec: VoiceCodec, dibits: &[u8]) -> Self {
        Self::new(codec, &crate::dibit::unpack_dibits(dibits))
    }

    /// Set the timeslot
    pub fn with_slot(mut self, slot: Option<u8>) -> Self {
        self.slot = slot;
        self
    }

    /// Pack the codeword MSB-first, zero-padding the last byte
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits
            .chunks(8)
            .map(|chunk| {
                chunk
                    .iter()
                    .enumerate()
                    .fold(0u8, |acc, (i, b)| acc | (*b << (7 - i)))
            })
            .collect()
    }
}

/// P25 Header Data Unit contents
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct P25Header {
    /// Message indicator
    pub mi: [u8; 9],
    /// Manufacturer ID
    pub mfid: u8,
    /// Encryption algorithm ID
    pub algid: u8,
    /// Encryption key ID
    pub kid: u16,
    /// Talkgroup ID
    pub tgid: u16,
}

/// P25 link control word
///
/// The 72-bit link control word is carried in LDU1 and TDULC
/// frames. Its interpretation depends on the opcode and the
/// manufacturer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LinkControl(pub [u8; 9]);

impl LinkControl {
    /// Group voice channel user
    pub const LCO_GROUP_VOICE: u8 = 0x00;

    /// Unit-to-unit voice channel user
    pub const LCO_UNIT_TO_UNIT: u8 = 0x03;

    /// Link control format
    pub fn lcf(&self) -> u8 {
        self.0[0]
    }

    /// Link control opcode
    pub fn lco(&self) -> u8 {
        self.0[0] & 0x3f
    }

    /// True if the link control is encrypted
    pub fn is_protected(&self) -> bool {
        self.0[0] & 0x80 != 0
    }

    /// Manufacturer ID
    pub fn mfid(&self) -> u8 {
        self.0[1]
    }

    /// Service options
    pub fn service_options(&self) -> u8 {
        self.0[2]
    }

    /// True if the fields have their standard meaning
    pub fn is_standard(&self) -> bool {
        self.mfid() == 0x00 || self.mfid() == 0x01
    }

    /// Talkgroup or target unit
    ///
    /// For group voice, the 16-bit talkgroup. For unit-to-unit
    /// voice, the 24-bit target radio. `None` for any other
    /// opcode or for non-standard manufacturers.
    pub fn destination(&self) -> Option<u32> {
        if !self.is_standard() || self.is_protected() {
            return None;
        }
        match self.lco() {
            Self::LCO_GROUP_VOICE => Some(u32::from_be_bytes([0, 0, self.0[4], self.0[5]])),
            Self::LCO_UNIT_TO_UNIT => {
                Some(u32::from_be_bytes([0, self.0[3], self.0[4], self.0[5]]))
            }
            _ => None,
        }
    }

    /// Source radio
    pub fn source(&self) -> Option<u32> {
        if !self.is_standard() || self.is_protected() {
            return None;
        }
        match self.lco() {
            Self::LCO_GROUP_VOICE | Self::LCO_UNIT_TO_UNIT => {
                Some(u32::from_be_bytes([0, self.0[6], self.0[7], self.0[8]]))
            }
            _ => None,
        }
    }
}

/// P25 encryption sync, from LDU2
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EncryptionSync {
    /// Message indicator
    pub mi: [u8; 9],
    /// Encryption algorithm ID
    pub algid: u8,
    /// Encryption key ID
    pub kid: u16,
}

impl EncryptionSync {
    /// Algorithm ID for unencrypted traffic
    pub const ALGID_CLEAR: u8 = 0x80;

    /// True if the traffic is encrypted
    pub fn is_encrypted(&self) -> bool {
        self.algid != Self::ALGID_CLEAR
    }
}

/// DMR or X2-TDMA data burst
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TdmaBurst {
    /// Timeslot, from the CACH, if known
    pub slot: Option<u8>,

    /// Color code, if the slot type was recovered
    pub color_code: Option<u8>,

    /// Data type, if the slot type was recovered
    pub data_type: Option<u8>,

    /// Info field dibits
    ///
    /// 98 dibits when the whole burst was recovered, or only
    /// the 49 post-sync dibits otherwise.
    pub info: Vec<u8>,
}

impl TdmaBurst {
    /// Human-readable DMR data type, if known
    pub fn data_type_name(&self) -> Option<&'static str> {
        Some(match self.data_type? {
            0 => "PI Header",
            1 => "Voice LC Header",
            2 => "Terminator with LC",
            3 => "CSBK",
            4 => "MBC Header",
            5 => "MBC Continuation",
            6 => "Data Header",
            7 => "Rate 1/2 Data",
            8 => "Rate 3/4 Data",
            9 => "Idle",
            10 => "Rate 1 Data",
            _ => "Reserved",
        })
    }
}

/// NXDN Link Information Channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NxdnLich {
    /// RF channel type (2 bits)
    pub rf_channel: u8,
    /// Functional channel type (2 bits)
    pub functional_channel: u8,
    /// Option (2 bits)
    pub option: u8,
    /// Direction: `true` for outbound (repeater to mobile)
    pub outbound: bool,
    /// Parity bit
    pub parity: u8,
}

impl NxdnLich {
    /// Parse from eight bits, MSB first
    pub fn from_bits(bits: &[u8]) -> Option<Self> {
        if bits.len() < 8 {
            return None;
        }
        Some(Self {
            rf_channel: (bits[0] << 1) | bits[1],
            functional_channel: (bits[2] << 1) | bits[3],
            option: (bits[4] << 1) | bits[5],
            outbound: bits[6] != 0,
            parity: bits[7],
        })
    }

    /// True if the parity bit checks out
    ///
    /// Parity is even over the first four bits.
    pub fn parity_ok(&self) -> bool {
        let ones = (self.rf_channel.count_ones() + self.functional_channel.count_ones()) & 0x1;
        ones as u8 == self.parity
    }
}

/// Data decoded from a frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataRecord {
    /// P25 Header Data Unit
    P25Header(P25Header),

    /// P25 link control, from LDU1 or TDULC
    P25LinkControl(LinkControl),

    /// P25 encryption sync, from LDU2
    P25EncryptionSync(EncryptionSync),

    /// P25 low-speed data bytes
    P25LowSpeedData([u8; 2]),

    /// DMR or X2-TDMA data burst
    TdmaBurst(TdmaBurst),

    /// D-STAR slow data, descrambled
    DstarSlowData {
        /// Slow data bytes
        data: Vec<u8>,
        /// Twenty-character text message, if one was complete
        message: Option<String>,
    },

    /// D-STAR radio header, as raw bits
    DstarHeader(Vec<u8>),

    /// NXDN Link Information Channel
    NxdnLich(NxdnLich),

    /// NXDN slow associated control channel dibits
    NxdnSacch(Vec<u8>),

    /// NXDN data frame dibits
    NxdnData(Vec<u8>),

    /// EDACS ProVoice logical ID
    ProVoiceLid(u16),
}

/// Decoder event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeEvent {
    /// A voice codec frame is ready
    Voice(VoiceFrame),

    /// A data record is ready
    Data(DataRecord),

    /// The voice codec's inter-frame prediction must be reset
    CodecReset,

    /// The scanner should resume scanning
    ResumeScan,

    /// A P25 DUID could neither be matched nor inferred
    UnknownDuid(DuidCode),
}

/// How a frame was handled
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameOutcome {
    /// The frame type was read from the stream and decoded
    Decoded(FrameKind),

    /// The frame type was inferred from the previous frame
    InferredFromContinuity(FrameKind),

    /// The frame could not be classified
    ///
    /// Nothing was consumed past the Network ID.
    Unclassified,
}

impl FrameOutcome {
    /// Kind of frame, if one was decoded
    pub fn kind(&self) -> Option<FrameKind> {
        match self {
            FrameOutcome::Decoded(k) | FrameOutcome::InferredFromContinuity(k) => Some(*k),
            FrameOutcome::Unclassified => None,
        }
    }
}

/// Report on one processed frame
///
/// Carries every event the frame produced and a snapshot of
/// the call identity afterwards. The `Display` form is a
/// one-line status summary:
///
/// ```txt
/// Sync: +P25p1    inlvl: 45% nac:  ABC src:     1234 tg:   100  LDU1
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameReport {
    /// Sync word which began the frame
    pub sync: SyncType,

    /// How the frame was handled
    pub outcome: FrameOutcome,

    /// Events, in order of occurrence
    pub events: Vec<DecodeEvent>,

    /// Frame subtype label
    pub subtype: FrameSubtype,

    /// Network Access Code
    pub nac: u16,

    /// Source radio
    pub src: u32,

    /// Talkgroup
    pub tg: u32,

    /// Signal level percentage, if level display is enabled
    pub level: Option<i32>,

    /// Show the P25 NAC, source, and talkgroup
    pub show_p25_status: bool,

    /// Status text
    pub err_str: String,
}

impl FrameReport {
    /// Voice frames, in order
    pub fn voice_frames(&self) -> impl Iterator<Item = &VoiceFrame> {
        self.events.iter().filter_map(|evt| match evt {
            DecodeEvent::Voice(vf) => Some(vf),
            _ => None,
        })
    }

    /// Data records, in order
    pub fn data_records(&self) -> impl Iterator<Item = &DataRecord> {
        self.events.iter().filter_map(|evt| match evt {
            DecodeEvent::Data(rec) => Some(rec),
            _ => None,
        })
    }

    /// True if the scanner was asked to resume
    pub fn resume_scan(&self) -> bool {
        self.events.contains(&DecodeEvent::ResumeScan)
    }
}

impl fmt::Display for FrameReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sync: {:<10}", self.sync)?;
        if let Some(level) = self.level {
            write!(f, "inlvl: {:2}% ", level)?;
        }
        if self.show_p25_status && self.sync.family() == SyncFamily::P25 {
            write!(
                f,
                "nac: {:4X} src: {:8} tg: {:5} ",
                self.nac, self.src, self.tg
            )?;
        }
        write!(f, "{}", self.subtype)?;
        for evt in &self.events {
            if let DecodeEvent::UnknownDuid(duid) = evt {
                write!(f, " duid:{} *Unknown DUID*", duid)?;
            }
        }
        if !self.err_str.is_empty() {
            write!(f, " {}", self.err_str)?;
        }
        Ok(())
    }
}
