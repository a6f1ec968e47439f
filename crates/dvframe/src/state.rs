//! Decode state and display labels

use std::fmt;

use strum::EnumMessage;

use crate::slicer::SignalLevels;
use crate::synctype::SyncType;

/// Last P25 frame type, for continuity
///
/// Remembers what kind of traffic the P25 link carried most
/// recently. The decoder consults it only when a frame's
/// DUID cannot be matched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum LastP25Type {
    /// Nothing to infer from
    #[default]
    None = 0,

    /// Logical Data Unit 1 was last
    Ldu1 = 1,

    /// Logical Data Unit 2 was last
    Ldu2 = 2,

    /// Trunking Signaling Data Unit was last
    Tsdu = 3,

    /// Packet Data Unit was last
    Pdu = 4,
}

impl LastP25Type {
    /// Integer code, `0..=4`
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

/// RF modulation in use
///
/// Only affects the signal level reference.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Default,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum Modulation {
    /// Continuous 4-level FM
    #[default]
    C4fm = 0,

    /// Compatible QPSK (LSM / CQPSK)
    Qpsk = 1,

    /// GFSK
    Gfsk = 2,
}

/// Frame subtype label
///
/// Names the subtype of the frame most recently decoded. Labels
/// in parentheses were inferred from continuity rather than
/// read from the stream. Every label is exactly 14 characters.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Default,
    strum_macros::EnumIter,
    strum_macros::EnumMessage,
)]
pub enum FrameSubtype {
    #[strum(message = " HDU          ")]
    Hdu,
    #[strum(message = " LDU1         ")]
    Ldu1,
    #[strum(message = " LDU2         ")]
    Ldu2,
    #[strum(message = " TDULC        ")]
    Tdulc,
    #[strum(message = " TDU          ")]
    Tdu,
    #[strum(message = " TSDU         ")]
    Tsdu,
    #[strum(message = " PDU          ")]
    Pdu,
    #[strum(message = "(LDU1)        ")]
    InferredLdu1,
    #[strum(message = "(LDU2)        ")]
    InferredLdu2,
    #[strum(message = "(TSDU)        ")]
    InferredTsdu,
    #[strum(message = "(PDU)         ")]
    InferredPdu,
    #[strum(message = " VOICE        ")]
    Voice,
    #[strum(message = " DATA         ")]
    Data,
    #[strum(message = " HEADER       ")]
    Header,
    #[default]
    #[strum(message = "              ")]
    Blank,
}

impl FrameSubtype {
    /// Fixed-width label
    pub fn as_str(&self) -> &'static str {
        self.get_message().expect("missing definition")
    }
}

impl fmt::Display for FrameSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode state
///
/// One `DecodeState` lives for an entire receive session and is
/// mutated in place as each frame is processed. It is owned by
/// the [`FrameDecoder`](crate::FrameDecoder).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeState {
    /// Last-seen P25 Network Access Code (12 bits)
    ///
    /// Zero after any non-P25 sync.
    pub nac: u16,

    /// Last-seen talkgroup
    pub last_tg: u32,

    /// Last-seen source radio ID
    pub last_src: u32,

    /// Continuity memory
    pub last_p25_type: LastP25Type,

    /// Count of TDULC frames since the last LDU1
    pub num_tdulc: u32,

    /// RF modulation
    pub rf_mod: Modulation,

    /// Signal level maximum
    pub max: i32,

    /// Signal level minimum
    pub min: i32,

    /// Reference maximum, scaled for modulation
    pub maxref: i32,

    /// Reference minimum, scaled for modulation
    pub minref: i32,

    /// Short status or error text
    pub err_str: String,

    /// Label of the most recent frame
    pub subtype: FrameSubtype,

    /// Most recent sync
    pub last_sync: Option<SyncType>,
}

impl DecodeState {
    /// Fresh session state for the given modulation
    pub fn new(rf_mod: Modulation) -> Self {
        let levels = SignalLevels::default();
        let mut out = Self {
            nac: 0,
            last_tg: 0,
            last_src: 0,
            last_p25_type: LastP25Type::None,
            num_tdulc: 0,
            rf_mod,
            max: levels.max,
            min: levels.min,
            maxref: levels.max,
            minref: levels.min,
            err_str: String::new(),
            subtype: FrameSubtype::Blank,
            last_sync: None,
        };
        out.update_levels(None);
        out
    }

    /// Refresh signal level extrema and their references
    ///
    /// If `levels` are given, they replace `max` and `min`.
    /// The references are then recomputed.
    pub fn update_levels(&mut self, levels: Option<SignalLevels>) {
        if let Some(lvl) = levels {
            self.max = lvl.max;
            self.min = lvl.min;
        }

        if self.rf_mod == Modulation::Qpsk {
            self.maxref = (self.max as f32 * 0.80) as i32;
            self.minref = (self.min as f32 * 0.80) as i32;
        } else {
            self.maxref = self.max;
            self.minref = self.min;
        }
    }

    /// Displayed signal level, in percent
    pub fn level_percent(&self) -> i32 {
        self.max / 164
    }

    /// Forget the current call's identity
    pub fn clear_call(&mut self) {
        self.last_tg = 0;
        self.last_src = 0;
    }

    /// Return to the start-of-session state
    ///
    /// The modulation setting is retained.
    pub fn reset(&mut self) {
        *self = Self::new(self.rf_mod);
    }
}

impl Default for DecodeState {
    fn default() -> Self {
        Self::new(Modulation::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::str::FromStr;

    use strum::IntoEnumIterator;

    #[test]
    fn test_subtype_labels() {
        for st in FrameSubtype::iter() {
            assert_eq!(14, st.as_str().len(), "{:?}", st);
        }
        assert_eq!("(LDU2)        ", FrameSubtype::InferredLdu2.as_str());
        assert_eq!(" TDULC        ", &format!("{}", FrameSubtype::Tdulc));
        assert_eq!("              ", FrameSubtype::default().as_str());
    }

    #[test]
    fn test_levels() {
        let mut st = DecodeState::new(Modulation::C4fm);
        assert_eq!(15000, st.maxref);
        assert_eq!(-15000, st.minref);
        assert_eq!(91, st.level_percent());

        st.rf_mod = Modulation::Qpsk;
        st.update_levels(Some(SignalLevels {
            max: 10000,
            min: -5000,
        }));
        assert_eq!(8000, st.maxref);
        assert_eq!(-4000, st.minref);
        assert_eq!(60, st.level_percent());

        st.rf_mod = Modulation::Gfsk;
        st.update_levels(None);
        assert_eq!(10000, st.maxref);
        assert_eq!(-5000, st.minref);
    }

    #[test]
    fn test_reset_keeps_modulation() {
        let mut st = DecodeState::new(Modulation::Qpsk);
        st.nac = 0x293;
        st.last_p25_type = LastP25Type::Pdu;
        st.err_str.push_str("crc");
        st.reset();
        assert_eq!(Modulation::Qpsk, st.rf_mod);
        assert_eq!(0, st.nac);
        assert_eq!(LastP25Type::None, st.last_p25_type);
        assert!(st.err_str.is_empty());
        assert_eq!(12000, st.maxref);
    }

    #[test]
    fn test_modulation_names() {
        assert_eq!(Modulation::Qpsk, Modulation::from_str("qpsk").unwrap());
        assert_eq!("c4fm", Modulation::C4fm.as_ref());
        assert_eq!(4, LastP25Type::Pdu.code());
    }
}
