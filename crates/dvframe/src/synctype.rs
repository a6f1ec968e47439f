//! Synchronization types and protocol families

use std::fmt;

use strum::{EnumMessage, IntoEnumIterator};

/// Protocol family
///
/// Each family shares one decoder path. Families may be
/// individually enabled or disabled in the
/// [`SyncDetector`](crate::SyncDetector).
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum_macros::EnumIter,
    strum_macros::EnumMessage,
    strum_macros::EnumString,
)]
pub enum SyncFamily {
    /// APCO Project 25, Phase 1
    #[strum(serialize = "p25", message = " P25 Phase 1 ")]
    P25,

    /// Motorola X2-TDMA
    #[strum(serialize = "x2tdma", message = " X2-TDMA     ")]
    X2Tdma,

    /// D-STAR digital voice
    #[strum(serialize = "dstar", message = " D-STAR      ")]
    Dstar,

    /// D-STAR radio header
    #[strum(serialize = "dstar-hd", message = " D-STAR_HD   ")]
    DstarHeader,

    /// NXDN (4800 baud), voice and data
    #[strum(serialize = "nxdn", message = " NXDN48      ")]
    Nxdn,

    /// ETSI DMR
    #[strum(serialize = "dmr", message = " DMR         ")]
    Dmr,

    /// EDACS ProVoice
    #[strum(serialize = "provoice", message = " ProVoice    ")]
    ProVoice,
}

impl SyncFamily {
    /// Fixed-width display label, like "` DMR         `"
    pub fn as_display_str(&self) -> &'static str {
        self.get_message().expect("missing definition")
    }

    /// Short lowercase name, like "`dmr`"
    pub fn as_str(&self) -> &'static str {
        self.get_serializations()[0]
    }
}

impl fmt::Display for SyncFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

/// Synchronization status
///
/// The upstream sync detector reports which sync word it has
/// matched with a small integer code. Codes come in
/// normal/inverted polarity pairs, and the TDMA families
/// further distinguish voice from data bursts:
///
/// | codes          | family       |                          |
/// |----------------|--------------|--------------------------|
/// | 0, 1           | P25 Phase 1  | +, −                     |
/// | 2, 3, 4, 5     | X2-TDMA      | +data, −voice, +voice, −data |
/// | 6, 7           | D-STAR       | +, −                     |
/// | 8, 9           | NXDN voice   | +, −                     |
/// | 10, 11, 12, 13 | DMR          | +data, −voice, +voice, −data |
/// | 14, 15         | ProVoice     | +, −                     |
/// | 16, 17         | NXDN data    | +, −                     |
/// | 18, 19         | D-STAR HD    | +, −                     |
///
/// Any other code is treated as P25-class.
///
/// ```
/// use dvframe::{SyncFamily, SyncType};
///
/// let st = SyncType::from_code(11);
/// assert_eq!(SyncType::InvDmrVoice, st);
/// assert_eq!(SyncFamily::Dmr, st.family());
/// assert!(st.is_inverted());
/// assert!(st.is_voice());
/// assert_eq!("-DMR", st.as_str());
///
/// assert_eq!(SyncType::P25Phase1, SyncType::from_code(99));
/// ```
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum_macros::EnumIter,
    strum_macros::EnumMessage,
)]
#[repr(u8)]
pub enum SyncType {
    #[strum(message = "+P25p1")]
    P25Phase1 = 0,
    #[strum(message = "-P25p1")]
    InvP25Phase1 = 1,
    #[strum(message = "+X2-TDMA")]
    X2TdmaData = 2,
    #[strum(message = "-X2-TDMA")]
    InvX2TdmaVoice = 3,
    #[strum(message = "+X2-TDMA")]
    X2TdmaVoice = 4,
    #[strum(message = "-X2-TDMA")]
    InvX2TdmaData = 5,
    #[strum(message = "+DSTAR")]
    Dstar = 6,
    #[strum(message = "-DSTAR")]
    InvDstar = 7,
    #[strum(message = "+NXDN")]
    NxdnVoice = 8,
    #[strum(message = "-NXDN")]
    InvNxdnVoice = 9,
    #[strum(message = "+DMR")]
    DmrData = 10,
    #[strum(message = "-DMR")]
    InvDmrVoice = 11,
    #[strum(message = "+DMR")]
    DmrVoice = 12,
    #[strum(message = "-DMR")]
    InvDmrData = 13,
    #[strum(message = "+ProVoice")]
    ProVoice = 14,
    #[strum(message = "-ProVoice")]
    InvProVoice = 15,
    #[strum(message = "+NXDN")]
    NxdnData = 16,
    #[strum(message = "-NXDN")]
    InvNxdnData = 17,
    #[strum(message = "+DSTAR_HD")]
    DstarHeader = 18,
    #[strum(message = "-DSTAR_HD")]
    InvDstarHeader = 19,
}

impl SyncType {
    /// Convert from integer sync code
    ///
    /// Codes outside of `0..=19` are P25-class and map to
    /// normal-polarity [`SyncType::P25Phase1`].
    pub fn from_code(code: i32) -> Self {
        SyncType::iter()
            .find(|st| st.code() == code)
            .unwrap_or(SyncType::P25Phase1)
    }

    /// Integer sync code
    pub fn code(&self) -> i32 {
        *self as u8 as i32
    }

    /// Protocol family
    pub fn family(&self) -> SyncFamily {
        match self {
            SyncType::P25Phase1 | SyncType::InvP25Phase1 => SyncFamily::P25,
            SyncType::X2TdmaData
            | SyncType::InvX2TdmaVoice
            | SyncType::X2TdmaVoice
            | SyncType::InvX2TdmaData => SyncFamily::X2Tdma,
            SyncType::Dstar | SyncType::InvDstar => SyncFamily::Dstar,
            SyncType::NxdnVoice
            | SyncType::InvNxdnVoice
            | SyncType::NxdnData
            | SyncType::InvNxdnData => SyncFamily::Nxdn,
            SyncType::DmrData
            | SyncType::InvDmrVoice
            | SyncType::DmrVoice
            | SyncType::InvDmrData => SyncFamily::Dmr,
            SyncType::ProVoice | SyncType::InvProVoice => SyncFamily::ProVoice,
            SyncType::DstarHeader | SyncType::InvDstarHeader => SyncFamily::DstarHeader,
        }
    }

    /// True if the sync word was received with inverted polarity
    pub fn is_inverted(&self) -> bool {
        match self {
            // in the TDMA families, polarity does not follow parity
            SyncType::InvX2TdmaVoice | SyncType::InvX2TdmaData => true,
            SyncType::X2TdmaData | SyncType::X2TdmaVoice => false,
            SyncType::InvDmrVoice | SyncType::InvDmrData => true,
            SyncType::DmrData | SyncType::DmrVoice => false,
            _ => self.code() % 2 == 1,
        }
    }

    /// True if the sync word introduces a voice frame
    ///
    /// P25 frames are voice or data depending on their DUID,
    /// which is not known from the sync word. They report `false`.
    pub fn is_voice(&self) -> bool {
        matches!(
            self,
            SyncType::InvX2TdmaVoice
                | SyncType::X2TdmaVoice
                | SyncType::Dstar
                | SyncType::InvDstar
                | SyncType::NxdnVoice
                | SyncType::InvNxdnVoice
                | SyncType::InvDmrVoice
                | SyncType::DmrVoice
                | SyncType::ProVoice
                | SyncType::InvProVoice
        )
    }

    /// Display string, like "`+P25p1`"
    pub fn as_str(&self) -> &'static str {
        self.get_message().expect("missing definition")
    }
}

impl fmt::Display for SyncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

impl From<i32> for SyncType {
    fn from(code: i32) -> Self {
        SyncType::from_code(code)
    }
}

impl From<SyncType> for i32 {
    fn from(st: SyncType) -> Self {
        st.code()
    }
}
