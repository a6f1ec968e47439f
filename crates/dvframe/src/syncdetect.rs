//! Sync word detection
//!
//! The [`SyncDetector`] watches the most recent dibits for any
//! of the known frame synchronization words and reports which
//! one it found as a [`SyncType`]. The detector tolerates a
//! configurable number of dibit errors.
//!
//! Several of the TDMA sync words are exact complements of one
//! another: the DMR base station *data* word, received with
//! inverted polarity, is indistinguishable from the *voice*
//! word at normal polarity. These ties are broken in favor of
//! the polarity of the previous sync.

use arraydeque::ArrayDeque;
use lazy_static::lazy_static;

#[cfg(not(test))]
use log::debug;

#[cfg(test)]
use std::println as debug;

use crate::dibit::{Dibit, DibitSource, SourceExhausted};
use crate::synctype::{SyncFamily, SyncType};

/// Signal polarity
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
pub enum Polarity {
    /// Search for sync words of either polarity
    #[default]
    Auto,

    /// Accept only normal polarity
    Normal,

    /// Accept only inverted polarity
    Inverted,
}

/// Frame sync word detector
///
/// Call [`search()`](SyncDetector::search) to read dibits from
/// a source until a sync word is found. The source is left
/// positioned on the first dibit *after* the sync word.
///
/// ```
/// use dvframe::{DibitStream, SyncDetector, SyncType};
///
/// // P25 Phase 1 frame sync
/// let sync = "111113113311333313133333";
/// let dibits = sync.bytes().map(|c| c - b'0');
/// let mut src = DibitStream::new(std::iter::repeat(0u8).take(10).chain(dibits));
///
/// let mut det = SyncDetector::default();
/// assert_eq!(Ok(SyncType::P25Phase1), det.search(&mut src));
/// ```
#[derive(Clone, Debug)]
pub struct SyncDetector {
    max_errors: u32,
    polarity: Polarity,
    candidates: Vec<&'static SyncWord>,
    window: ArrayDeque<Dibit, MAX_SYNC_LEN, arraydeque::Wrapping>,
    last_inverted: bool,
    last_errors: u32,
}

impl SyncDetector {
    /// New detector
    ///
    /// Accept sync words of the given `families` with no more
    /// than `max_errors` incorrect dibits, at the given
    /// `polarity`.
    pub fn new<F>(families: F, max_errors: u32, polarity: Polarity) -> Self
    where
        F: IntoIterator<Item = SyncFamily>,
    {
        let families: Vec<SyncFamily> = families.into_iter().collect();
        let candidates = SYNC_WORDS
            .iter()
            .filter(|sw| families.contains(&sw.normal.family()))
            .collect();

        Self {
            max_errors,
            polarity,
            candidates,
            window: ArrayDeque::new(),
            last_inverted: polarity == Polarity::Inverted,
            last_errors: 0,
        }
    }

    /// Read from `source` until a sync word is found
    ///
    /// Returns the type of the sync word. Errors only if the
    /// source runs dry first.
    pub fn search<S>(&mut self, source: &mut S) -> Result<SyncType, SourceExhausted>
    where
        S: DibitSource + ?Sized,
    {
        loop {
            let dibit = source.get_dibit()?;
            if let Some(st) = self.input(dibit) {
                return Ok(st);
            }
        }
    }

    /// Process one dibit
    ///
    /// Returns a sync type if the most recent dibits, including
    /// `dibit`, match a sync word.
    pub fn input(&mut self, dibit: Dibit) -> Option<SyncType> {
        let _ = self.window.push_back(dibit & 0x3);

        let mut best: Option<(SyncType, u32)> = None;
        for sw in &self.candidates {
            for &inverted in self.polarities() {
                let err = match sw.errors(&self.window, inverted) {
                    Some(err) if err <= self.max_errors => err,
                    _ => continue,
                };
                let st = if inverted { sw.inverted } else { sw.normal };
                best = match best {
                    None => Some((st, err)),
                    Some((_, berr)) if err < berr => Some((st, err)),
                    Some((bst, berr))
                        if err == berr
                            && bst.is_inverted() != self.last_inverted
                            && st.is_inverted() == self.last_inverted =>
                    {
                        Some((st, err))
                    }
                    keep => keep,
                };
            }
        }

        let (st, err) = best?;
        debug!(
            "sync: {} ({} errors) at {}",
            st,
            err,
            st.family().as_display_str().trim()
        );
        self.window.clear();
        self.last_inverted = st.is_inverted();
        self.last_errors = err;
        Some(st)
    }

    /// Dibit errors in the most recently detected sync word
    pub fn last_errors(&self) -> u32 {
        self.last_errors
    }

    /// Forget all history
    pub fn reset(&mut self) {
        self.window.clear();
        self.last_inverted = self.polarity == Polarity::Inverted;
        self.last_errors = 0;
    }

    fn polarities(&self) -> &'static [bool] {
        match self.polarity {
            Polarity::Auto => &[false, true],
            Polarity::Normal => &[false],
            Polarity::Inverted => &[true],
        }
    }
}

impl Default for SyncDetector {
    /// All families, exact match, either polarity
    fn default() -> Self {
        use strum::IntoEnumIterator;
        Self::new(SyncFamily::iter(), 0, Polarity::Auto)
    }
}

// Longest sync word, in dibits
const MAX_SYNC_LEN: usize = 32;

// A sync word and the sync types it reports at each polarity
#[derive(Clone, Debug)]
struct SyncWord {
    pattern: Vec<Dibit>,
    normal: SyncType,
    inverted: SyncType,
}

impl SyncWord {
    fn new(pattern: &str, normal: SyncType, inverted: SyncType) -> Self {
        Self {
            pattern: pattern.bytes().map(|c| (c - b'0') & 0x3).collect(),
            normal,
            inverted,
        }
    }

    // Count of mismatched dibits against the tail of `window`,
    // or None if the window is too short
    fn errors(
        &self,
        window: &ArrayDeque<Dibit, MAX_SYNC_LEN, arraydeque::Wrapping>,
        inverted: bool,
    ) -> Option<u32> {
        let len = window.len();
        if len < self.pattern.len() {
            return None;
        }
        let flip = if inverted { 0x2 } else { 0x0 };
        let err = window
            .iter()
            .skip(len - self.pattern.len())
            .zip(self.pattern.iter())
            .filter(|(rx, want)| **rx != (**want ^ flip))
            .count();
        Some(err as u32)
    }
}

lazy_static! {
    static ref SYNC_WORDS: Vec<SyncWord> = vec![
        SyncWord::new(
            "111113113311333313133333",
            SyncType::P25Phase1,
            SyncType::InvP25Phase1
        ),
        SyncWord::new(
            "113131333331313331113311",
            SyncType::X2TdmaVoice,
            SyncType::InvX2TdmaVoice
        ),
        SyncWord::new(
            "331313111113131113331133",
            SyncType::X2TdmaData,
            SyncType::InvX2TdmaData
        ),
        SyncWord::new(
            "131331111333333311111131",
            SyncType::X2TdmaVoice,
            SyncType::InvX2TdmaVoice
        ),
        SyncWord::new(
            "313113333111111133333313",
            SyncType::X2TdmaData,
            SyncType::InvX2TdmaData
        ),
        SyncWord::new(
            "313131313133131113313111",
            SyncType::Dstar,
            SyncType::InvDstar
        ),
        SyncWord::new(
            "131313131333133113131111",
            SyncType::DstarHeader,
            SyncType::InvDstarHeader
        ),
        SyncWord::new(
            "313133113131113133",
            SyncType::NxdnVoice,
            SyncType::InvNxdnVoice
        ),
        SyncWord::new(
            "313133113131113113",
            SyncType::NxdnVoice,
            SyncType::InvNxdnVoice
        ),
        SyncWord::new(
            "313133113131111333",
            SyncType::NxdnData,
            SyncType::InvNxdnData
        ),
        SyncWord::new(
            "313133113131111313",
            SyncType::NxdnData,
            SyncType::InvNxdnData
        ),
        SyncWord::new(
            "131111333113313313113313",
            SyncType::DmrVoice,
            SyncType::InvDmrVoice
        ),
        SyncWord::new(
            "313333111331131131331131",
            SyncType::DmrData,
            SyncType::InvDmrData
        ),
        SyncWord::new(
            "133313311131311113313331",
            SyncType::DmrVoice,
            SyncType::InvDmrVoice
        ),
        SyncWord::new(
            "311131133313133331131113",
            SyncType::DmrData,
            SyncType::InvDmrData
        ),
        SyncWord::new(
            "13131333111311311133113311331133",
            SyncType::ProVoice,
            SyncType::InvProVoice
        ),
        SyncWord::new(
            "31131311331331111133131311311133",
            SyncType::ProVoice,
            SyncType::InvProVoice
        ),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    use strum::IntoEnumIterator;

    use crate::dibit::DibitStream;

    fn to_dibits(s: &str) -> Vec<Dibit> {
        s.bytes().map(|c| c - b'0').collect()
    }

    fn invert(d: &[Dibit]) -> Vec<Dibit> {
        d.iter().map(|d| d ^ 0x2).collect()
    }

    #[test]
    fn test_sync_word_table() {
        for sw in SYNC_WORDS.iter() {
            assert!(sw.pattern.len() <= MAX_SYNC_LEN);
            assert!(sw.pattern.iter().all(|d| *d == 1 || *d == 3));
            assert_eq!(sw.normal.family(), sw.inverted.family());
            assert!(!sw.normal.is_inverted());
            assert!(sw.inverted.is_inverted());
        }
    }

    #[test]
    fn test_finds_each_family() {
        let cases = [
            ("111113113311333313133333", SyncType::P25Phase1),
            ("313131313133131113313111", SyncType::Dstar),
            ("131313131333133113131111", SyncType::DstarHeader),
            ("313133113131113133", SyncType::NxdnVoice),
            ("313133113131111313", SyncType::NxdnData),
            ("13131333111311311133113311331133", SyncType::ProVoice),
        ];
        for (pat, want) in cases {
            let mut input = vec![0u8; 40];
            input.extend(to_dibits(pat));
            input.push(0);

            let mut src = DibitStream::new(input);
            let mut det = SyncDetector::default();
            assert_eq!(Ok(want), det.search(&mut src));
            assert_eq!(40 + pat.len() as u64, src.symbol_count());
            assert_eq!(0, det.last_errors());
        }
    }

    #[test]
    fn test_inverted() {
        let mut input = vec![0u8; 8];
        input.extend(invert(&to_dibits("111113113311333313133333")));
        let mut det = SyncDetector::default();
        let mut src = DibitStream::new(input.clone());
        assert_eq!(Ok(SyncType::InvP25Phase1), det.search(&mut src));

        // normal-only detector never finds it
        let mut det = SyncDetector::new(SyncFamily::iter(), 0, Polarity::Normal);
        let mut src = DibitStream::new(input);
        assert!(det.search(&mut src).is_err());
    }

    #[test]
    fn test_complement_prefers_last_polarity() {
        let data = to_dibits("313333111331131131331131");

        // fresh detector: normal polarity, so this is +DMR data
        let mut det = SyncDetector::default();
        let mut src = DibitStream::new(data.clone());
        assert_eq!(Ok(SyncType::DmrData), det.search(&mut src));

        // after an inverted P25 sync, the same word reads as -DMR voice
        let mut input = invert(&to_dibits("111113113311333313133333"));
        input.extend(vec![0u8; 4]);
        input.extend(data);
        let mut src = DibitStream::new(input);
        let mut det = SyncDetector::default();
        assert_eq!(Ok(SyncType::InvP25Phase1), det.search(&mut src));
        assert_eq!(Ok(SyncType::InvDmrVoice), det.search(&mut src));
    }

    #[test]
    fn test_errors_and_families() {
        let mut pat = to_dibits("111113113311333313133333");
        pat[3] = 3;
        pat[12] = 1;

        let mut det = SyncDetector::new([SyncFamily::P25], 1, Polarity::Auto);
        assert!(det.search(&mut DibitStream::new(pat.clone())).is_err());

        let mut det = SyncDetector::new([SyncFamily::P25], 2, Polarity::Auto);
        assert_eq!(
            Ok(SyncType::P25Phase1),
            det.search(&mut DibitStream::new(pat))
        );
        assert_eq!(2, det.last_errors());

        // disabled families are ignored
        let mut det = SyncDetector::new([SyncFamily::Dmr], 0, Polarity::Auto);
        let p25 = to_dibits("111113113311333313133333");
        assert!(det.search(&mut DibitStream::new(p25)).is_err());
    }

    #[test]
    fn test_window_clears_after_hit() {
        let mut det = SyncDetector::default();
        let mut hits = 0;
        for d in to_dibits("111113113311333313133333") {
            if det.input(d).is_some() {
                hits += 1;
            }
        }
        assert_eq!(1, hits);
        assert_eq!(None, det.input(3));
    }
}
