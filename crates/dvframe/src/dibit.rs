//! Dibit sources
//!
//! The frame decoder pulls symbols, one at a time, from a
//! [`DibitSource`]. A *dibit* is a two-bit symbol in `0..=3`
//! which encodes one of four deviation levels:
//!
//! ```txt
//!   dibit   symbol
//!   -----   ------
//!     0       +1
//!     1       +3
//!     2       -1
//!     3       -3
//! ```
//!
//! Inverting the polarity of the signal maps `+3 ↔ -3` and
//! `+1 ↔ -1`, which is an exclusive-or with `0b10`. Binary
//! (two-level) modes like D-STAR and ProVoice carry one bit
//! per symbol in the sign, i.e., `dibit >> 1`.
//!
//! Two sources are provided:
//!
//! * [`DibitStream`] binds to any iterator of hard dibits
//! * [`SoftSymbolStream`] binds to an iterator of `i16` soft
//!   symbols and slices them into dibits with a
//!   [`SymbolSlicer`](crate::slicer::SymbolSlicer)
//!
//! Both remember the most recent [`HISTORY_LEN`] dibits so that
//! decoders whose sync word sits in the middle of a burst can
//! recover the symbols that preceded it.

use arraydeque::ArrayDeque;
use thiserror::Error;

use crate::slicer::{SignalLevels, SymbolSlicer};

/// A two-bit symbol, in `0..=3`
pub type Dibit = u8;

/// Number of past dibits retained by the provided sources
pub const HISTORY_LEN: usize = 256;

/// The source has no more symbols to give
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[error("dibit source exhausted")]
pub struct SourceExhausted {}

/// A source of dibits, synchronized to the symbol clock
///
/// Implementors must provide [`get_dibit()`](DibitSource::get_dibit).
/// The remaining methods have defaults.
pub trait DibitSource {
    /// Read the next dibit, advancing the stream by one symbol
    fn get_dibit(&mut self) -> Result<Dibit, SourceExhausted>;

    /// Advance the stream by `n` symbols, discarding them
    fn skip_dibits(&mut self, n: usize) -> Result<(), SourceExhausted> {
        for _i in 0..n {
            self.get_dibit()?;
        }
        Ok(())
    }

    /// Recall previously-delivered dibits
    ///
    /// Returns the `count` dibits which were delivered *before*
    /// the most recent `skip` dibits, oldest first. Returns `None`
    /// if the source does not keep history or does not have
    /// enough of it.
    fn lookback(&self, _skip: usize, _count: usize) -> Option<Vec<Dibit>> {
        None
    }

    /// Current signal level extrema, if the source tracks them
    fn signal_levels(&self) -> Option<SignalLevels> {
        None
    }
}

impl<S> DibitSource for &mut S
where
    S: DibitSource + ?Sized,
{
    fn get_dibit(&mut self) -> Result<Dibit, SourceExhausted> {
        (**self).get_dibit()
    }

    fn skip_dibits(&mut self, n: usize) -> Result<(), SourceExhausted> {
        (**self).skip_dibits(n)
    }

    fn lookback(&self, skip: usize, count: usize) -> Option<Vec<Dibit>> {
        (**self).lookback(skip, count)
    }

    fn signal_levels(&self) -> Option<SignalLevels> {
        (**self).signal_levels()
    }
}

/// Hard-decision dibit source
///
/// Wraps an iterator of dibits. Values outside `0..=3` are
/// masked to their two least-significant bits.
///
/// ```
/// use dvframe::{DibitSource, DibitStream};
///
/// let mut src = DibitStream::new(vec![1u8, 3, 0, 2]);
/// assert_eq!(Ok(1), src.get_dibit());
/// src.skip_dibits(2).unwrap();
/// assert_eq!(Ok(2), src.get_dibit());
/// assert!(src.get_dibit().is_err());
/// assert_eq!(4, src.symbol_count());
/// ```
#[derive(Clone, Debug)]
pub struct DibitStream<I>
where
    I: Iterator<Item = Dibit>,
{
    source: I,
    history: DibitHistory,
}

impl<I> DibitStream<I>
where
    I: Iterator<Item = Dibit>,
{
    /// Bind to a source of dibits
    pub fn new<S>(source: S) -> Self
    where
        S: IntoIterator<Item = Dibit, IntoIter = I>,
    {
        Self {
            source: source.into_iter(),
            history: DibitHistory::new(),
        }
    }

    /// Lifetime count of dibits delivered
    pub fn symbol_count(&self) -> u64 {
        self.history.count
    }
}

impl<I> DibitSource for DibitStream<I>
where
    I: Iterator<Item = Dibit>,
{
    fn get_dibit(&mut self) -> Result<Dibit, SourceExhausted> {
        let dibit = self.source.next().ok_or(SourceExhausted {})? & 0x3;
        self.history.push(dibit);
        Ok(dibit)
    }

    fn lookback(&self, skip: usize, count: usize) -> Option<Vec<Dibit>> {
        self.history.lookback(skip, count)
    }
}

/// Soft-symbol dibit source
///
/// Wraps an iterator of `i16` soft symbols, one per symbol
/// period, and makes a four-level hard decision on each. The
/// slicer thresholds follow the observed signal extrema, which
/// are also reported via
/// [`signal_levels()`](DibitSource::signal_levels).
#[derive(Clone, Debug)]
pub struct SoftSymbolStream<I>
where
    I: Iterator<Item = i16>,
{
    source: I,
    slicer: SymbolSlicer,
    history: DibitHistory,
}

impl<I> SoftSymbolStream<I>
where
    I: Iterator<Item = i16>,
{
    /// Bind to a source of soft symbols
    pub fn new<S>(source: S, slicer: SymbolSlicer) -> Self
    where
        S: IntoIterator<Item = i16, IntoIter = I>,
    {
        Self {
            source: source.into_iter(),
            slicer,
            history: DibitHistory::new(),
        }
    }

    /// Lifetime count of dibits delivered
    pub fn symbol_count(&self) -> u64 {
        self.history.count
    }
}

impl<I> DibitSource for SoftSymbolStream<I>
where
    I: Iterator<Item = i16>,
{
    fn get_dibit(&mut self) -> Result<Dibit, SourceExhausted> {
        let sym = self.source.next().ok_or(SourceExhausted {})?;
        let dibit = self.slicer.slice(sym);
        self.history.push(dibit);
        Ok(dibit)
    }

    fn lookback(&self, skip: usize, count: usize) -> Option<Vec<Dibit>> {
        self.history.lookback(skip, count)
    }

    fn signal_levels(&self) -> Option<SignalLevels> {
        Some(self.slicer.levels())
    }
}

/// Polarity-correcting view of a source
///
/// When `inverted`, every dibit read through this adapter,
/// including history, is exclusive-or'd with `0b10`. Decoders
/// read through this view so that they always see
/// normal-polarity symbols.
#[derive(Debug)]
pub struct Polarized<'src, S>
where
    S: DibitSource + ?Sized,
{
    source: &'src mut S,
    inverted: bool,
}

impl<'src, S> Polarized<'src, S>
where
    S: DibitSource + ?Sized,
{
    /// Wrap `source`, inverting if `inverted` is set
    pub fn new(source: &'src mut S, inverted: bool) -> Self {
        Self { source, inverted }
    }

    #[inline]
    fn fix(&self, dibit: Dibit) -> Dibit {
        if self.inverted {
            dibit ^ 0x2
        } else {
            dibit
        }
    }
}

impl<'src, S> DibitSource for Polarized<'src, S>
where
    S: DibitSource + ?Sized,
{
    fn get_dibit(&mut self) -> Result<Dibit, SourceExhausted> {
        let dibit = self.source.get_dibit()?;
        Ok(self.fix(dibit))
    }

    fn skip_dibits(&mut self, n: usize) -> Result<(), SourceExhausted> {
        self.source.skip_dibits(n)
    }

    fn lookback(&self, skip: usize, count: usize) -> Option<Vec<Dibit>> {
        let mut out = self.source.lookback(skip, count)?;
        for d in out.iter_mut() {
            *d = self.fix(*d);
        }
        Some(out)
    }

    fn signal_levels(&self) -> Option<SignalLevels> {
        self.source.signal_levels()
    }
}

/// Read `count` dibits from `source` into a vector
pub(crate) fn read_dibits<S>(source: &mut S, count: usize) -> Result<Vec<Dibit>, SourceExhausted>
where
    S: DibitSource + ?Sized,
{
    let mut out = Vec::with_capacity(count);
    for _i in 0..count {
        out.push(source.get_dibit()?);
    }
    Ok(out)
}

/// Sign bit of each symbol, for binary modes
pub(crate) fn dibits_to_bits(dibits: &[Dibit]) -> Vec<u8> {
    dibits.iter().map(|d| (d >> 1) & 0x1).collect()
}

/// Expand dibits into bits, most significant bit first
pub(crate) fn unpack_dibits(dibits: &[Dibit]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 * dibits.len());
    for d in dibits {
        out.push((d >> 1) & 0x1);
        out.push(d & 0x1);
    }
    out
}

/// Interpret `bits[start..start+len]` as an MSB-first integer
///
/// Panics if the range exceeds `bits` or 64 bits.
pub(crate) fn bits_to_u64(bits: &[u8], start: usize, len: usize) -> u64 {
    assert!(len <= 64);
    bits[start..start + len]
        .iter()
        .fold(0u64, |acc, b| (acc << 1) | (*b as u64 & 0x1))
}

// Ring buffer of recently-delivered dibits
#[derive(Clone, Debug)]
struct DibitHistory {
    ring: ArrayDeque<Dibit, HISTORY_LEN, arraydeque::Wrapping>,
    count: u64,
}

impl DibitHistory {
    fn new() -> Self {
        Self {
            ring: ArrayDeque::new(),
            count: 0,
        }
    }

    #[inline]
    fn push(&mut self, dibit: Dibit) {
        let _ = self.ring.push_back(dibit);
        self.count = self.count.wrapping_add(1);
    }

    fn lookback(&self, skip: usize, count: usize) -> Option<Vec<Dibit>> {
        let len = self.ring.len();
        if skip + count > len {
            return None;
        }
        let start = len - skip - count;
        Some(self.ring.iter().skip(start).take(count).copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_masks_and_counts() {
        let mut src = DibitStream::new(vec![0u8, 1, 6, 3]);
        assert_eq!(Ok(0), src.get_dibit());
        assert_eq!(Ok(1), src.get_dibit());
        assert_eq!(Ok(2), src.get_dibit());
        assert_eq!(Ok(3), src.get_dibit());
        assert_eq!(Err(SourceExhausted {}), src.get_dibit());
        assert_eq!(4, src.symbol_count());
    }

    #[test]
    fn test_skip_counts() {
        let mut src = DibitStream::new(std::iter::repeat(1u8).take(10));
        src.skip_dibits(7).expect("skip");
        assert_eq!(7, src.symbol_count());
        assert!(src.skip_dibits(4).is_err());
    }

    #[test]
    fn test_lookback() {
        let mut src = DibitStream::new((0..20u8).map(|v| v % 4));
        for _i in 0..10 {
            src.get_dibit().unwrap();
        }
        // delivered: 0 1 2 3 0 1 2 3 0 1
        assert_eq!(Some(vec![1, 2, 3]), src.lookback(2, 3));
        assert_eq!(Some(vec![0, 1]), src.lookback(0, 2));
        assert_eq!(None, src.lookback(5, 6));
    }

    #[test]
    fn test_history_wraps() {
        let mut src = DibitStream::new(std::iter::repeat(3u8).take(HISTORY_LEN + 50));
        src.skip_dibits(HISTORY_LEN + 50).unwrap();
        assert!(src.lookback(0, HISTORY_LEN).is_some());
        assert!(src.lookback(1, HISTORY_LEN).is_none());
    }

    #[test]
    fn test_polarized() {
        let mut src = DibitStream::new(vec![0u8, 1, 2, 3]);
        {
            let mut inv = Polarized::new(&mut src, true);
            assert_eq!(Ok(2), inv.get_dibit());
            assert_eq!(Ok(3), inv.get_dibit());
            assert_eq!(Some(vec![2, 3]), inv.lookback(0, 2));
        }
        let mut norm = Polarized::new(&mut src, false);
        assert_eq!(Ok(2), norm.get_dibit());
        assert_eq!(Some(vec![0, 1, 2]), norm.lookback(0, 3));
    }

    #[test]
    fn test_bit_helpers() {
        let bits = unpack_dibits(&[2, 3, 1]);
        assert_eq!(vec![1, 0, 1, 1, 0, 1], bits);
        assert_eq!(0b101101, bits_to_u64(&bits, 0, 6));
        assert_eq!(0b1101, bits_to_u64(&bits, 2, 4));
        assert_eq!(vec![0, 0, 1, 1], dibits_to_bits(&[0, 1, 2, 3]));
    }

    #[test]
    fn test_soft_stream_levels() {
        let slicer = SymbolSlicer::default();
        let mut src = SoftSymbolStream::new(vec![15000i16, 5000, -5000, -15000], slicer);
        let got: Vec<Dibit> = (0..4).map(|_| src.get_dibit().unwrap()).collect();
        assert_eq!(vec![1, 0, 2, 3], got);
        assert!(src.signal_levels().is_some());
        assert_eq!(Some(vec![2, 3]), src.lookback(0, 2));
    }
}
