//! Four-level symbol slicer

use crate::dibit::Dibit;

/// Signal level extrema
///
/// Rolling estimates of the outer (±3) symbol levels, in input
/// units. These are diagnostic: the decoder uses them only to
/// report a signal level percentage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SignalLevels {
    /// Estimated +3 symbol level
    pub max: i32,

    /// Estimated -3 symbol level
    pub min: i32,
}

impl Default for SignalLevels {
    fn default() -> Self {
        Self {
            max: SymbolSlicer::DEFAULT_MAX,
            min: SymbolSlicer::DEFAULT_MIN,
        }
    }
}

/// Hard-decision slicer for 4FSK soft symbols
///
/// The slicer places its decision thresholds from the
/// estimated outer symbol levels:
///
/// ```txt
///   max ─────────── +3 → dibit 1
///   umid ─ ─ ─ ─ ─
///                   +1 → dibit 0
///   center ────────
///                   -1 → dibit 2
///   lmid ─ ─ ─ ─ ─
///   min ─────────── -3 → dibit 3
/// ```
///
/// `umid` and `lmid` sit 62.5% of the way from the center to
/// each extreme. Outer symbols pull the extrema toward them
/// with a single-pole filter of bandwidth `bandwidth`.
#[derive(Clone, Debug)]
pub struct SymbolSlicer {
    bandwidth: f32,
    max: f32,
    min: f32,
}

impl SymbolSlicer {
    /// New slicer
    ///
    /// The extrema start at `max` and `min` and adapt with the
    /// given `bandwidth`, which is clamped to `[0.0, 1.0]`. A
    /// bandwidth of zero freezes the thresholds.
    pub fn new(max: i32, min: i32, bandwidth: f32) -> Self {
        Self {
            bandwidth: f32::clamp(bandwidth, 0.0, 1.0),
            max: max as f32,
            min: min as f32,
        }
    }

    /// Make a hard decision on soft symbol `sym`
    pub fn slice(&mut self, sym: i16) -> Dibit {
        let sym = sym as f32;
        let center = (self.max + self.min) / 2.0;
        let umid = center + (self.max - center) * Self::MID_FRACTION;
        let lmid = center + (self.min - center) * Self::MID_FRACTION;

        if sym > center {
            if sym > umid {
                self.max += (sym - self.max) * self.bandwidth;
                1
            } else {
                0
            }
        } else if sym < lmid {
            self.min += (sym - self.min) * self.bandwidth;
            3
        } else {
            2
        }
    }

    /// Current level estimates
    pub fn levels(&self) -> SignalLevels {
        SignalLevels {
            max: self.max as i32,
            min: self.min as i32,
        }
    }

    /// Return to the default level estimates
    pub fn reset(&mut self) {
        self.max = Self::DEFAULT_MAX as f32;
        self.min = Self::DEFAULT_MIN as f32;
    }

    pub(crate) const DEFAULT_MAX: i32 = 15000;
    pub(crate) const DEFAULT_MIN: i32 = -15000;
    const MID_FRACTION: f32 = 0.625;
}

impl Default for SymbolSlicer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX, Self::DEFAULT_MIN, 0.01)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_decisions() {
        let mut uut = SymbolSlicer::new(15000, -15000, 0.0);
        assert_eq!(1, uut.slice(14000));
        assert_eq!(1, uut.slice(9400));
        assert_eq!(0, uut.slice(9300));
        assert_eq!(0, uut.slice(1));
        assert_eq!(2, uut.slice(0));
        assert_eq!(2, uut.slice(-9300));
        assert_eq!(3, uut.slice(-9400));
        assert_eq!(3, uut.slice(-32000));

        // frozen
        assert_eq!(SignalLevels::default(), uut.levels());
    }

    #[test]
    fn test_tracking() {
        let mut uut = SymbolSlicer::new(15000, -15000, 0.5);
        uut.slice(11000);
        assert_approx_eq!(13000.0f32, uut.max);
        uut.slice(-19000);
        assert_approx_eq!(-17000.0f32, uut.min);

        // inner symbols never move the extrema
        uut.slice(3000);
        uut.slice(-3000);
        assert_eq!(13000, uut.levels().max);
        assert_eq!(-17000, uut.levels().min);

        uut.reset();
        assert_eq!(SignalLevels::default(), uut.levels());
    }
}
