use std::path::{Path, PathBuf};

use strum::IntoEnumIterator;

use crate::decoder::DecoderOptions;
use crate::receiver::Receiver;
use crate::slicer::{SignalLevels, SymbolSlicer};
use crate::state::Modulation;
use crate::syncdetect::Polarity;
use crate::synctype::SyncFamily;

/// Builds a digital voice receiver
///
/// The builder comes with a sensible set of default options:
/// every supported standard is enabled, sync words must match
/// exactly, and either polarity is accepted. Nothing is
/// written to disk unless you ask for it.
///
/// The API specified by the builder is part of this crate's
/// API. The actual default values are *not*, however, and
/// are subject to revision in any minor release. If you
/// care very strongly about a setting, be sure to configure
/// it here.
#[derive(Clone, Debug, PartialEq)]
pub struct ReceiverBuilder {
    families: Vec<SyncFamily>,
    sync_max_errors: u32,
    polarity: Polarity,
    modulation: Modulation,
    slicer_bandwidth: f32,
    verbose: u8,
    error_bars: bool,
    p25_status: bool,
    resume: u32,
    mbe_out_dir: Option<PathBuf>,
}

impl ReceiverBuilder {
    /// New receiver with "sensible" defaults
    pub fn new() -> Self {
        Self {
            families: SyncFamily::iter().collect(),
            sync_max_errors: 0,
            polarity: Polarity::Auto,
            modulation: Modulation::C4fm,
            slicer_bandwidth: 0.01,
            verbose: 0,
            error_bars: false,
            p25_status: false,
            resume: 0,
            mbe_out_dir: None,
        }
    }

    /// Build a receiver
    ///
    /// Once built, the receiver is immediately ready to
    /// process dibits.
    pub fn build(&self) -> Receiver {
        Receiver::from(self)
    }

    /// Build a symbol slicer for soft-symbol input
    ///
    /// The slicer starts from the default signal levels and
    /// adapts at the [slicer bandwidth](Self::with_slicer_bandwidth).
    pub fn build_slicer(&self) -> SymbolSlicer {
        let lvl = SignalLevels::default();
        SymbolSlicer::new(lvl.max, lvl.min, self.slicer_bandwidth)
    }

    /// Enable only the given standards
    ///
    /// Sync words for any standard not listed are ignored. An
    /// empty list is replaced with every supported standard.
    pub fn with_families<F>(&mut self, families: F) -> &mut Self
    where
        F: IntoIterator<Item = SyncFamily>,
    {
        let mut families = families
            .into_iter()
            .fold(Vec::<SyncFamily>::new(), |mut acc, fam| {
                if !acc.contains(&fam) {
                    acc.push(fam);
                }
                acc
            });
        if families.is_empty() {
            families = SyncFamily::iter().collect();
        }
        self.families = families;
        self
    }

    /// Maximum sync word dibit errors
    ///
    /// Set how many dibits of a sync word may be wrong. `0`
    /// requires an exact match. Values above `4` are clamped:
    /// the shortest sync words are only 24 dibits long, and
    /// tolerating more errors than this will trigger on noise.
    pub fn with_sync_max_errors(&mut self, max_err: u32) -> &mut Self {
        self.sync_max_errors = u32::clamp(max_err, 0, 4);
        self
    }

    /// Signal polarity
    ///
    /// Some receivers and discriminator taps invert the
    /// baseband. [`Polarity::Auto`] accepts either.
    pub fn with_polarity(&mut self, polarity: Polarity) -> &mut Self {
        self.polarity = polarity;
        self
    }

    /// RF modulation
    ///
    /// Only affects the reported signal level references. For
    /// QPSK (CQPSK simulcast), these are scaled to 80% of the
    /// observed extrema. Symbol slicing is unchanged.
    pub fn with_modulation(&mut self, modulation: Modulation) -> &mut Self {
        self.modulation = modulation;
        self
    }

    /// Symbol slicer bandwidth (fraction of symbol rate)
    ///
    /// Controls how fast the slicer's decision thresholds
    /// follow the signal level. Clamped to `[0.0, 1.0]`.
    pub fn with_slicer_bandwidth(&mut self, bw: f32) -> &mut Self {
        self.slicer_bandwidth = f32::clamp(bw, 0.0, 1.0);
        self
    }

    /// Verbosity
    pub fn with_verbose(&mut self, verbose: u8) -> &mut Self {
        self.verbose = verbose;
        self
    }

    /// Report signal levels
    ///
    /// Each [`FrameReport`](crate::FrameReport) will carry the
    /// signal level as a percentage. Only takes effect if the
    /// [verbosity](Self::with_verbose) is nonzero.
    pub fn with_error_bars(&mut self, enable: bool) -> &mut Self {
        self.error_bars = enable;
        self
    }

    /// Report P25 network and call identifiers
    pub fn with_p25_status(&mut self, enable: bool) -> &mut Self {
        self.p25_status = enable;
        self
    }

    /// Resume scanning after `threshold` terminators
    ///
    /// When nonzero, the receiver asks the scanner to resume
    /// on every P25 TDULC after the first `threshold` of
    /// them, and on every TSDU and PDU. `0` disables this.
    pub fn with_resume(&mut self, threshold: u32) -> &mut Self {
        self.resume = threshold;
        self
    }

    /// Save voice frames to MBE files in `dir`
    ///
    /// One file is written per call. The directory must
    /// exist.
    pub fn with_mbe_out_dir<P>(&mut self, dir: P) -> &mut Self
    where
        P: Into<PathBuf>,
    {
        self.mbe_out_dir = Some(dir.into());
        self
    }

    /// Do not save voice frames
    pub fn without_mbe_out(&mut self) -> &mut Self {
        self.mbe_out_dir = None;
        self
    }

    /// Enabled standards
    pub fn families(&self) -> &[SyncFamily] {
        &self.families
    }

    /// Maximum sync word dibit errors
    pub fn sync_max_errors(&self) -> u32 {
        self.sync_max_errors
    }

    /// Signal polarity
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// RF modulation
    pub fn modulation(&self) -> Modulation {
        self.modulation
    }

    /// Symbol slicer bandwidth (fraction of symbol rate)
    pub fn slicer_bandwidth(&self) -> f32 {
        self.slicer_bandwidth
    }

    /// MBE output directory
    pub fn mbe_out_dir(&self) -> Option<&Path> {
        self.mbe_out_dir.as_deref()
    }

    /// Frame decoder options
    pub fn decoder_options(&self) -> DecoderOptions {
        DecoderOptions {
            verbose: self.verbose,
            error_bars: self.error_bars,
            p25_status: self.p25_status,
            resume: self.resume,
            mbe_out_dir: self.mbe_out_dir.clone(),
            modulation: self.modulation,
        }
    }
}

impl std::default::Default for ReceiverBuilder {
    fn default() -> Self {
        Self::new()
    }
}
