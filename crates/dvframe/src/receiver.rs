//! Full receiver chain

#[cfg(not(test))]
use log::{info, trace};

#[cfg(test)]
use std::println as trace;
#[cfg(test)]
use std::println as info;

use std::convert::From;

use crate::builder::ReceiverBuilder;
use crate::decoder::FrameDecoder;
use crate::dibit::{DibitSource, SourceExhausted};
use crate::frame::FrameReport;
use crate::state::DecodeState;
use crate::syncdetect::SyncDetector;

/// A complete digital voice receiver
///
/// The receiver takes a source of dibits and performs the
/// following operations:
///
/// 1. Frame sync detection, for every enabled standard, at
///    either polarity
/// 2. Frame classification, by sync type and by P25 Network ID,
///    with continuity inference for damaged P25 frames
/// 3. Per-standard frame decoding
/// 4. Voice frame output to MBE files, if enabled
///
/// To create the receiver, first create its Builder:
///
/// ```
/// use dvframe::ReceiverBuilder;
///
/// let receiver = ReceiverBuilder::default()
///     .with_resume(2)
///     .build();
/// assert_eq!(0, receiver.state().nac);
/// ```
///
/// See [module documentation](index.html) for details.
#[derive(Debug)]
pub struct Receiver {
    detector: SyncDetector,
    decoder: FrameDecoder,
    frame_counter: u64,
}

impl Receiver {
    /// Receive frames from a source of dibits
    ///
    /// Bind an iterator which will consume the `source` and
    /// produce one [`FrameReport`] per frame.
    ///
    /// The iterator will consume as many dibits of `source` as
    /// are required to find and decode the next frame. It will
    /// return `None` once the source is exhausted. A frame which
    /// is cut off by the end of the source is not reported.
    #[must_use = "iterators are lazy and do nothing unless consumed"]
    pub fn iter<S>(&mut self, source: S) -> FrameIter<'_, S>
    where
        S: DibitSource,
    {
        FrameIter {
            source,
            receiver: self,
        }
    }

    /// Find and decode the next frame
    ///
    /// Errors if the `source` runs dry before a complete frame
    /// has been read.
    pub fn process<S>(&mut self, source: &mut S) -> Result<FrameReport, SourceExhausted>
    where
        S: DibitSource + ?Sized,
    {
        let sync = self.detector.search(source)?;
        trace!(
            "receiver: {} with {} errors",
            sync,
            self.detector.last_errors()
        );
        let report = self.decoder.process_frame(sync, source)?;
        self.frame_counter = self.frame_counter.wrapping_add(1);
        Ok(report)
    }

    /// Frame decoder
    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }

    /// Session state
    pub fn state(&self) -> &DecodeState {
        self.decoder.state()
    }

    /// Lifetime total of frames decoded
    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    /// Clear all state and reset to initial conditions
    ///
    /// Any open MBE file is closed.
    pub fn reset(&mut self) {
        self.detector.reset();
        self.decoder.reset();
        self.frame_counter = 0;
    }
}

impl From<&ReceiverBuilder> for Receiver {
    /// Create the Receiver from its Builder
    fn from(cfg: &ReceiverBuilder) -> Self {
        let detector = SyncDetector::new(
            cfg.families().iter().copied(),
            cfg.sync_max_errors(),
            cfg.polarity(),
        );
        let decoder = FrameDecoder::new(cfg.decoder_options());

        Self {
            detector,
            decoder,
            frame_counter: 0,
        }
    }
}

/// Dibit source iterator
///
/// This iterator is bound to a source of dibits. Calling the
/// `next()` method will return the next [`FrameReport`] or
/// `None` if the source has been consumed.
#[derive(Debug)]
pub struct FrameIter<'rx, S>
where
    S: DibitSource,
{
    source: S,
    receiver: &'rx mut Receiver,
}

impl<'rx, S> FrameIter<'rx, S>
where
    S: DibitSource,
{
    /// The bound source
    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<'rx, S> Iterator for FrameIter<'rx, S>
where
    S: DibitSource,
{
    type Item = FrameReport;

    fn next(&mut self) -> Option<Self::Item> {
        match self.receiver.process(&mut self.source) {
            Ok(report) => {
                info!(
                    "receiver [{:<8}]: {}",
                    self.receiver.frame_counter(),
                    report
                );
                Some(report)
            }
            Err(_) => None,
        }
    }
}
