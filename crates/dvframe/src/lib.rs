//! # dvframe: Digital Voice Frame Decoding
//!
//! This crate finds and decodes the frames of several land mobile
//! radio digital voice standards:
//!
//! * APCO Project 25 Phase 1
//! * DMR and Motorola X2-TDMA
//! * D-STAR
//! * NXDN (4800 baud)
//! * EDACS ProVoice
//!
//! It works on *dibits*: the hard-decision two-bit symbols
//! recovered from a demodulated four-level FM signal. Recovering
//! baseband audio, and slicing it into dibits, is mostly beyond the
//! scope of this crate. A simple adaptive [`SymbolSlicer`] is
//! provided for discriminator audio that has already been
//! downsampled to one sample per symbol.
//!
//! ## Disclaimer
//!
//! This crate is dual-licensed MIT and Apache 2.0. Read these licenses
//! carefully as they may affect your rights.
//!
//! Voice frames are emitted as raw codewords. This crate does not
//! contain a vocoder, and it does not perform any decryption.
//!
//! ## Example
//!
//! ```
//! use dvframe::{DecodeEvent, DibitStream, FrameOutcome, ReceiverBuilder};
//!
//! # let some_dibit_source_iterator = || std::iter::once(0u8);
//! #
//! let mut rx = ReceiverBuilder::new()
//!     .with_sync_max_errors(0)   // dibit errors permitted in each sync word
//!     .with_p25_status(true)     // report NAC, talkgroup, and source
//!     .with_resume(2)            // ask the scanner to move on after two TDULCs
//!     .build();
//!
//! // let dibits be an iterator which outputs dibits (0 to 3),
//! // such as a BufReader bound to stdin or a file
//! let dibits = DibitStream::new(some_dibit_source_iterator());
//! for report in rx.iter(dibits) {
//!     println!("{}", report);
//!     for evt in &report.events {
//!         match evt {
//!             DecodeEvent::Voice(vf) => {
//!                 // hand vf.to_bytes() to your vocoder
//!             }
//!             DecodeEvent::ResumeScan => {
//!                 // tell the scanner to resume
//!             }
//!             _ => {}
//!         }
//!     }
//!     if report.outcome == FrameOutcome::Unclassified {
//!         // a damaged P25 frame
//!     }
//! }
//! ```
//!
//! The receiver is created via a [builder](ReceiverBuilder).
//!
//! The [`Receiver`] binds by iterator to any [`DibitSource`]. It
//! searches for a frame sync word, then decodes exactly one frame,
//! and emits one [`FrameReport`] per frame.
//!
//! ## Frame classification
//!
//! Most standards are identified by their sync word alone. P25 Phase 1
//! shares a single sync word across all of its data units, so the
//! receiver must also read the *Network ID* which follows the sync.
//! The Network ID contains the twelve-bit Network Access Code (NAC)
//! and a Data Unit ID (DUID) which selects the frame type.
//!
//! The DUID is not well-protected. When it is received with errors,
//! the receiver falls back on *continuity*: an LDU1 is always
//! followed by an LDU2, and vice versa. Continuity inference is
//! single-shot. An inferred frame never leads to another inference,
//! so a run of damaged frames cannot sustain itself.
//!
//! ```
//! use dvframe::{classify_duid, Classification, Duid, DuidCode, LastP25Type};
//!
//! let damaged = DuidCode::from_dibits(1, 2);
//! assert_eq!(
//!     Classification::Inferred(Duid::Ldu2),
//!     classify_duid(damaged, LastP25Type::Ldu1)
//! );
//! assert_eq!(
//!     Classification::Unknown(damaged),
//!     classify_duid(damaged, LastP25Type::None)
//! );
//! ```
//!
//! ## Crate features
//!
//! * `chrono`: Use chrono to timestamp MBE output file names in
//!   local time. Without it, file names carry UNIX timestamps.
//!

mod builder;
mod classify;
mod decoder;
mod dibit;
mod dstar;
mod frame;
mod mbeout;
mod nxdn;
mod p25;
mod provoice;
mod receiver;
mod slicer;
mod state;
mod syncdetect;
mod synctype;
mod tdma;

pub use builder::ReceiverBuilder;
pub use classify::{
    classify_duid, classify_sync, read_duid, read_nac, Classification, Duid, DuidCode, FrameKind,
    DUID_DIBITS, NAC_DIBITS,
};
pub use decoder::{DecoderOptions, FrameDecoder};
pub use dibit::{
    Dibit, DibitSource, DibitStream, Polarized, SoftSymbolStream, SourceExhausted, HISTORY_LEN,
};
pub use frame::{
    DataRecord, DecodeEvent, EncryptionSync, FrameOutcome, FrameReport, LinkControl, NxdnLich,
    P25Header, TdmaBurst, VoiceCodec, VoiceFrame, MAX_VOICE_BITS,
};
pub use mbeout::{MbeOutput, MbeOutputError};
pub use receiver::{FrameIter, Receiver};
pub use slicer::{SignalLevels, SymbolSlicer};
pub use state::{DecodeState, FrameSubtype, LastP25Type, Modulation};
pub use syncdetect::{Polarity, SyncDetector};
pub use synctype::{SyncFamily, SyncType};
