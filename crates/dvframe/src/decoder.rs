//! Frame decoder and dispatch
//!
//! The [`FrameDecoder`] owns the session's [`DecodeState`] and
//! the MBE output file. It is invoked once per frame, after the
//! frame's sync word has been detected, and:
//!
//! 1. classifies the frame from its sync type and, for P25,
//!    from the Network ID which follows the sync;
//! 2. falls back on continuity when a P25 DUID cannot be
//!    matched;
//! 3. dispatches to exactly one per-standard decoder, which
//!    consumes the frame; and
//! 4. updates the decode state and reports what happened.

use std::path::PathBuf;

#[cfg(not(test))]
use log::{debug, info, warn};

#[cfg(test)]
use std::println as debug;
#[cfg(test)]
use std::println as info;
#[cfg(test)]
use std::println as warn;

use crate::classify::{
    classify_duid, classify_sync, read_duid, read_nac, Classification, Duid, FrameKind,
};
use crate::dibit::{DibitSource, Polarized, SourceExhausted};
use crate::frame::{DataRecord, DecodeEvent, FrameOutcome, FrameReport, VoiceCodec, VoiceFrame};
use crate::mbeout::MbeOutput;
use crate::state::{DecodeState, FrameSubtype, LastP25Type, Modulation};
use crate::synctype::SyncType;
use crate::{dstar, nxdn, p25, provoice, tdma};

/// Decoder options
///
/// Options are fixed for the life of the decoder. Use the
/// [`ReceiverBuilder`](crate::ReceiverBuilder) to set them.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct DecoderOptions {
    /// Verbosity level
    pub verbose: u8,

    /// Report the signal level with each frame
    ///
    /// Requires `verbose > 0`.
    pub error_bars: bool,

    /// Report the P25 NAC, source, and talkgroup
    pub p25_status: bool,

    /// Resume scanning after this many TDULC frames
    ///
    /// Zero disables resume. When nonzero, every TSDU and PDU
    /// also asks the scanner to resume.
    pub resume: u32,

    /// Save voice frames to files in this directory
    pub mbe_out_dir: Option<PathBuf>,

    /// RF modulation
    pub modulation: Modulation,
}

/// Multi-protocol frame decoder
#[derive(Debug)]
pub struct FrameDecoder {
    options: DecoderOptions,
    state: DecodeState,
    mbe: MbeOutput,
    mbe_failed: bool,
}

impl FrameDecoder {
    /// New decoder with fresh session state
    pub fn new(options: DecoderOptions) -> Self {
        Self {
            state: DecodeState::new(options.modulation),
            mbe: MbeOutput::new(options.mbe_out_dir.clone()),
            mbe_failed: false,
            options,
        }
    }

    /// Decode one frame
    ///
    /// `sync` is the type of the sync word which was just read
    /// from `source`. The source must be positioned on the first
    /// symbol after the sync word.
    ///
    /// Consumes the entire frame, except when a P25 frame can be
    /// neither classified nor inferred. Only its Network ID is
    /// consumed in that case. Errors only if `source` is
    /// exhausted.
    pub fn process_frame<S>(
        &mut self,
        sync: SyncType,
        source: &mut S,
    ) -> Result<FrameReport, SourceExhausted>
    where
        S: DibitSource + ?Sized,
    {
        self.state.update_levels(source.signal_levels());
        let level = if self.options.error_bars && self.options.verbose > 0 {
            Some(self.state.level_percent())
        } else {
            None
        };

        let mut events = Vec::new();
        let mut source = Polarized::new(source, sync.is_inverted());
        let outcome = match classify_sync(sync) {
            Some(kind) => {
                self.state.nac = 0;
                self.state.last_p25_type = LastP25Type::None;
                self.decode_kind(kind, &mut source, &mut events)?;
                FrameOutcome::Decoded(kind)
            }
            None => self.process_p25(&mut source, &mut events)?,
        };
        self.state.last_sync = Some(sync);

        debug!(
            "decoder: {} {:?}, {} events",
            sync,
            outcome,
            events.len()
        );

        Ok(FrameReport {
            sync,
            outcome,
            events,
            subtype: self.state.subtype,
            nac: self.state.nac,
            src: self.state.last_src,
            tg: self.state.last_tg,
            level,
            show_p25_status: self.options.p25_status,
            err_str: self.state.err_str.clone(),
        })
    }

    /// Decoder options
    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Session state
    pub fn state(&self) -> &DecodeState {
        &self.state
    }

    /// Mutable session state
    pub fn state_mut(&mut self) -> &mut DecodeState {
        &mut self.state
    }

    /// End the session
    ///
    /// Closes any open MBE file and returns to fresh state.
    pub fn reset(&mut self) {
        self.close_mbe();
        self.state.reset();
    }

    // Read the Network ID and classify the P25 frame
    fn process_p25<S>(
        &mut self,
        source: &mut S,
        events: &mut Vec<DecodeEvent>,
    ) -> Result<FrameOutcome, SourceExhausted>
    where
        S: DibitSource + ?Sized,
    {
        self.state.nac = read_nac(source)?;
        let duid = read_duid(source)?;

        match classify_duid(duid, self.state.last_p25_type) {
            Classification::Frame(du) => {
                self.decode_p25(du, source, events)?;
                Ok(FrameOutcome::Decoded(FrameKind::P25(du)))
            }
            Classification::Inferred(du) => {
                self.infer_p25(du, source, events)?;
                Ok(FrameOutcome::InferredFromContinuity(FrameKind::P25(du)))
            }
            Classification::Unknown(code) => {
                info!("p25: unknown DUID \"{}\" (nac {:03X})", code, self.state.nac);
                self.state.subtype = FrameSubtype::Blank;
                events.push(DecodeEvent::UnknownDuid(code));
                Ok(FrameOutcome::Unclassified)
            }
        }
    }

    // Decode the body of a P25 data unit whose DUID was read
    fn decode_p25<S>(
        &mut self,
        du: Duid,
        source: &mut S,
        events: &mut Vec<DecodeEvent>,
    ) -> Result<(), SourceExhausted>
    where
        S: DibitSource + ?Sized,
    {
        match du {
            Duid::Hdu => {
                self.state.subtype = FrameSubtype::Hdu;
                self.open_mbe(VoiceCodec::Imbe7200);
                events.push(DecodeEvent::CodecReset);
                self.state.last_p25_type = LastP25Type::Ldu2;
                let hdr = p25::decode_hdu(source)?;
                self.state.last_tg = hdr.tgid as u32;
                events.push(DecodeEvent::Data(DataRecord::P25Header(hdr)));
            }
            Duid::Ldu1 => {
                self.state.subtype = FrameSubtype::Ldu1;
                self.open_mbe(VoiceCodec::Imbe7200);
                self.state.last_p25_type = LastP25Type::Ldu1;
                self.state.num_tdulc = 0;
                self.ldu1(source, events)?;
            }
            Duid::Ldu2 => {
                self.state.subtype = FrameSubtype::Ldu2;
                self.open_mbe(VoiceCodec::Imbe7200);
                self.state.last_p25_type = LastP25Type::Ldu2;
                self.ldu2(source, events)?;
            }
            Duid::Tdulc => {
                self.state.subtype = FrameSubtype::Tdulc;
                self.close_mbe();
                events.push(DecodeEvent::CodecReset);
                self.state.clear_call();
                self.state.last_p25_type = LastP25Type::None;
                self.state.err_str.clear();

                self.state.num_tdulc += 1;
                if self.options.resume > 0 && self.state.num_tdulc > self.options.resume {
                    events.push(DecodeEvent::ResumeScan);
                }

                let lc = p25::decode_tdulc(source)?;
                events.push(DecodeEvent::Data(DataRecord::P25LinkControl(lc)));
                self.state.err_str.clear();
            }
            Duid::Tdu => {
                self.state.subtype = FrameSubtype::Tdu;
                self.close_mbe();
                self.state.clear_call();
                self.state.last_p25_type = LastP25Type::None;
                self.state.err_str.clear();
                source.skip_dibits(p25::TDU_REMAINING)?;
            }
            Duid::Tsdu => {
                self.state.subtype = FrameSubtype::Tsdu;
                self.close_mbe();
                self.state.clear_call();
                self.state.last_p25_type = LastP25Type::Tsdu;
                if self.options.resume > 0 {
                    events.push(DecodeEvent::ResumeScan);
                }
                source.skip_dibits(p25::TSDU_SKIP)?;
            }
            Duid::Pdu => {
                self.state.subtype = FrameSubtype::Pdu;
                self.close_mbe();
                self.state.clear_call();
                self.state.last_p25_type = LastP25Type::Pdu;
                self.state.err_str.clear();
                if self.options.resume > 0 {
                    events.push(DecodeEvent::ResumeScan);
                }
            }
        }
        Ok(())
    }

    // Continuity inference is single-shot: the memory is always
    // cleared, never set to the inferred type
    fn infer_p25<S>(
        &mut self,
        du: Duid,
        source: &mut S,
        events: &mut Vec<DecodeEvent>,
    ) -> Result<(), SourceExhausted>
    where
        S: DibitSource + ?Sized,
    {
        match du {
            Duid::Ldu2 => {
                self.state.subtype = FrameSubtype::InferredLdu2;
                self.open_mbe(VoiceCodec::Imbe7200);
                self.state.last_p25_type = LastP25Type::None;
                self.ldu2(source, events)
            }
            Duid::Ldu1 => {
                self.state.subtype = FrameSubtype::InferredLdu1;
                self.open_mbe(VoiceCodec::Imbe7200);
                self.state.last_p25_type = LastP25Type::None;
                self.state.num_tdulc = 0;
                self.ldu1(source, events)
            }
            Duid::Tsdu => {
                self.state.subtype = FrameSubtype::InferredTsdu;
                self.close_mbe();
                self.state.last_p25_type = LastP25Type::None;
                source.skip_dibits(p25::TSDU_SKIP)
            }
            Duid::Pdu => {
                self.state.subtype = FrameSubtype::InferredPdu;
                self.close_mbe();
                self.state.last_p25_type = LastP25Type::None;
                Ok(())
            }
            // never inferred
            Duid::Hdu | Duid::Tdulc | Duid::Tdu => self.decode_p25(du, source, events),
        }
    }

    fn ldu1<S>(&mut self, source: &mut S, events: &mut Vec<DecodeEvent>) -> Result<(), SourceExhausted>
    where
        S: DibitSource + ?Sized,
    {
        let ldu = p25::decode_ldu1(source)?;
        for vf in ldu.voice {
            self.emit_voice(vf, events);
        }
        if let (Some(tg), Some(src)) = (ldu.info.destination(), ldu.info.source()) {
            self.state.last_tg = tg;
            self.state.last_src = src;
        }
        events.push(DecodeEvent::Data(DataRecord::P25LinkControl(ldu.info)));
        events.push(DecodeEvent::Data(DataRecord::P25LowSpeedData(ldu.lsd)));
        Ok(())
    }

    fn ldu2<S>(&mut self, source: &mut S, events: &mut Vec<DecodeEvent>) -> Result<(), SourceExhausted>
    where
        S: DibitSource + ?Sized,
    {
        let ldu = p25::decode_ldu2(source)?;
        for vf in ldu.voice {
            self.emit_voice(vf, events);
        }
        events.push(DecodeEvent::Data(DataRecord::P25EncryptionSync(ldu.info)));
        events.push(DecodeEvent::Data(DataRecord::P25LowSpeedData(ldu.lsd)));
        Ok(())
    }

    // Decode a non-P25 frame, or the body of a P25 data unit
    fn decode_kind<S>(
        &mut self,
        kind: FrameKind,
        source: &mut S,
        events: &mut Vec<DecodeEvent>,
    ) -> Result<(), SourceExhausted>
    where
        S: DibitSource + ?Sized,
    {
        match kind {
            FrameKind::P25(du) => self.decode_p25(du, source, events)?,
            FrameKind::X2TdmaVoice | FrameKind::DmrVoice => {
                if kind == FrameKind::DmrVoice {
                    self.state.clear_call();
                }
                self.state.subtype = FrameSubtype::Voice;
                self.open_mbe(VoiceCodec::Ambe3600x2450);
                for vf in tdma::decode_voice(source)? {
                    self.emit_voice(vf, events);
                }
            }
            FrameKind::X2TdmaData | FrameKind::DmrData => {
                if kind == FrameKind::DmrData {
                    self.state.clear_call();
                }
                self.state.subtype = FrameSubtype::Data;
                self.close_mbe();
                self.state.err_str.clear();
                let burst = tdma::decode_data(source)?;
                events.push(DecodeEvent::Data(DataRecord::TdmaBurst(burst)));
            }
            FrameKind::DstarVoice => {
                self.state.subtype = FrameSubtype::Voice;
                self.open_mbe(VoiceCodec::Ambe3600x2400);
                let dv = dstar::decode_voice(source)?;
                for vf in dv.voice {
                    self.emit_voice(vf, events);
                }
                events.push(DecodeEvent::Data(DataRecord::DstarSlowData {
                    data: dv.slow_data,
                    message: dv.message,
                }));
            }
            FrameKind::DstarHeader => {
                self.state.clear_call();
                self.state.subtype = FrameSubtype::Header;
                let bits = dstar::decode_header(source)?;
                events.push(DecodeEvent::Data(DataRecord::DstarHeader(bits)));
            }
            FrameKind::NxdnVoice => {
                self.state.clear_call();
                self.state.subtype = FrameSubtype::Voice;
                self.open_mbe(VoiceCodec::Ambe3600x2450);
                let nv = nxdn::decode_voice(source)?;
                if let Some(lich) = nv.lich {
                    events.push(DecodeEvent::Data(DataRecord::NxdnLich(lich)));
                }
                events.push(DecodeEvent::Data(DataRecord::NxdnSacch(nv.sacch)));
                for vf in nv.voice {
                    self.emit_voice(vf, events);
                }
            }
            FrameKind::NxdnData => {
                self.state.clear_call();
                self.state.subtype = FrameSubtype::Data;
                self.state.err_str.clear();
                let nd = nxdn::decode_data(source)?;
                if let Some(lich) = nd.lich {
                    events.push(DecodeEvent::Data(DataRecord::NxdnLich(lich)));
                }
                events.push(DecodeEvent::Data(DataRecord::NxdnData(nd.payload)));
            }
            FrameKind::ProVoice => {
                self.state.clear_call();
                self.state.subtype = FrameSubtype::Voice;
                self.open_mbe(VoiceCodec::Imbe7100);
                let pv = provoice::decode(source)?;
                events.push(DecodeEvent::Data(DataRecord::ProVoiceLid(pv.lid)));
                for vf in pv.voice {
                    self.emit_voice(vf, events);
                }
            }
        }
        Ok(())
    }

    fn emit_voice(&mut self, vf: VoiceFrame, events: &mut Vec<DecodeEvent>) {
        if let Err(e) = self.mbe.write_frame(&vf) {
            warn!("{}; MBE output disabled until end of call", e);
            if let Err(e) = self.mbe.close() {
                warn!("{}", e);
            }
            self.mbe_failed = true;
        }
        events.push(DecodeEvent::Voice(vf));
    }

    fn open_mbe(&mut self, codec: VoiceCodec) {
        if !self.mbe.is_enabled() || self.mbe_failed {
            return;
        }
        if let Err(e) = self.mbe.open(codec) {
            warn!("{}; MBE output disabled until end of call", e);
            self.mbe_failed = true;
        }
    }

    fn close_mbe(&mut self) {
        if let Err(e) = self.mbe.close() {
            warn!("{}", e);
        }
        self.mbe_failed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::classify::DuidCode;
    use crate::dibit::{Dibit, DibitStream};
    use crate::p25::testframe;

    // Group voice LC: talkgroup 100, source 1234
    const GROUP_LC: [u8; 9] = [0x00, 0x00, 0x00, 0x00, 0x00, 0x64, 0x00, 0x04, 0xd2];

    // Clear encryption sync
    const CLEAR_ES: [u8; 12] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0x80, 0, 0];

    fn decoder() -> FrameDecoder {
        FrameDecoder::new(DecoderOptions::default())
    }

    fn decoder_with_resume(resume: u32) -> FrameDecoder {
        FrameDecoder::new(DecoderOptions {
            resume,
            ..DecoderOptions::default()
        })
    }

    // NID followed by `pad` zero dibits
    fn nid_only(nac: u16, duid: [Dibit; 2], pad: usize) -> Vec<Dibit> {
        let mut out = testframe::nid(nac, duid);
        out.resize(8 + pad, 0);
        out
    }

    fn run(uut: &mut FrameDecoder, sync: SyncType, input: Vec<Dibit>) -> (FrameReport, u64) {
        let mut src = DibitStream::new(input);
        let rpt = uut.process_frame(sync, &mut src).expect("frame");
        (rpt, src.symbol_count())
    }

    #[test]
    fn test_x2tdma_by_code_zeroes_nac() {
        for code in 2..=5 {
            let mut uut = decoder();
            uut.state_mut().nac = 0x293;
            uut.state_mut().last_tg = 7;
            uut.state_mut().last_src = 8;

            let (rpt, used) = run(&mut uut, SyncType::from_code(code), vec![0u8; 1000]);
            assert_eq!(0, uut.state().nac);
            assert_eq!(7, uut.state().last_tg);
            assert_eq!(8, uut.state().last_src);
            if code == 3 || code == 4 {
                assert_eq!(FrameOutcome::Decoded(FrameKind::X2TdmaVoice), rpt.outcome);
                assert_eq!(FrameSubtype::Voice, rpt.subtype);
                assert_eq!(tdma::VOICE_SYMBOLS as u64, used);
            } else {
                assert_eq!(FrameOutcome::Decoded(FrameKind::X2TdmaData), rpt.outcome);
                assert_eq!(FrameSubtype::Data, rpt.subtype);
                assert_eq!(tdma::DATA_SYMBOLS as u64, used);
            }
        }
    }

    #[test]
    fn test_non_p25_call_identity() {
        // DMR, ProVoice, NXDN, and D-STAR header forget the call
        for code in [10, 11, 12, 13, 14, 15, 8, 9, 16, 17, 18, 19] {
            let mut uut = decoder();
            uut.state_mut().nac = 0x293;
            uut.state_mut().last_tg = 7;
            uut.state_mut().last_src = 8;
            run(&mut uut, SyncType::from_code(code), vec![0u8; 2000]);
            assert_eq!(0, uut.state().nac, "code {}", code);
            assert_eq!(0, uut.state().last_tg, "code {}", code);
            assert_eq!(0, uut.state().last_src, "code {}", code);
        }

        // D-STAR voice keeps it
        for code in [6, 7] {
            let mut uut = decoder();
            uut.state_mut().nac = 0x293;
            uut.state_mut().last_tg = 7;
            let (rpt, used) = run(&mut uut, SyncType::from_code(code), vec![0u8; 2000]);
            assert_eq!(0, uut.state().nac);
            assert_eq!(7, uut.state().last_tg);
            assert_eq!(dstar::VOICE_SYMBOLS as u64, used);
            assert_eq!(21, rpt.voice_frames().count());
        }
    }

    #[test]
    fn test_non_p25_consumption() {
        let cases = [
            (SyncType::DstarHeader, dstar::HEADER_SYMBOLS, FrameSubtype::Header),
            (SyncType::NxdnVoice, nxdn::FRAME_SYMBOLS, FrameSubtype::Voice),
            (SyncType::InvNxdnData, nxdn::FRAME_SYMBOLS, FrameSubtype::Data),
            (SyncType::ProVoice, provoice::FRAME_SYMBOLS, FrameSubtype::Voice),
            (SyncType::DmrVoice, tdma::VOICE_SYMBOLS, FrameSubtype::Voice),
            (SyncType::InvDmrData, tdma::DATA_SYMBOLS, FrameSubtype::Data),
        ];
        for (sync, want, subtype) in cases {
            let mut uut = decoder();
            uut.state_mut().err_str.push_str("stale");
            let (rpt, used) = run(&mut uut, sync, vec![0u8; 3000]);
            assert_eq!(want as u64, used, "{:?}", sync);
            assert_eq!(subtype, rpt.subtype);
            if subtype == FrameSubtype::Data {
                assert!(rpt.err_str.is_empty());
            }
        }
    }

    #[test]
    fn test_duid_table_dispatch() {
        let table = [
            ([0u8, 0u8], Duid::Hdu),
            ([1, 1], Duid::Ldu1),
            ([2, 2], Duid::Ldu2),
            ([3, 3], Duid::Tdulc),
            ([0, 3], Duid::Tdu),
            ([1, 3], Duid::Tsdu),
            ([3, 0], Duid::Pdu),
        ];
        for d0 in 0..4u8 {
            for d1 in 0..4u8 {
                let mut uut = decoder();
                let (rpt, used) = run(&mut uut, SyncType::P25Phase1, nid_only(0x293, [d0, d1], 1000));
                assert_eq!(0x293, rpt.nac);
                match table.iter().find(|(code, _)| *code == [d0, d1]) {
                    Some((_, du)) => {
                        assert_eq!(FrameOutcome::Decoded(FrameKind::P25(*du)), rpt.outcome)
                    }
                    None => {
                        assert_eq!(FrameOutcome::Unclassified, rpt.outcome);
                        assert_eq!(8, used);
                    }
                }
            }
        }
    }

    #[test]
    fn test_fixed_consumption() {
        let mut uut = decoder();
        let (rpt, used) = run(&mut uut, SyncType::P25Phase1, nid_only(1, [0, 3], 500));
        assert_eq!(FrameSubtype::Tdu, rpt.subtype);
        assert_eq!(8 + 40, used);

        let (rpt, used) = run(&mut uut, SyncType::P25Phase1, nid_only(1, [1, 3], 500));
        assert_eq!(FrameSubtype::Tsdu, rpt.subtype);
        assert_eq!(8 + 328, used);
        assert_eq!(LastP25Type::Tsdu, uut.state().last_p25_type);

        let (rpt, used) = run(&mut uut, SyncType::P25Phase1, nid_only(1, [3, 0], 500));
        assert_eq!(FrameSubtype::Pdu, rpt.subtype);
        assert_eq!(8, used);
        assert_eq!(LastP25Type::Pdu, uut.state().last_p25_type);
    }

    #[test]
    fn test_no_cascade() {
        let mut uut = decoder();
        uut.state_mut().last_p25_type = LastP25Type::Ldu1;

        let input = testframe::ldu2_with_duid(0x293, [1, 2], CLEAR_ES);
        let (rpt, used) = run(&mut uut, SyncType::P25Phase1, input);
        assert_eq!(
            FrameOutcome::InferredFromContinuity(FrameKind::P25(Duid::Ldu2)),
            rpt.outcome
        );
        assert_eq!(FrameSubtype::InferredLdu2, rpt.subtype);
        assert_eq!(LastP25Type::None, uut.state().last_p25_type);
        assert_eq!((p25::LDU_SYMBOLS - 24) as u64, used);

        let (rpt, used) = run(&mut uut, SyncType::P25Phase1, nid_only(0x293, [1, 2], 900));
        assert_eq!(FrameOutcome::Unclassified, rpt.outcome);
        assert_eq!(FrameSubtype::Blank, rpt.subtype);
        assert_eq!(
            vec![DecodeEvent::UnknownDuid(DuidCode(*b"12"))],
            rpt.events
        );
        assert!(format!("{}", rpt).contains(" duid:12 *Unknown DUID*"));
        assert_eq!(LastP25Type::None, uut.state().last_p25_type);
        assert_eq!(8, used);
    }

    #[test]
    fn test_continuity_always_clears() {
        for (last, inferred, used) in [
            (LastP25Type::Ldu1, Duid::Ldu2, p25::LDU_SYMBOLS - 24),
            (LastP25Type::Ldu2, Duid::Ldu1, p25::LDU_SYMBOLS - 24),
            (LastP25Type::Tsdu, Duid::Tsdu, 8 + p25::TSDU_SKIP),
            (LastP25Type::Pdu, Duid::Pdu, 8),
        ] {
            let mut uut = decoder_with_resume(1);
            uut.state_mut().last_p25_type = last;
            uut.state_mut().num_tdulc = 5;
            let (rpt, n) = run(&mut uut, SyncType::P25Phase1, nid_only(1, [2, 1], 1000));
            assert_eq!(
                FrameOutcome::InferredFromContinuity(FrameKind::P25(inferred)),
                rpt.outcome
            );
            assert_eq!(LastP25Type::None, uut.state().last_p25_type);
            assert_eq!(used as u64, n);
            assert!(!rpt.resume_scan());

            // only an inferred LDU1 resets the TDULC counter
            let want_tdulc = if inferred == Duid::Ldu1 { 0 } else { 5 };
            assert_eq!(want_tdulc, uut.state().num_tdulc);
        }
    }

    #[test]
    fn test_tdulc_counting() {
        let mut uut = decoder();
        let mut counts = Vec::new();
        for _i in 0..3 {
            let (rpt, used) = run(&mut uut, SyncType::P25Phase1, testframe::tdulc(1, GROUP_LC));
            assert_eq!(FrameSubtype::Tdulc, rpt.subtype);
            assert_eq!((p25::TDULC_SYMBOLS - 24) as u64, used);
            assert!(rpt.events.contains(&DecodeEvent::CodecReset));
            counts.push(uut.state().num_tdulc);
        }
        run(&mut uut, SyncType::P25Phase1, testframe::ldu1(1, GROUP_LC));
        counts.push(uut.state().num_tdulc);
        assert_eq!(vec![1, 2, 3, 0], counts);
    }

    #[test]
    fn test_tdulc_not_reset_by_other_frames() {
        let mut uut = decoder();
        run(&mut uut, SyncType::P25Phase1, testframe::tdulc(1, GROUP_LC));
        run(&mut uut, SyncType::P25Phase1, nid_only(1, [0, 3], 100));
        run(&mut uut, SyncType::DmrData, vec![0u8; 100]);
        run(&mut uut, SyncType::P25Phase1, testframe::ldu2(1, CLEAR_ES));
        assert_eq!(1, uut.state().num_tdulc);
        run(&mut uut, SyncType::P25Phase1, testframe::tdulc(1, GROUP_LC));
        assert_eq!(2, uut.state().num_tdulc);
    }

    #[test]
    fn test_resume_every_frame_past_threshold() {
        let threshold = 2;
        let mut uut = decoder_with_resume(threshold);
        let mut fired = Vec::new();
        for _i in 0..6 {
            let (rpt, _) = run(&mut uut, SyncType::P25Phase1, testframe::tdulc(1, GROUP_LC));
            fired.push(
                rpt.events
                    .iter()
                    .filter(|e| **e == DecodeEvent::ResumeScan)
                    .count(),
            );
        }
        assert_eq!(vec![0, 0, 1, 1, 1, 1], fired);

        // disabled
        let mut uut = decoder();
        for _i in 0..4 {
            let (rpt, _) = run(&mut uut, SyncType::P25Phase1, testframe::tdulc(1, GROUP_LC));
            assert!(!rpt.resume_scan());
        }
    }

    #[test]
    fn test_resume_on_tsdu_and_pdu() {
        let mut uut = decoder_with_resume(100);
        let (rpt, _) = run(&mut uut, SyncType::P25Phase1, nid_only(1, [1, 3], 400));
        assert!(rpt.resume_scan());
        let (rpt, _) = run(&mut uut, SyncType::P25Phase1, nid_only(1, [3, 0], 400));
        assert!(rpt.resume_scan());

        let mut uut = decoder();
        let (rpt, _) = run(&mut uut, SyncType::P25Phase1, nid_only(1, [1, 3], 400));
        assert!(!rpt.resume_scan());
    }

    #[test]
    fn test_hdu() {
        let mut uut = decoder();
        for last in [LastP25Type::None, LastP25Type::Ldu1, LastP25Type::Pdu] {
            uut.state_mut().last_p25_type = last;
            let mut header = [0u8; 15];
            header[13..15].copy_from_slice(&[0x00, 0x2a]);
            let (rpt, used) = run(&mut uut, SyncType::P25Phase1, testframe::hdu(0x293, header));
            assert_eq!(LastP25Type::Ldu2, uut.state().last_p25_type);
            assert_eq!(2, uut.state().last_p25_type.code());
            assert_eq!(FrameSubtype::Hdu, rpt.subtype);
            assert_eq!(42, rpt.tg);
            assert_eq!((p25::HDU_SYMBOLS - 24) as u64, used);
            assert_eq!(Some(&DecodeEvent::CodecReset), rpt.events.first());
        }
    }

    #[test]
    fn test_end_to_end_ldu1_then_inferred_ldu2() {
        let mut uut = FrameDecoder::new(DecoderOptions {
            p25_status: true,
            ..DecoderOptions::default()
        });

        let mut input = testframe::ldu1(0xabc, GROUP_LC);
        input.extend(testframe::ldu2_with_duid(0x123, [0, 1], CLEAR_ES));
        let mut src = DibitStream::new(input);

        let rpt = uut
            .process_frame(SyncType::from_code(99), &mut src)
            .expect("ldu1");
        assert_eq!(
            FrameOutcome::Decoded(FrameKind::P25(Duid::Ldu1)),
            rpt.outcome
        );
        assert_eq!(LastP25Type::Ldu1, uut.state().last_p25_type);
        assert_eq!(0xabc, rpt.nac);
        assert_eq!(100, rpt.tg);
        assert_eq!(1234, rpt.src);
        assert_eq!(9, rpt.voice_frames().count());
        assert!(format!("{}", rpt).contains("nac:  ABC src:     1234 tg:   100  LDU1"));

        let rpt = uut
            .process_frame(SyncType::from_code(99), &mut src)
            .expect("ldu2");
        assert_eq!(
            FrameOutcome::InferredFromContinuity(FrameKind::P25(Duid::Ldu2)),
            rpt.outcome
        );
        assert_eq!(LastP25Type::None, uut.state().last_p25_type);
        assert_eq!(FrameSubtype::InferredLdu2, rpt.subtype);
        assert_eq!(0x123, rpt.nac);
        assert_eq!(100, rpt.tg);
        assert_eq!(9, rpt.voice_frames().count());
        assert!(rpt
            .data_records()
            .any(|r| matches!(r, DataRecord::P25EncryptionSync(es) if !es.is_encrypted())));
        assert!(src.get_dibit().is_err());
    }

    #[test]
    fn test_inverted_p25() {
        let input: Vec<Dibit> = testframe::nid(0xabc, [0, 3])
            .into_iter()
            .map(|d| d ^ 0x2)
            .chain(std::iter::repeat(0).take(40))
            .collect();
        let mut uut = decoder();
        let (rpt, _) = run(&mut uut, SyncType::InvP25Phase1, input);
        assert_eq!(0xabc, rpt.nac);
        assert_eq!(FrameOutcome::Decoded(FrameKind::P25(Duid::Tdu)), rpt.outcome);
    }

    #[test]
    fn test_terminators_end_call() {
        let mut uut = decoder();
        run(&mut uut, SyncType::P25Phase1, testframe::ldu1(1, GROUP_LC));
        assert_eq!(100, uut.state().last_tg);
        uut.state_mut().err_str.push_str("err");
        let (rpt, _) = run(&mut uut, SyncType::P25Phase1, testframe::tdulc(1, GROUP_LC));
        assert_eq!(0, rpt.tg);
        assert_eq!(0, rpt.src);
        assert!(rpt.err_str.is_empty());
        assert_eq!(LastP25Type::None, uut.state().last_p25_type);
        assert!(rpt
            .data_records()
            .any(|r| *r == DataRecord::P25LinkControl(crate::frame::LinkControl(GROUP_LC))));
    }

    #[test]
    fn test_err_str_cleared_at_tdu_and_pdu() {
        let mut uut = decoder();
        for duid in [[0, 3], [3, 0]] {
            uut.state_mut().err_str.push_str("crc");
            let (rpt, _) = run(&mut uut, SyncType::P25Phase1, nid_only(1, duid, 100));
            assert!(rpt.err_str.is_empty());
            assert!(uut.state().err_str.is_empty());
        }
    }

    #[test]
    fn test_other_standard_breaks_continuity() {
        let mut uut = decoder();
        run(&mut uut, SyncType::P25Phase1, testframe::ldu1(0x293, GROUP_LC));
        assert_eq!(LastP25Type::Ldu1, uut.state().last_p25_type);
        uut.state_mut().num_tdulc = 2;

        run(&mut uut, SyncType::DmrData, vec![0u8; 1000]);
        assert_eq!(LastP25Type::None, uut.state().last_p25_type);
        assert_eq!(2, uut.state().num_tdulc);

        // a damaged DUID has nothing to infer from
        let input = testframe::ldu2_with_duid(0x293, [1, 2], CLEAR_ES);
        let (rpt, used) = run(&mut uut, SyncType::P25Phase1, input);
        assert_eq!(FrameOutcome::Unclassified, rpt.outcome);
        assert_eq!(8, used);
        assert_eq!(2, uut.state().num_tdulc);
    }

    #[test]
    fn test_level_display() {
        let mut uut = FrameDecoder::new(DecoderOptions {
            verbose: 1,
            error_bars: true,
            ..DecoderOptions::default()
        });
        let (rpt, _) = run(&mut uut, SyncType::P25Phase1, nid_only(1, [3, 0], 0));
        assert_eq!(Some(91), rpt.level);
        assert!(format!("{}", rpt).contains("inlvl: 91% "));

        // needs verbosity
        let mut uut = FrameDecoder::new(DecoderOptions {
            error_bars: true,
            modulation: Modulation::Qpsk,
            ..DecoderOptions::default()
        });
        let (rpt, _) = run(&mut uut, SyncType::P25Phase1, nid_only(1, [3, 0], 0));
        assert_eq!(None, rpt.level);
        assert_eq!(12000, uut.state().maxref);
    }

    #[test]
    fn test_mbe_file_per_call() {
        let dir = std::env::temp_dir().join(format!("dvframe-decoder-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("scratch dir");

        let mut uut = FrameDecoder::new(DecoderOptions {
            mbe_out_dir: Some(dir.clone()),
            ..DecoderOptions::default()
        });
        run(&mut uut, SyncType::P25Phase1, testframe::ldu1(1, GROUP_LC));
        run(&mut uut, SyncType::P25Phase1, testframe::ldu2(1, CLEAR_ES));
        run(&mut uut, SyncType::P25Phase1, nid_only(1, [0, 3], 40));

        let files: Vec<_> = std::fs::read_dir(&dir)
            .expect("list")
            .map(|e| e.expect("entry").path())
            .collect();
        assert_eq!(1, files.len());
        let data = std::fs::read(&files[0]).expect("read");
        assert_eq!(b".imb", &data[0..4]);
        assert_eq!(4 + 18 * 19, data.len());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_mbe_file_closed_at_tdulc() {
        let dir =
            std::env::temp_dir().join(format!("dvframe-decoder-tdulc-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("scratch dir");

        let mut uut = FrameDecoder::new(DecoderOptions {
            mbe_out_dir: Some(dir.clone()),
            ..DecoderOptions::default()
        });
        run(&mut uut, SyncType::P25Phase1, testframe::ldu1(1, GROUP_LC));
        run(&mut uut, SyncType::P25Phase1, testframe::tdulc(1, GROUP_LC));
        run(&mut uut, SyncType::P25Phase1, testframe::ldu1(1, GROUP_LC));
        uut.reset();

        let mut files: Vec<_> = std::fs::read_dir(&dir)
            .expect("list")
            .map(|e| e.expect("entry").path())
            .collect();
        files.sort();
        assert_eq!(2, files.len());
        for path in files {
            let data = std::fs::read(&path).expect("read");
            assert_eq!(b".imb", &data[0..4]);
            assert_eq!(4 + 9 * 19, data.len());
        }

        let _ = std::fs::remove_dir_all(&dir);
    }
}
