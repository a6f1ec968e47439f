//! P25 Phase 1 data units
//!
//! Every P25 Phase 1 frame embeds one *status symbol* after
//! each 35 data symbols, counting from the first symbol of the
//! frame sync. The [`FrameReader`] strips these out so that the
//! decoders below see only data symbols.
//!
//! The Network ID (NAC and DUID) never contains a status symbol.
//! Decoders pick up immediately after the DUID, at frame symbol
//! 32, and read the 24 dibits of NID parity first.
//!
//! Error correction is not performed here. Data fields are
//! taken from the systematic bits of each codeword.

use crate::dibit::{bits_to_u64, unpack_dibits, Dibit, DibitSource, SourceExhausted};
use crate::frame::{EncryptionSync, LinkControl, P25Header, VoiceCodec, VoiceFrame};

/// Frame symbol index of the first symbol after the DUID
pub const NID_END: usize = 32;

/// Total length of an HDU, in symbols
pub const HDU_SYMBOLS: usize = 396;

/// Total length of an LDU1 or LDU2, in symbols
pub const LDU_SYMBOLS: usize = 864;

/// Total length of a TDULC, in symbols
pub const TDULC_SYMBOLS: usize = 216;

/// Symbols remaining in a TDU after the DUID
pub const TDU_REMAINING: usize = 40;

/// Symbols skipped for a TSDU after the DUID
pub const TSDU_SKIP: usize = 328;

const NID_PARITY_DIBITS: usize = 24;
const STATUS_PERIOD: usize = 36;
const VOICE_DIBITS: usize = 72;
const LSD_DIBITS: usize = 16;

/// Status-symbol-stripping reader
///
/// Tracks the frame symbol index and silently discards each
/// status symbol as it passes.
#[derive(Debug)]
pub struct FrameReader<'src, S>
where
    S: DibitSource + ?Sized,
{
    source: &'src mut S,
    pos: usize,
}

impl<'src, S> FrameReader<'src, S>
where
    S: DibitSource + ?Sized,
{
    /// Read from `source`, which is positioned at frame symbol `pos`
    pub fn new(source: &'src mut S, pos: usize) -> Self {
        Self { source, pos }
    }

    /// Current frame symbol index
    #[allow(dead_code)]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Read one data symbol
    pub fn read(&mut self) -> Result<Dibit, SourceExhausted> {
        if self.pos % STATUS_PERIOD == STATUS_PERIOD - 1 {
            self.source.get_dibit()?;
            self.pos += 1;
        }
        let out = self.source.get_dibit()?;
        self.pos += 1;
        Ok(out)
    }

    /// Read `count` data symbols
    pub fn read_many(&mut self, count: usize) -> Result<Vec<Dibit>, SourceExhausted> {
        let mut out = Vec::with_capacity(count);
        for _i in 0..count {
            out.push(self.read()?);
        }
        Ok(out)
    }

    /// Discard symbols until the frame symbol index reaches `total`
    pub fn finish(&mut self, total: usize) -> Result<(), SourceExhausted> {
        if total > self.pos {
            self.source.skip_dibits(total - self.pos)?;
            self.pos = total;
        }
        Ok(())
    }

    // Read one codeword of `dibits` length and return its
    // leading `data_bits` bits
    fn read_codeword(&mut self, dibits: usize, data_bits: usize) -> Result<u64, SourceExhausted> {
        let bits = unpack_dibits(&self.read_many(dibits)?);
        Ok(bits_to_u64(&bits, 0, data_bits))
    }
}

/// Logical Data Unit contents
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ldu<T> {
    /// Nine IMBE voice frames
    pub voice: Vec<VoiceFrame>,

    /// Link control (LDU1) or encryption sync (LDU2)
    pub info: T,

    /// Low-speed data
    pub lsd: [u8; 2],
}

/// Decode a Header Data Unit
///
/// The header code word is 36 Golay (18,6) codewords of nine
/// dibits each. The first 20 hexbits carry the header.
pub fn decode_hdu<S>(source: &mut S) -> Result<P25Header, SourceExhausted>
where
    S: DibitSource + ?Sized,
{
    let mut rd = FrameReader::new(source, NID_END);
    rd.read_many(NID_PARITY_DIBITS)?;

    let mut hexbits = Vec::with_capacity(36);
    for _i in 0..36 {
        hexbits.push(rd.read_codeword(9, 6)? as u8);
    }
    rd.finish(HDU_SYMBOLS)?;

    let bytes = hexbits_to_bytes(&hexbits[0..20]);
    let mut mi = [0u8; 9];
    mi.copy_from_slice(&bytes[0..9]);
    Ok(P25Header {
        mi,
        mfid: bytes[9],
        algid: bytes[10],
        kid: u16::from_be_bytes([bytes[11], bytes[12]]),
        tgid: u16::from_be_bytes([bytes[13], bytes[14]]),
    })
}

/// Decode a Logical Data Unit 1
pub fn decode_ldu1<S>(source: &mut S) -> Result<Ldu<LinkControl>, SourceExhausted>
where
    S: DibitSource + ?Sized,
{
    let (voice, hexbits, lsd) = read_ldu(source)?;
    Ok(Ldu {
        voice,
        info: link_control(&hexbits[0..12]),
        lsd,
    })
}

/// Decode a Logical Data Unit 2
pub fn decode_ldu2<S>(source: &mut S) -> Result<Ldu<EncryptionSync>, SourceExhausted>
where
    S: DibitSource + ?Sized,
{
    let (voice, hexbits, lsd) = read_ldu(source)?;
    let bytes = hexbits_to_bytes(&hexbits[0..16]);
    let mut mi = [0u8; 9];
    mi.copy_from_slice(&bytes[0..9]);
    Ok(Ldu {
        voice,
        info: EncryptionSync {
            mi,
            algid: bytes[9],
            kid: u16::from_be_bytes([bytes[10], bytes[11]]),
        },
        lsd,
    })
}

/// Decode a Terminator Data Unit with Link Control
///
/// The link control is carried in 12 Golay (24,12) codewords
/// of 12 dibits each, two hexbits apiece.
pub fn decode_tdulc<S>(source: &mut S) -> Result<LinkControl, SourceExhausted>
where
    S: DibitSource + ?Sized,
{
    let mut rd = FrameReader::new(source, NID_END);
    rd.read_many(NID_PARITY_DIBITS)?;

    let mut hexbits = Vec::with_capacity(24);
    for _i in 0..12 {
        let word = rd.read_codeword(12, 12)?;
        hexbits.push((word >> 6) as u8 & 0x3f);
        hexbits.push(word as u8 & 0x3f);
    }
    rd.finish(TDULC_SYMBOLS)?;

    Ok(link_control(&hexbits[0..12]))
}

// Voice frames, LC/ES hexbits, and low-speed data of an LDU
//
// VC1 VC2 LC VC3 LC VC4 LC VC5 LC VC6 LC VC7 LC VC8 LSD VC9
fn read_ldu<S>(source: &mut S) -> Result<(Vec<VoiceFrame>, Vec<u8>, [u8; 2]), SourceExhausted>
where
    S: DibitSource + ?Sized,
{
    let mut rd = FrameReader::new(source, NID_END);
    rd.read_many(NID_PARITY_DIBITS)?;

    let mut voice = Vec::with_capacity(9);
    let mut hexbits = Vec::with_capacity(24);
    let mut lsd = [0u8; 2];

    for vc in 0..9 {
        voice.push(VoiceFrame::from_dibits(
            VoiceCodec::Imbe7200,
            &rd.read_many(VOICE_DIBITS)?,
        ));
        match vc {
            1..=6 => {
                // four Hamming (10,6) codewords
                for _i in 0..4 {
                    hexbits.push(rd.read_codeword(5, 6)? as u8);
                }
            }
            7 => {
                let bits = unpack_dibits(&rd.read_many(LSD_DIBITS)?);
                lsd[0] = bits_to_u64(&bits, 0, 8) as u8;
                lsd[1] = bits_to_u64(&bits, 16, 8) as u8;
            }
            _ => {}
        }
    }
    rd.finish(LDU_SYMBOLS)?;

    Ok((voice, hexbits, lsd))
}

fn link_control(hexbits: &[u8]) -> LinkControl {
    let bytes = hexbits_to_bytes(hexbits);
    let mut lc = [0u8; 9];
    lc.copy_from_slice(&bytes[0..9]);
    LinkControl(lc)
}

// Concatenate six-bit values and pack MSB-first into bytes
fn hexbits_to_bytes(hexbits: &[u8]) -> Vec<u8> {
    let bits: Vec<u8> = hexbits
        .iter()
        .flat_map(|h| (0..6).rev().map(move |i| (h >> i) & 0x1))
        .collect();
    bits.chunks(8)
        .map(|c| bits_to_u64(c, 0, c.len()) as u8)
        .collect()
}


#[cfg(test)]
mod tests {
    use super::testframe::*;
    use super::*;

    use crate::dibit::DibitStream;

    // Group voice LC: talkgroup 100, source 1234
    const GROUP_LC: [u8; 9] = [0x00, 0x00, 0x00, 0x00, 0x00, 0x64, 0x00, 0x04, 0xd2];

    #[test]
    fn test_reader_skips_status() {
        // frame symbols 32..40, status at 35
        let input = vec![1u8, 1, 1, 3, 2, 2, 2, 2, 0];
        let mut src = DibitStream::new(input);
        let mut rd = FrameReader::new(&mut src, NID_END);
        assert_eq!(vec![1, 1, 1, 2, 2], rd.read_many(5).unwrap());
        assert_eq!(38, rd.pos());
        rd.finish(41).unwrap();
        assert_eq!(41, rd.pos());
        assert_eq!(9, src.symbol_count());
    }

    #[test]
    fn test_hexbits() {
        let bytes = [0xde, 0xad, 0xbe, 0xef, 0x01, 0x23];
        let hex = hexbits(&bytes);
        assert_eq!(8, hex.len());
        assert_eq!(bytes.to_vec(), hexbits_to_bytes(&hex));
    }

    #[test]
    fn test_decode_ldu1() {
        let input = ldu1(0x293, GROUP_LC);
        assert_eq!(LDU_SYMBOLS - 24, input.len());

        let mut src = DibitStream::new(input);
        src.skip_dibits(8).unwrap();
        let ldu = decode_ldu1(&mut src).expect("ldu1");
        assert_eq!((LDU_SYMBOLS - 24) as u64, src.symbol_count());

        assert_eq!(9, ldu.voice.len());
        for vf in &ldu.voice {
            assert_eq!(VoiceCodec::Imbe7200, vf.codec);
            assert_eq!(144, vf.bits.len());
            assert_eq!(vec![0x55u8; 18], vf.to_bytes());
        }
        assert_eq!(GROUP_LC, ldu.info.0);
        assert_eq!(Some(100), ldu.info.destination());
        assert_eq!(Some(1234), ldu.info.source());
    }

    #[test]
    fn test_decode_ldu2() {
        let es = [1, 2, 3, 4, 5, 6, 7, 8, 9, 0x80, 0x12, 0x34];
        let mut src = DibitStream::new(ldu2(0x293, es));
        src.skip_dibits(8).unwrap();
        let ldu = decode_ldu2(&mut src).expect("ldu2");
        assert_eq!((LDU_SYMBOLS - 24) as u64, src.symbol_count());
        assert_eq!([1, 2, 3, 4, 5, 6, 7, 8, 9], ldu.info.mi);
        assert_eq!(0x80, ldu.info.algid);
        assert_eq!(0x1234, ldu.info.kid);
        assert!(!ldu.info.is_encrypted());
        assert_eq!(vec![0xaau8; 18], ldu.voice[8].to_bytes());
    }

    #[test]
    fn test_decode_lsd() {
        let data = ldu_data(&[], [0xa5, 0x3c], 0);
        let mut src = DibitStream::new(frame(&nid(0, [1, 1]), &data, LDU_SYMBOLS));
        src.skip_dibits(8).unwrap();
        let ldu = decode_ldu1(&mut src).expect("ldu1");
        assert_eq!([0xa5, 0x3c], ldu.lsd);
    }

    #[test]
    fn test_decode_tdulc() {
        let mut src = DibitStream::new(tdulc(0x293, GROUP_LC));
        src.skip_dibits(8).unwrap();
        let lc = decode_tdulc(&mut src).expect("tdulc");
        assert_eq!((TDULC_SYMBOLS - 24) as u64, src.symbol_count());
        assert_eq!(GROUP_LC, lc.0);
    }

    #[test]
    fn test_decode_hdu() {
        let mut header = [0u8; 15];
        header[0..9].copy_from_slice(&[9, 8, 7, 6, 5, 4, 3, 2, 1]);
        header[9] = 0x90;
        header[10] = 0x84;
        header[11..13].copy_from_slice(&[0xbe, 0xef]);
        header[13..15].copy_from_slice(&[0x01, 0x02]);

        let mut src = DibitStream::new(hdu(0x293, header));
        src.skip_dibits(8).unwrap();
        let hdr = decode_hdu(&mut src).expect("hdu");
        assert_eq!((HDU_SYMBOLS - 24) as u64, src.symbol_count());
        assert_eq!([9, 8, 7, 6, 5, 4, 3, 2, 1], hdr.mi);
        assert_eq!(0x90, hdr.mfid);
        assert_eq!(0x84, hdr.algid);
        assert_eq!(0xbeef, hdr.kid);
        assert_eq!(0x0102, hdr.tgid);
    }
}
