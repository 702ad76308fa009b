// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! x86-64 encoding classification
//!
//! Single source of truth for which CPU features an x86-64 instruction
//! encoding requires. Classification works on the raw bytes of one complete,
//! already-decoded instruction: prefixes and escape bytes select an opcode
//! map, and the first matching [`FeatureRule`] in [`FEATURE_TABLE`] gives the
//! required features. Encodings without a rule require nothing beyond the
//! long-mode base instruction set.
//!
//! Vector encodings get post-rules on top of the table:
//! - VEX: everything except the GPR-only BMI forms requires `avx`; 256-bit
//!   integer forms additionally require `avx2`
//! - EVEX: `avx512f`
//! - XOP: `xop`

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::{CpuFeature as F, CpuFeatures};

/// Opcode map an instruction's opcode byte belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpcodeMap {
    /// Primary one-byte opcodes
    OneByte,
    /// `0F xx`
    Map0F,
    /// `0F 38 xx`
    Map0F38,
    /// `0F 3A xx`
    Map0F3A,
    /// `0F 0F modrm ... xx` (3DNow!, keyed by the trailing suffix byte)
    Amd3dNow,
    /// VEX map 1
    Vex0F,
    /// VEX map 2
    Vex0F38,
    /// VEX map 3
    Vex0F3A,
    /// Any EVEX-encoded instruction
    Evex,
    /// Any XOP-encoded instruction
    Xop,
}

/// Mandatory prefix selecting between SSE variants of one opcode.
///
/// For legacy encodings this is the last of `F2`/`F3` if present, otherwise
/// `66`; for VEX it is the `pp` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MandatoryPrefix {
    None,
    P66,
    PF3,
    PF2,
}

/// The parts of an encoding that determine its feature requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeKey {
    pub map: OpcodeMap,
    pub opcode: u8,
    pub prefix: MandatoryPrefix,
    pub modrm: Option<u8>,
    /// REX.W (or VEX.W)
    pub rex_w: bool,
    /// VEX.L (256-bit vector length)
    pub vex_l: bool,
}

impl OpcodeKey {
    /// Parse the opcode key of one complete instruction encoding.
    ///
    /// Returns `None` if the bytes end before the opcode.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let mut i = 0;
        let mut rep = None;
        let mut operand_size = false;
        let mut rex_w = false;

        loop {
            let byte = *bytes.get(i)?;
            match byte {
                0xF2 | 0xF3 => {
                    rep = Some(byte);
                    rex_w = false;
                }
                0x66 => {
                    operand_size = true;
                    rex_w = false;
                }
                0xF0 | 0x2E | 0x36 | 0x3E | 0x26 | 0x64 | 0x65 | 0x67 => rex_w = false,
                // REX only takes effect immediately before the opcode
                0x40..=0x4F => rex_w = byte & 0x08 != 0,
                _ => break,
            }
            i += 1;
        }

        let prefix = match rep {
            Some(0xF3) => MandatoryPrefix::PF3,
            Some(_) => MandatoryPrefix::PF2,
            None if operand_size => MandatoryPrefix::P66,
            None => MandatoryPrefix::None,
        };

        let key = |map, opcode, modrm_at: usize| Self {
            map,
            opcode,
            prefix,
            modrm: bytes.get(modrm_at).copied(),
            rex_w,
            vex_l: false,
        };

        match bytes[i] {
            0xC5 => {
                let payload = *bytes.get(i + 1)?;
                Some(Self {
                    map: OpcodeMap::Vex0F,
                    opcode: *bytes.get(i + 2)?,
                    prefix: vex_prefix(payload),
                    modrm: bytes.get(i + 3).copied(),
                    rex_w: false,
                    vex_l: payload & 0x04 != 0,
                })
            }
            0xC4 => {
                let select = *bytes.get(i + 1)?;
                let payload = *bytes.get(i + 2)?;
                let map = match select & 0x1F {
                    1 => OpcodeMap::Vex0F,
                    2 => OpcodeMap::Vex0F38,
                    3 => OpcodeMap::Vex0F3A,
                    _ => return None,
                };
                Some(Self {
                    map,
                    opcode: *bytes.get(i + 3)?,
                    prefix: vex_prefix(payload),
                    modrm: bytes.get(i + 4).copied(),
                    rex_w: payload & 0x80 != 0,
                    vex_l: payload & 0x04 != 0,
                })
            }
            0x62 => Some(key(OpcodeMap::Evex, *bytes.get(i + 4)?, i + 5)),
            // 8F with map select >= 8 is XOP, otherwise POP r/m
            0x8F if bytes.get(i + 1).is_some_and(|select| select & 0x1F >= 8) => {
                Some(key(OpcodeMap::Xop, *bytes.get(i + 3)?, i + 4))
            }
            0x0F => match *bytes.get(i + 1)? {
                0x38 => Some(key(OpcodeMap::Map0F38, *bytes.get(i + 2)?, i + 3)),
                0x3A => Some(key(OpcodeMap::Map0F3A, *bytes.get(i + 2)?, i + 3)),
                0x0F => Some(key(OpcodeMap::Amd3dNow, *bytes.last()?, i + 2)),
                opcode => Some(key(OpcodeMap::Map0F, opcode, i + 2)),
            },
            opcode => Some(key(OpcodeMap::OneByte, opcode, i + 1)),
        }
    }

    /// Features required by an instruction with this key.
    pub fn required_features(&self) -> CpuFeatures {
        let table = self.lookup();

        match self.map {
            OpcodeMap::Evex => CpuFeatures::from_slice(&[F::Avx, F::Avx512f]),
            OpcodeMap::Xop => CpuFeatures::from(F::Xop),
            OpcodeMap::Vex0F | OpcodeMap::Vex0F38 | OpcodeMap::Vex0F3A => {
                // BMI1/BMI2 use VEX to encode general-purpose register forms
                if table.intersects(GPR_VEX) {
                    return table;
                }
                let mut features = table | CpuFeatures::from(F::Avx);
                if self.vex_l && self.is_vector_integer() {
                    features.insert(F::Avx2);
                }
                features
            }
            _ => table,
        }
    }

    fn lookup(&self) -> CpuFeatures {
        BY_OPCODE
            .get(&(self.map, self.opcode))
            .and_then(|rules| rules.iter().find(|rule| rule.matches(self)))
            .map_or(CpuFeatures::empty(), |rule| rule.features)
    }

    /// Integer vector operations whose 256-bit VEX form was added by AVX2.
    fn is_vector_integer(&self) -> bool {
        match (self.map, self.prefix) {
            // vpshufd (66), vpshufhw (F3), vpshuflw (F2)
            (OpcodeMap::Vex0F, prefix) if self.opcode == 0x70 => prefix != MandatoryPrefix::None,
            (OpcodeMap::Vex0F, MandatoryPrefix::P66) => matches!(
                self.opcode,
                0x60..=0x6D | 0x71..=0x76 | 0xD1..=0xD5 | 0xD7..=0xE5 | 0xE8..=0xEF | 0xF1..=0xFE
            ),
            (OpcodeMap::Vex0F38, MandatoryPrefix::P66) => matches!(
                self.opcode,
                0x00..=0x0B | 0x1C..=0x1E | 0x20..=0x25 | 0x28..=0x2B | 0x30..=0x35 | 0x37..=0x40
            ),
            (OpcodeMap::Vex0F3A, MandatoryPrefix::P66) => {
                matches!(self.opcode, 0x0E | 0x0F | 0x42 | 0x4C)
            }
            _ => false,
        }
    }
}

fn vex_prefix(payload: u8) -> MandatoryPrefix {
    match payload & 0x03 {
        0 => MandatoryPrefix::None,
        1 => MandatoryPrefix::P66,
        2 => MandatoryPrefix::PF3,
        _ => MandatoryPrefix::PF2,
    }
}

const GPR_VEX: CpuFeatures = CpuFeatures::from_slice(&[F::Bmi1, F::Bmi2]);

/// Classify one complete x86-64 instruction encoding.
///
/// Bytes that end before the opcode require nothing; the decoder never
/// produces such records.
pub fn classify(bytes: &[u8]) -> CpuFeatures {
    OpcodeKey::parse(bytes).map_or(CpuFeatures::empty(), |key| key.required_features())
}

#[derive(Clone, Copy)]
enum PrefixMatch {
    Any,
    Is(MandatoryPrefix),
}

#[derive(Clone, Copy)]
enum ModRmMatch {
    Any,
    /// Memory operand (`mod != 3`) with `reg` in the inclusive range
    Mem(u8, u8),
    /// Register operand (`mod == 3`) with `reg` in the inclusive range
    Reg(u8, u8),
    /// Whole ModRM byte in the inclusive range
    Bytes(u8, u8),
}

/// One row of the classification table.
pub struct FeatureRule {
    map: OpcodeMap,
    first: u8,
    last: u8,
    prefix: PrefixMatch,
    modrm: ModRmMatch,
    rex_w: Option<bool>,
    vex_l: Option<bool>,
    features: CpuFeatures,
}

impl FeatureRule {
    const fn ops(map: OpcodeMap, first: u8, last: u8, features: &[F]) -> Self {
        Self {
            map,
            first,
            last,
            prefix: PrefixMatch::Any,
            modrm: ModRmMatch::Any,
            rex_w: None,
            vex_l: None,
            features: CpuFeatures::from_slice(features),
        }
    }

    const fn op(map: OpcodeMap, opcode: u8, features: &[F]) -> Self {
        Self::ops(map, opcode, opcode, features)
    }

    const fn with_prefix(self, prefix: MandatoryPrefix) -> Self {
        Self {
            prefix: PrefixMatch::Is(prefix),
            ..self
        }
    }

    const fn none(self) -> Self {
        self.with_prefix(MandatoryPrefix::None)
    }

    const fn p66(self) -> Self {
        self.with_prefix(MandatoryPrefix::P66)
    }

    const fn pf3(self) -> Self {
        self.with_prefix(MandatoryPrefix::PF3)
    }

    const fn pf2(self) -> Self {
        self.with_prefix(MandatoryPrefix::PF2)
    }

    const fn mem(self, first: u8, last: u8) -> Self {
        Self {
            modrm: ModRmMatch::Mem(first, last),
            ..self
        }
    }

    const fn reg(self, first: u8, last: u8) -> Self {
        Self {
            modrm: ModRmMatch::Reg(first, last),
            ..self
        }
    }

    const fn modrm(self, first: u8, last: u8) -> Self {
        Self {
            modrm: ModRmMatch::Bytes(first, last),
            ..self
        }
    }

    const fn rex_w(self) -> Self {
        Self {
            rex_w: Some(true),
            ..self
        }
    }

    /// 256-bit VEX forms only
    const fn l256(self) -> Self {
        Self {
            vex_l: Some(true),
            ..self
        }
    }

    fn matches(&self, key: &OpcodeKey) -> bool {
        let prefix = match self.prefix {
            PrefixMatch::Any => true,
            PrefixMatch::Is(prefix) => prefix == key.prefix,
        };
        let modrm = match (self.modrm, key.modrm) {
            (ModRmMatch::Any, _) => true,
            (ModRmMatch::Mem(first, last), Some(modrm)) => {
                modrm >> 6 != 3 && (first..=last).contains(&((modrm >> 3) & 7))
            }
            (ModRmMatch::Reg(first, last), Some(modrm)) => {
                modrm >> 6 == 3 && (first..=last).contains(&((modrm >> 3) & 7))
            }
            (ModRmMatch::Bytes(first, last), Some(modrm)) => (first..=last).contains(&modrm),
            (_, None) => false,
        };
        let rex_w = self.rex_w.is_none_or(|w| w == key.rex_w);
        let vex_l = self.vex_l.is_none_or(|l| l == key.vex_l);
        prefix && modrm && rex_w && vex_l
    }
}

lazy_static! {
    /// Candidate rules per (map, opcode), in table order.
    static ref BY_OPCODE: HashMap<(OpcodeMap, u8), Vec<&'static FeatureRule>> = {
        let mut index: HashMap<_, Vec<_>> = HashMap::new();
        for rule in FEATURE_TABLE {
            for opcode in rule.first..=rule.last {
                index.entry((rule.map, opcode)).or_default().push(rule);
            }
        }
        index
    };
}

use FeatureRule as R;
use OpcodeMap::{
    Amd3dNow, Map0F, Map0F3A, Map0F38, OneByte, Vex0F3A as V3A, Vex0F38 as V38,
};

/// Classification table. Within one opcode the first matching row wins, so
/// specific rows come before catch-all rows.
pub const FEATURE_TABLE: &[FeatureRule] = &[
    // One-byte map: long-mode-only encodings
    R::op(OneByte, 0x63, &[F::LongMode]), // movsxd
    R::ops(OneByte, 0x9E, 0x9F, &[F::LahfLm]), // sahf, lahf
    R::op(OneByte, 0xC6, &[F::Rtm]).modrm(0xF8, 0xF8), // xabort
    R::op(OneByte, 0xC7, &[F::Rtm]).modrm(0xF8, 0xF8), // xbegin
    // x87 forms that also depend on CMOV
    R::op(OneByte, 0xDA, &[F::X87, F::Cmov]).reg(0, 3), // fcmovb/e/be/u
    R::op(OneByte, 0xDB, &[F::X87, F::Cmov]).reg(0, 3), // fcmovnb/ne/nbe/nu
    R::op(OneByte, 0xDB, &[F::X87, F::Cmov]).reg(5, 6), // fucomi, fcomi
    R::op(OneByte, 0xDF, &[F::X87, F::Cmov]).reg(5, 6), // fucomip, fcomip
    // fisttp
    R::op(OneByte, 0xDB, &[F::X87, F::Sse3]).mem(1, 1),
    R::op(OneByte, 0xDD, &[F::X87, F::Sse3]).mem(1, 1),
    R::op(OneByte, 0xDF, &[F::X87, F::Sse3]).mem(1, 1),
    R::ops(OneByte, 0xD8, 0xDF, &[F::X87]),
    // 0F map: system and miscellaneous
    R::op(Map0F, 0x01, &[F::Vmx]).modrm(0xC1, 0xC4), // vmcall .. vmxoff
    R::op(Map0F, 0x01, &[F::Monitor]).modrm(0xC8, 0xC9), // monitor, mwait
    R::op(Map0F, 0x01, &[F::Xsave]).modrm(0xD0, 0xD1), // xgetbv, xsetbv
    R::op(Map0F, 0x01, &[F::Vmx]).modrm(0xD4, 0xD4), // vmfunc
    R::op(Map0F, 0x01, &[F::Rtm]).modrm(0xD5, 0xD6), // xend, xtest
    R::op(Map0F, 0x01, &[F::Svm]).modrm(0xD8, 0xDF), // vmrun .. invlpga
    R::op(Map0F, 0x01, &[F::Pku]).modrm(0xEE, 0xEF), // rdpkru, wrpkru
    R::op(Map0F, 0x01, &[F::LongMode]).modrm(0xF8, 0xF8), // swapgs
    R::op(Map0F, 0x01, &[F::Rdtscp]).modrm(0xF9, 0xF9),
    R::op(Map0F, 0x0D, &[F::Prefetchw]),
    R::op(Map0F, 0x0E, &[F::Amd3dNow]), // femms
    R::op(Map0F, 0x31, &[F::Tsc]),      // rdtsc
    R::ops(Map0F, 0x40, 0x4F, &[F::Cmov]),
    R::op(Map0F, 0x18, &[F::Sse]), // prefetchnta/t0/t1/t2
    // 0F AE group: prefixed forms first, then the rest by ModRM alone
    R::op(Map0F, 0xAE, &[F::Fsgsbase]).pf3().reg(0, 3), // rd/wr fs/gs base
    R::op(Map0F, 0xAE, &[F::Clwb]).p66().mem(6, 6),
    R::op(Map0F, 0xAE, &[F::Clflushopt]).p66().mem(7, 7),
    R::op(Map0F, 0xAE, &[F::Fxsr]).mem(0, 1),
    R::op(Map0F, 0xAE, &[F::Sse]).mem(2, 3), // ldmxcsr, stmxcsr
    R::op(Map0F, 0xAE, &[F::Xsave]).mem(4, 5),
    R::op(Map0F, 0xAE, &[F::Xsave, F::Xsaveopt]).mem(6, 6),
    R::op(Map0F, 0xAE, &[F::Clflush]).mem(7, 7),
    R::op(Map0F, 0xAE, &[F::Sse2]).reg(5, 6), // lfence, mfence
    R::op(Map0F, 0xAE, &[F::Sse]).reg(7, 7),  // sfence
    R::op(Map0F, 0xB8, &[F::Popcnt]).pf3(),
    // Without F3 these are bsf / bsr, which older CPUs execute instead
    R::op(Map0F, 0xBC, &[F::Bmi1]).pf3(), // tzcnt
    R::op(Map0F, 0xBD, &[F::Lzcnt]).pf3(),
    R::op(Map0F, 0xC3, &[F::Sse2]).none(), // movnti
    R::op(Map0F, 0xC7, &[F::Cx16, F::LongMode]).mem(1, 1).rex_w(),
    R::op(Map0F, 0xC7, &[F::Cx8]).mem(1, 1),
    R::op(Map0F, 0xC7, &[F::Xsave, F::Xsaves]).mem(3, 3), // xrstors
    R::op(Map0F, 0xC7, &[F::Xsave, F::Xsavec]).mem(4, 4),
    R::op(Map0F, 0xC7, &[F::Xsave, F::Xsaves]).mem(5, 5),
    R::op(Map0F, 0xC7, &[F::Vmx]).mem(6, 7), // vmptrld, vmclear, vmxon, vmptrst
    R::op(Map0F, 0xC7, &[F::Rdpid]).pf3().reg(7, 7),
    R::op(Map0F, 0xC7, &[F::Rdrand]).reg(6, 6),
    R::op(Map0F, 0xC7, &[F::Rdseed]).reg(7, 7),
    R::ops(Map0F, 0x78, 0x79, &[F::Vmx]).none(), // vmread, vmwrite
    R::ops(Map0F, 0x78, 0x79, &[F::Sse4a]).p66(), // extrq
    R::ops(Map0F, 0x78, 0x79, &[F::Sse4a]).pf2(), // insertq
    // 0F map: SSE family (packed/scalar float, moves, conversions)
    R::op(Map0F, 0x12, &[F::Sse3]).pf3(), // movsldup
    R::op(Map0F, 0x16, &[F::Sse3]).pf3(), // movshdup
    R::op(Map0F, 0x12, &[F::Sse3]).pf2(), // movddup
    R::ops(Map0F, 0x10, 0x11, &[F::Sse]).pf3(),
    R::ops(Map0F, 0x10, 0x11, &[F::Sse2]).pf2(),
    R::ops(Map0F, 0x10, 0x17, &[F::Sse]).none(),
    R::ops(Map0F, 0x10, 0x17, &[F::Sse2]).p66(),
    R::op(Map0F, 0x2B, &[F::Sse4a]).pf3(), // movntss
    R::op(Map0F, 0x2B, &[F::Sse4a]).pf2(), // movntsd
    R::op(Map0F, 0x2A, &[F::Sse]).pf3(),
    R::ops(Map0F, 0x2C, 0x2D, &[F::Sse]).pf3(),
    R::op(Map0F, 0x2A, &[F::Sse2]).pf2(),
    R::ops(Map0F, 0x2C, 0x2D, &[F::Sse2]).pf2(),
    R::ops(Map0F, 0x28, 0x2F, &[F::Sse]).none(),
    R::ops(Map0F, 0x28, 0x2F, &[F::Sse2]).p66(),
    R::ops(Map0F, 0x5A, 0x5B, &[F::Sse2]).none(), // cvtps2pd, cvtdq2ps
    R::ops(Map0F, 0x5A, 0x5B, &[F::Sse2]).pf3(),  // cvtss2sd, cvttps2dq
    R::ops(Map0F, 0x50, 0x5F, &[F::Sse]).none(),
    R::ops(Map0F, 0x50, 0x5F, &[F::Sse]).pf3(),
    R::ops(Map0F, 0x50, 0x5F, &[F::Sse2]).p66(),
    R::ops(Map0F, 0x50, 0x5F, &[F::Sse2]).pf2(),
    R::op(Map0F, 0xC2, &[F::Sse]).none(),
    R::op(Map0F, 0xC2, &[F::Sse]).pf3(),
    R::op(Map0F, 0xC2, &[F::Sse2]).p66(),
    R::op(Map0F, 0xC2, &[F::Sse2]).pf2(),
    R::op(Map0F, 0xC6, &[F::Sse]).none(),
    R::op(Map0F, 0xC6, &[F::Sse2]).p66(),
    R::ops(Map0F, 0x7C, 0x7D, &[F::Sse3]).p66(), // haddpd, hsubpd
    R::ops(Map0F, 0x7C, 0x7D, &[F::Sse3]).pf2(), // haddps, hsubps
    R::op(Map0F, 0xD0, &[F::Sse3]).p66(),        // addsubpd
    R::op(Map0F, 0xD0, &[F::Sse3]).pf2(),        // addsubps
    R::op(Map0F, 0xF0, &[F::Sse3]).pf2(),        // lddqu
    // 0F map: integer SIMD. No prefix operates on mm registers (MMX),
    // 66 on xmm registers (SSE2). MMX-register forms added by SSE and SSE2
    // need both.
    R::op(Map0F, 0x70, &[F::Sse, F::Mmx]).none(), // pshufw
    R::ops(Map0F, 0xC4, 0xC5, &[F::Sse, F::Mmx]).none(), // pinsrw, pextrw
    R::op(Map0F, 0xD7, &[F::Sse, F::Mmx]).none(), // pmovmskb
    R::op(Map0F, 0xDA, &[F::Sse, F::Mmx]).none(), // pminub
    R::op(Map0F, 0xDE, &[F::Sse, F::Mmx]).none(), // pmaxub
    R::op(Map0F, 0xE0, &[F::Sse, F::Mmx]).none(), // pavgb
    R::ops(Map0F, 0xE3, 0xE4, &[F::Sse, F::Mmx]).none(), // pavgw, pmulhuw
    R::op(Map0F, 0xE7, &[F::Sse, F::Mmx]).none(), // movntq
    R::op(Map0F, 0xEA, &[F::Sse, F::Mmx]).none(), // pminsw
    R::op(Map0F, 0xEE, &[F::Sse, F::Mmx]).none(), // pmaxsw
    R::ops(Map0F, 0xF6, 0xF7, &[F::Sse, F::Mmx]).none(), // psadbw, maskmovq
    R::op(Map0F, 0xD4, &[F::Mmx, F::Sse2]).none(), // paddq
    R::op(Map0F, 0xF4, &[F::Mmx, F::Sse2]).none(), // pmuludq
    R::op(Map0F, 0xFB, &[F::Mmx, F::Sse2]).none(), // psubq
    R::op(Map0F, 0x70, &[F::Sse2]),                // pshufd, pshufhw, pshuflw
    R::ops(Map0F, 0xC4, 0xC5, &[F::Sse2]).p66(),
    R::op(Map0F, 0x6F, &[F::Sse2]).pf3(), // movdqu
    R::ops(Map0F, 0x7E, 0x7F, &[F::Sse2]).pf3(),
    R::op(Map0F, 0xD6, &[F::Sse2]), // movq, movq2dq, movdq2q
    R::op(Map0F, 0xE6, &[F::Sse2]), // cvttpd2dq, cvtdq2pd, cvtpd2dq
    R::ops(Map0F, 0x60, 0x6B, &[F::Mmx]).none(),
    R::ops(Map0F, 0x6E, 0x6F, &[F::Mmx]).none(),
    R::ops(Map0F, 0x71, 0x77, &[F::Mmx]).none(), // shifts, compares, emms
    R::ops(Map0F, 0x7E, 0x7F, &[F::Mmx]).none(),
    R::ops(Map0F, 0xD1, 0xFE, &[F::Mmx]).none(),
    R::ops(Map0F, 0x60, 0x6F, &[F::Sse2]).p66(),
    R::ops(Map0F, 0x71, 0x76, &[F::Sse2]).p66(),
    R::ops(Map0F, 0x7E, 0x7F, &[F::Sse2]).p66(),
    R::ops(Map0F, 0xD1, 0xFE, &[F::Sse2]).p66(),
    // 0F 38 map
    R::ops(Map0F38, 0x00, 0x0B, &[F::Mmx, F::Ssse3]).none(),
    R::ops(Map0F38, 0x00, 0x0B, &[F::Ssse3]).p66(),
    R::ops(Map0F38, 0x1C, 0x1E, &[F::Mmx, F::Ssse3]).none(),
    R::ops(Map0F38, 0x1C, 0x1E, &[F::Ssse3]).p66(),
    R::op(Map0F38, 0x37, &[F::Sse42]).p66(), // pcmpgtq
    R::op(Map0F38, 0x10, &[F::Sse41]).p66(),
    R::ops(Map0F38, 0x14, 0x15, &[F::Sse41]).p66(),
    R::op(Map0F38, 0x17, &[F::Sse41]).p66(),
    R::ops(Map0F38, 0x20, 0x25, &[F::Sse41]).p66(),
    R::ops(Map0F38, 0x28, 0x2B, &[F::Sse41]).p66(),
    R::ops(Map0F38, 0x30, 0x35, &[F::Sse41]).p66(),
    R::ops(Map0F38, 0x38, 0x41, &[F::Sse41]).p66(),
    R::ops(Map0F38, 0x80, 0x81, &[F::Vmx]).p66(), // invept, invvpid
    R::op(Map0F38, 0x82, &[F::Invpcid]).p66(),
    R::ops(Map0F38, 0xC8, 0xCD, &[F::Sha]).none(),
    R::op(Map0F38, 0xCF, &[F::Gfni]).p66(), // gf2p8mulb
    R::ops(Map0F38, 0xDB, 0xDF, &[F::Aes]).p66(),
    R::ops(Map0F38, 0xF0, 0xF1, &[F::Sse42]).pf2(), // crc32
    R::ops(Map0F38, 0xF0, 0xF1, &[F::Movbe]).none(),
    R::ops(Map0F38, 0xF0, 0xF1, &[F::Movbe]).p66(),
    R::op(Map0F38, 0xF6, &[F::Adx]).p66(), // adcx
    R::op(Map0F38, 0xF6, &[F::Adx]).pf3(), // adox
    R::op(Map0F38, 0xF8, &[F::Movdir64b]).p66(),
    R::op(Map0F38, 0xF9, &[F::Movdiri]).none(),
    // 0F 3A map
    R::op(Map0F3A, 0x0F, &[F::Mmx, F::Ssse3]).none(), // palignr
    R::op(Map0F3A, 0x0F, &[F::Ssse3]).p66(),
    R::ops(Map0F3A, 0x08, 0x0E, &[F::Sse41]).p66(),
    R::ops(Map0F3A, 0x14, 0x17, &[F::Sse41]).p66(),
    R::ops(Map0F3A, 0x20, 0x22, &[F::Sse41]).p66(),
    R::ops(Map0F3A, 0x40, 0x42, &[F::Sse41]).p66(),
    R::op(Map0F3A, 0x44, &[F::Pclmulqdq]).p66(),
    R::ops(Map0F3A, 0x60, 0x63, &[F::Sse42]).p66(), // pcmpestr*, pcmpistr*
    R::op(Map0F3A, 0xCC, &[F::Sha]).none(),
    R::ops(Map0F3A, 0xCE, 0xCF, &[F::Gfni]).p66(), // gf2p8affine(inv)qb
    R::op(Map0F3A, 0xDF, &[F::Aes]).p66(), // aeskeygenassist
    // 3DNow!, keyed by suffix byte
    R::op(Amd3dNow, 0x0C, &[F::Amd3dNowExt]), // pi2fw
    R::op(Amd3dNow, 0x1C, &[F::Amd3dNowExt]), // pf2iw
    R::op(Amd3dNow, 0x8A, &[F::Amd3dNowExt]), // pfnacc
    R::op(Amd3dNow, 0x8E, &[F::Amd3dNowExt]), // pfpnacc
    R::op(Amd3dNow, 0xBB, &[F::Amd3dNowExt]), // pswapd
    R::ops(Amd3dNow, 0x00, 0xFF, &[F::Amd3dNow]),
    // VEX: general-purpose register forms
    R::op(V38, 0xF2, &[F::Bmi1]).none(),           // andn
    R::op(V38, 0xF3, &[F::Bmi1]).none().reg(1, 3), // blsr, blsmsk, blsi
    R::op(V38, 0xF3, &[F::Bmi1]).none().mem(1, 3),
    R::op(V38, 0xF7, &[F::Bmi1]).none(), // bextr
    R::op(V38, 0xF5, &[F::Bmi2]).none(), // bzhi
    R::op(V38, 0xF5, &[F::Bmi2]).pf3(),  // pext
    R::op(V38, 0xF5, &[F::Bmi2]).pf2(),  // pdep
    R::op(V38, 0xF6, &[F::Bmi2]).pf2(),  // mulx
    R::op(V38, 0xF7, &[F::Bmi2]),        // shlx, sarx, shrx
    R::op(V3A, 0xF0, &[F::Bmi2]).pf2(),  // rorx
    // VEX: extensions layered on AVX
    R::op(V38, 0x13, &[F::F16c]).p66(), // vcvtph2ps
    R::op(V3A, 0x1D, &[F::F16c]).p66(), // vcvtps2ph
    R::ops(V38, 0x96, 0x9F, &[F::Fma]).p66(),
    R::ops(V38, 0xA6, 0xAF, &[F::Fma]).p66(),
    R::ops(V38, 0xB6, 0xBF, &[F::Fma]).p66(),
    R::ops(V38, 0xDC, 0xDF, &[F::Vaes]).p66().l256(),
    R::ops(V38, 0xDB, 0xDF, &[F::Aes]).p66(),
    R::op(V3A, 0xDF, &[F::Aes]).p66(),
    R::op(V3A, 0x44, &[F::Vpclmulqdq]).p66().l256(),
    R::op(V3A, 0x44, &[F::Pclmulqdq]).p66(),
    R::op(V38, 0xCF, &[F::Gfni]).p66(),
    R::ops(V3A, 0xCE, 0xCF, &[F::Gfni]).p66(),
    // VEX: opcodes introduced by AVX2 at any vector length
    R::op(V38, 0x16, &[F::Avx2]).p66(),             // vpermps
    R::op(V38, 0x36, &[F::Avx2]).p66(),             // vpermd
    R::ops(V38, 0x45, 0x47, &[F::Avx2]).p66(),      // vpsrlv, vpsrav, vpsllv
    R::ops(V38, 0x58, 0x5A, &[F::Avx2]).p66(),      // vpbroadcastd/q, vbroadcasti128
    R::ops(V38, 0x78, 0x79, &[F::Avx2]).p66(),      // vpbroadcastb/w
    R::op(V38, 0x8C, &[F::Avx2]).p66(),             // vpmaskmov load
    R::op(V38, 0x8E, &[F::Avx2]).p66(),             // vpmaskmov store
    R::ops(V38, 0x90, 0x93, &[F::Avx2]).p66(),      // gathers
    R::ops(V3A, 0x00, 0x02, &[F::Avx2]).p66(),      // vpermq, vpermpd, vpblendd
    R::ops(V3A, 0x38, 0x39, &[F::Avx2]).p66(),      // vinserti128, vextracti128
    R::op(V3A, 0x46, &[F::Avx2]).p66(),             // vperm2i128
];
