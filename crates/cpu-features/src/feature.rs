// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! CPU feature identifiers
//!
//! The set of features is closed: every capability the classifier can demand
//! is a variant of [`CpuFeature`], and sets of features are fixed-size
//! bitsets ([`CpuFeatures`]) indexed by the variant.

use std::fmt;

/// A CPU capability that changes which x86-64 encodings are well-defined.
///
/// Declaration order is the canonical order: iteration over [`CpuFeatures`]
/// and diagnostics for multi-feature instructions follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CpuFeature {
    /// x87 floating point unit
    X87,
    /// MMX integer SIMD on `mm` registers
    Mmx,
    /// Conditional moves (`cmovcc`, and with x87 `fcmovcc`/`fcomi`)
    Cmov,
    /// `cmpxchg8b`
    Cx8,
    /// `cmpxchg16b`
    Cx16,
    /// `rdtsc`
    Tsc,
    /// `rdtscp`
    Rdtscp,
    /// `clflush`
    Clflush,
    /// `fxsave` / `fxrstor`
    Fxsr,
    /// `monitor` / `mwait`
    Monitor,
    /// `lahf` / `sahf` in 64-bit mode
    LahfLm,
    /// Encodings that only exist in long mode
    LongMode,
    Popcnt,
    Lzcnt,
    Movbe,
    /// `prefetch` / `prefetchw`
    Prefetchw,
    Sse,
    Sse2,
    Sse3,
    Ssse3,
    Sse41,
    Sse42,
    /// AMD `extrq` / `insertq` / `movnts*`
    Sse4a,
    /// AMD 3DNow!
    Amd3dNow,
    /// AMD extended 3DNow!
    Amd3dNowExt,
    Aes,
    Pclmulqdq,
    Sha,
    Avx,
    Avx2,
    Avx512f,
    Fma,
    F16c,
    /// AMD XOP
    Xop,
    Bmi1,
    Bmi2,
    Adx,
    Rdrand,
    Rdseed,
    Xsave,
    Vmx,
    Svm,
    /// Restricted transactional memory (`xbegin`, `xend`, `xabort`, `xtest`)
    Rtm,
    Rdpid,
    /// `rdfsbase` / `rdgsbase` / `wrfsbase` / `wrgsbase`
    Fsgsbase,
    Clflushopt,
    Clwb,
    /// Protection keys (`rdpkru` / `wrpkru`)
    Pku,
    Gfni,
    /// 256-bit VEX forms of the AES instructions
    Vaes,
    /// 256-bit VEX form of `pclmulqdq`
    Vpclmulqdq,
    Xsaveopt,
    Xsavec,
    /// `xsaves` / `xrstors`
    Xsaves,
    Invpcid,
    Movdiri,
    Movdir64b,
}

impl CpuFeature {
    /// Every feature, in canonical order.
    pub const ALL: [CpuFeature; 57] = [
        CpuFeature::X87,
        CpuFeature::Mmx,
        CpuFeature::Cmov,
        CpuFeature::Cx8,
        CpuFeature::Cx16,
        CpuFeature::Tsc,
        CpuFeature::Rdtscp,
        CpuFeature::Clflush,
        CpuFeature::Fxsr,
        CpuFeature::Monitor,
        CpuFeature::LahfLm,
        CpuFeature::LongMode,
        CpuFeature::Popcnt,
        CpuFeature::Lzcnt,
        CpuFeature::Movbe,
        CpuFeature::Prefetchw,
        CpuFeature::Sse,
        CpuFeature::Sse2,
        CpuFeature::Sse3,
        CpuFeature::Ssse3,
        CpuFeature::Sse41,
        CpuFeature::Sse42,
        CpuFeature::Sse4a,
        CpuFeature::Amd3dNow,
        CpuFeature::Amd3dNowExt,
        CpuFeature::Aes,
        CpuFeature::Pclmulqdq,
        CpuFeature::Sha,
        CpuFeature::Avx,
        CpuFeature::Avx2,
        CpuFeature::Avx512f,
        CpuFeature::Fma,
        CpuFeature::F16c,
        CpuFeature::Xop,
        CpuFeature::Bmi1,
        CpuFeature::Bmi2,
        CpuFeature::Adx,
        CpuFeature::Rdrand,
        CpuFeature::Rdseed,
        CpuFeature::Xsave,
        CpuFeature::Vmx,
        CpuFeature::Svm,
        CpuFeature::Rtm,
        CpuFeature::Rdpid,
        CpuFeature::Fsgsbase,
        CpuFeature::Clflushopt,
        CpuFeature::Clwb,
        CpuFeature::Pku,
        CpuFeature::Gfni,
        CpuFeature::Vaes,
        CpuFeature::Vpclmulqdq,
        CpuFeature::Xsaveopt,
        CpuFeature::Xsavec,
        CpuFeature::Xsaves,
        CpuFeature::Invpcid,
        CpuFeature::Movdiri,
        CpuFeature::Movdir64b,
    ];

    /// Stable lowercase name, as used by CPUID listings and policy strings.
    pub const fn name(self) -> &'static str {
        match self {
            CpuFeature::X87 => "x87",
            CpuFeature::Mmx => "mmx",
            CpuFeature::Cmov => "cmov",
            CpuFeature::Cx8 => "cx8",
            CpuFeature::Cx16 => "cx16",
            CpuFeature::Tsc => "tsc",
            CpuFeature::Rdtscp => "rdtscp",
            CpuFeature::Clflush => "clflush",
            CpuFeature::Fxsr => "fxsr",
            CpuFeature::Monitor => "monitor",
            CpuFeature::LahfLm => "lahf_lm",
            CpuFeature::LongMode => "lm",
            CpuFeature::Popcnt => "popcnt",
            CpuFeature::Lzcnt => "lzcnt",
            CpuFeature::Movbe => "movbe",
            CpuFeature::Prefetchw => "prfchw",
            CpuFeature::Sse => "sse",
            CpuFeature::Sse2 => "sse2",
            CpuFeature::Sse3 => "sse3",
            CpuFeature::Ssse3 => "ssse3",
            CpuFeature::Sse41 => "sse4.1",
            CpuFeature::Sse42 => "sse4.2",
            CpuFeature::Sse4a => "sse4a",
            CpuFeature::Amd3dNow => "3dnow",
            CpuFeature::Amd3dNowExt => "3dnowext",
            CpuFeature::Aes => "aes",
            CpuFeature::Pclmulqdq => "pclmulqdq",
            CpuFeature::Sha => "sha",
            CpuFeature::Avx => "avx",
            CpuFeature::Avx2 => "avx2",
            CpuFeature::Avx512f => "avx512f",
            CpuFeature::Fma => "fma",
            CpuFeature::F16c => "f16c",
            CpuFeature::Xop => "xop",
            CpuFeature::Bmi1 => "bmi1",
            CpuFeature::Bmi2 => "bmi2",
            CpuFeature::Adx => "adx",
            CpuFeature::Rdrand => "rdrand",
            CpuFeature::Rdseed => "rdseed",
            CpuFeature::Xsave => "xsave",
            CpuFeature::Vmx => "vmx",
            CpuFeature::Svm => "svm",
            CpuFeature::Rtm => "rtm",
            CpuFeature::Rdpid => "rdpid",
            CpuFeature::Fsgsbase => "fsgsbase",
            CpuFeature::Clflushopt => "clflushopt",
            CpuFeature::Clwb => "clwb",
            CpuFeature::Pku => "pku",
            CpuFeature::Gfni => "gfni",
            CpuFeature::Vaes => "vaes",
            CpuFeature::Vpclmulqdq => "vpclmulqdq",
            CpuFeature::Xsaveopt => "xsaveopt",
            CpuFeature::Xsavec => "xsavec",
            CpuFeature::Xsaves => "xsaves",
            CpuFeature::Invpcid => "invpcid",
            CpuFeature::Movdiri => "movdiri",
            CpuFeature::Movdir64b => "movdir64b",
        }
    }

    /// Look up a feature by name (case-insensitive, common aliases accepted).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        let canonical = match name.as_str() {
            "sse4_1" | "sse41" => "sse4.1",
            "sse4_2" | "sse42" => "sse4.2",
            "lahf-lm" | "lahf" => "lahf_lm",
            "long_mode" | "longmode" | "long-mode" => "lm",
            "prefetchw" => "prfchw",
            "fpu" => "x87",
            "cmpxchg8b" => "cx8",
            "cmpxchg16b" => "cx16",
            "clmul" => "pclmulqdq",
            "pkeys" | "ospke" => "pku",
            other => other,
        };
        Self::ALL
            .iter()
            .copied()
            .find(|feature| feature.name() == canonical)
    }

    const fn bit(self) -> u64 {
        1u64 << (self as u8)
    }
}

impl fmt::Display for CpuFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const _: () = assert!(CpuFeature::ALL.len() <= u64::BITS as usize);

/// A fixed-size set of [`CpuFeature`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CpuFeatures(u64);

impl CpuFeatures {
    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// The set of every known feature.
    pub const fn all() -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < CpuFeature::ALL.len() {
            bits |= CpuFeature::ALL[i].bit();
            i += 1;
        }
        Self(bits)
    }

    /// Build a set from a slice (usable in `const` tables).
    pub const fn from_slice(features: &[CpuFeature]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < features.len() {
            bits |= features[i].bit();
            i += 1;
        }
        Self(bits)
    }

    pub const fn contains(self, feature: CpuFeature) -> bool {
        self.0 & feature.bit() != 0
    }

    pub fn insert(&mut self, feature: CpuFeature) {
        self.0 |= feature.bit();
    }

    pub fn remove(&mut self, feature: CpuFeature) {
        self.0 &= !feature.bit();
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Features in `self` that are not in `other`.
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_subset(self, other: Self) -> bool {
        self.0 & !other.0 == 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterate the members in canonical order.
    pub fn iter(self) -> impl Iterator<Item = CpuFeature> {
        CpuFeature::ALL
            .into_iter()
            .filter(move |feature| self.contains(*feature))
    }
}

impl From<CpuFeature> for CpuFeatures {
    fn from(feature: CpuFeature) -> Self {
        Self(feature.bit())
    }
}

impl FromIterator<CpuFeature> for CpuFeatures {
    fn from_iter<T: IntoIterator<Item = CpuFeature>>(iter: T) -> Self {
        let mut features = Self::empty();
        for feature in iter {
            features.insert(feature);
        }
        features
    }
}

impl std::ops::BitOr for CpuFeatures {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for CpuFeatures {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for CpuFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for feature in self.iter() {
            if !first {
                f.write_str(",")?;
            }
            f.write_str(feature.name())?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{CpuFeature, CpuFeatures};

    #[test]
    fn test_discriminants_match_canonical_order() {
        for (index, feature) in CpuFeature::ALL.iter().enumerate() {
            assert_eq!(*feature as usize, index, "{feature} out of order");
        }
    }

    #[test]
    fn test_names_are_unique_and_round_trip() {
        for feature in CpuFeature::ALL {
            assert_eq!(CpuFeature::from_name(feature.name()), Some(feature));
        }
        let mut names: Vec<_> = CpuFeature::ALL.iter().map(|f| f.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CpuFeature::ALL.len());
    }

    #[test]
    fn test_from_name_aliases() {
        assert_eq!(CpuFeature::from_name("SSE4_1"), Some(CpuFeature::Sse41));
        assert_eq!(CpuFeature::from_name("sse42"), Some(CpuFeature::Sse42));
        assert_eq!(CpuFeature::from_name("long_mode"), Some(CpuFeature::LongMode));
        assert_eq!(CpuFeature::from_name("AVX2"), Some(CpuFeature::Avx2));
        assert_eq!(CpuFeature::from_name("pkeys"), Some(CpuFeature::Pku));
        assert_eq!(CpuFeature::from_name("avx1024"), None);
    }

    #[test]
    fn test_iter_is_canonical_order() {
        let set: CpuFeatures = [CpuFeature::Avx, CpuFeature::X87, CpuFeature::Sse2]
            .into_iter()
            .collect();
        let order: Vec<_> = set.iter().collect();
        assert_eq!(order, [CpuFeature::X87, CpuFeature::Sse2, CpuFeature::Avx]);
        assert_eq!(set.to_string(), "x87,sse2,avx");
    }

    #[test]
    fn test_set_operations() {
        let mut set = CpuFeatures::empty();
        assert!(set.is_empty());

        set.insert(CpuFeature::Cmov);
        set.insert(CpuFeature::Cmov);
        assert_eq!(set.len(), 1);
        assert!(set.contains(CpuFeature::Cmov));
        assert!(!set.contains(CpuFeature::Cx8));

        let other = CpuFeatures::from_slice(&[CpuFeature::Cmov, CpuFeature::Cx8]);
        assert!(set.is_subset(other));
        assert!(set.intersects(other));
        assert_eq!(other.difference(set), CpuFeatures::from(CpuFeature::Cx8));

        set.remove(CpuFeature::Cmov);
        assert!(set.is_empty());
    }

    #[test]
    fn test_all_contains_every_feature() {
        let all = CpuFeatures::all();
        assert_eq!(all.len(), CpuFeature::ALL.len());
        assert!(CpuFeature::ALL.iter().all(|f| all.contains(*f)));
    }
}
