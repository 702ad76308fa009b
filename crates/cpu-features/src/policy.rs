// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Permitted-feature policy
//!
//! A [`FeaturePolicy`] is the set of CPU features the sandbox target is
//! guaranteed to provide. It is fixed when validation starts and only ever
//! queried afterwards.
//!
//! Policies are usually built from an x86-64 micro-architecture level and
//! adjusted with `+feature` / `-feature` tokens:
//!
//! ```
//! use cpu_features::{CpuFeature, FeaturePolicy};
//!
//! let policy: FeaturePolicy = "x86-64-v2,+aes,-popcnt".parse().unwrap();
//! assert!(policy.permits(CpuFeature::Aes));
//! assert!(policy.permits(CpuFeature::Ssse3));
//! assert!(!policy.permits(CpuFeature::Popcnt));
//! ```

use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::{CpuFeature, CpuFeatures};

/// Level used when no policy is configured.
pub const DEFAULT_LEVEL: MicroarchLevel = MicroarchLevel::Baseline;

/// Policy string equivalent to [`DEFAULT_LEVEL`].
pub const DEFAULT_POLICY: &str = "x86-64";

/// Errors from parsing a policy string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("unknown cpu feature or level '{0}'")]
    UnknownFeature(String),
}

/// The x86-64 psABI micro-architecture levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicroarchLevel {
    /// `x86-64`: the original AMD64 feature set
    Baseline,
    /// `x86-64-v2`
    V2,
    /// `x86-64-v3`
    V3,
    /// `x86-64-v4`
    V4,
}

const BASELINE: &[CpuFeature] = &[
    CpuFeature::X87,
    CpuFeature::Mmx,
    CpuFeature::Cmov,
    CpuFeature::Cx8,
    CpuFeature::Tsc,
    CpuFeature::Clflush,
    CpuFeature::Fxsr,
    CpuFeature::LongMode,
    CpuFeature::Sse,
    CpuFeature::Sse2,
];

const V2: &[CpuFeature] = &[
    CpuFeature::Cx16,
    CpuFeature::LahfLm,
    CpuFeature::Popcnt,
    CpuFeature::Sse3,
    CpuFeature::Ssse3,
    CpuFeature::Sse41,
    CpuFeature::Sse42,
];

const V3: &[CpuFeature] = &[
    CpuFeature::Avx,
    CpuFeature::Avx2,
    CpuFeature::Bmi1,
    CpuFeature::Bmi2,
    CpuFeature::F16c,
    CpuFeature::Fma,
    CpuFeature::Lzcnt,
    CpuFeature::Movbe,
    CpuFeature::Xsave,
];

const V4: &[CpuFeature] = &[CpuFeature::Avx512f];

impl MicroarchLevel {
    /// Features guaranteed at this level (cumulative).
    pub const fn features(self) -> CpuFeatures {
        let baseline = CpuFeatures::from_slice(BASELINE);
        let v2 = baseline.union(CpuFeatures::from_slice(V2));
        let v3 = v2.union(CpuFeatures::from_slice(V3));
        match self {
            MicroarchLevel::Baseline => baseline,
            MicroarchLevel::V2 => v2,
            MicroarchLevel::V3 => v3,
            MicroarchLevel::V4 => v3.union(CpuFeatures::from_slice(V4)),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            MicroarchLevel::Baseline => "x86-64",
            MicroarchLevel::V2 => "x86-64-v2",
            MicroarchLevel::V3 => "x86-64-v3",
            MicroarchLevel::V4 => "x86-64-v4",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "x86-64" | "x86_64" | "baseline" | "v1" => Some(MicroarchLevel::Baseline),
            "x86-64-v2" | "x86_64_v2" | "v2" => Some(MicroarchLevel::V2),
            "x86-64-v3" | "x86_64_v3" | "v3" => Some(MicroarchLevel::V3),
            "x86-64-v4" | "x86_64_v4" | "v4" => Some(MicroarchLevel::V4),
            _ => None,
        }
    }
}

impl fmt::Display for MicroarchLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The set of CPU features permitted for one sandbox target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeaturePolicy {
    permitted: CpuFeatures,
}

impl FeaturePolicy {
    pub const fn new(permitted: CpuFeatures) -> Self {
        Self { permitted }
    }

    /// Policy that permits no optional feature at all.
    pub const fn deny_all() -> Self {
        Self::new(CpuFeatures::empty())
    }

    pub const fn for_level(level: MicroarchLevel) -> Self {
        Self::new(level.features())
    }

    /// Returns a copy that also permits `feature`.
    pub fn with(mut self, feature: CpuFeature) -> Self {
        self.permitted.insert(feature);
        self
    }

    /// Returns a copy that no longer permits `feature`.
    pub fn without(mut self, feature: CpuFeature) -> Self {
        self.permitted.remove(feature);
        self
    }

    pub const fn permits(&self, feature: CpuFeature) -> bool {
        self.permitted.contains(feature)
    }

    pub const fn permitted(&self) -> CpuFeatures {
        self.permitted
    }
}

impl Default for FeaturePolicy {
    fn default() -> Self {
        Self::for_level(DEFAULT_LEVEL)
    }
}

impl FromStr for FeaturePolicy {
    type Err = PolicyError;

    /// Tokens are separated by commas and/or whitespace and applied in order:
    /// a level name adds the level, `none` clears, `feature` / `+feature`
    /// adds and `-feature` removes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut permitted = CpuFeatures::empty();

        for token in s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
        {
            if token.eq_ignore_ascii_case("none") {
                permitted = CpuFeatures::empty();
                continue;
            }

            if let Some(name) = token.strip_prefix('-') {
                let feature = CpuFeature::from_name(name)
                    .ok_or_else(|| PolicyError::UnknownFeature(token.to_string()))?;
                permitted.remove(feature);
                continue;
            }

            let name = token.strip_prefix('+').unwrap_or(token);
            if let Some(level) = MicroarchLevel::from_name(name) {
                permitted |= level.features();
            } else {
                let feature = CpuFeature::from_name(name)
                    .ok_or_else(|| PolicyError::UnknownFeature(token.to_string()))?;
                permitted.insert(feature);
            }
        }

        Ok(Self::new(permitted))
    }
}

impl fmt::Display for FeaturePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.permitted.is_empty() {
            f.write_str("none")
        } else {
            fmt::Display::fmt(&self.permitted, f)
        }
    }
}
