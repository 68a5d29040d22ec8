// Broadcast encryption foundation libraries.
//
// SPDX-License-Identifier: Apache-2.0
//
// Written in 2022-2023 by
//     Dr. Maxim Orlovsky <orlovsky@lnp-bp.org>
//
// Copyright (C) 2022-2023 LNP/BP Standards Association. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::{self, Display, Formatter};

use super::{CoverError, MAX_VARIABLES};

/// Product term over `n` Boolean variables.
///
/// Each position holds 0, 1 or `*`; the term covers a point `x` iff every
/// non-`*` position equals the corresponding bit of `x`. Position 0 is the
/// most significant variable, so the bit of variable `i` inside the packed
/// masks sits at offset `n - 1 - i`, matching both the natural binary
/// notation of points and the wire encoding.
///
/// Stored as two bit masks: `ones` marks positions fixed to 1, `stars` marks
/// free positions; positions in neither mask are fixed to 0. The mask pair
/// doubles as the two accelerators of the Quine–McCluskey pairing rule (the
/// Hamming weight is the popcount of `ones`, the star pattern is `stars`
/// itself).
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct Implicant {
    locality: u8,
    ones: u32,
    stars: u32,
}

impl Implicant {
    fn value_mask(locality: u8) -> u32 {
        debug_assert!(
            locality >= 1 && locality <= MAX_VARIABLES,
            "implicant locality out of range"
        );
        (1u32 << locality) - 1
    }

    /// Minterm implicant: every variable fixed to the corresponding bit of
    /// `point`.
    pub fn minterm(point: u32, locality: u8) -> Self {
        Implicant {
            locality,
            ones: point & Self::value_mask(locality),
            stars: 0,
        }
    }

    /// Product term fixing the variables selected by `fixed_mask` to their
    /// values in `point`, leaving every other position free.
    ///
    /// `fixed_mask` uses the same bit orientation as points (bit `n - 1 - i`
    /// selects variable `i`).
    pub fn restriction(point: u32, fixed_mask: u32, locality: u8) -> Self {
        let mask = Self::value_mask(locality);
        Implicant {
            locality,
            ones: point & fixed_mask & mask,
            stars: !fixed_mask & mask,
        }
    }

    /// Number of variables, free positions included.
    #[inline]
    pub fn locality(&self) -> u8 { self.locality }

    /// Number of positions fixed to 1.
    #[inline]
    pub fn weight(&self) -> u32 { self.ones.count_ones() }

    /// Bit mask of the free (`*`) positions.
    #[inline]
    pub fn star_pattern(&self) -> u32 { self.stars }

    /// Bit mask of the fixed positions.
    #[inline]
    pub fn fixed_mask(&self) -> u32 { !self.stars & Self::value_mask(self.locality) }

    /// Value of variable `pos`, or `None` for a free position.
    pub fn fixed(&self, pos: u8) -> Option<bool> {
        debug_assert!(pos < self.locality);
        let bit = 1u32 << (self.locality - 1 - pos);
        if self.stars & bit != 0 {
            None
        } else {
            Some(self.ones & bit != 0)
        }
    }

    /// Whether the term covers (implies) the point `x`: every fixed position
    /// equals the corresponding bit of `x`.
    #[inline]
    pub fn covers(&self, x: u32) -> bool { (x ^ self.ones) & self.fixed_mask() == 0 }

    /// Combines two implicants differing in a single fixed position into the
    /// term freeing that position.
    ///
    /// Only terms with identical star patterns whose fixed parts are at
    /// Hamming distance one combine; any other pair returns `None`.
    pub fn combine(&self, other: &Self) -> Option<Self> {
        if self.locality != other.locality || self.stars != other.stars {
            return None;
        }
        let diff = self.ones ^ other.ones;
        if diff.count_ones() != 1 {
            return None;
        }
        Some(Implicant {
            locality: self.locality,
            ones: self.ones & other.ones,
            stars: self.stars | diff,
        })
    }

    /// Packed `2n`-bit wire code: the high `n` bits mark positions fixed to
    /// 0, the low `n` bits mark positions fixed to 1; a position clear in
    /// both halves is free.
    pub fn encode(&self) -> u64 {
        let zeros = !self.ones & self.fixed_mask();
        (u64::from(zeros) << self.locality) | u64::from(self.ones)
    }

    /// Inverse of [`Self::encode`].
    pub fn decode(code: u64, locality: u8) -> Result<Self, CoverError> {
        let mask = Self::value_mask(locality);
        if code >> (2 * locality) != 0 {
            return Err(CoverError::OversizedCode(code, locality));
        }
        let zeros = (code >> locality) as u32 & mask;
        let ones = code as u32 & mask;
        if zeros & ones != 0 {
            return Err(CoverError::ContradictoryCode(code));
        }
        Ok(Implicant {
            locality,
            ones,
            stars: !(zeros | ones) & mask,
        })
    }
}

impl Display for Implicant {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for pos in 0..self.locality {
            match self.fixed(pos) {
                None => f.write_str("*")?,
                Some(false) => f.write_str("0")?,
                Some(true) => f.write_str("1")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn imp(s: &str) -> Implicant {
        let locality = s.len() as u8;
        let mut ones = 0u32;
        let mut fixed = 0u32;
        for (pos, c) in s.chars().enumerate() {
            let bit = 1u32 << (s.len() - 1 - pos);
            match c {
                '0' => fixed |= bit,
                '1' => {
                    fixed |= bit;
                    ones |= bit;
                }
                '*' => {}
                _ => panic!("invalid implicant literal"),
            }
        }
        Implicant::restriction(ones, fixed, locality)
    }

    #[test]
    fn display_round_trip() {
        for s in ["000", "101", "1*0", "***", "0*1*"] {
            assert_eq!(imp(s).to_string(), s);
        }
    }

    #[test]
    fn minterm_positions() {
        let m = Implicant::minterm(0b101, 3);
        assert_eq!(m.fixed(0), Some(true));
        assert_eq!(m.fixed(1), Some(false));
        assert_eq!(m.fixed(2), Some(true));
        assert_eq!(m.weight(), 2);
        assert_eq!(m.star_pattern(), 0);
    }

    #[test]
    fn encoding_fixture() {
        // (1, *, 0) over three variables packs to 0b001100 = 12
        let term = imp("1*0");
        assert_eq!(term.encode(), 12);
        assert_eq!(Implicant::decode(12, 3).unwrap(), term);
    }

    #[test]
    fn encode_decode_exhaustive() {
        // All 3^4 product terms over four variables survive the round trip
        for ones in 0u32..16 {
            for stars in 0u32..16 {
                if ones & stars != 0 {
                    continue;
                }
                let term = Implicant::restriction(ones, !stars & 0xf, 4);
                assert_eq!(Implicant::decode(term.encode(), 4).unwrap(), term);
            }
        }
    }

    #[test]
    fn decode_rejects_malformed_codes() {
        assert_eq!(
            Implicant::decode(1 << 6, 3),
            Err(CoverError::OversizedCode(1 << 6, 3))
        );
        // Variable fixed both to 0 and 1
        let bad = (0b100 << 3) | 0b100;
        assert_eq!(Implicant::decode(bad, 3), Err(CoverError::ContradictoryCode(bad)));
    }

    #[test]
    fn coverage() {
        let term = imp("1*0");
        assert!(term.covers(0b100));
        assert!(term.covers(0b110));
        assert!(!term.covers(0b101));
        assert!(!term.covers(0b000));
        assert!(imp("***").covers(0b111));
        assert!(imp("***").covers(0));
    }

    #[test]
    fn combination_rule() {
        // Differ in one fixed position
        assert_eq!(imp("101").combine(&imp("100")), Some(imp("10*")));
        assert_eq!(imp("10*").combine(&imp("11*")), Some(imp("1**")));
        // Hamming distance two
        assert_eq!(imp("101").combine(&imp("110")), None);
        // Star patterns differ
        assert_eq!(imp("10*").combine(&imp("101")), None);
        assert_eq!(imp("1*0").combine(&imp("10*")), None);
    }

    #[test]
    fn restriction_matches_manual_codes() {
        // Receiver 0b011 with variables {0, 2} fixed: 0 * 1
        let term = Implicant::restriction(0b011, 0b101, 3);
        assert_eq!(term.to_string(), "0*1");
        assert_eq!(term.encode(), (0b100 << 3) | 0b001);
    }
}
