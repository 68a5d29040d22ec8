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

//! Boolean-function covers for sum-product broadcast encryption.
//!
//! The set of authorized receivers is the on-set of a Boolean function over
//! `n = log2(N)` variables: the truth table holds 1 for authorized receivers
//! and 0 for revoked ones. The function is rewritten as a sum of product
//! terms ([`Implicant`]s) in three steps: prime-implicant enumeration with
//! the Quine–McCluskey procedure ([`prime_implicants`]), incidence-chart
//! construction ([`prime_implicant_chart`]) and set-cover selection
//! ([`select_cover`]). Each product term of the final cover maps to one
//! key-encryption key at the scheme layer.

mod implicant;
mod qmc;

pub use implicant::Implicant;
pub use qmc::{prime_implicant_chart, prime_implicants, select_cover, TruthValue};

/// Most variables a Boolean cover may range over.
///
/// Bounded by the per-receiver key material of the sum-product scheme, which
/// grows as `2^n` entries.
pub const MAX_VARIABLES: u8 = 16;

/// Structural failures of the Boolean cover machinery.
#[derive(Clone, PartialEq, Eq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum CoverError {
    /// truth table of length {0} is not a power of two within the supported
    /// range
    InvalidTableLength(usize),

    /// authorized point {0} is not covered by any prime implicant
    UncoveredPoint(usize),

    /// implicant {0} covers the revoked point {1}
    SpuriousCover(Implicant, usize),

    /// implicant code {0:#x} does not fit {1} variables
    OversizedCode(u64, u8),

    /// implicant code {0:#x} fixes some variable both to 0 and to 1
    ContradictoryCode(u64),
}
