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

// Coding conventions
#![deny(
    unsafe_code,
    dead_code,
    missing_docs,
    unused_variables,
    unused_mut,
    unused_imports,
    non_upper_case_globals,
    non_camel_case_types,
    non_snake_case
)]

//! Symmetric primitive interfaces and key derivation.
//!
//! Broadcast-encryption schemes consume their cryptography through four
//! capability traits: [`BlockCipher`], [`ConfidentialityMode`], [`Prf`] and
//! [`Kdm`]. The schemes are primitive-agnostic; this crate also ships the
//! reference instantiations reproducing the library test vectors: AES-256
//! ([`Aes256`]), the length-preserving CTR mode ([`CtrMode`]), HMAC-SHA-256
//! ([`HmacSha256`]), the NIST SP800-108 key-derivation function in counter
//! and feedback modes ([`Sp800108`]) and the SP800-56C two-step
//! extract/expand mechanism ([`TwoStepKdm`]).

#[macro_use]
extern crate amplify;

pub mod block;
pub mod kdf;
pub mod kdm;
pub mod mode;
pub mod prf;

pub use block::{Aes256, BlockCipher};
pub use kdf::{FixedInfoLayout, KdfMode, Sp800108};
pub use kdm::{Kdm, TwoStepKdm};
pub use mode::{Aes256Ctr, ConfidentialityMode, CtrMode};
pub use prf::{HmacSha256, Prf};

/// Failures of the symmetric primitives and key-derivation machinery.
#[derive(Clone, PartialEq, Eq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum Error {
    /// key of {0} bytes does not match the primitive key size of {1} bytes
    KeySize(usize, usize),

    /// IV of {0} bytes does not match the cipher block size of {1} bytes
    IvSize(usize, usize),

    /// data block of {0} bytes does not match the cipher block size of {1}
    /// bytes
    BlockSize(usize, usize),

    /// operation requires a key which was not set
    NoKey,

    /// streaming operation used without initialization
    NotInitialized,

    /// `expand` was invoked before `extract` had seeded the derivation key
    NoDerivationKey,

    /// output of {0} bits is not a whole number of bytes
    FractionalOutput(usize),

    /// output of {0} bits does not fit the KDF counter capacity
    OutputOverflow(usize),

    /// requested {0} bits exceeding the {1} bits left of the announced output
    ExcessDerivation(usize, usize),

    /// derivation finalized with {0} bits of the announced output still
    /// pending
    PendingOutput(usize),

    /// KDF counter size of {0} bits is not supported
    CounterSize(usize),
}
