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

//! SP800-56C two-step key-derivation mechanism.

use zeroize::Zeroizing;

use crate::{Error, Prf, Sp800108};

/// Key-derivation mechanism in two steps.
///
/// [`Kdm::extract`] condenses a shared secret and a salt into an internal
/// key-derivation key; [`Kdm::expand`] then produces any number of
/// independent pseudo-random outputs under that key, each selected by a
/// label and an optional context. Expansion before extraction is a sequence
/// error; successive expansions under one extraction are independent and do
/// not disturb the derivation key.
pub trait Kdm {
    /// Seeds the internal key-derivation key. Produces no output.
    fn extract(&mut self, shared_secret: &[u8], salt: &[u8]) -> Result<(), Error>;

    /// Derives `output_bits / 8` bytes, deterministic in the derivation key,
    /// `label` and `context`.
    fn expand(&mut self, output_bits: usize, label: &[u8], context: &[u8])
        -> Result<Vec<u8>, Error>;
}

/// Two-step KDM of NIST SP800-56C Rev 2.
///
/// Extraction runs the PRF keyed by the salt over the shared secret; an
/// empty salt is replaced by an all-zero block of the PRF block size.
/// Expansion runs an SP800-108 KDF under the extracted key. The caller must
/// pair consistent primitives (an HMAC extraction with a KDF over the same
/// HMAC).
#[derive(Clone)]
pub struct TwoStepKdm<P: Prf> {
    extractor: P,
    expander: Sp800108<P>,
    extracted: bool,
}

impl<P: Prf> TwoStepKdm<P> {
    /// Combines an extraction PRF with an expansion KDF.
    pub fn new(extractor: P, expander: Sp800108<P>) -> Self {
        TwoStepKdm { extractor, expander, extracted: false }
    }
}

impl<P: Prf> Kdm for TwoStepKdm<P> {
    fn extract(&mut self, shared_secret: &[u8], salt: &[u8]) -> Result<(), Error> {
        let default_salt;
        let salt = if salt.is_empty() {
            default_salt = vec![0u8; self.extractor.block_size()];
            &default_salt
        } else {
            salt
        };
        let derivation_key = Zeroizing::new(self.extractor.one_shot(shared_secret, salt)?);
        self.expander.set_key(&derivation_key);
        self.extracted = true;
        Ok(())
    }

    fn expand(
        &mut self,
        output_bits: usize,
        label: &[u8],
        context: &[u8],
    ) -> Result<Vec<u8>, Error> {
        if !self.extracted {
            return Err(Error::NoDerivationKey);
        }
        self.expander.one_shot(output_bits, label, context, &[], None)
    }
}
