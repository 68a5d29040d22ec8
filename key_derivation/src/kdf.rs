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

//! NIST SP800-108 key-derivation function.

use zeroize::Zeroizing;

use crate::{Error, Prf};

/// Iteration variant of the SP800-108 KDF.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum KdfMode {
    /// Counter mode: every PRF invocation is independent.
    Counter,
    /// Feedback mode: each PRF output chains into the next fixed-info block.
    Feedback,
}

/// Layout of the fixed-info block fed into the PRF on every iteration.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum FixedInfoLayout {
    /// `iv ∥ [i] ∥ label ∥ 0x00 ∥ context ∥ [L]₃₂`, the SP800-108 encoding
    /// used by the broadcast-encryption schemes.
    NistDefault,
    /// `[i] ∥ iv ∥ label`, the layout of the NIST CAVP known-answer vectors.
    Cavp,
    /// `iv ∥ label ∥ [i]`, under which the feedback mode reproduces RFC 5869
    /// HKDF expansion.
    Rfc5869,
}

impl FixedInfoLayout {
    fn assemble(
        self,
        counter: u32,
        counter_bits: usize,
        label: &[u8],
        context: &[u8],
        total_bits: usize,
        iv: &[u8],
    ) -> Vec<u8> {
        let counter_bytes = counter.to_be_bytes();
        let counter = &counter_bytes[4 - counter_bits / 8..];
        let mut info = Vec::new();
        match self {
            FixedInfoLayout::NistDefault => {
                info.extend_from_slice(iv);
                info.extend_from_slice(counter);
                info.extend_from_slice(label);
                info.push(0x00);
                info.extend_from_slice(context);
                info.extend_from_slice(&(total_bits as u32).to_be_bytes());
            }
            FixedInfoLayout::Cavp => {
                info.extend_from_slice(counter);
                info.extend_from_slice(iv);
                info.extend_from_slice(label);
            }
            FixedInfoLayout::Rfc5869 => {
                info.extend_from_slice(iv);
                info.extend_from_slice(label);
                info.extend_from_slice(counter);
            }
        }
        info
    }
}

/// SP800-108 key-derivation function over a keyed PRF.
///
/// Supports streamed extraction: [`Sp800108::init`] announces the total
/// output size, [`Sp800108::update`] may then be called repeatedly for
/// partial outputs and [`Sp800108::finalize`] verifies the announced total
/// was drained. Unconsumed PRF output is buffered between updates, so any
/// chunking of the same total produces the same stream.
#[derive(Clone)]
pub struct Sp800108<P: Prf> {
    prf: P,
    mode: KdfMode,
    counter_bits: usize,
    layout: FixedInfoLayout,
    stream: Zeroizing<Vec<u8>>,
    counter: u32,
    label: Vec<u8>,
    context: Vec<u8>,
    chain: Zeroizing<Vec<u8>>,
    total_bits: usize,
    remaining_bits: usize,
    ready: bool,
}

impl<P: Prf> Sp800108<P> {
    /// Creates a KDF over the given PRF.
    ///
    /// The iteration counter is encoded on `counter_bits` bits, which must be
    /// a multiple of 8 between 8 and 32.
    pub fn new(
        prf: P,
        mode: KdfMode,
        counter_bits: usize,
        layout: FixedInfoLayout,
    ) -> Result<Self, Error> {
        if counter_bits == 0 || counter_bits > 32 || counter_bits % 8 != 0 {
            return Err(Error::CounterSize(counter_bits));
        }
        Ok(Sp800108 {
            prf,
            mode,
            counter_bits,
            layout,
            stream: Zeroizing::new(Vec::new()),
            counter: 1,
            label: Vec::new(),
            context: Vec::new(),
            chain: Zeroizing::new(Vec::new()),
            total_bits: 0,
            remaining_bits: 0,
            ready: false,
        })
    }

    /// Installs the key-derivation key into the underlying PRF.
    pub fn set_key(&mut self, key: &[u8]) { self.prf.set_key(key) }

    /// Starts a derivation of `total_bits` bits of output under the
    /// previously installed key.
    ///
    /// `iv` seeds the chaining value in feedback mode and is copied verbatim
    /// into the fixed info in counter mode (normally empty there).
    pub fn init(
        &mut self,
        total_bits: usize,
        label: &[u8],
        context: &[u8],
        iv: &[u8],
    ) -> Result<(), Error> {
        if total_bits % 8 != 0 {
            return Err(Error::FractionalOutput(total_bits));
        }
        let blocks = total_bits / (8 * self.prf.tag_size()) + 1;
        if blocks > 1 << (self.counter_bits - 1) {
            return Err(Error::OutputOverflow(total_bits));
        }
        self.stream.clear();
        self.counter = 1;
        self.label = label.to_vec();
        self.context = context.to_vec();
        *self.chain = iv.to_vec();
        self.total_bits = total_bits;
        self.remaining_bits = total_bits;
        self.ready = true;
        Ok(())
    }

    /// Produces the next `output_bits` bits of the derivation stream.
    pub fn update(&mut self, output_bits: usize) -> Result<Vec<u8>, Error> {
        if !self.ready {
            return Err(Error::NotInitialized);
        }
        if output_bits % 8 != 0 {
            return Err(Error::FractionalOutput(output_bits));
        }
        if self.remaining_bits < output_bits {
            return Err(Error::ExcessDerivation(output_bits, self.remaining_bits));
        }
        self.remaining_bits -= output_bits;

        while self.stream.len() < output_bits / 8 {
            let info = self.layout.assemble(
                self.counter,
                self.counter_bits,
                &self.label,
                &self.context,
                self.total_bits,
                &self.chain,
            );
            self.prf.init()?;
            self.prf.update(&info)?;
            let tag = self.prf.finalize()?;
            if self.mode == KdfMode::Feedback {
                *self.chain = tag.clone();
            }
            self.stream.extend_from_slice(&tag);
            self.counter += 1;
        }

        let output = self.stream[..output_bits / 8].to_vec();
        self.stream.drain(..output_bits / 8);
        Ok(output)
    }

    /// Completes the derivation, verifying that the announced output was
    /// fully drained.
    pub fn finalize(&mut self) -> Result<(), Error> {
        if self.remaining_bits > 0 {
            return Err(Error::PendingOutput(self.remaining_bits));
        }
        self.ready = false;
        Ok(())
    }

    /// Derives `total_bits` bits in a single call, optionally installing
    /// `key` first.
    pub fn one_shot(
        &mut self,
        total_bits: usize,
        label: &[u8],
        context: &[u8],
        iv: &[u8],
        key: Option<&[u8]>,
    ) -> Result<Vec<u8>, Error> {
        if let Some(key) = key {
            self.set_key(key);
        }
        self.init(total_bits, label, context, iv)?;
        let output = self.update(total_bits)?;
        self.finalize()?;
        Ok(output)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::HmacSha256;

    fn cavp_kdf() -> Sp800108<HmacSha256> {
        Sp800108::new(HmacSha256::new(), KdfMode::Counter, 16, FixedInfoLayout::Cavp).unwrap()
    }

    // NIST CAVP vector for KDF SP800-108 in counter mode over HMAC-SHA-256,
    // 16-bit counter, L = 128
    const KEY_128: [u8; 32] = [
        0x74, 0x34, 0x34, 0xc9, 0x30, 0xfe, 0x92, 0x3c, 0x35, 0x0e, 0xc2, 0x02, 0xbe, 0xf2, 0x8b,
        0x76, 0x8c, 0xd6, 0x06, 0x2c, 0xf2, 0x33, 0x32, 0x4e, 0x21, 0xa8, 0x6c, 0x31, 0xf9, 0x40,
        0x65, 0x83,
    ];
    const INFO_128: [u8; 60] = [
        0x9b, 0xdb, 0x8a, 0x45, 0x4b, 0xd5, 0x5a, 0xb3, 0x0c, 0xed, 0x3f, 0xd4, 0x20, 0xfd, 0xe6,
        0xd9, 0x46, 0x25, 0x2c, 0x87, 0x5b, 0xfe, 0x98, 0x6e, 0xd3, 0x49, 0x27, 0xc7, 0xf7, 0xf0,
        0xb1, 0x06, 0xda, 0xb9, 0xcc, 0x85, 0xb4, 0xc7, 0x02, 0x80, 0x49, 0x65, 0xeb, 0x24, 0xc3,
        0x7a, 0xd8, 0x83, 0xa8, 0xf6, 0x95, 0x58, 0x7a, 0x7b, 0x60, 0x94, 0xd3, 0x33, 0x5b, 0xbc,
    ];
    const OUT_128: [u8; 16] = [
        0x19, 0xc8, 0xa5, 0x6d, 0xb1, 0xd2, 0xa9, 0xaf, 0xb7, 0x93, 0xdc, 0x96, 0xfb, 0xde, 0x4c,
        0x31,
    ];

    // Same suite, L = 320
    const KEY_320: [u8; 32] = [
        0x2c, 0x09, 0x40, 0xc8, 0x43, 0xd2, 0xf8, 0x46, 0x63, 0xbb, 0xc1, 0x9f, 0x70, 0xcd, 0x68,
        0xfb, 0x35, 0x1e, 0xd5, 0x15, 0xc2, 0x7a, 0xbf, 0x22, 0x31, 0x76, 0x9d, 0x91, 0xf8, 0xc5,
        0x80, 0x62,
    ];
    const INFO_320: [u8; 60] = [
        0x82, 0x4e, 0x7d, 0x79, 0xb9, 0x9d, 0x28, 0x92, 0xbd, 0xa3, 0xbf, 0xbc, 0x39, 0x66, 0xf6,
        0xd1, 0x90, 0xcb, 0x34, 0x21, 0xc6, 0x2f, 0x3c, 0x89, 0xc1, 0x5a, 0xab, 0xe3, 0x79, 0x41,
        0x5f, 0xaa, 0x9b, 0x05, 0xcb, 0xec, 0x42, 0xb1, 0xb4, 0x1e, 0x35, 0x27, 0x2d, 0xba, 0xed,
        0xb7, 0x2e, 0xee, 0xe3, 0xab, 0x09, 0x37, 0x65, 0xa4, 0xf2, 0x75, 0xd8, 0xbe, 0x2c, 0x75,
    ];
    const OUT_320: [u8; 40] = [
        0xa9, 0x28, 0x99, 0x5c, 0x32, 0x9a, 0xd9, 0x46, 0xad, 0x30, 0x86, 0x59, 0xd1, 0x56, 0x7f,
        0x64, 0xc6, 0x2e, 0x44, 0x16, 0xe3, 0x3f, 0x50, 0x82, 0x64, 0xc1, 0x3f, 0xc9, 0xce, 0xc1,
        0x9e, 0xcf, 0xfd, 0x00, 0xea, 0x88, 0x2a, 0xb5, 0xf8, 0xeb,
    ];

    #[test]
    fn cavp_counter_streamed() {
        let mut kdf = cavp_kdf();
        kdf.set_key(&KEY_128);
        kdf.init(128, &INFO_128, &[], &[]).unwrap();
        let mut output = kdf.update(8).unwrap();
        output.extend(kdf.update(32).unwrap());
        output.extend(kdf.update(128 - 32 - 8).unwrap());
        kdf.finalize().unwrap();
        assert_eq!(output, OUT_128);
    }

    #[test]
    fn cavp_counter_one_shot() {
        let mut kdf = cavp_kdf();
        let output = kdf.one_shot(128, &INFO_128, &[], &[], Some(&KEY_128)).unwrap();
        assert_eq!(output, OUT_128);

        let output = kdf.one_shot(320, &INFO_320, &[], &[], Some(&KEY_320)).unwrap();
        assert_eq!(output, OUT_320);
    }

    #[test]
    fn output_budget_is_enforced() {
        let mut kdf = cavp_kdf();
        kdf.set_key(&KEY_128);
        kdf.init(128, &[], &[], &[]).unwrap();
        assert_eq!(kdf.update(256), Err(Error::ExcessDerivation(256, 128)));
        kdf.update(64).unwrap();
        assert_eq!(kdf.finalize(), Err(Error::PendingOutput(64)));
    }

    #[test]
    fn parameter_checks() {
        assert!(matches!(
            Sp800108::new(HmacSha256::new(), KdfMode::Counter, 12, FixedInfoLayout::Cavp),
            Err(Error::CounterSize(12))
        ));

        let mut kdf =
            Sp800108::new(HmacSha256::new(), KdfMode::Counter, 8, FixedInfoLayout::Cavp).unwrap();
        kdf.set_key(&KEY_128);
        assert_eq!(kdf.init(7, &[], &[], &[]), Err(Error::FractionalOutput(7)));
        // An 8-bit counter caps the derivation at 128 blocks
        assert_eq!(kdf.init(8 * 32 * 128, &[], &[], &[]), Err(Error::OutputOverflow(32768)));
        assert_eq!(kdf.update(8), Err(Error::NotInitialized));
    }
}
