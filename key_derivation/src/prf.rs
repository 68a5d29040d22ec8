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

//! Keyed pseudo-random function seam used by the key-derivation machinery.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::Error;

/// Keyed PRF: a message-integrity primitive (HMAC or a blockcipher MAC)
/// reused as the pseudo-random function of KDF extraction and expansion.
pub trait Prf {
    /// Output (tag) size in bytes.
    fn tag_size(&self) -> usize;

    /// Input block size in bytes; also the length of the all-zero default
    /// extraction salt.
    fn block_size(&self) -> usize;

    /// Installs the PRF key, replacing any previous one.
    fn set_key(&mut self, key: &[u8]);

    /// Starts computation of a new tag under the installed key.
    fn init(&mut self) -> Result<(), Error>;

    /// Feeds data into the running computation.
    fn update(&mut self, data: &[u8]) -> Result<(), Error>;

    /// Completes the computation and returns the tag.
    fn finalize(&mut self) -> Result<Vec<u8>, Error>;

    /// Computes a tag over `data` under `key` in a single call.
    fn one_shot(&mut self, data: &[u8], key: &[u8]) -> Result<Vec<u8>, Error> {
        self.set_key(key);
        self.init()?;
        self.update(data)?;
        self.finalize()
    }
}

/// HMAC over SHA-256 (RFC 2104 / FIPS 198-1).
#[derive(Clone, Default)]
pub struct HmacSha256 {
    key: Option<Zeroizing<Vec<u8>>>,
    engine: Option<Hmac<Sha256>>,
}

impl HmacSha256 {
    /// Creates a PRF instance with no key installed.
    pub fn new() -> Self { Self::default() }
}

impl Prf for HmacSha256 {
    fn tag_size(&self) -> usize { 32 }

    fn block_size(&self) -> usize { 64 }

    fn set_key(&mut self, key: &[u8]) { self.key = Some(Zeroizing::new(key.to_vec())); }

    fn init(&mut self) -> Result<(), Error> {
        let key = self.key.as_ref().ok_or(Error::NoKey)?;
        self.engine =
            Some(Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts keys of any size"));
        Ok(())
    }

    fn update(&mut self, data: &[u8]) -> Result<(), Error> {
        self.engine.as_mut().ok_or(Error::NotInitialized)?.update(data);
        Ok(())
    }

    fn finalize(&mut self) -> Result<Vec<u8>, Error> {
        let engine = self.engine.take().ok_or(Error::NotInitialized)?;
        Ok(engine.finalize().into_bytes().to_vec())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // RFC 4231 test case 2 ("what do ya want for nothing?")
    const KEY: &[u8] = b"Jefe";
    const DATA: &[u8] = b"what do ya want for nothing?";
    const TAG: [u8; 32] = [
        0x5b, 0xdc, 0xc1, 0x46, 0xbf, 0x60, 0x75, 0x4e, 0x6a, 0x04, 0x24, 0x26, 0x08, 0x95, 0x75,
        0xc7, 0x5a, 0x00, 0x3f, 0x08, 0x9d, 0x27, 0x39, 0x83, 0x9d, 0xec, 0x58, 0xb9, 0x64, 0xec,
        0x38, 0x43,
    ];

    #[test]
    fn rfc4231_vector() {
        let mut prf = HmacSha256::new();
        assert_eq!(prf.one_shot(DATA, KEY).unwrap(), TAG);
    }

    #[test]
    fn streaming_matches_one_shot() {
        let mut prf = HmacSha256::new();
        prf.set_key(KEY);
        prf.init().unwrap();
        prf.update(&DATA[..10]).unwrap();
        prf.update(&DATA[10..]).unwrap();
        assert_eq!(prf.finalize().unwrap(), TAG);
    }

    #[test]
    fn sequencing_errors() {
        let mut prf = HmacSha256::new();
        assert_eq!(prf.init(), Err(Error::NoKey));
        assert_eq!(prf.update(b"data"), Err(Error::NotInitialized));
        assert_eq!(prf.finalize(), Err(Error::NotInitialized));
    }
}
