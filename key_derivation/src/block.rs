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

//! Block-cipher capability trait and its AES-256 instantiation.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};

use crate::Error;

/// Raw block cipher operating on single blocks.
///
/// Confidentiality modes are generic over this trait; the key is installed
/// once with [`BlockCipher::set_key`] and both block operations then work on
/// buffers of exactly [`BlockCipher::block_size`] bytes in place.
pub trait BlockCipher {
    /// Cipher block size in bytes.
    fn block_size(&self) -> usize;

    /// Cipher key size in bytes.
    fn key_size(&self) -> usize;

    /// Installs the cipher key, replacing any previous one.
    fn set_key(&mut self, key: &[u8]) -> Result<(), Error>;

    /// Whether a key was installed.
    fn is_keyed(&self) -> bool;

    /// Encrypts a single block in place.
    fn encrypt_block(&self, block: &mut [u8]) -> Result<(), Error>;

    /// Decrypts a single block in place.
    fn decrypt_block(&self, block: &mut [u8]) -> Result<(), Error>;
}

/// AES with 256-bit keys.
#[derive(Clone, Default)]
pub struct Aes256 {
    cipher: Option<aes::Aes256>,
}

impl Aes256 {
    /// Creates a cipher instance with no key installed.
    pub fn new() -> Self { Self::default() }

    fn cipher(&self) -> Result<&aes::Aes256, Error> { self.cipher.as_ref().ok_or(Error::NoKey) }

    fn check_block(&self, block: &[u8]) -> Result<(), Error> {
        if block.len() != self.block_size() {
            return Err(Error::BlockSize(block.len(), self.block_size()));
        }
        Ok(())
    }
}

impl BlockCipher for Aes256 {
    fn block_size(&self) -> usize { 16 }

    fn key_size(&self) -> usize { 32 }

    fn set_key(&mut self, key: &[u8]) -> Result<(), Error> {
        let cipher = aes::Aes256::new_from_slice(key)
            .map_err(|_| Error::KeySize(key.len(), self.key_size()))?;
        self.cipher = Some(cipher);
        Ok(())
    }

    fn is_keyed(&self) -> bool { self.cipher.is_some() }

    fn encrypt_block(&self, block: &mut [u8]) -> Result<(), Error> {
        self.check_block(block)?;
        self.cipher()?.encrypt_block(GenericArray::from_mut_slice(block));
        Ok(())
    }

    fn decrypt_block(&self, block: &mut [u8]) -> Result<(), Error> {
        self.check_block(block)?;
        self.cipher()?.decrypt_block(GenericArray::from_mut_slice(block));
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // NIST FIPS-197 appendix C.3 known-answer vector
    const KEY: [u8; 32] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
        0x0f, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x1b, 0x1c, 0x1d,
        0x1e, 0x1f,
    ];
    const PLAINTEXT: [u8; 16] = [
        0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee,
        0xff,
    ];
    const CIPHERTEXT: [u8; 16] = [
        0x8e, 0xa2, 0xb7, 0xca, 0x51, 0x67, 0x45, 0xbf, 0xea, 0xfc, 0x49, 0x90, 0x4b, 0x49, 0x60,
        0x89,
    ];

    #[test]
    fn fips197_round_trip() {
        let mut aes = Aes256::new();
        aes.set_key(&KEY).unwrap();

        let mut block = PLAINTEXT;
        aes.encrypt_block(&mut block).unwrap();
        assert_eq!(block, CIPHERTEXT);

        aes.decrypt_block(&mut block).unwrap();
        assert_eq!(block, PLAINTEXT);
    }

    #[test]
    fn key_and_block_size_checks() {
        let mut aes = Aes256::new();
        assert_eq!(aes.set_key(&[0u8; 16]), Err(Error::KeySize(16, 32)));
        assert_eq!(aes.encrypt_block(&mut [0u8; 16]), Err(Error::NoKey));

        aes.set_key(&KEY).unwrap();
        assert_eq!(aes.encrypt_block(&mut [0u8; 8]), Err(Error::BlockSize(8, 16)));
    }
}
