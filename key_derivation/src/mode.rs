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

//! Confidentiality-mode capability trait and the CTR mode.

use zeroize::Zeroizing;

use crate::{Aes256, BlockCipher, Error};

/// Stream-oriented confidentiality mode with an explicit IV.
///
/// The streaming triplet `init`/`update`/`final` keeps state inside the mode
/// object; the keyed one-shot helpers are the only re-entrant entry points
/// and reset that state on every call. Counter-style modes are
/// length-preserving: every update returns exactly as many bytes as it was
/// given.
pub trait ConfidentialityMode {
    /// Size of the mode key in bytes.
    fn key_size(&self) -> usize;

    /// Size of the IV in bytes.
    fn iv_size(&self) -> usize;

    /// Installs the encryption/decryption key.
    fn set_key(&mut self, key: &[u8]) -> Result<(), Error>;

    /// Starts an encryption stream under the installed key.
    fn encrypt_init(&mut self, iv: &[u8]) -> Result<(), Error>;

    /// Encrypts the next chunk of plaintext.
    fn encrypt_update(&mut self, data: &[u8]) -> Result<Vec<u8>, Error>;

    /// Finalizes the encryption stream, returning any retained tail bytes.
    fn encrypt_final(&mut self) -> Result<Vec<u8>, Error>;

    /// Starts a decryption stream under the installed key.
    fn decrypt_init(&mut self, iv: &[u8]) -> Result<(), Error>;

    /// Decrypts the next chunk of ciphertext.
    fn decrypt_update(&mut self, data: &[u8]) -> Result<Vec<u8>, Error>;

    /// Finalizes the decryption stream, returning any retained tail bytes.
    fn decrypt_final(&mut self) -> Result<Vec<u8>, Error>;

    /// Encrypts `data` in a single call under the provided key.
    fn encrypt_one_shot(&mut self, iv: &[u8], data: &[u8], key: &[u8]) -> Result<Vec<u8>, Error> {
        self.set_key(key)?;
        self.encrypt_init(iv)?;
        let mut ciphertext = self.encrypt_update(data)?;
        ciphertext.extend(self.encrypt_final()?);
        Ok(ciphertext)
    }

    /// Decrypts `data` in a single call under the provided key.
    fn decrypt_one_shot(&mut self, iv: &[u8], data: &[u8], key: &[u8]) -> Result<Vec<u8>, Error> {
        self.set_key(key)?;
        self.decrypt_init(iv)?;
        let mut plaintext = self.decrypt_update(data)?;
        plaintext.extend(self.decrypt_final()?);
        Ok(plaintext)
    }
}

/// CTR confidentiality mode over an arbitrary block cipher (NIST SP
/// 800-38A).
///
/// The counter block starts at the IV and is incremented as a single
/// big-endian integer. Unconsumed keystream is retained between updates, so
/// chunked and one-shot encryptions of the same data agree byte for byte.
#[derive(Clone)]
pub struct CtrMode<C: BlockCipher> {
    cipher: C,
    counter: Zeroizing<Vec<u8>>,
    keystream: Zeroizing<Vec<u8>>,
    live: bool,
}

/// CTR mode over AES-256, the session and payload mode of the broadcast
/// encryption test vectors.
pub type Aes256Ctr = CtrMode<Aes256>;

impl Default for Aes256Ctr {
    fn default() -> Self { CtrMode::with(Aes256::new()) }
}

impl Aes256Ctr {
    /// Creates an AES-256-CTR mode instance with no key installed.
    pub fn new() -> Self { Self::default() }
}

impl<C: BlockCipher> CtrMode<C> {
    /// Wraps a block cipher into the CTR mode.
    pub fn with(cipher: C) -> Self {
        CtrMode {
            cipher,
            counter: Zeroizing::new(Vec::new()),
            keystream: Zeroizing::new(Vec::new()),
            live: false,
        }
    }

    fn init(&mut self, iv: &[u8]) -> Result<(), Error> {
        if !self.cipher.is_keyed() {
            return Err(Error::NoKey);
        }
        if iv.len() != self.cipher.block_size() {
            return Err(Error::IvSize(iv.len(), self.cipher.block_size()));
        }
        *self.counter = iv.to_vec();
        self.keystream.clear();
        self.live = true;
        Ok(())
    }

    fn apply_keystream(&mut self, data: &[u8]) -> Result<Vec<u8>, Error> {
        if !self.live {
            return Err(Error::NotInitialized);
        }
        let mut output = data.to_vec();
        let mut offset = 0;
        while offset < output.len() {
            let take = self.keystream.len().min(output.len() - offset);
            for (byte, pad) in output[offset..offset + take].iter_mut().zip(self.keystream.iter())
            {
                *byte ^= pad;
            }
            offset += take;

            if take >= self.keystream.len() {
                let mut block = self.counter.clone();
                self.cipher.encrypt_block(&mut block)?;
                *self.keystream = block.to_vec();
                increment(&mut self.counter);
            } else {
                self.keystream.drain(..take);
            }
        }
        Ok(output)
    }
}

/// Big-endian +1 increment over the whole counter block, wrapping around.
fn increment(counter: &mut [u8]) {
    for byte in counter.iter_mut().rev() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            break;
        }
    }
}

impl<C: BlockCipher> ConfidentialityMode for CtrMode<C> {
    fn key_size(&self) -> usize { self.cipher.key_size() }

    fn iv_size(&self) -> usize { self.cipher.block_size() }

    fn set_key(&mut self, key: &[u8]) -> Result<(), Error> { self.cipher.set_key(key) }

    fn encrypt_init(&mut self, iv: &[u8]) -> Result<(), Error> { self.init(iv) }

    fn encrypt_update(&mut self, data: &[u8]) -> Result<Vec<u8>, Error> {
        self.apply_keystream(data)
    }

    fn encrypt_final(&mut self) -> Result<Vec<u8>, Error> {
        self.live = false;
        Ok(Vec::new())
    }

    // Decryption in counter mode is the same keystream XOR
    fn decrypt_init(&mut self, iv: &[u8]) -> Result<(), Error> { self.init(iv) }

    fn decrypt_update(&mut self, data: &[u8]) -> Result<Vec<u8>, Error> {
        self.apply_keystream(data)
    }

    fn decrypt_final(&mut self) -> Result<Vec<u8>, Error> {
        self.live = false;
        Ok(Vec::new())
    }
}
