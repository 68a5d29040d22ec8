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

//! Sum-product broadcast encryption.
//!
//! The scheme from "Broadcast encryption using sum-product decomposition of
//! Boolean functions": the authorized set is the on-set of a Boolean
//! function over `n = log2(N)` variables, rewritten per broadcast as a small
//! sum of product terms (a prime-implicant cover). Every variable position
//! and value has a public label input; the key of a product term is the KDM
//! expansion of the concatenated labels of its fixed positions. A receiver
//! holds one derived key per subset of positions fixed to its own bits
//! (`2^n` keys in total) and can thus open any product term covering it.

use key_derivation::{ConfidentialityMode, Kdm};
use subset_cover::bool_func::{
    prime_implicant_chart, prime_implicants, select_cover, Implicant, TruthValue, MAX_VARIABLES,
};
use zeroize::Zeroizing;

use crate::{Broadcast, BroadcastMaster, BroadcastMember, Error, SchemeParams};

const PRF_SALT: &[u8] = b"Derivation of K_PRF";

/// MSB-first bit packer for the broadcast header.
struct BitWriter {
    bytes: Vec<u8>,
    bit_len: usize,
}

impl BitWriter {
    fn new() -> Self { BitWriter { bytes: Vec::new(), bit_len: 0 } }

    fn push(&mut self, value: u64, width: usize) {
        for shift in (0..width).rev() {
            if self.bit_len % 8 == 0 {
                self.bytes.push(0);
            }
            if value >> shift & 1 != 0 {
                let last = self.bytes.len() - 1;
                self.bytes[last] |= 1 << (7 - self.bit_len % 8);
            }
            self.bit_len += 1;
        }
    }

    /// Packed bytes, the tail padded with zero bits.
    fn into_bytes(self) -> Vec<u8> { self.bytes }
}

/// MSB-first bit reader over a broadcast header.
struct BitReader<'data> {
    bytes: &'data [u8],
    position: usize,
}

impl<'data> BitReader<'data> {
    fn new(bytes: &'data [u8]) -> Self { BitReader { bytes, position: 0 } }

    fn read(&mut self, width: usize) -> Result<u64, Error> {
        if self.position + width > self.bytes.len() * 8 {
            return Err(Error::MalformedHeader(self.bytes.len()));
        }
        let mut value = 0u64;
        for _ in 0..width {
            let bit = self.bytes[self.position / 8] >> (7 - self.position % 8) & 1;
            value = value << 1 | u64::from(bit);
            self.position += 1;
        }
        Ok(value)
    }
}

fn check_depth(params: SchemeParams) -> Result<SchemeParams, Error> {
    if params.depth() > MAX_VARIABLES as usize {
        return Err(Error::InvalidUserCount(params.n_users()));
    }
    Ok(params)
}

/// Concatenation of the bit-position labels fixed by a product term, the KDM
/// expansion label of the term key.
fn term_label(labels: &[(Vec<u8>, Vec<u8>)], term: &Implicant) -> Vec<u8> {
    let mut concat = Vec::new();
    for pos in 0..term.locality() {
        if let Some(bit) = term.fixed(pos) {
            let (zero, one) = &labels[pos as usize];
            concat.extend_from_slice(if bit { one } else { zero });
        }
    }
    concat
}

/// Master of a sum-product broadcast system.
///
/// Owns the `2n` per-bit label inputs created by [`BroadcastMaster::setup`];
/// the actual secret is the derivation key the KDM extracts from the master
/// secret.
pub struct SpbeMaster<K: Kdm, S: ConfidentialityMode, P: ConfidentialityMode> {
    params: SchemeParams,
    kdm: K,
    session_mode: S,
    payload_mode: P,
    master_key: Option<Zeroizing<Vec<u8>>>,
    labels: Vec<(Vec<u8>, Vec<u8>)>,
}

impl<K: Kdm, S: ConfidentialityMode, P: ConfidentialityMode> SpbeMaster<K, S, P> {
    /// Creates the master of a system of `n_users` receivers.
    pub fn new(n_users: usize, session_mode: S, payload_mode: P, kdm: K) -> Result<Self, Error> {
        let params = check_depth(SchemeParams::new(n_users, session_mode.key_size())?)?;
        Ok(SpbeMaster {
            params,
            kdm,
            session_mode,
            payload_mode,
            master_key: None,
            labels: Vec::new(),
        })
    }

    /// System parameters shared with the members.
    pub fn params(&self) -> SchemeParams { self.params }
}

impl<K: Kdm, S: ConfidentialityMode, P: ConfidentialityMode> BroadcastMaster
    for SpbeMaster<K, S, P>
{
    fn set_master_key(&mut self, key: &[u8]) -> Result<(), Error> {
        self.master_key = Some(Zeroizing::new(key.to_vec()));
        Ok(())
    }

    fn setup(&mut self) -> Result<(), Error> {
        let master_key = self.master_key.as_ref().ok_or(Error::NoMasterKey)?;
        self.kdm.extract(master_key, PRF_SALT)?;
        self.labels = (0..self.params.depth() as u64)
            .map(|position| {
                let mut zero = position.to_be_bytes().to_vec();
                let mut one = zero.clone();
                zero.push(0x00);
                one.push(0x01);
                (zero, one)
            })
            .collect();
        Ok(())
    }

    fn issue_user_key(&mut self, user: usize) -> Result<Vec<u8>, Error> {
        if self.labels.is_empty() {
            return Err(Error::NotSetUp);
        }
        self.params.check_user(user)?;
        let key_bits = self.params.key_size() * 8;
        let depth = self.params.depth() as u8;

        // One derived key per subset of bit positions fixed to the bits of
        // the receiver identifier
        let mut material = Vec::with_capacity(self.params.n_users() * self.params.key_size());
        for mask in 0..self.params.n_users() as u32 {
            let term = Implicant::restriction(user as u32, mask, depth);
            let label = term_label(&self.labels, &term);
            material.extend(self.kdm.expand(key_bits, &label, &[])?);
        }
        Ok(material)
    }

    fn encrypt(
        &mut self,
        plaintext: &[u8],
        revoked: &[usize],
        session_iv: &[u8],
        ciphertext_iv: Option<&[u8]>,
        session_key: &[u8],
    ) -> Result<Broadcast, Error> {
        if self.labels.is_empty() {
            return Err(Error::NotSetUp);
        }
        for &user in revoked {
            self.params.check_user(user)?;
        }
        let key_bits = self.params.key_size() * 8;
        let depth = self.params.depth();

        let mut table = vec![TruthValue::One; self.params.n_users()];
        for &user in revoked {
            table[user] = TruthValue::Zero;
        }
        let primes = prime_implicants(&table)?;
        let chart = prime_implicant_chart(&primes, &table)?;
        let cover = select_cover(primes.len(), &chart);

        let mut header = BitWriter::new();
        header.push(cover.len() as u64, depth);

        let mut ciphertext = Vec::new();
        for &index in &cover {
            let term = primes[index];
            header.push(term.encode(), 2 * depth);

            let term_key = self.kdm.expand(key_bits, &term_label(&self.labels, &term), &[])?;
            ciphertext
                .extend(self.session_mode.encrypt_one_shot(session_iv, session_key, &term_key)?);
        }

        let payload_iv = ciphertext_iv.unwrap_or(session_iv);
        ciphertext.extend(self.payload_mode.encrypt_one_shot(payload_iv, plaintext, session_key)?);
        Ok(Broadcast { ciphertext, header: header.into_bytes() })
    }
}

/// Receiver of a sum-product broadcast system.
///
/// Holds `2^n` pairs of a product-term wire code and the derived key opening
/// that term. Unlike the master, a receiver needs no KDM: all its keys come
/// pre-derived in the issued material.
pub struct SpbeMember<S: ConfidentialityMode, P: ConfidentialityMode> {
    params: SchemeParams,
    user: usize,
    session_mode: S,
    payload_mode: P,
    term_keys: Vec<(u64, Zeroizing<Vec<u8>>)>,
}

impl<S: ConfidentialityMode, P: ConfidentialityMode> SpbeMember<S, P> {
    /// Creates receiver `user` of a system of `n_users` receivers.
    pub fn new(
        user: usize,
        n_users: usize,
        session_mode: S,
        payload_mode: P,
    ) -> Result<Self, Error> {
        let params = check_depth(SchemeParams::new(n_users, session_mode.key_size())?)?;
        params.check_user(user)?;
        Ok(SpbeMember {
            params,
            user,
            session_mode,
            payload_mode,
            term_keys: Vec::new(),
        })
    }

    /// Identifier of this receiver.
    pub fn user(&self) -> usize { self.user }
}

impl<S: ConfidentialityMode, P: ConfidentialityMode> BroadcastMember for SpbeMember<S, P> {
    fn set_user_key(&mut self, key_material: &[u8]) -> Result<(), Error> {
        let key_size = self.params.key_size();
        let expected = self.params.n_users() * key_size;
        if key_material.len() != expected {
            return Err(Error::KeyMaterialSize(key_material.len(), expected));
        }
        let depth = self.params.depth() as u8;

        self.term_keys = key_material
            .chunks(key_size)
            .enumerate()
            .map(|(mask, key)| {
                let term = Implicant::restriction(self.user as u32, mask as u32, depth);
                (term.encode(), Zeroizing::new(key.to_vec()))
            })
            .collect();
        Ok(())
    }

    fn decrypt(
        &mut self,
        ciphertext: &[u8],
        header: &[u8],
        session_iv: &[u8],
        ciphertext_iv: Option<&[u8]>,
    ) -> Result<Option<Vec<u8>>, Error> {
        if self.term_keys.is_empty() {
            return Err(Error::NoKeyMaterial);
        }
        let key_size = self.params.key_size();
        let depth = self.params.depth();

        let mut reader = BitReader::new(header);
        let n_terms = reader.read(depth)? as usize;
        let mut terms = Vec::with_capacity(n_terms);
        for _ in 0..n_terms {
            let code = reader.read(2 * depth)?;
            terms.push(Implicant::decode(code, depth as u8)?);
        }
        if ciphertext.len() < n_terms * key_size {
            return Err(Error::TruncatedCiphertext(ciphertext.len(), n_terms * key_size));
        }

        for (position, term) in terms.iter().enumerate() {
            if !term.covers(self.user as u32) {
                continue;
            }
            // A receiver covered by the term always holds the key derived
            // for exactly this set of fixed positions
            let Some((_, term_key)) =
                self.term_keys.iter().find(|(code, _)| *code == term.encode())
            else {
                return Err(Error::ForeignKeyMaterial);
            };
            let term_key = term_key.to_vec();

            let encrypted = &ciphertext[position * key_size..(position + 1) * key_size];
            let session_key = self.session_mode.decrypt_one_shot(session_iv, encrypted, &term_key)?;

            let payload_iv = ciphertext_iv.unwrap_or(session_iv);
            let payload = self.payload_mode.decrypt_one_shot(
                payload_iv,
                &ciphertext[n_terms * key_size..],
                &session_key,
            )?;
            return Ok(Some(payload));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod test {
    use key_derivation::{
        Aes256Ctr, FixedInfoLayout, HmacSha256, KdfMode, Sp800108, TwoStepKdm,
    };

    use super::*;

    type Master = SpbeMaster<TwoStepKdm<HmacSha256>, Aes256Ctr, Aes256Ctr>;
    type Member = SpbeMember<Aes256Ctr, Aes256Ctr>;

    const MASTER_KEY: &[u8] = b"masterKey.......";
    const SESSION_KEY: &[u8] = b"AES256_sessionkey...............";
    const SESSION_IV: &[u8] = b"ThisIsAnIV......";

    fn kdm() -> TwoStepKdm<HmacSha256> {
        let kdf = Sp800108::new(
            HmacSha256::new(),
            KdfMode::Counter,
            16,
            FixedInfoLayout::NistDefault,
        )
        .unwrap();
        TwoStepKdm::new(HmacSha256::new(), kdf)
    }

    fn master(n_users: usize) -> Master {
        let mut master =
            SpbeMaster::new(n_users, Aes256Ctr::new(), Aes256Ctr::new(), kdm()).unwrap();
        master.set_master_key(MASTER_KEY).unwrap();
        master.setup().unwrap();
        master
    }

    fn member(master: &mut Master, user: usize) -> Member {
        let mut member =
            SpbeMember::new(user, master.params().n_users(), Aes256Ctr::new(), Aes256Ctr::new())
                .unwrap();
        member.set_user_key(&master.issue_user_key(user).unwrap()).unwrap();
        member
    }

    #[test]
    fn bit_packing_round_trip() {
        let mut writer = BitWriter::new();
        writer.push(0b10, 2);
        writer.push(0b1000, 4);
        writer.push(0b0100, 4);
        let bytes = writer.into_bytes();
        assert_eq!(bytes, vec![0xa1, 0x00]);

        let mut reader = BitReader::new(&bytes);
        assert_eq!(reader.read(2).unwrap(), 0b10);
        assert_eq!(reader.read(4).unwrap(), 0b1000);
        assert_eq!(reader.read(4).unwrap(), 0b0100);
        assert!(matches!(reader.read(7), Err(Error::MalformedHeader(2))));
    }

    #[test]
    fn header_wire_fixture() {
        // N = 4, revoked {3}: the cover is {0*, *0}, packed as two bits of
        // count followed by two 4-bit term codes and zero padding
        let mut master = master(4);
        let broadcast =
            master.encrypt(b"message", &[3], SESSION_IV, None, SESSION_KEY).unwrap();
        assert_eq!(broadcast.header, vec![0xa1, 0x00]);
        assert_eq!(broadcast.ciphertext.len(), 2 * 32 + b"message".len());
    }

    #[test]
    fn issued_material_size() {
        let mut master = master(8);
        assert_eq!(master.issue_user_key(6).unwrap().len(), 8 * 32);
    }

    #[test]
    fn empty_revocation_single_free_term() {
        let mut master = master(8);
        let broadcast =
            master.encrypt(b"message", &[], SESSION_IV, None, SESSION_KEY).unwrap();
        // Count 1 plus one all-star term: (1 + 2) * 3 bits in two bytes
        assert_eq!(broadcast.header.len(), 2);
        assert_eq!(broadcast.ciphertext.len(), 32 + b"message".len());

        for user in 0..8 {
            let mut member = member(&mut master, user);
            let plaintext = member
                .decrypt(&broadcast.ciphertext, &broadcast.header, SESSION_IV, None)
                .unwrap();
            assert_eq!(plaintext.as_deref(), Some(&b"message"[..]));
        }
    }

    #[test]
    fn revocation_splits_the_population() {
        let mut master = master(16);
        let revoked = [2usize, 3, 9, 14];
        let broadcast =
            master.encrypt(b"message", &revoked, SESSION_IV, None, SESSION_KEY).unwrap();

        for user in 0..16 {
            let mut member = member(&mut master, user);
            let plaintext = member
                .decrypt(&broadcast.ciphertext, &broadcast.header, SESSION_IV, None)
                .unwrap();
            if revoked.contains(&user) {
                assert_eq!(plaintext, None);
            } else {
                assert_eq!(plaintext.as_deref(), Some(&b"message"[..]));
            }
        }
    }

    #[test]
    fn sequence_errors() {
        let mut master =
            SpbeMaster::new(8, Aes256Ctr::new(), Aes256Ctr::new(), kdm()).unwrap();
        assert!(matches!(master.setup(), Err(Error::NoMasterKey)));
        assert!(matches!(master.issue_user_key(0), Err(Error::NotSetUp)));

        let mut member =
            SpbeMember::new(0, 8, Aes256Ctr::new(), Aes256Ctr::new()).unwrap();
        assert!(matches!(member.decrypt(&[], &[], SESSION_IV, None), Err(Error::NoKeyMaterial)));
        assert!(matches!(
            member.set_user_key(&[0u8; 32]),
            Err(Error::KeyMaterialSize(32, 256))
        ));
    }

    #[test]
    fn truncated_wire_data() {
        let mut master = master(8);
        let mut member = member(&mut master, 0);
        let broadcast =
            master.encrypt(b"message", &[5], SESSION_IV, None, SESSION_KEY).unwrap();

        assert!(matches!(
            member.decrypt(&broadcast.ciphertext, &broadcast.header[..1], SESSION_IV, None),
            Err(Error::MalformedHeader(1))
        ));
        assert!(matches!(
            member.decrypt(&broadcast.ciphertext[..16], &broadcast.header, SESSION_IV, None),
            Err(Error::TruncatedCiphertext(16, _))
        ));
    }
}
