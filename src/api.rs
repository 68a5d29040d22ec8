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

//! Broadcast-encryption contract shared by all schemes.
//!
//! Each scheme comes as a pair of types sharing one immutable parameter set:
//! a *master* (implementing [`BroadcastMaster`]) which owns the root secret,
//! issues per-receiver key material and encrypts broadcasts, and a *member*
//! (implementing [`BroadcastMember`]) which holds its issued material and
//! decrypts. Splitting the roles at the type level makes wrong-role calls
//! unrepresentable; the remaining sequence constraints (setup after the
//! master key, encryption after setup, decryption after key installation)
//! surface as [`Error`] values.

/// Failure modes of broadcast-encryption operations.
#[derive(Clone, PartialEq, Eq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum Error {
    /// a broadcast system of {0} users is not supported: the number of users
    /// must be a power of two greater than one
    InvalidUserCount(usize),

    /// user identifier {0} is outside of the system of {1} users
    UnknownUser(usize, usize),

    /// the master key was not installed prior to the operation
    NoMasterKey,

    /// the operation requires a completed system setup
    NotSetUp,

    /// decryption requires key material issued by the master
    NoKeyMaterial,

    /// key material of {0} bytes instead of the {1} bytes the scheme issues
    KeyMaterialSize(usize, usize),

    /// broadcast header of {0} bytes is malformed
    MalformedHeader(usize),

    /// ciphertext of {0} bytes is shorter than the {1} bytes implied by its
    /// header
    TruncatedCiphertext(usize, usize),

    /// the header claims this receiver is authorized, yet no stored key
    /// material matches: the key material was not issued by the broadcasting
    /// master
    ForeignKeyMaterial,

    /// cryptographic primitive failure
    #[display(inner)]
    #[from]
    Primitive(key_derivation::Error),

    /// Boolean cover failure
    #[display(inner)]
    #[from]
    Cover(subset_cover::CoverError),
}

/// Wire artifact of a broadcast encryption.
///
/// The ciphertext carries one session-key encryption per cover element
/// followed by the encrypted payload; the header describes the cover so that
/// each receiver can locate the session-key encryption it is able to open.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Broadcast {
    /// Encrypted session keys followed by the encrypted payload.
    pub ciphertext: Vec<u8>,
    /// Scheme-specific cover description.
    pub header: Vec<u8>,
}

/// Immutable configuration shared by the master and every member of one
/// broadcast system.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct SchemeParams {
    n_users: usize,
    depth: usize,
    key_size: usize,
}

impl SchemeParams {
    /// Validates the population size and fixes the session-key size.
    ///
    /// `n_users` must be a power of two greater than one; `key_size` is the
    /// key size of the session confidentiality mode in bytes.
    pub fn new(n_users: usize, key_size: usize) -> Result<Self, Error> {
        if !n_users.is_power_of_two() || n_users < 2 {
            return Err(Error::InvalidUserCount(n_users));
        }
        Ok(SchemeParams {
            n_users,
            depth: n_users.trailing_zeros() as usize,
            key_size,
        })
    }

    /// Number of users the system addresses.
    #[inline]
    pub fn n_users(&self) -> usize { self.n_users }

    /// Binary logarithm of the number of users.
    #[inline]
    pub fn depth(&self) -> usize { self.depth }

    /// Session-key size in bytes.
    #[inline]
    pub fn key_size(&self) -> usize { self.key_size }

    /// Validates a user identifier against the population size.
    pub fn check_user(&self, user: usize) -> Result<(), Error> {
        if user >= self.n_users {
            return Err(Error::UnknownUser(user, self.n_users));
        }
        Ok(())
    }
}

/// Master-side broadcast-encryption operations.
pub trait BroadcastMaster {
    /// Installs the root secret of the system.
    fn set_master_key(&mut self, key: &[u8]) -> Result<(), Error>;

    /// Derives the long-term system state from the master key.
    fn setup(&mut self) -> Result<(), Error>;

    /// Produces the key material to be installed at receiver `user`.
    fn issue_user_key(&mut self, user: usize) -> Result<Vec<u8>, Error>;

    /// Encrypts `plaintext` so that every user outside of `revoked` can
    /// decrypt it.
    ///
    /// The session key is encrypted once per cover element under
    /// `session_iv`; the payload is encrypted under the session key with
    /// `ciphertext_iv`, which defaults to the session IV.
    fn encrypt(
        &mut self,
        plaintext: &[u8],
        revoked: &[usize],
        session_iv: &[u8],
        ciphertext_iv: Option<&[u8]>,
        session_key: &[u8],
    ) -> Result<Broadcast, Error>;
}

/// Member-side broadcast-encryption operations.
pub trait BroadcastMember {
    /// Installs the key material issued by the master for this receiver.
    fn set_user_key(&mut self, key_material: &[u8]) -> Result<(), Error>;

    /// Decrypts a broadcast.
    ///
    /// Returns `None` when the receiver is revoked by the broadcast header;
    /// this is a regular outcome, not an error.
    fn decrypt(
        &mut self,
        ciphertext: &[u8],
        header: &[u8],
        session_iv: &[u8],
        ciphertext_iv: Option<&[u8]>,
    ) -> Result<Option<Vec<u8>>, Error>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn params_validation() {
        assert_eq!(SchemeParams::new(0, 32), Err(Error::InvalidUserCount(0)));
        assert_eq!(SchemeParams::new(1, 32), Err(Error::InvalidUserCount(1)));
        assert_eq!(SchemeParams::new(48, 32), Err(Error::InvalidUserCount(48)));

        let params = SchemeParams::new(128, 32).unwrap();
        assert_eq!(params.n_users(), 128);
        assert_eq!(params.depth(), 7);
        assert_eq!(params.key_size(), 32);
        assert_eq!(params.check_user(127), Ok(()));
        assert_eq!(params.check_user(128), Err(Error::UnknownUser(128, 128)));
    }
}
