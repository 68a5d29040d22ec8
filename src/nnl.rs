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

//! Subset-difference broadcast encryption.
//!
//! The scheme of Naor, Naor and Lotspiech ("Revocation and Tracing Schemes
//! for Stateless Receivers", eprint 2001/059) over a complete binary tree of
//! `N = 2^n` receivers. The master assigns a pseudo-random label to every
//! internal tree node; the authorized set is covered by subset-difference
//! sets `S_(i,j)` extracted from the Steiner tree of the revoked leaves, and
//! the session key is encrypted once per subset under a key derived from the
//! label chain `i → j`.
//!
//! A few details the original paper leaves open are fixed as follows: the
//! one-way trapdoor functions `G_L`, `G_M`, `G_R` are KDM expansions under
//! the `"Left"`, `"Middle"` and `"Right"` labels; node labels are generated
//! from a master secret through the same KDM; session keys are encrypted by
//! a confidentiality mode rather than a bare block cipher, de-correlating
//! key and block sizes; and all session-key encryptions share one IV while
//! using distinct derived keys.

use key_derivation::{ConfidentialityMode, Kdm};
use subset_cover::tree::{
    chain_subsets, leaf_for_user, left_child, path_between, right_child, steiner_tree,
    user_in_subset, Direction, Subset,
};
use zeroize::Zeroizing;

use crate::{Broadcast, BroadcastMaster, BroadcastMember, Error, SchemeParams};

const SETUP_SALT: &[u8] = b"Setup";
const SETUP_INFO: &[u8] = b"Label";
const LABEL_SALT: &[u8] = b"UserLabels";
const LEFT_INFO: &[u8] = b"Left";
const MIDDLE_INFO: &[u8] = b"Middle";
const RIGHT_INFO: &[u8] = b"Right";

/// Number of k-byte labels in the key material issued to one receiver of a
/// system of depth `n`: the global key plus one sibling label per step of
/// the issuance walks.
fn issued_labels(depth: usize) -> usize { 1 + depth * (depth + 1) / 2 }

fn node_bytes(node: usize, size: usize) -> Vec<u8> {
    (node as u64).to_be_bytes()[8 - size..].to_vec()
}

fn read_node(bytes: &[u8]) -> usize {
    bytes.iter().fold(0usize, |node, &byte| (node << 8) | byte as usize)
}

/// Derives both child labels of a node label.
fn child_labels<K: Kdm>(
    kdm: &mut K,
    key_bits: usize,
    label: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), Error> {
    kdm.extract(label, LABEL_SALT)?;
    let left = kdm.expand(key_bits, LEFT_INFO, &[])?;
    let right = kdm.expand(key_bits, RIGHT_INFO, &[])?;
    Ok((left, right))
}

/// Walks a label down a left/right path, one derivation per step.
fn walk_down<K: Kdm>(
    kdm: &mut K,
    key_bits: usize,
    mut label: Vec<u8>,
    path: &[Direction],
) -> Result<Vec<u8>, Error> {
    for direction in path {
        kdm.extract(&label, LABEL_SALT)?;
        label = match direction {
            Direction::Left => kdm.expand(key_bits, LEFT_INFO, &[])?,
            Direction::Right => kdm.expand(key_bits, RIGHT_INFO, &[])?,
        };
    }
    Ok(label)
}

/// Turns the label of a chain endpoint into the subset key `L_(i,j)`.
fn middle_key<K: Kdm>(kdm: &mut K, key_bits: usize, label: &[u8]) -> Result<Vec<u8>, Error> {
    kdm.extract(label, LABEL_SALT)?;
    Ok(kdm.expand(key_bits, MIDDLE_INFO, &[])?)
}

/// Master of an NNL-SD broadcast system.
///
/// Owns the master secret and the table of internal-node labels created by
/// [`BroadcastMaster::setup`].
pub struct NnlSdMaster<K: Kdm, S: ConfidentialityMode, P: ConfidentialityMode> {
    params: SchemeParams,
    node_index_size: usize,
    kdm: K,
    session_mode: S,
    payload_mode: P,
    master_key: Option<Zeroizing<Vec<u8>>>,
    tree_labels: Vec<Zeroizing<Vec<u8>>>,
}

impl<K: Kdm, S: ConfidentialityMode, P: ConfidentialityMode> NnlSdMaster<K, S, P> {
    /// Creates the master of a system of `n_users` receivers.
    ///
    /// `session_mode` encrypts the session key under per-subset keys;
    /// `payload_mode` encrypts the payload under the session key. Labels and
    /// derived keys take the key size of the session mode.
    pub fn new(n_users: usize, session_mode: S, payload_mode: P, kdm: K) -> Result<Self, Error> {
        let params = SchemeParams::new(n_users, session_mode.key_size())?;
        Ok(NnlSdMaster {
            params,
            node_index_size: (params.depth() + 1 + 7) / 8,
            kdm,
            session_mode,
            payload_mode,
            master_key: None,
            tree_labels: Vec::new(),
        })
    }

    /// System parameters shared with the members.
    pub fn params(&self) -> SchemeParams { self.params }

    fn global_key(&mut self) -> Result<Vec<u8>, Error> {
        let root_label = self.tree_labels[0].to_vec();
        middle_key(&mut self.kdm, self.params.key_size() * 8, &root_label)
    }
}

impl<K: Kdm, S: ConfidentialityMode, P: ConfidentialityMode> BroadcastMaster
    for NnlSdMaster<K, S, P>
{
    fn set_master_key(&mut self, key: &[u8]) -> Result<(), Error> {
        self.master_key = Some(Zeroizing::new(key.to_vec()));
        Ok(())
    }

    fn setup(&mut self) -> Result<(), Error> {
        let master_key = self.master_key.as_ref().ok_or(Error::NoMasterKey)?;
        let key_bits = self.params.key_size() * 8;

        self.kdm.extract(master_key, SETUP_SALT)?;
        let mut labels = Vec::with_capacity(self.params.n_users() - 1);
        for node in 0..self.params.n_users() - 1 {
            let mut info = SETUP_INFO.to_vec();
            info.extend(node_bytes(node, self.node_index_size));
            labels.push(Zeroizing::new(self.kdm.expand(key_bits, &info, &[])?));
        }
        self.tree_labels = labels;
        Ok(())
    }

    fn issue_user_key(&mut self, user: usize) -> Result<Vec<u8>, Error> {
        if self.tree_labels.is_empty() {
            return Err(Error::NotSetUp);
        }
        self.params.check_user(user)?;
        let key_bits = self.params.key_size() * 8;
        let depth = self.params.depth();

        let mut material = self.global_key()?;

        let path = path_between(0, leaf_for_user(self.params.n_users(), user))
            .expect("every leaf is a descendant of the root");

        // One walk per subtree T_i on the root-to-leaf path of the receiver;
        // each walk hands out the labels of the siblings hanging off the path
        let mut subtree_root = 0usize;
        for level in 0..depth {
            let mut label = self.tree_labels[subtree_root].to_vec();
            for step in level..depth {
                let (left, right) = child_labels(&mut self.kdm, key_bits, &label)?;
                match path[step] {
                    Direction::Left => {
                        material.extend(right);
                        label = left;
                    }
                    Direction::Right => {
                        material.extend(left);
                        label = right;
                    }
                }
            }
            subtree_root = match path[level] {
                Direction::Left => left_child(subtree_root),
                Direction::Right => right_child(subtree_root),
            };
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
        if self.tree_labels.is_empty() {
            return Err(Error::NotSetUp);
        }
        for &user in revoked {
            self.params.check_user(user)?;
        }
        let key_bits = self.params.key_size() * 8;

        let mut header = Vec::new();
        let mut ciphertext = Vec::new();

        if revoked.is_empty() {
            let global_key = self.global_key()?;
            ciphertext
                .extend(self.session_mode.encrypt_one_shot(session_iv, session_key, &global_key)?);
        }

        let subsets = chain_subsets(&steiner_tree(self.params.n_users(), revoked));
        for subset in subsets {
            let path = path_between(subset.root, subset.excluded)
                .expect("chain subsets connect a node to its descendant");
            let start_label = self.tree_labels[subset.root].to_vec();
            let chain_end = walk_down(&mut self.kdm, key_bits, start_label, &path)?;
            let subset_key = middle_key(&mut self.kdm, key_bits, &chain_end)?;

            header.extend(node_bytes(subset.root, self.node_index_size));
            header.extend(node_bytes(subset.excluded, self.node_index_size));
            ciphertext
                .extend(self.session_mode.encrypt_one_shot(session_iv, session_key, &subset_key)?);
        }

        let payload_iv = ciphertext_iv.unwrap_or(session_iv);
        ciphertext.extend(self.payload_mode.encrypt_one_shot(payload_iv, plaintext, session_key)?);
        Ok(Broadcast { ciphertext, header })
    }
}

/// Receiver of an NNL-SD broadcast system.
///
/// Holds the issued key material as `(i, j, label)` tuples: for every tuple,
/// `j` lies on the path from `i` towards the receiver leaf's sibling
/// subtrees, so the receiver can re-derive the subset key of any `S_(i,j)`
/// it belongs to. The first tuple `(0, 0, global)` is the global key used
/// when nobody is revoked.
pub struct NnlSdMember<K: Kdm, S: ConfidentialityMode, P: ConfidentialityMode> {
    params: SchemeParams,
    node_index_size: usize,
    user: usize,
    kdm: K,
    session_mode: S,
    payload_mode: P,
    key_tuples: Vec<(usize, usize, Zeroizing<Vec<u8>>)>,
}

impl<K: Kdm, S: ConfidentialityMode, P: ConfidentialityMode> NnlSdMember<K, S, P> {
    /// Creates receiver `user` of a system of `n_users` receivers.
    pub fn new(
        user: usize,
        n_users: usize,
        session_mode: S,
        payload_mode: P,
        kdm: K,
    ) -> Result<Self, Error> {
        let params = SchemeParams::new(n_users, session_mode.key_size())?;
        params.check_user(user)?;
        Ok(NnlSdMember {
            params,
            node_index_size: (params.depth() + 1 + 7) / 8,
            user,
            kdm,
            session_mode,
            payload_mode,
            key_tuples: Vec::new(),
        })
    }

    /// Identifier of this receiver.
    pub fn user(&self) -> usize { self.user }

    /// Issued key tuples; empty until [`BroadcastMember::set_user_key`].
    #[cfg(test)]
    pub(crate) fn key_tuples(&self) -> &[(usize, usize, Zeroizing<Vec<u8>>)] { &self.key_tuples }

    fn session_key_for(
        &mut self,
        ciphertext: &[u8],
        header: &[u8],
        session_iv: &[u8],
    ) -> Result<Option<(usize, Vec<u8>)>, Error> {
        let key_size = self.params.key_size();
        let key_bits = key_size * 8;
        let pair_size = 2 * self.node_index_size;

        if header.is_empty() {
            // Nobody is revoked: a single global-key encryption of the
            // session key starts the ciphertext
            if ciphertext.len() < key_size {
                return Err(Error::TruncatedCiphertext(ciphertext.len(), key_size));
            }
            let global = self.key_tuples[0].2.to_vec();
            let session_key =
                self.session_mode.decrypt_one_shot(session_iv, &ciphertext[..key_size], &global)?;
            return Ok(Some((1, session_key)));
        }

        if header.len() % pair_size != 0 {
            return Err(Error::MalformedHeader(header.len()));
        }
        let n_subsets = header.len() / pair_size;
        if ciphertext.len() < n_subsets * key_size {
            return Err(Error::TruncatedCiphertext(ciphertext.len(), n_subsets * key_size));
        }

        let mut matched = None;
        for (position, pair) in header.chunks(pair_size).enumerate() {
            let subset = Subset {
                root: read_node(&pair[..self.node_index_size]),
                excluded: read_node(&pair[self.node_index_size..]),
            };
            if user_in_subset(self.user, self.params.n_users(), subset) {
                matched = Some((position, subset));
                break;
            }
        }
        let Some((position, subset)) = matched else {
            // Every header subset carves this receiver out: revoked
            return Ok(None);
        };
        let encrypted = &ciphertext[position * key_size..(position + 1) * key_size];

        for (i, j, label) in &self.key_tuples[1..] {
            if *i != subset.root {
                continue;
            }
            let Some(path) = path_between(*j, subset.excluded) else {
                continue;
            };
            let chain_end = walk_down(&mut self.kdm, key_bits, label.to_vec(), &path)?;
            let subset_key = middle_key(&mut self.kdm, key_bits, &chain_end)?;
            let session_key =
                self.session_mode.decrypt_one_shot(session_iv, encrypted, &subset_key)?;
            return Ok(Some((n_subsets, session_key)));
        }
        // The header covers this receiver, so a conforming master must have
        // issued a tuple able to reach (i, j)
        Err(Error::ForeignKeyMaterial)
    }
}

impl<K: Kdm, S: ConfidentialityMode, P: ConfidentialityMode> BroadcastMember
    for NnlSdMember<K, S, P>
{
    fn set_user_key(&mut self, key_material: &[u8]) -> Result<(), Error> {
        let key_size = self.params.key_size();
        let depth = self.params.depth();
        let expected = issued_labels(depth) * key_size;
        if key_material.len() != expected {
            return Err(Error::KeyMaterialSize(key_material.len(), expected));
        }

        let path = path_between(0, leaf_for_user(self.params.n_users(), self.user))
            .expect("every leaf is a descendant of the root");

        // Mirror the issuance walks to tag every sibling label with the
        // subset (i, j) it unlocks
        let mut tuples = Vec::with_capacity(issued_labels(depth));
        tuples.push((0, 0, Zeroizing::new(key_material[..key_size].to_vec())));
        let mut i = 0usize;
        let mut j = 0usize;
        let mut depth_i = 0usize;
        let mut depth_j = 0usize;
        for label in key_material[key_size..].chunks(key_size) {
            let label = Zeroizing::new(label.to_vec());
            match path[depth_j] {
                Direction::Left => {
                    tuples.push((i, right_child(j), label));
                    j = left_child(j);
                }
                Direction::Right => {
                    tuples.push((i, left_child(j), label));
                    j = right_child(j);
                }
            }
            depth_j += 1;

            if depth_j >= depth {
                i = match path[depth_i] {
                    Direction::Left => left_child(i),
                    Direction::Right => right_child(i),
                };
                j = i;
                depth_i += 1;
                depth_j = depth_i;
            }
        }
        self.key_tuples = tuples;
        Ok(())
    }

    fn decrypt(
        &mut self,
        ciphertext: &[u8],
        header: &[u8],
        session_iv: &[u8],
        ciphertext_iv: Option<&[u8]>,
    ) -> Result<Option<Vec<u8>>, Error> {
        if self.key_tuples.is_empty() {
            return Err(Error::NoKeyMaterial);
        }

        let Some((n_keys, session_key)) = self.session_key_for(ciphertext, header, session_iv)?
        else {
            return Ok(None);
        };

        let payload_iv = ciphertext_iv.unwrap_or(session_iv);
        let payload_start = n_keys * self.params.key_size();
        let payload = self.payload_mode.decrypt_one_shot(
            payload_iv,
            &ciphertext[payload_start..],
            &session_key,
        )?;
        Ok(Some(payload))
    }
}
