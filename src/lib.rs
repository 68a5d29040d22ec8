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

//! Broadcast encryption foundation library.
//!
//! A *broadcaster* emits a single ciphertext addressed to a population of
//! `N = 2^n` pre-registered receivers so that any chosen subset of receivers
//! can be revoked per broadcast: authorized receivers recover the plaintext,
//! revoked ones learn nothing. Two independent schemes implement the common
//! [`BroadcastMaster`]/[`BroadcastMember`] contract:
//!
//! * [`nnl`]: the subset-difference scheme of Naor, Naor and Lotspiech over
//!   a complete binary tree of receivers;
//! * [`spbe`]: sum-product broadcast encryption, covering the authorized
//!   set by prime implicants of a Boolean function.
//!
//! Both schemes are built from the same two foundations: the combinatorial
//! cover engines of the `subset_cover` crate and the primitive seams of the
//! `key_derivation` crate (an SP800-56C two-step KDM over SP800-108, plus a
//! length-preserving confidentiality mode for session keys and payload).
//! A session key encrypts the payload; the session key itself is encrypted
//! once per cover element under a derived key only the covered receivers can
//! re-create.

/// Re-export of the `key_derivation` crate.
pub extern crate key_derivation;
/// Re-export of the `subset_cover` crate.
pub extern crate subset_cover;

#[macro_use]
extern crate amplify;

mod api;
pub mod nnl;
pub mod spbe;

pub use api::{Broadcast, BroadcastMaster, BroadcastMember, Error, SchemeParams};
pub use nnl::{NnlSdMaster, NnlSdMember};
pub use spbe::{SpbeMaster, SpbeMember};
