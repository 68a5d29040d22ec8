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

//! Combinatorial subset-cover engines for broadcast encryption.
//!
//! A broadcaster addressing `N` pre-registered receivers must express "every
//! receiver except the revoked ones" as a small family of sets, each of which
//! maps to a single key-encryption key. This crate provides the two cover
//! constructions used by the scheme layer:
//!
//! - [`tree`]: the implicit complete binary tree over `2N - 1` breadth-first
//!   node indices, Steiner trees of revoked leaves and their decomposition
//!   into *subset-difference* covers `(i, j)` ("descendants of `i` which are
//!   not descendants of `j`");
//! - [`bool_func`]: authorized sets encoded as Boolean functions, covered by
//!   prime implicants enumerated with the Quine–McCluskey procedure and
//!   selected through a deterministic set-cover heuristic.

#[macro_use]
extern crate amplify;

pub mod bool_func;
pub mod tree;

pub use bool_func::{
    prime_implicant_chart, prime_implicants, select_cover, CoverError, Implicant, TruthValue,
};
pub use tree::{
    chain_subsets, leaf_for_user, left_child, parent, path_between, right_child, steiner_tree,
    user_in_subset, Direction, Subset,
};
