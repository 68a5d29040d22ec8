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

//! Implicit complete binary tree used by subset-difference covers.
//!
//! The tree over `N = 2^n` leaves is never materialized: its `2N - 1` nodes
//! are breadth-first indices with node 0 as the root, children of node `k` at
//! `2k + 1` and `2k + 2`, and receiver `u` sitting at leaf `u + N - 1`. The
//! only allocated structure is the Steiner tree of a revoked-leaf set,
//! represented as a `2N - 1` bit vector.

use std::fmt::{self, Display, Formatter};

/// Left or right branching decision on a root-to-leaf walk.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
#[repr(u8)]
pub enum Direction {
    /// Step into the left child (`2k + 1`).
    Left = 0,
    /// Step into the right child (`2k + 2`).
    Right = 1,
}

/// Subset-difference set `S_(i,j)`: leaves which are descendants of `root`
/// but not descendants of `excluded`.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct Subset {
    /// Ancestor node whose subtree is included.
    pub root: usize,
    /// Proper descendant of [`Self::root`] whose subtree is carved out.
    pub excluded: usize,
}

impl Display for Subset {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "S({},{})", self.root, self.excluded)
    }
}

/// Index of the left child of `node`.
#[inline]
pub const fn left_child(node: usize) -> usize { 2 * node + 1 }

/// Index of the right child of `node`.
#[inline]
pub const fn right_child(node: usize) -> usize { 2 * node + 2 }

/// Index of the parent of `node`, or `None` for the root.
#[inline]
pub const fn parent(node: usize) -> Option<usize> {
    if node == 0 {
        None
    } else {
        Some((node - 1) / 2)
    }
}

/// Leaf index of receiver `user` in a tree with `n_users` leaves.
///
/// The caller must ensure `user < n_users`.
#[inline]
pub const fn leaf_for_user(n_users: usize, user: usize) -> usize { user + n_users - 1 }

/// Branching decisions leading from ancestor `i` down to descendant `j`.
///
/// Returns an empty path when `j == i` and `None` when `j` does not belong to
/// the subtree rooted at `i`. The walk ascends from `j`, prepending the side
/// on which each node hangs off its parent.
pub fn path_between(i: usize, mut j: usize) -> Option<Vec<Direction>> {
    let mut path = Vec::new();
    while j > i {
        if j % 2 == 0 {
            path.push(Direction::Right);
        } else {
            path.push(Direction::Left);
        }
        j = parent(j)?;
    }
    if j != i {
        return None;
    }
    path.reverse();
    Some(path)
}

/// Steiner tree of the revoked leaves: the minimal subtree containing the
/// root and the leaf of every member of `revoked`.
///
/// Encoded as a `2 * n_users - 1` bit vector over breadth-first node indices.
/// Each revoked leaf is walked up towards the root, stopping at the first
/// node already present, which bounds the cost by `O(|R| log N)`.
pub fn steiner_tree(n_users: usize, revoked: &[usize]) -> Vec<bool> {
    let mut nodes = vec![false; 2 * n_users - 1];
    for &user in revoked {
        let mut node = leaf_for_user(n_users, user);
        while !nodes[node] {
            nodes[node] = true;
            match parent(node) {
                Some(up) => node = up,
                None => break,
            }
        }
    }
    nodes
}

/// Decomposes a Steiner tree into its maximal degree-1 chains, emitted as
/// subset-difference sets.
///
/// Depth-first traversal on an explicit stack with the right child pushed
/// before the left one, so left chains are enumerated first; the scheme wire
/// format relies on this order. A chain starting at `s` runs down through
/// nodes with a single marked child until the first node `t` of differing
/// degree; `(s, t)` is emitted unless the chain is trivial. Nodes with both
/// children marked fork the traversal.
pub fn chain_subsets(steiner: &[bool]) -> Vec<Subset> {
    if !steiner[0] {
        // No revoked leaves: nothing to carve out
        return Vec::new();
    }

    let mut subsets = Vec::new();
    let mut stack = vec![0usize];
    while let Some(start) = stack.pop() {
        let mut node = start;
        loop {
            if left_child(node) >= steiner.len() {
                // Reached a revoked leaf
                if start != node {
                    subsets.push(Subset { root: start, excluded: node });
                }
                break;
            }
            let left = steiner[left_child(node)];
            let right = steiner[right_child(node)];
            match (left, right) {
                (true, true) => {
                    stack.push(right_child(node));
                    stack.push(left_child(node));
                    if start != node {
                        subsets.push(Subset { root: start, excluded: node });
                    }
                    break;
                }
                (true, false) => node = left_child(node),
                (false, true) => node = right_child(node),
                (false, false) => {
                    // A Steiner tree has no internal node of leaf degree;
                    // marked chains always continue down to a revoked leaf
                    unreachable!("degree-0 internal node in a Steiner tree")
                }
            }
        }
    }
    subsets
}

/// Whether receiver `user` belongs to the subset-difference set `subset`,
/// i.e. its leaf descends from `subset.root` but not from `subset.excluded`.
pub fn user_in_subset(user: usize, n_users: usize, subset: Subset) -> bool {
    let mut node = leaf_for_user(n_users, user);
    loop {
        if node == subset.excluded {
            return false;
        }
        if node == subset.root {
            return true;
        }
        if node < subset.root {
            return false;
        }
        match parent(node) {
            Some(up) => node = up,
            None => return false,
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn covered_users(n_users: usize, subsets: &[Subset]) -> BTreeSet<usize> {
        (0..n_users)
            .filter(|&u| subsets.iter().any(|&s| user_in_subset(u, n_users, s)))
            .collect()
    }

    #[test]
    fn node_arithmetic() {
        assert_eq!(left_child(0), 1);
        assert_eq!(right_child(0), 2);
        assert_eq!(parent(0), None);
        assert_eq!(parent(1), Some(0));
        assert_eq!(parent(2), Some(0));
        assert_eq!(parent(6), Some(2));
        assert_eq!(leaf_for_user(8, 0), 7);
        assert_eq!(leaf_for_user(8, 7), 14);
    }

    #[test]
    fn paths() {
        use Direction::*;
        assert_eq!(path_between(0, 0), Some(vec![]));
        assert_eq!(path_between(0, 6), Some(vec![Right, Right]));
        assert_eq!(path_between(0, 3), Some(vec![Left, Left]));
        assert_eq!(path_between(1, 4), Some(vec![Right]));
        // 5 is in the right subtree, not below 1
        assert_eq!(path_between(1, 5), None);
        // Ancestors are not descendants
        assert_eq!(path_between(6, 0), None);
    }

    #[test]
    fn steiner_single_revocation() {
        let st = steiner_tree(4, &[1]);
        // Leaf 4 plus its ancestry
        let marked: Vec<usize> =
            st.iter().enumerate().filter(|(_, &b)| b).map(|(n, _)| n).collect();
        assert_eq!(marked, vec![0, 1, 4]);
        assert_eq!(chain_subsets(&st), vec![Subset { root: 0, excluded: 4 }]);
    }

    #[test]
    fn steiner_forking_chains() {
        // N = 8, revoked users 2 and 5 (leaves 9 and 12)
        let st = steiner_tree(8, &[2, 5]);
        let subsets = chain_subsets(&st);
        // Left chain enumerated before the right one
        assert_eq!(subsets, vec![
            Subset { root: 1, excluded: 9 },
            Subset { root: 2, excluded: 12 },
        ]);
        let covered = covered_users(8, &subsets);
        assert_eq!(covered, BTreeSet::from([0, 1, 3, 4, 6, 7]));
    }

    #[test]
    fn empty_revocation_has_no_subsets() {
        let st = steiner_tree(16, &[]);
        assert!(st.iter().all(|&b| !b));
        assert!(chain_subsets(&st).is_empty());
    }

    #[test]
    fn subset_membership() {
        let s = Subset { root: 1, excluded: 9 };
        assert!(user_in_subset(0, 8, s));
        assert!(user_in_subset(1, 8, s));
        assert!(!user_in_subset(2, 8, s));
        assert!(user_in_subset(3, 8, s));
        assert!(!user_in_subset(4, 8, s));
    }

    #[test]
    fn covers_exactly_the_authorized_set() {
        let mut rng = StdRng::seed_from_u64(0x5d);
        for n_users in [4usize, 16, 64, 256] {
            for trial in 0..16 {
                let revoked: BTreeSet<usize> =
                    (0..=3 * trial).map(|_| rng.gen_range(0..n_users)).collect();
                let revoked: Vec<usize> = revoked.into_iter().collect();
                let subsets = chain_subsets(&steiner_tree(n_users, &revoked));
                let authorized: BTreeSet<usize> =
                    (0..n_users).filter(|u| !revoked.contains(u)).collect();
                assert_eq!(covered_users(n_users, &subsets), authorized);
            }
        }
    }
}
