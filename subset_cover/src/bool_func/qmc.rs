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

use std::collections::BTreeMap;

use super::{CoverError, Implicant, MAX_VARIABLES};

/// Entry of a Boolean-function truth table.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum TruthValue {
    /// The function is 0 at this point; no implicant may cover it.
    Zero,
    /// The function is 1 at this point; the cover must include it.
    One,
    /// The point participates in implicant enumeration but the cover is not
    /// required to include it.
    DontCare,
}

fn locality_of(table_len: usize) -> Result<u8, CoverError> {
    let locality = table_len.trailing_zeros() as u8;
    if !table_len.is_power_of_two() || locality == 0 || locality > MAX_VARIABLES {
        return Err(CoverError::InvalidTableLength(table_len));
    }
    Ok(locality)
}

/// Enumerates all prime implicants of the function given by its truth table.
///
/// Quine–McCluskey procedure: the non-zero points seed the first generation
/// of minterms; each generation is bucketed by `(star pattern, Hamming
/// weight)` and every pair of adjacent-weight terms inside a star-pattern
/// class is tentatively combined. A successful combination marks both inputs
/// non-prime and feeds the (deduplicated) result into the next generation.
/// Terms still marked prime when their generation dies out are harvested.
///
/// The table length must be a power of two not exceeding
/// `2^`[`MAX_VARIABLES`].
pub fn prime_implicants(table: &[TruthValue]) -> Result<Vec<Implicant>, CoverError> {
    let locality = locality_of(table.len())?;

    let mut generation: Vec<Implicant> = table
        .iter()
        .enumerate()
        .filter(|(_, &value)| value != TruthValue::Zero)
        .map(|(x, _)| Implicant::minterm(x as u32, locality))
        .collect();

    let mut primes = Vec::new();
    loop {
        let mut buckets = BTreeMap::<(u32, u32), Vec<usize>>::new();
        for (index, term) in generation.iter().enumerate() {
            buckets
                .entry((term.star_pattern(), term.weight()))
                .or_default()
                .push(index);
        }

        let mut prime = vec![true; generation.len()];
        let mut next: Vec<Implicant> = Vec::new();
        for (&(stars, weight), lower) in &buckets {
            let Some(upper) = buckets.get(&(stars, weight + 1)) else {
                continue;
            };
            for &a in lower {
                for &b in upper {
                    let Some(combined) = generation[a].combine(&generation[b]) else {
                        continue;
                    };
                    prime[a] = false;
                    prime[b] = false;
                    if !next.contains(&combined) {
                        next.push(combined);
                    }
                }
            }
        }

        primes.extend(
            generation
                .iter()
                .zip(&prime)
                .filter(|(_, &keep)| keep)
                .map(|(term, _)| *term),
        );
        if next.is_empty() {
            break;
        }
        generation = next;
    }
    Ok(primes)
}

/// Builds the prime-implicant chart: for every point where the function is 1,
/// the indices of the implicants covering it.
///
/// Points where the function is 0 must not be covered by any implicant and
/// every 1-point must be covered by at least one; a violation of either is a
/// structural bug of the implicant set and fails with [`CoverError`].
/// Don't-care rows stay empty.
pub fn prime_implicant_chart(
    implicants: &[Implicant],
    table: &[TruthValue],
) -> Result<Vec<Vec<usize>>, CoverError> {
    locality_of(table.len())?;
    let mut chart = vec![Vec::new(); table.len()];
    for (x, &value) in table.iter().enumerate() {
        match value {
            TruthValue::One => {
                for (index, term) in implicants.iter().enumerate() {
                    if term.covers(x as u32) {
                        chart[x].push(index);
                    }
                }
                if chart[x].is_empty() {
                    return Err(CoverError::UncoveredPoint(x));
                }
            }
            TruthValue::Zero => {
                for term in implicants {
                    if term.covers(x as u32) {
                        return Err(CoverError::SpuriousCover(*term, x));
                    }
                }
            }
            TruthValue::DontCare => {}
        }
    }
    Ok(chart)
}

/// Selects a feasible cover from a prime-implicant chart, returning implicant
/// indices in selection order.
///
/// Deterministic two-phase heuristic standing in for an integer linear
/// program: essential implicants (sole coverers of some point) are taken
/// first in ascending index order, then the remaining points are covered
/// greedily, each round picking the implicant covering the most still-open
/// points with ties broken towards the lowest index. The result covers every
/// point with a non-empty chart row; its cardinality may exceed the optimum.
pub fn select_cover(n_implicants: usize, chart: &[Vec<usize>]) -> Vec<usize> {
    fn take(index: usize, rows: &[&Vec<usize>], row_open: &mut [bool]) {
        for (row, open) in rows.iter().zip(row_open.iter_mut()) {
            if *open && row.contains(&index) {
                *open = false;
            }
        }
    }

    let rows: Vec<&Vec<usize>> = chart.iter().filter(|row| !row.is_empty()).collect();
    let mut row_open = vec![true; rows.len()];
    let mut selected_mask = vec![false; n_implicants];
    let mut selection = Vec::new();

    let mut essentials: Vec<usize> = rows
        .iter()
        .filter(|row| row.len() == 1)
        .map(|row| row[0])
        .collect();
    essentials.sort_unstable();
    essentials.dedup();
    for index in essentials {
        selected_mask[index] = true;
        selection.push(index);
        take(index, &rows, &mut row_open);
    }

    while row_open.contains(&true) {
        let mut best = 0usize;
        let mut best_count = 0usize;
        for index in 0..n_implicants {
            if selected_mask[index] {
                continue;
            }
            let count = rows
                .iter()
                .zip(&row_open)
                .filter(|(row, &open)| open && row.contains(&index))
                .count();
            if count > best_count {
                best = index;
                best_count = count;
            }
        }
        debug_assert!(best_count > 0, "chart row not coverable by any implicant");
        selected_mask[best] = true;
        selection.push(best);
        take(best, &rows, &mut row_open);
    }
    selection
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use super::*;

    fn table_from_on_set(locality: u8, on_set: &[u32]) -> Vec<TruthValue> {
        (0..1u32 << locality)
            .map(|x| {
                if on_set.contains(&x) {
                    TruthValue::One
                } else {
                    TruthValue::Zero
                }
            })
            .collect()
    }

    fn as_strings(implicants: &[Implicant]) -> BTreeSet<String> {
        implicants.iter().map(Implicant::to_string).collect()
    }

    #[test]
    fn textbook_three_variable_function() {
        // f(a, b, c) with on-set {0, 1, 2, 5, 6, 7}
        let table = table_from_on_set(3, &[0, 1, 2, 5, 6, 7]);
        let primes = prime_implicants(&table).unwrap();
        assert_eq!(
            as_strings(&primes),
            BTreeSet::from([
                "00*".to_string(),
                "0*0".to_string(),
                "*01".to_string(),
                "*10".to_string(),
                "1*1".to_string(),
                "11*".to_string(),
            ])
        );

        let chart = prime_implicant_chart(&primes, &table).unwrap();
        let cover = select_cover(primes.len(), &chart);
        // Feasible and, for this function, optimal
        assert_eq!(cover.len(), 3);
        for x in [0u32, 1, 2, 5, 6, 7] {
            assert!(cover.iter().any(|&i| primes[i].covers(x)));
        }
    }

    #[test]
    fn all_ones_collapses_to_free_term() {
        let table = vec![TruthValue::One; 16];
        let primes = prime_implicants(&table).unwrap();
        assert_eq!(primes.len(), 1);
        assert_eq!(primes[0].to_string(), "****");

        let chart = prime_implicant_chart(&primes, &table).unwrap();
        assert_eq!(select_cover(primes.len(), &chart), vec![0]);
    }

    #[test]
    fn single_minterm_is_its_own_prime() {
        let table = table_from_on_set(3, &[5]);
        let primes = prime_implicants(&table).unwrap();
        assert_eq!(as_strings(&primes), BTreeSet::from(["101".to_string()]));
    }

    #[test]
    fn dont_care_points_extend_primes_without_requiring_coverage() {
        // On-set {3}, don't care at {1}: the pair combines into 0*1, and the
        // chart has a single requiring row
        let mut table = table_from_on_set(2, &[3]);
        table[1] = TruthValue::DontCare;
        let primes = prime_implicants(&table).unwrap();
        assert_eq!(as_strings(&primes), BTreeSet::from(["*1".to_string()]));

        let chart = prime_implicant_chart(&primes, &table).unwrap();
        assert!(chart[1].is_empty());
        assert_eq!(chart[3], vec![0]);
    }

    #[test]
    fn chart_rejects_implicant_covering_zero_point() {
        let table = table_from_on_set(2, &[0, 1]);
        // 0* covers the on-set, 1* spills over the off-set
        let good = Implicant::restriction(0b00, 0b10, 2);
        let bad = Implicant::restriction(0b10, 0b10, 2);
        assert_eq!(
            prime_implicant_chart(&[good, bad], &table),
            Err(CoverError::SpuriousCover(bad, 2))
        );
    }

    #[test]
    fn chart_rejects_uncovered_one_point() {
        let table = table_from_on_set(2, &[0, 1]);
        let partial = Implicant::minterm(0, 2);
        assert_eq!(
            prime_implicant_chart(&[partial], &table),
            Err(CoverError::UncoveredPoint(1))
        );
    }

    #[test]
    fn essential_implicants_selected_first() {
        // On-set {0, 3} over two variables: both minterms are essential
        let table = table_from_on_set(2, &[0, 3]);
        let primes = prime_implicants(&table).unwrap();
        let chart = prime_implicant_chart(&primes, &table).unwrap();
        let cover = select_cover(primes.len(), &chart);
        assert_eq!(cover.len(), 2);
    }

    #[test]
    fn enumeration_is_deterministic() {
        let table = table_from_on_set(4, &[0, 1, 2, 3, 5, 7, 8, 10, 12, 13, 15]);
        let first = prime_implicants(&table).unwrap();
        let second = prime_implicants(&table).unwrap();
        assert_eq!(first, second);
        let chart = prime_implicant_chart(&first, &table).unwrap();
        assert_eq!(
            select_cover(first.len(), &chart),
            select_cover(first.len(), &chart)
        );
    }

    #[test]
    fn random_tables_always_get_feasible_covers() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(0xc0fe);
        for _ in 0..32 {
            let table: Vec<TruthValue> = (0..64)
                .map(|_| {
                    if rng.gen_bool(0.8) {
                        TruthValue::One
                    } else {
                        TruthValue::Zero
                    }
                })
                .collect();
            if table.iter().all(|&v| v == TruthValue::Zero) {
                continue;
            }
            let primes = prime_implicants(&table).unwrap();
            // Chart construction verifies no prime covers a revoked point
            let chart = prime_implicant_chart(&primes, &table).unwrap();
            let cover = select_cover(primes.len(), &chart);
            for (x, &value) in table.iter().enumerate() {
                if value == TruthValue::One {
                    assert!(
                        cover.iter().any(|&i| primes[i].covers(x as u32)),
                        "point {x} left uncovered"
                    );
                }
            }
        }
    }

    #[test]
    fn rejects_bad_table_lengths() {
        assert_eq!(
            prime_implicants(&[TruthValue::One; 6]),
            Err(CoverError::InvalidTableLength(6))
        );
        assert_eq!(
            prime_implicants(&[TruthValue::One; 1]),
            Err(CoverError::InvalidTableLength(1))
        );
    }
}
