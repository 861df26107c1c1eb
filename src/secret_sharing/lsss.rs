/*
 * Copyright (c) pvgss contributors.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *        http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Sharing and reconstruction under a compiled LSSS matrix.
//!
//! A secret `s` is shared as `λ = M · v` with `v = (s, r_2, ..., r_C)`.
//! A set of rows `I` recovers `s` through coefficients `w` with
//! `w · M_I = e1`, since then `w · λ_I = e1 · v = s`. Sharing is linear, so
//! the same matrix also shares a group element in the exponent.
//!
//! Everything here is a synchronous function of its inputs; a caller's
//! deadline applies between calls.

use std::collections::BTreeSet;

use ark_ec::{CurveGroup, VariableBaseMSM};
use ark_std::{cfg_iter, One, UniformRand, Zero};
use rand::{CryptoRng, Rng};
use tracing::debug;
use zeroize::Zeroize;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{PvgssError, Result};
use crate::secret_sharing::access_tree::{AccessTree, Policy};
use crate::secret_sharing::compiler;
use crate::secret_sharing::matrix::{dot, Matrix};
use crate::{F, G1};

/// An LSSS matrix together with the leaf identity behind each row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lsss {
    matrix: Matrix,
    labels: Vec<u64>,
}

impl Lsss {
    pub fn new(matrix: Matrix, labels: Vec<u64>) -> Result<Self> {
        if labels.len() != matrix.rows() {
            return Err(PvgssError::Dimension(format!(
                "{} row labels for {} rows",
                labels.len(),
                matrix.rows()
            )));
        }
        if matrix.cols() == 0 {
            return Err(PvgssError::Dimension("matrix has no columns".into()));
        }
        Ok(Self { matrix, labels })
    }

    pub fn from_tree(tree: &AccessTree) -> Result<Self> {
        compiler::compile(tree)
    }

    pub fn from_policy(policy: &Policy) -> Result<Self> {
        compiler::compile(&AccessTree::new(policy)?)
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn labels(&self) -> &[u64] {
        &self.labels
    }

    pub fn rows(&self) -> usize {
        self.matrix.rows()
    }

    pub fn cols(&self) -> usize {
        self.matrix.cols()
    }

    /// Every row whose leaf carries one of `ids`, in row order.
    pub fn rows_for(&self, ids: &[u64]) -> Vec<usize> {
        let ids: BTreeSet<u64> = ids.iter().copied().collect();
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, label)| ids.contains(label))
            .map(|(row, _)| row)
            .collect()
    }

    /// Shares a field element: one share per row.
    pub fn share<R: Rng + CryptoRng>(&self, secret: F, rng: &mut R) -> Result<Vec<F>> {
        let mut v = Vec::with_capacity(self.cols());
        v.push(secret);
        v.extend((1..self.cols()).map(|_| F::rand(rng)));

        let shares = self.matrix.mul_vec(&v);
        v.zeroize();
        shares
    }

    /// Shares a group element `S` in the exponent: row `i` receives
    /// `S^{λ_i}` where `λ` shares the scalar one.
    pub fn share_group_element<R: Rng + CryptoRng>(
        &self,
        element: G1,
        rng: &mut R,
    ) -> Result<Vec<G1>> {
        let mut lambdas = self.share(F::one(), rng)?;
        let shares = cfg_iter!(lambdas).map(|l| element * l).collect();
        lambdas.zeroize();
        Ok(shares)
    }

    /// `M_I^{-1}` for the square block formed by rows `rows` and the first
    /// `rows.len()` columns.
    pub fn inverse_submatrix(&self, rows: &[usize]) -> Result<Matrix> {
        self.matrix
            .select_rows(rows)?
            .restrict_columns(rows.len())?
            .invert()
    }

    /// Reconstruction coefficients for `rows`; see [`Quorum::prepare`].
    pub fn quorum(&self, rows: &[usize]) -> Result<Quorum> {
        Quorum::prepare(self, rows)
    }
}

/// Reconstruction coefficients for one set of rows.
///
/// A `Quorum` only exists once `w · M_I = e1` has been established over
/// every column, so reconstructing from it cannot silently produce a value
/// that is not the shared secret.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quorum {
    rows: Vec<usize>,
    coefficients: Vec<F>,
}

impl Quorum {
    /// Solves `w · M_I = e1` by elimination on `M_I^T`. Works for any
    /// authorized row set, including ones whose leading square block is
    /// singular.
    pub fn prepare(lsss: &Lsss, rows: &[usize]) -> Result<Self> {
        let sub = checked_rows(lsss, rows)?;
        let coefficients = sub.transpose().solve(&unit_vector(lsss.cols()))?;

        debug!(rows = rows.len(), "prepared quorum");
        Ok(Self {
            rows: rows.to_vec(),
            coefficients,
        })
    }

    /// Derives `w = e1^T · M_I^{-1}` from a precomputed inverse (see
    /// [`Lsss::inverse_submatrix`]) and checks it against the full rows.
    pub fn from_inverse(lsss: &Lsss, rows: &[usize], inverse: &Matrix) -> Result<Self> {
        let sub = checked_rows(lsss, rows)?;
        if inverse.rows() != rows.len() || !inverse.is_square() {
            return Err(PvgssError::Dimension(format!(
                "inverse is {}x{}, expected {}x{}",
                inverse.rows(),
                inverse.cols(),
                rows.len(),
                rows.len()
            )));
        }

        let coefficients = inverse.row(0).to_vec();
        let target = sub.vec_mul(&coefficients)?;
        if let Some(column) = target
            .iter()
            .zip(unit_vector(lsss.cols()))
            .position(|(x, e)| *x != e)
        {
            return Err(PvgssError::SingularMatrix { column });
        }

        Ok(Self {
            rows: rows.to_vec(),
            coefficients,
        })
    }

    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn coefficients(&self) -> &[F] {
        &self.coefficients
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Picks this quorum's entries out of a full per-row vector.
    pub fn select<T: Clone>(&self, all: &[T]) -> Result<Vec<T>> {
        self.rows
            .iter()
            .map(|&r| {
                all.get(r).cloned().ok_or_else(|| {
                    PvgssError::Dimension(format!("no entry for row {} among {}", r, all.len()))
                })
            })
            .collect()
    }

    /// `Σ w_i · share_i`, with `shares` in the order of [`Quorum::rows`].
    pub fn reconstruct(&self, shares: &[F]) -> Result<F> {
        self.check_len(shares.len())?;
        Ok(dot(&self.coefficients, shares))
    }

    /// `Π share_i^{w_i}`, with `shares` in the order of [`Quorum::rows`].
    pub fn reconstruct_group(&self, shares: &[G1]) -> Result<G1> {
        self.check_len(shares.len())?;
        let bases = G1::normalize_batch(shares);
        G1::msm(&bases, &self.coefficients).map_err(|n| {
            PvgssError::Dimension(format!("multi-scalar multiplication over {} terms", n))
        })
    }

    fn check_len(&self, n: usize) -> Result<()> {
        if n != self.rows.len() {
            return Err(PvgssError::Dimension(format!(
                "{} shares for a quorum of {} rows",
                n,
                self.rows.len()
            )));
        }
        Ok(())
    }
}

fn checked_rows(lsss: &Lsss, rows: &[usize]) -> Result<Matrix> {
    if rows.is_empty() {
        return Err(PvgssError::Dimension("empty row set".into()));
    }
    let distinct: BTreeSet<usize> = rows.iter().copied().collect();
    if distinct.len() != rows.len() {
        return Err(PvgssError::Dimension("row set lists a row twice".into()));
    }
    lsss.matrix().select_rows(rows)
}

fn unit_vector(len: usize) -> Vec<F> {
    let mut e = vec![F::zero(); len];
    e[0] = F::one();
    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::PrimeGroup;
    use rand::thread_rng;
    use rand_chacha::rand_core::SeedableRng;

    // leaf ids count up from `next`
    fn random_policy<R: Rng>(rng: &mut R, depth: usize, next: &mut u64) -> Policy {
        if depth == 0 || rng.gen_bool(0.3) {
            *next += 1;
            return Policy::leaf(*next);
        }
        let n = rng.gen_range(1..=3);
        let children = (0..n).map(|_| random_policy(rng, depth - 1, next)).collect();
        Policy::threshold(rng.gen_range(1..=n), children)
    }

    fn subsets(n: usize) -> impl Iterator<Item = Vec<usize>> {
        (1u32..(1 << n)).map(move |mask| (0..n).filter(|i| mask & (1 << i) != 0).collect())
    }

    #[test]
    fn test_reconstruction_matches_access_structure() {
        let mut rng = rand_chacha::ChaCha8Rng::from_seed([3u8; 32]);

        for _ in 0..12 {
            let policy = random_policy(&mut rng, 2, &mut 0);
            let tree = AccessTree::new(&policy).unwrap();
            let lsss = Lsss::from_tree(&tree).unwrap();

            let secret = F::rand(&mut rng);
            let shares = lsss.share(secret, &mut rng).unwrap();
            let element = G1::generator() * F::rand(&mut rng);
            let group_shares = lsss.share_group_element(element, &mut rng).unwrap();

            for rows in subsets(lsss.rows()) {
                let positions: BTreeSet<usize> = rows.iter().copied().collect();
                let authorized = tree.is_satisfied_by(&positions);

                match lsss.quorum(&rows) {
                    Ok(quorum) => {
                        assert!(authorized, "{:?} {:?}", policy, rows);
                        let recovered = quorum.reconstruct(&quorum.select(&shares).unwrap());
                        assert_eq!(recovered.unwrap(), secret);
                        let recovered =
                            quorum.reconstruct_group(&quorum.select(&group_shares).unwrap());
                        assert_eq!(recovered.unwrap(), element);
                    }
                    Err(PvgssError::SingularMatrix { .. }) => {
                        assert!(!authorized, "{:?} {:?}", policy, rows);
                    }
                    Err(e) => panic!("unexpected error {}", e),
                }

                // the square-block path may refuse an authorized set, but
                // must never accept an unauthorized one
                let from_inverse = lsss
                    .inverse_submatrix(&rows)
                    .and_then(|inverse| Quorum::from_inverse(&lsss, &rows, &inverse));
                match from_inverse {
                    Ok(quorum) => {
                        assert!(authorized, "{:?} {:?}", policy, rows);
                        let recovered = quorum.reconstruct(&quorum.select(&shares).unwrap());
                        assert_eq!(recovered.unwrap(), secret);
                        let recovered =
                            quorum.reconstruct_group(&quorum.select(&group_shares).unwrap());
                        assert_eq!(recovered.unwrap(), element);
                    }
                    Err(PvgssError::SingularMatrix { .. }) | Err(PvgssError::Dimension(_)) => {}
                    Err(e) => panic!("unexpected error {}", e),
                }
            }
        }
    }

    #[test]
    fn test_group_sharing() {
        let mut rng = thread_rng();
        let policy = Policy::and(vec![
            Policy::threshold(2, vec![Policy::leaf(1), Policy::leaf(2), Policy::leaf(3)]),
            Policy::leaf(4),
        ]);
        let lsss = Lsss::from_policy(&policy).unwrap();

        let element = G1::generator() * F::rand(&mut rng);
        let shares = lsss.share_group_element(element, &mut rng).unwrap();

        let rows = lsss.rows_for(&[2, 3, 4]);
        assert_eq!(rows, vec![1, 2, 3]);
        let quorum = lsss.quorum(&rows).unwrap();
        let recovered = quorum.reconstruct_group(&quorum.select(&shares).unwrap());
        assert_eq!(recovered.unwrap(), element);
    }

    #[test]
    fn test_from_inverse() {
        let mut rng = thread_rng();
        // rows: P1, P2, P3, seller, buyer
        let policy = Policy::and(vec![
            Policy::or(vec![
                Policy::threshold(2, vec![Policy::leaf(1), Policy::leaf(2), Policy::leaf(3)]),
                Policy::leaf(4),
            ]),
            Policy::leaf(5),
        ]);
        let lsss = Lsss::from_policy(&policy).unwrap();
        let secret = F::rand(&mut rng);
        let shares = lsss.share(secret, &mut rng).unwrap();

        for rows in [vec![3, 4], vec![0, 1, 4], vec![4, 2, 0]] {
            let inverse = lsss.inverse_submatrix(&rows).unwrap();
            let quorum = Quorum::from_inverse(&lsss, &rows, &inverse).unwrap();
            assert_eq!(quorum, Quorum::from_inverse(&lsss, &rows, &inverse).unwrap());
            let recovered = quorum.reconstruct(&quorum.select(&shares).unwrap()).unwrap();
            assert_eq!(recovered, secret);
        }

        // P1 and the buyer are not authorized, although their leading 2x2
        // block [[1, 1], [1, 2]] is invertible
        let rows = vec![0, 4];
        let inverse = lsss.inverse_submatrix(&rows).unwrap();
        assert!(matches!(
            Quorum::from_inverse(&lsss, &rows, &inverse),
            Err(PvgssError::SingularMatrix { .. })
        ));
        assert!(matches!(
            lsss.quorum(&rows),
            Err(PvgssError::SingularMatrix { .. })
        ));

        // the seller alone
        assert!(matches!(
            lsss.inverse_submatrix(&[3]).and_then(|inv| Quorum::from_inverse(&lsss, &[3], &inv)),
            Err(PvgssError::SingularMatrix { .. })
        ));
    }

    #[test]
    fn test_malformed_row_sets() {
        let lsss = Lsss::from_policy(&Policy::or(vec![Policy::leaf(1), Policy::leaf(2)])).unwrap();
        assert!(matches!(lsss.quorum(&[]), Err(PvgssError::Dimension(_))));
        assert!(matches!(lsss.quorum(&[0, 0]), Err(PvgssError::Dimension(_))));
        assert!(matches!(lsss.quorum(&[2]), Err(PvgssError::Dimension(_))));

        let quorum = lsss.quorum(&[1]).unwrap();
        assert!(matches!(
            quorum.reconstruct(&[F::one(), F::one()]),
            Err(PvgssError::Dimension(_))
        ));
        assert!(quorum.select(&[F::one()]).is_err());
    }
}
