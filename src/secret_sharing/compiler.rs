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

//! Compiles an [`AccessTree`] into an LSSS matrix by repeated structural
//! substitution (Benaloh-Leichter style).
//!
//! The compiler keeps a matrix `M` and a parallel worklist `L` of pending
//! nodes, one per row, starting from `M = [1]` and `L = [root]`. Each step
//! replaces the first pending gate (t-of-n, at row `z`) by its `n`
//! children:
//!
//! * every other row is zero-padded with `t - 1` new columns;
//! * row `z` is replaced by `n` copies of itself, where copy `x`
//!   (counting from 1) gets `x, x^2, ..., x^(t-1)` in the new columns.
//!
//! This embeds t-of-n Shamir sharing of row `z`'s share: the old columns
//! give the constant term and the new ones the random coefficients, so
//! any `t` copies are linearly independent over the new block while fewer
//! reveal nothing about the constant term.

use ark_std::{One, Zero};
use tracing::debug;

use crate::error::Result;
use crate::secret_sharing::access_tree::{AccessTree, Node, NodeId};
use crate::secret_sharing::lsss::Lsss;
use crate::secret_sharing::matrix::Matrix;
use crate::F;

/// Runs the substitution to completion. Row `i` of the result belongs to
/// the `i`-th leaf from the left.
pub fn compile(tree: &AccessTree) -> Result<Lsss> {
    let mut matrix = Matrix::from_rows(vec![vec![F::one()]])?;
    let mut pending: Vec<NodeId> = vec![tree.root()];

    while let Some((z, threshold, children)) =
        pending
            .iter()
            .enumerate()
            .find_map(|(z, &id)| match tree.node(id) {
                Node::Gate { threshold, children } => Some((z, *threshold, children)),
                Node::Leaf { .. } => None,
            })
    {
        matrix = expand(&matrix, z, threshold, children.len())?;
        pending.splice(z..=z, children.iter().copied());
    }

    let labels = pending
        .iter()
        .filter_map(|&id| match tree.node(id) {
            Node::Leaf { id } => Some(*id),
            Node::Gate { .. } => None,
        })
        .collect();

    debug!(
        rows = matrix.rows(),
        cols = matrix.cols(),
        "compiled access tree"
    );
    Lsss::new(matrix, labels)
}

/// One substitution step: row `z` becomes `n` rows and `t - 1` columns are
/// appended.
fn expand(m: &Matrix, z: usize, t: usize, n: usize) -> Result<Matrix> {
    let extra = t - 1;
    let mut rows = Vec::with_capacity(m.rows() + n - 1);

    let padded = |row: &[F]| {
        let mut r = Vec::with_capacity(row.len() + extra);
        r.extend_from_slice(row);
        r.resize(row.len() + extra, F::zero());
        r
    };

    rows.extend(m.iter_rows().take(z).map(padded));

    let gate_row = m.row(z);
    for k in 1..=n {
        let x = F::from(k as u64);
        let mut r = Vec::with_capacity(gate_row.len() + extra);
        r.extend_from_slice(gate_row);
        let mut power = x;
        for _ in 0..extra {
            r.push(power);
            power *= x;
        }
        rows.push(r);
    }

    rows.extend(m.iter_rows().skip(z + 1).map(padded));

    Matrix::from_rows(rows)
}
