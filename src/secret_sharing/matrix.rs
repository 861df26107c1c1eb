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

//! Dense matrices over the scalar field, with exact Gauss-Jordan inversion.
//!
//! All arithmetic happens in `F`, so every accumulation is reduced modulo
//! the group order as it is performed.

use std::fmt;

use ark_ff::Field;
use ark_std::{One, Zero};

use crate::error::{PvgssError, Result};
use crate::F;

/// A rows x cols grid of field elements, stored row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    entries: Vec<Vec<F>>,
}

impl Matrix {
    /// Builds a matrix from its rows; every row must have the same length.
    pub fn from_rows(entries: Vec<Vec<F>>) -> Result<Self> {
        let rows = entries.len();
        let cols = entries.first().map_or(0, |r| r.len());
        if let Some(bad) = entries.iter().position(|r| r.len() != cols) {
            return Err(PvgssError::Dimension(format!(
                "row {} has {} entries, expected {}",
                bad,
                entries[bad].len(),
                cols
            )));
        }
        Ok(Self { rows, cols, entries })
    }

    /// Convenience constructor for small integer matrices.
    pub fn from_u64_rows(rows: &[&[u64]]) -> Result<Self> {
        Self::from_rows(
            rows.iter()
                .map(|r| r.iter().map(|&x| F::from(x)).collect())
                .collect(),
        )
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            entries: vec![vec![F::zero(); cols]; rows],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut id = Self::zeros(n, n);
        for i in 0..n {
            id.entries[i][i] = F::one();
        }
        id
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn row(&self, i: usize) -> &[F] {
        &self.entries[i]
    }

    pub fn get(&self, i: usize, j: usize) -> F {
        self.entries[i][j]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[F]> {
        self.entries.iter().map(|r| r.as_slice())
    }

    pub fn transpose(&self) -> Self {
        let mut t = Self::zeros(self.cols, self.rows);
        for (i, row) in self.entries.iter().enumerate() {
            for (j, x) in row.iter().enumerate() {
                t.entries[j][i] = *x;
            }
        }
        t
    }

    /// Matrix product `self * other`.
    pub fn mul(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(PvgssError::Dimension(format!(
                "cannot multiply {}x{} by {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )));
        }

        let mut product = Self::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for j in 0..other.cols {
                product.entries[i][j] = (0..self.cols)
                    .map(|k| self.entries[i][k] * other.entries[k][j])
                    .sum();
            }
        }
        Ok(product)
    }

    /// Matrix-vector product `self * v`.
    pub fn mul_vec(&self, v: &[F]) -> Result<Vec<F>> {
        if self.cols != v.len() {
            return Err(PvgssError::Dimension(format!(
                "cannot multiply {}x{} by a vector of length {}",
                self.rows,
                self.cols,
                v.len()
            )));
        }
        Ok(self.entries.iter().map(|row| dot(row, v)).collect())
    }

    /// Row vector times matrix, `v^T * self`.
    pub fn vec_mul(&self, v: &[F]) -> Result<Vec<F>> {
        self.transpose().mul_vec(v)
    }

    /// The rows named by `indices`, in that order.
    pub fn select_rows(&self, indices: &[usize]) -> Result<Matrix> {
        let mut entries = Vec::with_capacity(indices.len());
        for &i in indices {
            let row = self.entries.get(i).ok_or_else(|| {
                PvgssError::Dimension(format!("row {} out of range ({} rows)", i, self.rows))
            })?;
            entries.push(row.clone());
        }
        Ok(Matrix {
            rows: indices.len(),
            cols: self.cols,
            entries,
        })
    }

    /// The leftmost `cols` columns.
    pub fn restrict_columns(&self, cols: usize) -> Result<Matrix> {
        if cols > self.cols {
            return Err(PvgssError::Dimension(format!(
                "cannot keep {} of {} columns",
                cols, self.cols
            )));
        }
        Ok(Matrix {
            rows: self.rows,
            cols,
            entries: self.entries.iter().map(|r| r[..cols].to_vec()).collect(),
        })
    }

    /// Gauss-Jordan inversion over `F`.
    ///
    /// A zero pivot is replaced by the first nonzero entry below it in the
    /// same column; if there is none the matrix is singular.
    pub fn invert(&self) -> Result<Matrix> {
        if !self.is_square() {
            return Err(PvgssError::Dimension(format!(
                "cannot invert a {}x{} matrix",
                self.rows, self.cols
            )));
        }
        let n = self.rows;

        // augmented matrix [A | I]
        let mut aug: Vec<Vec<F>> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let mut r = Vec::with_capacity(2 * n);
                r.extend_from_slice(row);
                r.extend((0..n).map(|j| if i == j { F::one() } else { F::zero() }));
                r
            })
            .collect();

        for i in 0..n {
            if aug[i][i].is_zero() {
                let swap = (i + 1..n)
                    .find(|&j| !aug[j][i].is_zero())
                    .ok_or(PvgssError::SingularMatrix { column: i })?;
                aug.swap(i, swap);
            }

            let inv = aug[i][i]
                .inverse()
                .ok_or(PvgssError::SingularMatrix { column: i })?;
            for x in aug[i].iter_mut() {
                *x *= inv;
            }

            let pivot_row = aug[i].clone();
            for (j, row) in aug.iter_mut().enumerate() {
                if j == i || row[i].is_zero() {
                    continue;
                }
                let factor = row[i];
                for (x, p) in row.iter_mut().zip(pivot_row.iter()) {
                    *x -= factor * p;
                }
            }
        }

        Ok(Matrix {
            rows: n,
            cols: n,
            entries: aug.into_iter().map(|r| r[n..].to_vec()).collect(),
        })
    }

    /// Finds some `x` with `self * x = b`, or fails with `SingularMatrix`
    /// when the system is inconsistent. Free variables are set to zero.
    pub fn solve(&self, b: &[F]) -> Result<Vec<F>> {
        if b.len() != self.rows {
            return Err(PvgssError::Dimension(format!(
                "right-hand side has length {}, expected {}",
                b.len(),
                self.rows
            )));
        }

        let mut aug: Vec<Vec<F>> = self
            .entries
            .iter()
            .zip(b)
            .map(|(row, y)| {
                let mut r = row.clone();
                r.push(*y);
                r
            })
            .collect();

        // reduced row echelon form; pivots[k] is the column of the k-th pivot
        let mut pivots = Vec::new();
        let mut rank = 0;
        for col in 0..self.cols {
            let Some(p) = (rank..self.rows).find(|&r| !aug[r][col].is_zero()) else {
                continue;
            };
            aug.swap(rank, p);

            let inv = aug[rank][col]
                .inverse()
                .ok_or(PvgssError::SingularMatrix { column: col })?;
            for x in aug[rank].iter_mut() {
                *x *= inv;
            }

            let pivot_row = aug[rank].clone();
            for (j, row) in aug.iter_mut().enumerate() {
                if j == rank || row[col].is_zero() {
                    continue;
                }
                let factor = row[col];
                for (x, p) in row.iter_mut().zip(pivot_row.iter()) {
                    *x -= factor * p;
                }
            }

            pivots.push(col);
            rank += 1;
            if rank == self.rows {
                break;
            }
        }

        // a zero row with nonzero right-hand side means no solution
        if (rank..self.rows).any(|r| !aug[r][self.cols].is_zero()) {
            return Err(PvgssError::SingularMatrix { column: self.cols });
        }

        let mut x = vec![F::zero(); self.cols];
        for (k, &col) in pivots.iter().enumerate() {
            x[col] = aug[k][self.cols];
        }
        Ok(x)
    }
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Matrix {}x{} [", self.rows, self.cols)?;
        for row in &self.entries {
            let cells: Vec<String> = row.iter().map(|x| x.to_string()).collect();
            writeln!(f, "  [{}]", cells.join(", "))?;
        }
        write!(f, "]")
    }
}

pub fn dot(a: &[F], b: &[F]) -> F {
    a.iter().zip(b).map(|(x, y)| *x * y).sum()
}
