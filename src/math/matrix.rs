use rand::Rng;
use serde::{Serialize, Deserialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::activation::rectifier::Rectifier;
use crate::error::{Error, Result};

/// Dense row-major matrix of `f64`.
///
/// Every arithmetic operation is shape-checked and follows one numeric policy:
/// a finite-by-finite computation that overflows to `±∞` saturates to
/// `f64::MAX` / `f64::MIN`, and a `NaN` result is a [`Error::NumericFault`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Matrix{
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>
}

impl Matrix{
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix{
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows]
        }
    }

    /// Builds a matrix from literal rows. The first row fixes the column count;
    /// empty input and ragged rows are rejected.
    pub fn from_data(data: Vec<Vec<f64>>) -> Result<Matrix> {
        let cols = match data.first() {
            Some(row) => row.len(),
            None => return Err(Error::ShapeMismatch("matrix needs at least one row".to_owned())),
        };
        if let Some((i, row)) = data.iter().enumerate().find(|(_, row)| row.len() != cols) {
            return Err(Error::ShapeMismatch(format!(
                "row {i} has {} columns, expected {cols}",
                row.len()
            )));
        }

        Ok(Matrix {
            rows: data.len(),
            cols,
            data
        })
    }

    /// Lifts a vector into an `n × 1` column.
    pub fn column(values: &[f64]) -> Matrix {
        Matrix {
            rows: values.len(),
            cols: 1,
            data: values.iter().map(|&x| vec![x]).collect(),
        }
    }

    /// Row-major flattening; for a column this is the original vector.
    pub fn to_vec(&self) -> Vec<f64> {
        self.data.iter().flatten().copied().collect()
    }

    pub fn same_shape(&self, other: &Matrix) -> bool {
        self.rows == other.rows && self.cols == other.cols
    }

    /// Checks that `data` really is `rows × cols`. Only matrices that did not
    /// come from a constructor, such as deserialized ones, can fail this.
    pub fn check_layout(&self) -> Result<()> {
        if self.data.len() != self.rows {
            return Err(Error::ShapeMismatch(format!(
                "{}x{} matrix holds {} rows",
                self.rows,
                self.cols,
                self.data.len()
            )));
        }
        if let Some((i, row)) = self.data.iter().enumerate().find(|(_, row)| row.len() != self.cols) {
            return Err(Error::ShapeMismatch(format!(
                "row {i} of a {}x{} matrix has {} columns",
                self.rows,
                self.cols,
                row.len()
            )));
        }
        Ok(())
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }

        res
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().flatten().sum()
    }

    /// Element-wise map into a new matrix.
    pub fn apply<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect(),
        }
    }

    /// Element-wise binary map; `functor` receives `(self, other)` cells.
    pub fn apply_with<F>(&self, other: &Matrix, functor: F) -> Result<Matrix>
    where
        F: Fn(f64, f64) -> f64,
    {
        self.check_same_shape(other, "apply")?;
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(other.data.iter())
                .map(|(a, b)| a.iter().zip(b.iter()).map(|(&x, &y)| functor(x, y)).collect())
                .collect(),
        })
    }

    pub fn add(&self, other: &Matrix) -> Result<Matrix> {
        self.zip_checked(other, "+", |a, b| a + b)
    }

    pub fn subtract(&self, other: &Matrix) -> Result<Matrix> {
        self.zip_checked(other, "-", |a, b| a - b)
    }

    /// Hadamard product.
    pub fn multiply(&self, other: &Matrix) -> Result<Matrix> {
        self.zip_checked(other, "*", |a, b| a * b)
    }

    pub fn divide(&self, other: &Matrix) -> Result<Matrix> {
        self.zip_checked(other, "/", |a, b| a / b)
    }

    pub fn scale(&self, factor: f64) -> Result<Matrix> {
        self.map_checked(factor, "*", |a, b| a * b)
    }

    pub fn divide_scalar(&self, divisor: f64) -> Result<Matrix> {
        self.map_checked(divisor, "/", |a, b| a / b)
    }

    /// In-place `self += other`; `self` is untouched when the call fails.
    pub fn add_assign_checked(&mut self, other: &Matrix) -> Result<()> {
        *self = self.add(other)?;
        Ok(())
    }

    /// Standard `m×k · k×n` product.
    ///
    /// A term pairing `±∞` with an exact `0` contributes `0` rather than `NaN`.
    pub fn matmul(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.cols != rhs.rows {
            return Err(Error::ShapeMismatch(format!(
                "cannot multiply {}x{} by {}x{}",
                self.rows, self.cols, rhs.rows, rhs.cols
            )));
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);

        for i in 0..res.rows {
            for j in 0..res.cols {
                let mut sum = 0.0;

                for k in 0..self.cols {
                    let a = self.data[i][k];
                    let b = rhs.data[k][j];
                    let product = if (a.is_infinite() && b == 0.0) || (b.is_infinite() && a == 0.0) {
                        0.0
                    } else {
                        saturate(a * b, a, b, "*")?
                    };
                    sum = saturate(sum + product, sum, product, "+")?;
                }

                res.data[i][j] = sum;
            }
        }

        Ok(res)
    }

    /// Cell-wise arithmetic mean of two or more equal-shaped matrices.
    pub fn merge(matrices: &[&Matrix]) -> Result<Matrix> {
        if matrices.len() < 2 {
            return Err(Error::InvalidArgument(format!(
                "merge needs at least 2 matrices, got {}",
                matrices.len()
            )));
        }
        let mut acc = matrices[0].clone();
        for m in &matrices[1..] {
            acc.add_assign_checked(m)?;
        }
        acc.divide_scalar(matrices.len() as f64)
    }

    /// Activates every cell in place. Softmax-style rectifiers get their
    /// whole-matrix normalization term computed once up front.
    pub fn activate(&mut self, rectifier: Rectifier) -> Result<()> {
        let normalization = rectifier.normalization(self);
        for cell in self.data.iter_mut().flatten() {
            let y = rectifier.activate(*cell, normalization);
            if !y.is_finite() {
                return Err(Error::NumericFault(format!(
                    "{rectifier:?} activation of {} produced {y}",
                    *cell
                )));
            }
            *cell = y;
        }
        Ok(())
    }

    /// Per-cell derivative, reading `self` as already-activated values.
    pub fn derive(&self, rectifier: Rectifier) -> Result<Matrix> {
        let res = self.apply(|y| rectifier.derive(y));
        if let Some(bad) = res.data.iter().flatten().find(|d| !d.is_finite()) {
            return Err(Error::NumericFault(format!(
                "{rectifier:?} derivative produced {bad}"
            )));
        }
        Ok(res)
    }

    /// Genetic mutation: each cell, with probability `mutation_rate`, moves by
    /// `U(-1, 1) * factor`.
    pub fn randomize<R: Rng + ?Sized>(&mut self, factor: f64, mutation_rate: f64, rng: &mut R) {
        for cell in self.data.iter_mut().flatten() {
            if rng.gen::<f64>() < mutation_rate {
                let shift = (rng.gen::<f64>() * 2.0 - 1.0) * factor;
                *cell = (*cell + shift).clamp(f64::MIN, f64::MAX);
            }
        }
    }

    /// Copy with each cell independently zeroed with probability `factor`.
    pub fn dropout<R: Rng + ?Sized>(&self, factor: f64, rng: &mut R) -> Matrix {
        let mut res = self.clone();
        for cell in res.data.iter_mut().flatten() {
            if rng.gen::<f64>() < factor {
                *cell = 0.0;
            }
        }
        res
    }

    fn check_same_shape(&self, other: &Matrix, op: &str) -> Result<()> {
        if !self.same_shape(other) {
            return Err(Error::ShapeMismatch(format!(
                "{op}: {}x{} vs {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        Ok(())
    }

    fn zip_checked<F>(&self, other: &Matrix, op: &str, f: F) -> Result<Matrix>
    where
        F: Fn(f64, f64) -> f64,
    {
        self.check_same_shape(other, op)?;

        let mut res = Matrix::zeros(self.rows, self.cols);

        for i in 0..self.rows {
            for j in 0..self.cols {
                let (a, b) = (self.data[i][j], other.data[i][j]);
                res.data[i][j] = saturate(f(a, b), a, b, op)?;
            }
        }

        Ok(res)
    }

    fn map_checked<F>(&self, scalar: f64, op: &str, f: F) -> Result<Matrix>
    where
        F: Fn(f64, f64) -> f64,
    {
        let mut res = Matrix::zeros(self.rows, self.cols);

        for i in 0..self.rows {
            for j in 0..self.cols {
                let a = self.data[i][j];
                res.data[i][j] = saturate(f(a, scalar), a, scalar, op)?;
            }
        }

        Ok(res)
    }
}

/// Clamps finite-operand overflow and rejects `NaN`.
fn saturate(value: f64, lhs: f64, rhs: f64, op: &str) -> Result<f64> {
    if value.is_nan() {
        return Err(Error::NumericFault(format!("{lhs} {op} {rhs} is NaN")));
    }
    if value.is_infinite() && lhs.is_finite() && rhs.is_finite() {
        return Ok(if value > 0.0 { f64::MAX } else { f64::MIN });
    }
    Ok(value)
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)?;
        for row in &self.data {
            write!(f, "\n[")?;
            for (j, x) in row.iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{x:?}")?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

// Equality and hashing go through the printed form, so `0.0 != -0.0` here.
impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Eq for Matrix {}

impl Hash for Matrix {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}
