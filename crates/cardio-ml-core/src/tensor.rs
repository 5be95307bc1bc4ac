use crate::dtype::Float;
use crate::error::{MlError, MlResult};
use crate::shape::Shape;

use serde::{Deserialize, Serialize};

/// Dense row-major tensor. Feature matrices are 2-D `[samples, features]`,
/// label vectors are 1-D.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct Tensor<T: Float> {
    data: Vec<T>,
    shape: Shape,
}

// ─── Construction ───────────────────────────────────────────────────────────

impl<T: Float> Tensor<T> {
    /// Create a tensor from raw data and shape.
    pub fn new(data: Vec<T>, shape: Vec<usize>) -> MlResult<Self> {
        let s = Shape::new(shape);
        if data.len() != s.numel() {
            return Err(MlError::ShapeMismatch {
                expected: s.to_vec(),
                got: vec![data.len()],
            });
        }
        Ok(Tensor { data, shape: s })
    }

    /// Create a tensor filled with zeros.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let s = Shape::new(shape);
        Tensor {
            data: vec![T::ZERO; s.numel()],
            shape: s,
        }
    }

    /// Create a 1-D tensor from a slice.
    pub fn from_slice(data: &[T]) -> Self {
        Tensor {
            data: data.to_vec(),
            shape: Shape::new(vec![data.len()]),
        }
    }

    /// Create a 2-D tensor from rows.
    pub fn from_vec2d(rows: &[Vec<T>]) -> MlResult<Self> {
        if rows.is_empty() {
            return Ok(Tensor::zeros(vec![0, 0]));
        }
        let cols = rows[0].len();
        if rows.iter().any(|r| r.len() != cols) {
            return Err(MlError::InvalidOperation(
                "All rows must have the same number of columns".to_string(),
            ));
        }
        let flat: Vec<T> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Tensor::new(flat, vec![rows.len(), cols])
    }

    /// Create a 2-D tensor from columns of equal length.
    pub fn from_columns(columns: &[Vec<T>]) -> MlResult<Self> {
        let rows = columns.first().map(|c| c.len()).unwrap_or(0);
        if columns.iter().any(|c| c.len() != rows) {
            return Err(MlError::InvalidOperation(
                "All columns must have the same length".to_string(),
            ));
        }
        let cols = columns.len();
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for column in columns {
                data.push(column[i]);
            }
        }
        Tensor::new(data, vec![rows, cols])
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn shape_vec(&self) -> Vec<usize> {
        self.shape.to_vec()
    }

    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    /// Number of rows of a 2-D tensor (samples).
    pub fn nrows(&self) -> MlResult<usize> {
        self.require_2d("nrows")?;
        self.shape.dim(0)
    }

    /// Number of columns of a 2-D tensor (features).
    pub fn ncols(&self) -> MlResult<usize> {
        self.require_2d("ncols")?;
        self.shape.dim(1)
    }

    fn require_2d(&self, op: &str) -> MlResult<()> {
        if self.ndim() != 2 {
            return Err(MlError::InvalidOperation(format!(
                "{}() requires a 2D tensor, got shape {}",
                op, self.shape
            )));
        }
        Ok(())
    }

    fn offset(&self, indices: &[usize]) -> MlResult<usize> {
        if indices.len() != self.ndim() {
            return Err(MlError::DimensionMismatch(format!(
                "Expected {} indices, got {}",
                self.ndim(),
                indices.len()
            )));
        }
        let strides = self.shape.strides();
        let mut offset = 0;
        for (axis, &idx) in indices.iter().enumerate() {
            let size = self.shape.dim(axis)?;
            if idx >= size {
                return Err(MlError::IndexOutOfBounds {
                    index: idx,
                    axis,
                    size,
                });
            }
            offset += idx * strides[axis];
        }
        Ok(offset)
    }

    /// Multi-dimensional element read.
    pub fn get(&self, indices: &[usize]) -> MlResult<T> {
        Ok(self.data[self.offset(indices)?])
    }

    /// Multi-dimensional element write.
    pub fn set(&mut self, indices: &[usize], value: T) -> MlResult<()> {
        let offset = self.offset(indices)?;
        self.data[offset] = value;
        Ok(())
    }

    /// Borrow row `i` of a 2-D tensor.
    pub fn row(&self, i: usize) -> MlResult<&[T]> {
        let rows = self.nrows()?;
        let cols = self.ncols()?;
        if i >= rows {
            return Err(MlError::IndexOutOfBounds {
                index: i,
                axis: 0,
                size: rows,
            });
        }
        Ok(&self.data[i * cols..(i + 1) * cols])
    }

    /// Copy column `j` of a 2-D tensor.
    pub fn col(&self, j: usize) -> MlResult<Vec<T>> {
        let rows = self.nrows()?;
        let cols = self.ncols()?;
        if j >= cols {
            return Err(MlError::IndexOutOfBounds {
                index: j,
                axis: 1,
                size: cols,
            });
        }
        Ok((0..rows).map(|i| self.data[i * cols + j]).collect())
    }

    // ─── Selection ──────────────────────────────────────────────────────────

    /// Gather samples by index. Works on 1-D (labels) and 2-D (features).
    pub fn select_rows(&self, indices: &[usize]) -> MlResult<Tensor<T>> {
        let rows = self.shape.dim(0)?;
        let width: usize = self.shape.dims()[1..].iter().product();
        let mut data = Vec::with_capacity(indices.len() * width);
        for &i in indices {
            if i >= rows {
                return Err(MlError::IndexOutOfBounds {
                    index: i,
                    axis: 0,
                    size: rows,
                });
            }
            data.extend_from_slice(&self.data[i * width..(i + 1) * width]);
        }
        let mut dims = self.shape.to_vec();
        dims[0] = indices.len();
        Tensor::new(data, dims)
    }

    /// Gather feature columns by index from a 2-D tensor.
    pub fn select_cols(&self, indices: &[usize]) -> MlResult<Tensor<T>> {
        let rows = self.nrows()?;
        let cols = self.ncols()?;
        if let Some(&bad) = indices.iter().find(|&&j| j >= cols) {
            return Err(MlError::IndexOutOfBounds {
                index: bad,
                axis: 1,
                size: cols,
            });
        }
        let mut data = Vec::with_capacity(rows * indices.len());
        for i in 0..rows {
            for &j in indices {
                data.push(self.data[i * cols + j]);
            }
        }
        Tensor::new(data, vec![rows, indices.len()])
    }

    /// Concatenate 2-D tensors side by side (same number of rows).
    pub fn hstack(blocks: &[&Tensor<T>]) -> MlResult<Tensor<T>> {
        let Some(first) = blocks.first() else {
            return Err(MlError::EmptyTensor);
        };
        let rows = first.nrows()?;
        let mut total_cols = 0;
        for b in blocks {
            let r = b.nrows()?;
            if r != rows {
                return Err(MlError::ShapeMismatch {
                    expected: vec![rows],
                    got: vec![r],
                });
            }
            total_cols += b.ncols()?;
        }
        let mut data = Vec::with_capacity(rows * total_cols);
        for i in 0..rows {
            for b in blocks {
                data.extend_from_slice(b.row(i)?);
            }
        }
        Tensor::new(data, vec![rows, total_cols])
    }

    // ─── Element-wise ───────────────────────────────────────────────────────

    pub fn apply<F: Fn(T) -> T>(&self, f: F) -> Tensor<T> {
        Tensor {
            data: self.data.iter().map(|&x| f(x)).collect(),
            shape: self.shape.clone(),
        }
    }

    // ─── Reductions ─────────────────────────────────────────────────────────

    /// Sum of all elements.
    pub fn sum_all(&self) -> T {
        self.data.iter().copied().sum()
    }

    /// Mean of all elements.
    pub fn mean_all(&self) -> MlResult<T> {
        if self.data.is_empty() {
            return Err(MlError::EmptyTensor);
        }
        Ok(self.sum_all() / T::from_usize(self.numel()))
    }

    /// Max of all elements.
    pub fn max_all(&self) -> MlResult<T> {
        self.data
            .iter()
            .copied()
            .reduce(T::max)
            .ok_or(MlError::EmptyTensor)
    }

    /// Min of all elements.
    pub fn min_all(&self) -> MlResult<T> {
        self.data
            .iter()
            .copied()
            .reduce(T::min)
            .ok_or(MlError::EmptyTensor)
    }

    /// Per-column mean of a 2-D tensor.
    pub fn mean_axis0(&self) -> MlResult<Tensor<T>> {
        let rows = self.nrows()?;
        let cols = self.ncols()?;
        if rows == 0 {
            return Err(MlError::EmptyTensor);
        }
        let mut sums = vec![T::ZERO; cols];
        for i in 0..rows {
            for (j, s) in sums.iter_mut().enumerate() {
                *s += self.data[i * cols + j];
            }
        }
        let n = T::from_usize(rows);
        Ok(Tensor::from_slice(
            &sums.into_iter().map(|s| s / n).collect::<Vec<_>>(),
        ))
    }

    /// Per-column population standard deviation of a 2-D tensor.
    pub fn std_axis0(&self) -> MlResult<Tensor<T>> {
        let mean = self.mean_axis0()?;
        let rows = self.nrows()?;
        let cols = self.ncols()?;
        let mut acc = vec![T::ZERO; cols];
        for i in 0..rows {
            for (j, a) in acc.iter_mut().enumerate() {
                let d = self.data[i * cols + j] - mean.data[j];
                *a += d * d;
            }
        }
        let n = T::from_usize(rows);
        Ok(Tensor::from_slice(
            &acc.into_iter().map(|a| (a / n).sqrt()).collect::<Vec<_>>(),
        ))
    }
}

impl<T: Float> PartialEq for Tensor<T> {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && self.data == other.data
    }
}
