use thiserror::Error;

/// Row-major `f32` array with explicit dimensions.
///
/// A zero-dimensional shape (`[]`) holds exactly one element, matching the
/// usual scalar-tensor convention.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamArray {
    pub(crate) shape: Vec<usize>,
    pub(crate) data: Vec<f32>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArrayError {
    #[error("Shape mismatch: {expected:?} vs {got:?}")]
    ShapeMismatch { expected: Vec<usize>, got: Vec<usize> },
    #[error("Shape {shape:?} holds {expected} elements, got {got}")]
    ElementCount {
        shape: Vec<usize>,
        expected: usize,
        got: usize,
    },
}

/// Number of elements described by `shape`.
pub fn numel(shape: &[usize]) -> usize {
    shape.iter().product()
}

impl ParamArray {
    /// Wrap `data` with the given dimensions.
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, ArrayError> {
        let expected = numel(&shape);
        if expected != data.len() {
            return Err(ArrayError::ElementCount {
                shape,
                expected,
                got: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Create an array of zeros
    pub fn zeros(shape: Vec<usize>) -> Self {
        let n = numel(&shape);
        Self {
            shape,
            data: vec![0.0; n],
        }
    }

    /// One-dimensional array over `data`.
    pub fn from_vec(data: Vec<f32>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    /// Zero-dimensional array holding a single value.
    pub fn scalar(value: f32) -> Self {
        Self {
            shape: Vec::new(),
            data: vec![value],
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Row-major view of the elements.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
