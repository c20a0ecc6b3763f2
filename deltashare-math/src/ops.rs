use super::{ArrayError, ParamArray};

impl ParamArray {
    fn check_same_shape(&self, other: &Self) -> Result<(), ArrayError> {
        if self.shape() != other.shape() {
            return Err(ArrayError::ShapeMismatch {
                expected: self.shape().to_vec(),
                got: other.shape().to_vec(),
            });
        }
        Ok(())
    }

    /// Element-wise addition
    pub fn add(&self, other: &Self) -> Result<Self, ArrayError> {
        let mut out = self.clone();
        out.add_assign(other)?;
        Ok(out)
    }

    /// In-place element-wise addition.
    /// Used when folding a round's deltas into one accumulated signal.
    pub fn add_assign(&mut self, other: &Self) -> Result<(), ArrayError> {
        self.check_same_shape(other)?;
        for (a, &b) in self.data.iter_mut().zip(other.data.iter()) {
            *a += b;
        }
        Ok(())
    }

    /// Largest absolute value, or 0.0 for an empty array.
    pub fn abs_max(&self) -> f32 {
        self.data().iter().map(|x| x.abs()).fold(0.0f32, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add() {
        let a = ParamArray::from_vec(vec![1.0, 2.0]);
        let b = ParamArray::from_vec(vec![0.5, -0.5]);
        let c = a.add(&b).unwrap();
        assert_eq!(c.data(), &[1.5, 1.5]);
    }

    #[test]
    fn test_add_shape_mismatch() {
        let a = ParamArray::zeros(vec![2, 2]);
        let b = ParamArray::zeros(vec![4]);
        assert!(matches!(a.add(&b), Err(ArrayError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_add_assign_keeps_shape() {
        let mut a = ParamArray::new(vec![2, 1], vec![1.0, 2.0]).unwrap();
        let b = ParamArray::new(vec![2, 1], vec![3.0, 4.0]).unwrap();
        a.add_assign(&b).unwrap();
        assert_eq!(a.shape(), &[2, 1]);
        assert_eq!(a.data(), &[4.0, 6.0]);
    }

    #[test]
    fn test_abs_max() {
        let a = ParamArray::from_vec(vec![3.0, -10.0, 5.0]);
        assert_eq!(a.abs_max(), 10.0);
        assert_eq!(ParamArray::from_vec(vec![]).abs_max(), 0.0);
    }
}
