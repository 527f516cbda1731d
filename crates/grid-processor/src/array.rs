//! Dense row-major arrays with named dimensions.

use netcdf_parser::Variable;

use crate::error::{PipelineError, Result};

/// An n-dimensional array in row-major order, last dimension fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct GridArray {
    pub dims: Vec<String>,
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

impl GridArray {
    pub fn new(dims: Vec<String>, shape: Vec<usize>, data: Vec<f64>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if dims.len() != shape.len() || data.len() != expected {
            return Err(PipelineError::shape(format!(
                "array with dims {:?} and shape {:?} cannot hold {} values",
                dims,
                shape,
                data.len()
            )));
        }
        Ok(Self { dims, shape, data })
    }

    pub fn from_variable(var: &Variable) -> Result<Self> {
        Self::new(var.dims.clone(), var.shape.clone(), var.data.clone())
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn dim_index(&self, name: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == name)
    }

    /// `(outer, len, inner)` strides around `axis`.
    fn split(&self, axis: usize) -> (usize, usize, usize) {
        let outer = self.shape[..axis].iter().product();
        let inner = self.shape[axis + 1..].iter().product();
        (outer, self.shape[axis], inner)
    }

    /// Select `index` along `axis` and drop that axis.
    pub fn take(&self, axis: usize, index: usize) -> Result<GridArray> {
        if axis >= self.ndim() || index >= self.shape[axis] {
            return Err(PipelineError::shape(format!(
                "cannot take index {} of axis {} from shape {:?}",
                index, axis, self.shape
            )));
        }

        let (outer, len, inner) = self.split(axis);
        let mut data = Vec::with_capacity(outer * inner);
        for o in 0..outer {
            let start = (o * len + index) * inner;
            data.extend_from_slice(&self.data[start..start + inner]);
        }

        let mut dims = self.dims.clone();
        let mut shape = self.shape.clone();
        dims.remove(axis);
        shape.remove(axis);

        Ok(GridArray { dims, shape, data })
    }

    /// Reverse the order of elements along `axis`, in place.
    pub fn flip(&mut self, axis: usize) {
        if axis >= self.ndim() {
            return;
        }

        let (outer, len, inner) = self.split(axis);
        for o in 0..outer {
            let base = o * len * inner;
            for k in 0..len / 2 {
                let a = base + k * inner;
                let b = base + (len - 1 - k) * inner;
                for e in 0..inner {
                    self.data.swap(a + e, b + e);
                }
            }
        }
    }

    /// Replace every NaN with `value`; returns how many were replaced.
    pub fn fill_nan(&mut self, value: f64) -> usize {
        let mut count = 0;
        for v in self.data.iter_mut().filter(|v| v.is_nan()) {
            *v = value;
            count += 1;
        }
        count
    }

    /// Prepend a length-1 axis.
    pub fn insert_leading_axis(&mut self, name: &str) {
        self.dims.insert(0, name.to_string());
        self.shape.insert(0, 1);
    }

    /// Minimum and maximum, ignoring NaN.
    pub fn range(&self) -> Option<(f64, f64)> {
        self.data
            .iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array(shape: &[usize]) -> GridArray {
        let dims = (0..shape.len()).map(|d| format!("d{}", d)).collect();
        let len = shape.iter().product::<usize>();
        GridArray::new(dims, shape.to_vec(), (0..len).map(|v| v as f64).collect()).unwrap()
    }

    #[test]
    fn test_new_rejects_wrong_length() {
        let err = GridArray::new(vec!["a".into()], vec![3], vec![1.0]);
        assert!(matches!(err, Err(PipelineError::Shape(_))));
    }

    #[test]
    fn test_take_middle_axis() {
        // shape (2, 3, 2): take index 1 of axis 1
        let a = array(&[2, 3, 2]);
        let t = a.take(1, 1).unwrap();
        assert_eq!(t.shape, vec![2, 2]);
        assert_eq!(t.dims, vec!["d0", "d2"]);
        assert_eq!(t.data, vec![2.0, 3.0, 8.0, 9.0]);
    }

    #[test]
    fn test_take_out_of_range() {
        let a = array(&[2, 2]);
        assert!(a.take(0, 2).is_err());
        assert!(a.take(2, 0).is_err());
    }

    #[test]
    fn test_flip_second_to_last() {
        // (2, 3, 2) flipped along rows within each time step
        let mut a = array(&[2, 3, 2]);
        a.flip(1);
        assert_eq!(
            a.data,
            vec![4.0, 5.0, 2.0, 3.0, 0.0, 1.0, 10.0, 11.0, 8.0, 9.0, 6.0, 7.0]
        );
    }

    #[test]
    fn test_flip_last_axis() {
        let mut a = array(&[2, 3]);
        a.flip(1);
        assert_eq!(a.data, vec![2.0, 1.0, 0.0, 5.0, 4.0, 3.0]);
    }

    #[test]
    fn test_fill_nan_and_range() {
        let mut a = GridArray::new(
            vec!["x".into()],
            vec![4],
            vec![f64::NAN, -2.0, 3.5, f64::NAN],
        )
        .unwrap();
        assert_eq!(a.range(), Some((-2.0, 3.5)));
        assert_eq!(a.fill_nan(1.0), 2);
        assert_eq!(a.data, vec![1.0, -2.0, 3.5, 1.0]);
    }
}
