//! Dense per-cell fields.
//!
//! A [`Field`] holds one value per mesh cell. Boundary values belong to the
//! host's discretization and never appear here. Fields are sized once at
//! construction; in-place updates go through [`Field::values_mut`] or
//! [`Field::assign`], neither of which can change the cell count.

use std::ops::{Index, IndexMut};

use nalgebra::{Matrix3, Vector3};

/// Cell values of one scalar, vector, or tensor quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct Field<T> {
    name: String,
    values: Vec<T>,
}

/// One `f64` per cell.
pub type ScalarField = Field<f64>;

/// One 3-vector per cell.
pub type VectorField = Field<Vector3<f64>>;

/// One general 3×3 tensor per cell.
///
/// Gradients of vectors follow `(∇u)_ij = ∂u_j/∂x_i`.
pub type TensorField = Field<Matrix3<f64>>;

/// One symmetric 3×3 tensor per cell.
///
/// Stored as a full matrix; producers guarantee symmetry.
pub type SymmTensorField = Field<Matrix3<f64>>;

impl<T> Field<T> {
    /// Creates a field from cell values.
    pub fn new(name: impl Into<String>, values: Vec<T>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Creates a field with the same value in every cell.
    pub fn uniform(name: impl Into<String>, n_cells: usize, value: T) -> Self
    where
        T: Clone,
    {
        Self::new(name, vec![value; n_cells])
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Mutable access to the cell values; the slice cannot grow or shrink.
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }

    /// Builds a new field by applying `f` to each cell.
    pub fn map<U>(&self, name: impl Into<String>, f: impl Fn(&T) -> U) -> Field<U> {
        Field::new(name, self.values.iter().map(f).collect())
    }

    /// Builds a new field from this field and another, cell by cell.
    pub fn zip_map<U, V>(
        &self,
        other: &Field<U>,
        name: impl Into<String>,
        f: impl Fn(&T, &U) -> V,
    ) -> Field<V> {
        debug_assert_eq!(
            self.len(),
            other.len(),
            "fields '{}' and '{}' live on different meshes",
            self.name,
            other.name
        );
        Field::new(
            name,
            self.values
                .iter()
                .zip(&other.values)
                .map(|(a, b)| f(a, b))
                .collect(),
        )
    }

    /// Overwrites every cell with the values of `other`, keeping this field's name.
    ///
    /// # Panics
    ///
    /// Panics if the fields have different cell counts.
    pub fn assign(&mut self, other: &Field<T>)
    where
        T: Clone,
    {
        self.values.clone_from_slice(&other.values);
    }

    /// Returns the field under a new name.
    #[must_use]
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl ScalarField {
    /// Smallest cell value, or `None` for an empty field.
    #[must_use]
    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    /// Largest cell value, or `None` for an empty field.
    #[must_use]
    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    /// Index of the first non-finite cell, if any.
    #[must_use]
    pub fn first_non_finite(&self) -> Option<usize> {
        self.values.iter().position(|v| !v.is_finite())
    }
}

impl VectorField {
    /// Index of the first cell with a non-finite component, if any.
    #[must_use]
    pub fn first_non_finite(&self) -> Option<usize> {
        self.values
            .iter()
            .position(|v| v.iter().any(|c| !c.is_finite()))
    }
}

impl<T> Index<usize> for Field<T> {
    type Output = T;

    fn index(&self, cell: usize) -> &T {
        &self.values[cell]
    }
}

impl<T> IndexMut<usize> for Field<T> {
    fn index_mut(&mut self, cell: usize) -> &mut T {
        &mut self.values[cell]
    }
}

/// Symmetric part `(t + tᵀ)/2`.
#[must_use]
pub fn symm(t: &Matrix3<f64>) -> Matrix3<f64> {
    0.5 * (t + t.transpose())
}

/// Deviatoric part `t − tr(t)/3 I`.
#[must_use]
pub fn dev(t: &Matrix3<f64>) -> Matrix3<f64> {
    t - Matrix3::identity() * (t.trace() / 3.0)
}

/// Double inner product `a : b = Σ a_ij b_ij`.
#[must_use]
pub fn double_dot(a: &Matrix3<f64>, b: &Matrix3<f64>) -> f64 {
    a.component_mul(b).sum()
}
