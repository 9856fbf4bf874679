//! Dense field storage.
//!
//! Every field and coefficient array on the lattice is a [`Field3D`]: a flat
//! `Vec<f32>` in row-major `(i, j, k)` order with `k` varying fastest. The
//! layout keeps each `i`-slice contiguous so the parallel engine can hand out
//! disjoint slices to worker threads.

/// Extents of a 3D array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    /// Extent along x
    pub nx: usize,
    /// Extent along y
    pub ny: usize,
    /// Extent along z
    pub nz: usize,
}

impl Dimensions {
    /// Create new dimensions.
    pub const fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    /// Total number of cells.
    #[inline]
    pub const fn total(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// Number of cells in one `i`-slice.
    #[inline]
    pub const fn slice_len(&self) -> usize {
        self.ny * self.nz
    }

    /// Convert `(i, j, k)` to a linear index.
    #[inline]
    pub const fn to_linear(&self, i: usize, j: usize, k: usize) -> usize {
        (i * self.ny + j) * self.nz + k
    }

    /// Convert a linear index back to `(i, j, k)`.
    #[inline]
    pub const fn from_linear(&self, idx: usize) -> (usize, usize, usize) {
        let k = idx % self.nz;
        let j = (idx / self.nz) % self.ny;
        let i = idx / (self.ny * self.nz);
        (i, j, k)
    }

    /// Extent along `axis` (0 = x, 1 = y, 2 = z).
    ///
    /// # Panics
    /// Panics if `axis > 2`.
    #[inline]
    pub fn extent(&self, axis: usize) -> usize {
        self.as_array()[axis]
    }

    /// Extents as an array.
    #[inline]
    pub const fn as_array(&self) -> [usize; 3] {
        [self.nx, self.ny, self.nz]
    }

    /// Check that `(i, j, k)` lies inside these extents.
    #[inline]
    pub const fn contains(&self, i: usize, j: usize, k: usize) -> bool {
        i < self.nx && j < self.ny && k < self.nz
    }
}

impl From<(usize, usize, usize)> for Dimensions {
    fn from((nx, ny, nz): (usize, usize, usize)) -> Self {
        Self::new(nx, ny, nz)
    }
}

/// Dense 3D scalar array.
#[derive(Debug, Clone, PartialEq)]
pub struct Field3D {
    dims: Dimensions,
    data: Vec<f32>,
}

impl Field3D {
    /// Create a zero-filled array.
    pub fn new(dims: Dimensions) -> Self {
        Self::filled(dims, 0.0)
    }

    /// Create an array with every cell set to `value`.
    pub fn filled(dims: Dimensions, value: f32) -> Self {
        Self {
            dims,
            data: vec![value; dims.total()],
        }
    }

    /// Shape of the array.
    #[inline]
    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> f32 {
        self.data[self.dims.to_linear(i, j, k)]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, k: usize, value: f32) {
        let idx = self.dims.to_linear(i, j, k);
        self.data[idx] = value;
    }

    /// Add `value` to a cell (soft source injection).
    #[inline]
    pub fn add(&mut self, i: usize, j: usize, k: usize, value: f32) {
        let idx = self.dims.to_linear(i, j, k);
        self.data[idx] += value;
    }

    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    pub fn clear(&mut self) {
        self.fill(0.0);
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Sum of squares over all cells.
    pub fn energy(&self) -> f64 {
        self.data.iter().map(|&v| (v as f64) * (v as f64)).sum()
    }

    /// Largest absolute value.
    pub fn max_abs(&self) -> f32 {
        self.data.iter().fold(0.0f32, |acc, &v| acc.max(v.abs()))
    }

    /// Position of the first non-finite value, if any.
    pub fn first_non_finite(&self) -> Option<(usize, usize, usize)> {
        self.data
            .iter()
            .position(|v| !v.is_finite())
            .map(|idx| self.dims.from_linear(idx))
    }

    /// Copy the plane `index` perpendicular to `axis`.
    ///
    /// Axis 0 yields a `(ny, nz)` plane, axis 1 `(nx, nz)` and axis 2 `(nx, ny)`.
    /// The caller validates `axis` and `index`.
    pub(crate) fn plane(&self, axis: usize, index: usize) -> Field2D {
        let Dimensions { nx, ny, nz } = self.dims;
        match axis {
            0 => {
                let start = self.dims.to_linear(index, 0, 0);
                Field2D::from_vec(ny, nz, self.data[start..start + ny * nz].to_vec())
            }
            1 => {
                let mut plane = Field2D::new(nx, nz);
                for i in 0..nx {
                    for k in 0..nz {
                        plane.set(i, k, self.get(i, index, k));
                    }
                }
                plane
            }
            _ => {
                let mut plane = Field2D::new(nx, ny);
                for i in 0..nx {
                    for j in 0..ny {
                        plane.set(i, j, self.get(i, j, index));
                    }
                }
                plane
            }
        }
    }
}

/// Dense 2D scalar array, used for boundary memory and exported slices.
#[derive(Debug, Clone, PartialEq)]
pub struct Field2D {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Field2D {
    /// Create a zero-filled plane.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Self { rows, cols, data }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, r: usize, c: usize) -> f32 {
        self.data[r * self.cols + c]
    }

    #[inline]
    pub fn set(&mut self, r: usize, c: usize, value: f32) {
        self.data[r * self.cols + c] = value;
    }

    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Largest absolute value in the plane.
    pub fn max_abs(&self) -> f32 {
        self.data.iter().fold(0.0f32, |acc, &v| acc.max(v.abs()))
    }
}

/// Three scalar components of a vector field.
///
/// On the Yee lattice the components are staggered, so each may have its own
/// shape.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorField3D {
    /// x component
    pub x: Field3D,
    /// y component
    pub y: Field3D,
    /// z component
    pub z: Field3D,
}

impl VectorField3D {
    /// Create a zero-filled vector field with per-component shapes.
    pub fn staggered(shapes: [Dimensions; 3]) -> Self {
        Self::filled(shapes, 0.0)
    }

    /// Create a vector field with every cell of every component set to `value`.
    pub fn filled(shapes: [Dimensions; 3], value: f32) -> Self {
        Self {
            x: Field3D::filled(shapes[0], value),
            y: Field3D::filled(shapes[1], value),
            z: Field3D::filled(shapes[2], value),
        }
    }

    /// Component along `axis` (0 = x, 1 = y, 2 = z).
    ///
    /// # Panics
    /// Panics if `axis > 2`.
    pub fn component(&self, axis: usize) -> &Field3D {
        match axis {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("vector field axis {axis} out of range"),
        }
    }

    /// Mutable component along `axis`.
    ///
    /// # Panics
    /// Panics if `axis > 2`.
    pub fn component_mut(&mut self, axis: usize) -> &mut Field3D {
        match axis {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            _ => panic!("vector field axis {axis} out of range"),
        }
    }

    /// Sum of squares over all components.
    pub fn energy(&self) -> f64 {
        self.x.energy() + self.y.energy() + self.z.energy()
    }

    pub fn clear(&mut self) {
        self.x.clear();
        self.y.clear();
        self.z.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_index_roundtrip() {
        let dims = Dimensions::new(4, 5, 6);
        assert_eq!(dims.total(), 120);
        assert_eq!(dims.to_linear(0, 0, 1), 1);
        assert_eq!(dims.to_linear(0, 1, 0), 6);
        assert_eq!(dims.to_linear(1, 0, 0), 30);
        assert_eq!(dims.from_linear(dims.to_linear(3, 2, 5)), (3, 2, 5));
    }

    #[test]
    fn test_field_set_add_get() {
        let mut field = Field3D::new(Dimensions::new(3, 3, 3));
        field.set(1, 2, 0, 2.0);
        field.add(1, 2, 0, 0.5);
        assert_eq!(field.get(1, 2, 0), 2.5);
        assert_eq!(field.max_abs(), 2.5);
        assert!((field.energy() - 6.25).abs() < 1e-12);

        field.clear();
        assert_eq!(field.energy(), 0.0);
    }

    #[test]
    fn test_first_non_finite() {
        let mut field = Field3D::filled(Dimensions::new(2, 3, 4), 1.0);
        assert_eq!(field.first_non_finite(), None);
        field.set(1, 2, 3, f32::NAN);
        assert_eq!(field.first_non_finite(), Some((1, 2, 3)));
    }

    #[test]
    fn test_plane_extraction_per_axis() {
        let dims = Dimensions::new(2, 3, 4);
        let mut field = Field3D::new(dims);
        for i in 0..2 {
            for j in 0..3 {
                for k in 0..4 {
                    field.set(i, j, k, (100 * i + 10 * j + k) as f32);
                }
            }
        }

        let yz = field.plane(0, 1);
        assert_eq!((yz.rows(), yz.cols()), (3, 4));
        assert_eq!(yz.get(2, 3), 123.0);

        let xz = field.plane(1, 2);
        assert_eq!((xz.rows(), xz.cols()), (2, 4));
        assert_eq!(xz.get(1, 1), 121.0);

        let xy = field.plane(2, 3);
        assert_eq!((xy.rows(), xy.cols()), (2, 3));
        assert_eq!(xy.get(0, 2), 23.0);
    }
}
