//! Scalar volume types and voxel addressing

use ndarray::{Array3, ArrayView3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar voxel types a volume may hold
pub trait Intensity: Copy + Send + Sync + 'static {
    /// Widen the voxel value to f64 for energy computations
    fn to_f64(self) -> f64;
}

macro_rules! impl_intensity {
    ($($t:ty),*) => {
        $(
            impl Intensity for $t {
                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_intensity!(u8, i8, u16, i16, u32, i32, f32, f64);

/// Integer position of one volume cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoxelIndex {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl VoxelIndex {
    pub fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// Check whether the index addresses a cell of a volume with the given shape
    pub fn is_within(&self, dims: (usize, usize, usize)) -> bool {
        self.x < dims.0 && self.y < dims.1 && self.z < dims.2
    }

    /// Pattern usable with ndarray indexing
    #[inline]
    pub fn as_pattern(&self) -> (usize, usize, usize) {
        (self.x, self.y, self.z)
    }

    /// Raster-order position (z varies fastest) inside a volume of the given shape
    #[inline]
    pub fn linear(&self, dims: (usize, usize, usize)) -> usize {
        (self.x * dims.1 + self.y) * dims.2 + self.z
    }
}

impl From<(usize, usize, usize)> for VoxelIndex {
    fn from((x, y, z): (usize, usize, usize)) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for VoxelIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Widen a volume of any supported voxel type to f64
pub fn to_intensities<T: Intensity>(volume: ArrayView3<'_, T>) -> Array3<f64> {
    volume.mapv(Intensity::to_f64)
}

/// Global (min, max) of a volume; None for an empty volume
pub fn intensity_range(intensities: &Array3<f64>) -> Option<(f64, f64)> {
    let mut values = intensities.iter().copied();
    let first = values.next()?;
    Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}
