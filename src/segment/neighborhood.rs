//! Voxel neighborhoods for n-link insertion

use crate::config::Connectivity;
use itertools::iproduct;

/// Relative position of a neighboring voxel
pub type Offset = [isize; 3];

/// Offsets of the neighbors in one half of the neighborhood
///
/// An offset is "forward" when its first non-zero component is positive, so
/// each unordered voxel pair is visited exactly once.
pub fn forward_offsets(connectivity: Connectivity) -> Vec<Offset> {
    let max_nonzero = match connectivity {
        Connectivity::Six => 1,
        Connectivity::Eighteen => 2,
        Connectivity::TwentySix => 3,
    };

    iproduct!(-1isize..=1, -1isize..=1, -1isize..=1)
        .map(|(dx, dy, dz)| [dx, dy, dz])
        .filter(|offset| {
            let nonzero = offset.iter().filter(|&&c| c != 0).count();
            nonzero >= 1 && nonzero <= max_nonzero
        })
        .filter(|offset| offset.iter().find(|&&c| c != 0).map_or(false, |&c| c > 0))
        .collect()
}

/// Euclidean length of an offset in physical units
pub fn offset_distance(offset: &Offset, spacing: &[f64; 3]) -> f64 {
    offset
        .iter()
        .zip(spacing.iter())
        .map(|(&c, &s)| (c as f64 * s).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Neighbor position, or None if it falls outside the volume
#[inline]
pub fn neighbor(
    position: (usize, usize, usize),
    offset: &Offset,
    dims: (usize, usize, usize),
) -> Option<(usize, usize, usize)> {
    let step = |p: usize, d: isize, n: usize| {
        let q = p.checked_add_signed(d)?;
        (q < n).then_some(q)
    };

    Some((
        step(position.0, offset[0], dims.0)?,
        step(position.1, offset[1], dims.1)?,
        step(position.2, offset[2], dims.2)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_forward_offset_counts() {
        assert_eq!(forward_offsets(Connectivity::Six).len(), 3);
        assert_eq!(forward_offsets(Connectivity::Eighteen).len(), 9);
        assert_eq!(forward_offsets(Connectivity::TwentySix).len(), 13);
    }

    #[test]
    fn test_forward_offsets_cover_each_pair_once() {
        let forward = forward_offsets(Connectivity::TwentySix);
        let mut all: HashSet<Offset> = HashSet::new();
        for offset in &forward {
            let backward = [-offset[0], -offset[1], -offset[2]];
            assert!(!forward.contains(&backward));
            all.insert(*offset);
            all.insert(backward);
        }
        assert_eq!(all.len(), 26);
    }

    #[test]
    fn test_distance_uses_spacing() {
        let spacing = [1.0, 1.0, 1.0];
        assert_eq!(offset_distance(&[1, 0, 0], &spacing), 1.0);
        assert!((offset_distance(&[1, 1, 0], &spacing) - 2f64.sqrt()).abs() < 1e-12);
        assert!((offset_distance(&[1, -1, 1], &spacing) - 3f64.sqrt()).abs() < 1e-12);
        assert_eq!(offset_distance(&[0, 0, 1], &[0.5, 0.5, 2.5]), 2.5);
    }

    #[test]
    fn test_neighbor_bounds() {
        let dims = (3, 3, 3);
        assert_eq!(neighbor((0, 0, 0), &[1, 0, 0], dims), Some((1, 0, 0)));
        assert_eq!(neighbor((2, 0, 0), &[1, 0, 0], dims), None);
        assert_eq!(neighbor((0, 1, 0), &[0, -1, 0], dims), Some((0, 0, 0)));
        assert_eq!(neighbor((1, 0, 1), &[1, -1, 0], dims), None);
    }
}
