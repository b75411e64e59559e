//! Quadtree cell addresses.
//!
//! A cell address packs a quadtree node into 64 bits:
//!
//! ```text
//! | depth: 6 | interleaved: 58 |
//! ```
//!
//! `interleaved` holds the bits of y and x interleaved, one bit pair per
//! level, with the first level in the most significant pair. Only the low
//! `2 * depth` bits are used. Depth 0 has exactly one valid address: zero.
//!
//! The reduction itself treats addresses as opaque ordered integers; this
//! type exists so producers and consumers of a relation can build and read
//! addresses without hand-rolling the bit layout.

use bytemuck::{Pod, Zeroable};
use glam::UVec2;

/// Deepest level representable in 58 interleaved bits.
pub const MAX_DEPTH: u32 = 29;

const DEPTH_SHIFT: u32 = 58;
const INTERLEAVED_MASK: u64 = (1u64 << DEPTH_SHIFT) - 1;

/// A quadtree node address: 6-bit depth plus interleaved coordinate bits.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Pod, Zeroable)]
pub struct CellAddress(u64);

impl CellAddress {
    /// The depth-0 root cell.
    pub const ROOT: Self = Self(0);

    /// Build an address from a depth and its interleaved coordinate bits.
    ///
    /// Returns `None` if `depth > MAX_DEPTH` or `interleaved` uses bits
    /// beyond the `2 * depth` the depth allows.
    #[inline]
    pub fn new(depth: u32, interleaved: u64) -> Option<Self> {
        if depth > MAX_DEPTH {
            return None;
        }
        if interleaved >> (2 * depth) != 0 {
            return None;
        }
        Some(Self(((depth as u64) << DEPTH_SHIFT) | interleaved))
    }

    /// Build an address from cell coordinates at `depth`.
    ///
    /// Both coordinates must be `< 2^depth`.
    pub fn from_xy(depth: u32, xy: UVec2) -> Option<Self> {
        if depth > MAX_DEPTH {
            return None;
        }
        let limit = 1u64 << depth;
        if xy.x as u64 >= limit || xy.y as u64 >= limit {
            return None;
        }
        let interleaved = spread_bits(xy.x) | (spread_bits(xy.y) << 1);
        Self::new(depth, interleaved)
    }

    /// Reinterpret a raw 64-bit code without validation.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn depth(self) -> u32 {
        (self.0 >> DEPTH_SHIFT) as u32
    }

    #[inline]
    pub const fn interleaved(self) -> u64 {
        self.0 & INTERLEAVED_MASK
    }

    /// Cell coordinates at this address's depth.
    pub fn xy(self) -> UVec2 {
        let bits = self.interleaved();
        UVec2::new(compact_bits(bits), compact_bits(bits >> 1))
    }

    /// The enclosing cell one level up, or `None` for the root.
    pub fn parent(self) -> Option<Self> {
        let depth = self.depth();
        if depth == 0 {
            return None;
        }
        Some(Self(((depth as u64 - 1) << DEPTH_SHIFT) | (self.interleaved() >> 2)))
    }

    /// Child cell in `quadrant` (`0..4`, bit 1 = y, bit 0 = x).
    pub fn child(self, quadrant: u8) -> Option<Self> {
        if quadrant >= 4 {
            return None;
        }
        let depth = self.depth() + 1;
        Self::new(depth, (self.interleaved() << 2) | quadrant as u64)
    }

    /// Whether this is a well-formed code for its depth.
    pub fn is_valid(self) -> bool {
        Self::new(self.depth(), self.interleaved()).is_some()
    }

    /// View a slice of addresses as raw codes.
    #[inline]
    pub fn as_raw_slice(addresses: &[CellAddress]) -> &[u64] {
        bytemuck::cast_slice(addresses)
    }

    /// Mutable view of a slice of addresses as raw codes.
    #[inline]
    pub fn as_raw_slice_mut(addresses: &mut [CellAddress]) -> &mut [u64] {
        bytemuck::cast_slice_mut(addresses)
    }
}

impl From<CellAddress> for u64 {
    #[inline]
    fn from(addr: CellAddress) -> Self {
        addr.0
    }
}

/// Spread the low 29 bits of `v` into the even bit positions of a u64.
#[inline]
fn spread_bits(v: u32) -> u64 {
    let mut x = v as u64 & 0x1fff_ffff;
    x = (x | (x << 16)) & 0x0000_ffff_0000_ffff;
    x = (x | (x << 8)) & 0x00ff_00ff_00ff_00ff;
    x = (x | (x << 4)) & 0x0f0f_0f0f_0f0f_0f0f;
    x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    x = (x | (x << 1)) & 0x5555_5555_5555_5555;
    x
}

/// Inverse of [`spread_bits`]: gather the even bit positions.
#[inline]
fn compact_bits(v: u64) -> u32 {
    let mut x = v & 0x5555_5555_5555_5555;
    x = (x | (x >> 1)) & 0x3333_3333_3333_3333;
    x = (x | (x >> 2)) & 0x0f0f_0f0f_0f0f_0f0f;
    x = (x | (x >> 4)) & 0x00ff_00ff_00ff_00ff;
    x = (x | (x >> 8)) & 0x0000_ffff_0000_ffff;
    x = (x | (x >> 16)) & 0x0000_0000_ffff_ffff;
    x as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_zero() {
        assert_eq!(CellAddress::ROOT.raw(), 0);
        assert_eq!(CellAddress::ROOT.depth(), 0);
        assert!(CellAddress::ROOT.is_valid());
        assert_eq!(CellAddress::ROOT.parent(), None);
    }

    #[test]
    fn test_depth_zero_only_accepts_zero() {
        assert!(CellAddress::new(0, 0).is_some());
        assert!(CellAddress::new(0, 1).is_none());
    }

    #[test]
    fn test_depth_one_quadrants() {
        for q in 0..4u64 {
            let a = CellAddress::new(1, q).unwrap();
            assert_eq!(a.depth(), 1);
            assert_eq!(a.interleaved(), q);
        }
        assert!(CellAddress::new(1, 4).is_none());
    }

    #[test]
    fn test_rejects_excess_depth() {
        assert!(CellAddress::new(MAX_DEPTH + 1, 0).is_none());
        assert!(CellAddress::from_xy(MAX_DEPTH + 1, UVec2::ZERO).is_none());
    }

    #[test]
    fn test_from_xy_layout() {
        // y occupies the high bit of each pair.
        let a = CellAddress::from_xy(1, UVec2::new(1, 0)).unwrap();
        assert_eq!(a.interleaved(), 0b01);
        let b = CellAddress::from_xy(1, UVec2::new(0, 1)).unwrap();
        assert_eq!(b.interleaved(), 0b10);
        let c = CellAddress::from_xy(2, UVec2::new(2, 3)).unwrap();
        assert_eq!(c.interleaved(), 0b1110);
    }

    #[test]
    fn test_xy_recovers_coordinates() {
        let xy = UVec2::new(123_456, 98_765);
        let a = CellAddress::from_xy(20, xy).unwrap();
        assert_eq!(a.xy(), xy);

        let max = (1u32 << MAX_DEPTH) - 1;
        let b = CellAddress::from_xy(MAX_DEPTH, UVec2::new(max, 0)).unwrap();
        assert_eq!(b.xy(), UVec2::new(max, 0));
    }

    #[test]
    fn test_from_xy_rejects_out_of_range() {
        assert!(CellAddress::from_xy(2, UVec2::new(4, 0)).is_none());
        assert!(CellAddress::from_xy(2, UVec2::new(0, 4)).is_none());
    }

    #[test]
    fn test_parent_child() {
        let a = CellAddress::from_xy(3, UVec2::new(5, 2)).unwrap();
        let p = a.parent().unwrap();
        assert_eq!(p.depth(), 2);
        assert_eq!(p.xy(), UVec2::new(2, 1));

        let q = (a.interleaved() & 0b11) as u8;
        assert_eq!(p.child(q), Some(a));
        assert_eq!(p.child(4), None);
    }

    #[test]
    fn test_raw_slice_views() {
        let mut addrs = vec![CellAddress::ROOT, CellAddress::new(1, 3).unwrap()];
        assert_eq!(CellAddress::as_raw_slice(&addrs)[1], (1u64 << 58) | 3);
        let second = addrs[1].raw();
        CellAddress::as_raw_slice_mut(&mut addrs)[0] = second;
        assert_eq!(addrs[0], addrs[1]);
    }
}
