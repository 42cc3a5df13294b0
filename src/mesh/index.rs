//! Index types for mesh elements.
//!
//! Vertices and faces are addressed through type-safe wrappers so a face id
//! can never be used where a vertex id is expected. The wrappers are generic
//! over the underlying integer: `u32` covers any map a simulator can load,
//! `u64` is there for very large rasters.

use std::fmt::{self, Debug};
use std::hash::Hash;

/// Trait for integer types that can back mesh indices.
pub trait MeshIndex:
    Copy + Clone + Eq + PartialEq + Ord + PartialOrd + Hash + Debug + Send + Sync + 'static
{
    /// The largest index this type can address.
    const MAX: Self;

    /// Convert from usize, returning `None` if the value does not fit.
    fn try_from_usize(v: usize) -> Option<Self>;

    /// Convert from usize.
    ///
    /// # Panics
    /// Panics in debug builds if the value does not fit.
    fn from_usize(v: usize) -> Self;

    /// Convert to usize.
    fn to_usize(self) -> usize;

    /// Whether a collection of `len` elements can be fully addressed.
    fn can_address(len: usize) -> bool {
        len == 0 || Self::try_from_usize(len - 1).is_some()
    }
}

impl MeshIndex for u32 {
    const MAX: Self = u32::MAX;

    #[inline]
    fn try_from_usize(v: usize) -> Option<Self> {
        u32::try_from(v).ok()
    }

    #[inline]
    fn from_usize(v: usize) -> Self {
        debug_assert!(v <= u32::MAX as usize, "index {} too large for u32", v);
        v as u32
    }

    #[inline]
    fn to_usize(self) -> usize {
        self as usize
    }
}

impl MeshIndex for u64 {
    const MAX: Self = u64::MAX;

    #[inline]
    fn try_from_usize(v: usize) -> Option<Self> {
        u64::try_from(v).ok()
    }

    #[inline]
    fn from_usize(v: usize) -> Self {
        v as u64
    }

    #[inline]
    fn to_usize(self) -> usize {
        self as usize
    }
}

/// A type-safe vertex index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId<I: MeshIndex = u32>(I);

/// A type-safe face index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceId<I: MeshIndex = u32>(I);

macro_rules! impl_index_type {
    ($name:ident, $display:literal) => {
        impl<I: MeshIndex> $name<I> {
            /// Create a new index from a raw value.
            #[inline]
            pub fn new(index: usize) -> Self {
                Self(I::from_usize(index))
            }

            /// Get the raw index value.
            #[inline]
            pub fn index(self) -> usize {
                self.0.to_usize()
            }

            /// Get the raw value of the underlying type.
            #[inline]
            pub fn raw(self) -> I {
                self.0
            }
        }

        impl<I: MeshIndex> Debug for $name<I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $display, self.index())
            }
        }

        impl<I: MeshIndex> From<usize> for $name<I> {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_index_type!(VertexId, "V");
impl_index_type!(FaceId, "F");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_id() {
        let v: VertexId = VertexId::new(42);
        assert_eq!(v.index(), 42);
        assert_eq!(v.raw(), 42u32);
    }

    #[test]
    fn test_large_indices() {
        let v: VertexId<u64> = VertexId::new(5_000_000_000);
        assert_eq!(v.index(), 5_000_000_000);
    }

    #[test]
    fn test_can_address() {
        assert!(u32::can_address(0));
        assert!(u32::can_address(u32::MAX as usize + 1));
        assert!(!u32::can_address(u32::MAX as usize + 2));
        assert!(u64::can_address(usize::MAX));
    }

    #[test]
    fn test_debug_format() {
        let v: VertexId = VertexId::new(7);
        assert_eq!(format!("{:?}", v), "V(7)");
        let f: FaceId = FaceId::new(3);
        assert_eq!(format!("{:?}", f), "F(3)");
    }
}
