//! Per-worker packing buffer: on the stack when small, heap otherwise.

use crate::error::{GemmError, Result};

/// Floats the inline variant can hold (16 KiB).
pub const INLINE_CAPACITY: usize = 4096;

/// Packing scratch owned by one worker for the duration of one stripe.
#[allow(clippy::large_enum_variant)]
pub enum Scratch {
    Inline { buf: [f32; INLINE_CAPACITY], len: usize },
    Heap(Vec<f32>),
}

impl Scratch {
    /// Scratch of `len` floats. Inline when `len` floats take at most
    /// `max_inline_bytes` and fit [`INLINE_CAPACITY`].
    pub fn new(len: usize, max_inline_bytes: usize) -> Result<Self> {
        let bytes = len.saturating_mul(size_of::<f32>());
        if len <= INLINE_CAPACITY && bytes <= max_inline_bytes {
            return Ok(Scratch::Inline {
                buf: [0.0; INLINE_CAPACITY],
                len,
            });
        }

        let mut heap = Vec::new();
        heap.try_reserve_exact(len)
            .map_err(|_| GemmError::Allocation { bytes })?;
        heap.resize(len, 0.0);
        Ok(Scratch::Heap(heap))
    }

    #[inline]
    pub fn is_inline(&self) -> bool {
        matches!(self, Scratch::Inline { .. })
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        match self {
            Scratch::Inline { buf, len } => &mut buf[..*len],
            Scratch::Heap(v) => v.as_mut_slice(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_request_is_inline() {
        let mut s = Scratch::new(100, 1 << 14).unwrap();
        assert!(s.is_inline());
        assert_eq!(s.as_mut_slice().len(), 100);
    }

    #[test]
    fn test_threshold_is_in_bytes() {
        // 1024 floats = 4 KiB: inline under 4 KiB limit, heap under 4 KiB - 1.
        assert!(Scratch::new(1024, 4096).unwrap().is_inline());
        assert!(!Scratch::new(1024, 4095).unwrap().is_inline());
    }

    #[test]
    fn test_large_request_goes_to_heap() {
        let mut s = Scratch::new(INLINE_CAPACITY + 1, usize::MAX).unwrap();
        assert!(!s.is_inline());
        let slice = s.as_mut_slice();
        assert_eq!(slice.len(), INLINE_CAPACITY + 1);
        assert!(slice.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_impossible_request_fails() {
        assert!(matches!(
            Scratch::new(usize::MAX / 2, 0),
            Err(GemmError::Allocation { .. })
        ));
    }
}
