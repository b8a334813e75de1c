use crate::error::{PngError, Result};

pub(crate) const fn div_ceil(lhs: usize, rhs: usize) -> usize {
    let d = lhs / rhs;
    let r = lhs % rhs;
    if r > 0 && rhs > 0 {
        d + 1
    } else {
        d
    }
}

/// `stride * height`, or an error when that does not fit in memory addresses.
pub(crate) fn buffer_size(stride: usize, height: u32) -> Result<usize> {
    stride.checked_mul(height as usize).ok_or_else(|| {
        PngError::OutOfRange(format!("{stride} x {height} bytes exceeds addressable memory"))
    })
}
