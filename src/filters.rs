use crate::error::{PngError, Result};

/// Per-scanline byte predictors of filter method 0.
///
/// `x` is the byte being processed, `a` the corresponding byte of the pixel to
/// the left, `b` the byte above and `c` the byte above-left. Bytes outside the
/// image are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    None = 0,
    Sub = 1,
    Up = 2,
    Average = 3,
    Paeth = 4,
}
impl Filter {
    pub(crate) const ALL: [Filter; 5] = [
        Filter::None,
        Filter::Sub,
        Filter::Up,
        Filter::Average,
        Filter::Paeth,
    ];

    fn predict(&self, a: u8, b: u8, c: u8) -> u8 {
        match self {
            Filter::None => 0,
            Filter::Sub => a,
            Filter::Up => b,
            Filter::Average => ((a as u16 + b as u16) / 2) as u8,
            Filter::Paeth => paeth_predict(a, b, c),
        }
    }

    pub fn filter(&self, x: u8, a: u8, b: u8, c: u8) -> u8 {
        x.wrapping_sub(self.predict(a, b, c))
    }

    pub fn reconstruct(&self, x: u8, a: u8, b: u8, c: u8) -> u8 {
        x.wrapping_add(self.predict(a, b, c))
    }
}
impl TryFrom<u8> for Filter {
    type Error = PngError;
    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Sub),
            2 => Ok(Self::Up),
            3 => Ok(Self::Average),
            4 => Ok(Self::Paeth),
            i => Err(PngError::CorruptData(format!("unknown row filter type {i}"))),
        }
    }
}

const fn paeth_predict(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();
    // The order of these tests is fixed by the format.
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// How the encoder picks a filter for each row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FilterStrategy {
    /// Every row uses [`Filter::None`].
    Unfiltered,
    /// Each row takes the filter whose output has the smallest sum of
    /// absolute values when read as signed bytes.
    MinimumSum,
}

fn neighbours(row: &[u8], prev: Option<&[u8]>, i: usize, bpp: usize) -> (u8, u8, u8) {
    let a = if i >= bpp { row[i - bpp] } else { 0 };
    let b = prev.map_or(0, |p| p[i]);
    let c = match prev {
        Some(p) if i >= bpp => p[i - bpp],
        _ => 0,
    };
    (a, b, c)
}

/// Appends the filter selector byte and the filtered bytes of `row`.
pub(crate) fn filter_scanline(
    filter: Filter,
    row: &[u8],
    prev: Option<&[u8]>,
    bpp: usize,
    out: &mut Vec<u8>,
) {
    out.push(filter as u8);
    out.extend((0..row.len()).map(|i| {
        let (a, b, c) = neighbours(row, prev, i, bpp);
        filter.filter(row[i], a, b, c)
    }));
}

fn filter_cost(filter: Filter, row: &[u8], prev: Option<&[u8]>, bpp: usize) -> u64 {
    (0..row.len())
        .map(|i| {
            let (a, b, c) = neighbours(row, prev, i, bpp);
            (filter.filter(row[i], a, b, c) as i8).unsigned_abs() as u64
        })
        .sum()
}

pub(crate) fn choose_filter(
    strategy: FilterStrategy,
    row: &[u8],
    prev: Option<&[u8]>,
    bpp: usize,
) -> Filter {
    match strategy {
        FilterStrategy::Unfiltered => Filter::None,
        FilterStrategy::MinimumSum => Filter::ALL
            .into_iter()
            .min_by_key(|f| filter_cost(*f, row, prev, bpp))
            .unwrap_or(Filter::None),
    }
}

/// Filters `height` rows of `row_len` bytes each, prefixing every row with
/// its filter selector.
pub(crate) fn filter_scanlines(
    data: &[u8],
    row_len: usize,
    bpp: usize,
    strategy: FilterStrategy,
    out: &mut Vec<u8>,
) {
    if row_len == 0 {
        return;
    }
    let mut prev: Option<&[u8]> = None;
    for row in data.chunks_exact(row_len) {
        let filter = choose_filter(strategy, row, prev, bpp);
        filter_scanline(filter, row, prev, bpp, out);
        prev = Some(row);
    }
}

fn reconstruct_scanline(filter: Filter, row: &mut [u8], prev: Option<&[u8]>, bpp: usize) {
    if filter == Filter::None {
        return;
    }
    for i in 0..row.len() {
        let (a, b, c) = neighbours(row, prev, i, bpp);
        row[i] = filter.reconstruct(row[i], a, b, c);
    }
}

/// Undoes filtering in place on a run of scanlines of `row_len` data bytes,
/// each preceded by its selector byte. Selector bytes are reset to zero so the
/// run can be walked again as already-unfiltered data.
pub(crate) fn reconstruct_scanlines(data: &mut [u8], row_len: usize, bpp: usize) -> Result<()> {
    let stride = row_len + 1;
    let rows = data.len() / stride;
    for y in 0..rows {
        let (before, current) = data.split_at_mut(y * stride);
        let prev = if y == 0 {
            None
        } else {
            Some(&before[before.len() - row_len..])
        };
        let filter = Filter::try_from(current[0])?;
        current[0] = 0;
        reconstruct_scanline(filter, &mut current[1..stride], prev, bpp);
    }
    Ok(())
}
