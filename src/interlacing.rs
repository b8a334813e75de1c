use crate::utils::div_ceil;

/// Origin and spacing of one Adam7 pass: `(row, col, row_step, col_step)`.
const ADAM7_PASSES: [(usize, usize, usize, usize); 7] = [
    (0, 0, 8, 8),
    (0, 4, 8, 8),
    (4, 0, 8, 4),
    (0, 2, 4, 4),
    (2, 0, 4, 2),
    (0, 1, 2, 2),
    (1, 0, 2, 1),
];

/// Walks the seven Adam7 reduced images of a `width` x `height` image,
/// skipping passes that contain no pixels.
pub(crate) struct Adam7Iter {
    next_pass: usize,
    width: usize,
    height: usize,
}
impl Adam7Iter {
    pub(crate) fn new(width: usize, height: usize) -> Self {
        Self {
            next_pass: 0,
            width,
            height,
        }
    }
}
impl Iterator for Adam7Iter {
    type Item = SubImage;
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&(row, col, row_step, col_step)) = ADAM7_PASSES.get(self.next_pass) {
            self.next_pass += 1;
            let pass_width = div_ceil(self.width.saturating_sub(col), col_step);
            let pass_height = div_ceil(self.height.saturating_sub(row), row_step);
            if pass_width == 0 || pass_height == 0 {
                continue;
            }
            return Some(SubImage {
                pass: self.next_pass,
                width: pass_width,
                height: pass_height,
                pixel_indices: PixelIndicesIter {
                    row,
                    col,
                    first_col: col,
                    row_step,
                    col_step,
                    width: self.width,
                    height: self.height,
                },
            });
        }
        None
    }
}

/// One reduced image, or the whole image when it is not interlaced.
#[derive(Debug)]
pub(crate) struct SubImage {
    /// Adam7 pass number, 1 to 7, or 0 for a non-interlaced image.
    pub(crate) pass: usize,
    pub(crate) width: usize,
    pub(crate) height: usize,
    /// Full-image pixel index of every pixel in this sub image, in scan order.
    pub(crate) pixel_indices: PixelIndicesIter,
}
impl SubImage {
    pub(crate) fn full(width: usize, height: usize) -> Self {
        Self {
            pass: 0,
            width,
            height,
            pixel_indices: PixelIndicesIter {
                row: 0,
                col: 0,
                first_col: 0,
                row_step: 1,
                col_step: 1,
                width,
                height,
            },
        }
    }

    /// Bytes of filtered data this sub image occupies, selector bytes included.
    pub(crate) fn filtered_len(&self, bpp: usize) -> usize {
        (self.width * bpp + 1) * self.height
    }
}

/// The sub images an image is stored as: seven passes when interlaced,
/// otherwise the image itself.
pub(crate) fn sub_images(width: usize, height: usize, interlaced: bool) -> Vec<SubImage> {
    if interlaced {
        Adam7Iter::new(width, height).collect()
    } else {
        vec![SubImage::full(width, height)]
    }
}

/// Full-image pixel indices of a reduced image, row by row.
#[derive(Debug)]
pub(crate) struct PixelIndicesIter {
    row: usize,
    col: usize,
    first_col: usize,
    row_step: usize,
    col_step: usize,
    width: usize,
    height: usize,
}
impl Iterator for PixelIndicesIter {
    type Item = usize;
    fn next(&mut self) -> Option<Self::Item> {
        if self.col >= self.width {
            self.row += self.row_step;
            self.col = self.first_col;
        }
        if self.row >= self.height || self.col >= self.width {
            return None;
        }
        let index = self.row * self.width + self.col;
        self.col += self.col_step;
        Some(index)
    }
}

/// Copies the pixels of `sub` out of a full image into packed rows.
pub(crate) fn gather(image: &[u8], sub: SubImage, bpp: usize, out: &mut Vec<u8>) {
    for index in sub.pixel_indices {
        out.extend_from_slice(&image[index * bpp..(index + 1) * bpp]);
    }
}

/// Copies packed sub image pixels back to their places in the full image.
pub(crate) fn scatter(
    pixels: impl Iterator<Item = u8>,
    sub: SubImage,
    bpp: usize,
    image: &mut [u8],
) {
    let mut pixels = pixels;
    for index in sub.pixel_indices {
        for byte in &mut image[index * bpp..(index + 1) * bpp] {
            match pixels.next() {
                Some(value) => *byte = value,
                None => return,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adam7iter_correctly_calculates_pass_dimensions() {
        let adam7 = Adam7Iter::new(8, 8);
        let expected_dimensions = [(1, 1), (1, 1), (2, 1), (2, 2), (4, 2), (4, 4), (8, 4)];
        for (pass, expected) in adam7.zip(expected_dimensions) {
            assert_eq!((pass.width, pass.height), expected);
        }

        let adam7 = Adam7Iter::new(9, 9);
        let expected_dimensions = [(2, 2), (1, 2), (3, 1), (2, 3), (5, 2), (4, 5), (9, 4)];
        for (pass, expected) in adam7.zip(expected_dimensions) {
            assert_eq!((pass.width, pass.height), expected);
        }

        let adam7 = Adam7Iter::new(4, 4);
        let expected_dimensions = [(1, 1), (1, 1), (2, 1), (2, 2), (4, 2)];
        let passes: Vec<_> = adam7.map(|p| (p.pass, p.width, p.height)).collect();
        assert_eq!(passes.len(), expected_dimensions.len());
        for (pass, expected) in passes.into_iter().zip(expected_dimensions) {
            assert_eq!((pass.1, pass.2), expected);
        }
    }

    #[test]
    fn tiny_images_skip_empty_passes() {
        let passes: Vec<_> = Adam7Iter::new(1, 1).map(|p| p.pass).collect();
        assert_eq!(passes, [1]);
        let passes: Vec<_> = Adam7Iter::new(2, 1).map(|p| p.pass).collect();
        assert_eq!(passes, [1, 6]);
    }

    #[test]
    fn adam7iter_returns_iterator_over_pixel_indices() {
        let adam7 = Adam7Iter::new(8, 8);
        let expected_indices: [&[usize]; 7] = [
            &[0],
            &[4],
            &[32, 36],
            &[2, 6, 34, 38],
            &[16, 18, 20, 22, 48, 50, 52, 54],
            &[1, 3, 5, 7, 17, 19, 21, 23, 33, 35, 37, 39, 49, 51, 53, 55],
            &[
                8, 9, 10, 11, 12, 13, 14, 15, 24, 25, 26, 27, 28, 29, 30, 31, 40, 41, 42, 43, 44,
                45, 46, 47, 56, 57, 58, 59, 60, 61, 62, 63,
            ],
        ];
        for (pass, expected) in adam7.zip(expected_indices) {
            assert_eq!(pass.pixel_indices.collect::<Vec<_>>(), expected);
        }

        let adam7 = Adam7Iter::new(9, 9);
        let expected_lengths = [4, 2, 3, 6, 10, 20, 36];
        for (pass, expected) in adam7.zip(expected_lengths) {
            assert_eq!(pass.pixel_indices.count(), expected);
        }

        let adam7 = Adam7Iter::new(32, 32);
        let expected_lengths = [16, 16, 32, 64, 128, 256, 512];
        for (pass, expected) in adam7.zip(expected_lengths) {
            assert_eq!(pass.pixel_indices.count(), expected);
        }
    }

    #[test]
    fn non_square_indices_use_width() {
        let passes = sub_images(3, 2, true);
        let pass_6: Vec<_> = passes
            .into_iter()
            .find(|p| p.pass == 6)
            .unwrap()
            .pixel_indices
            .collect();
        assert_eq!(pass_6, [1]);
        let pass_7: Vec<_> = sub_images(3, 2, true)
            .into_iter()
            .find(|p| p.pass == 7)
            .unwrap()
            .pixel_indices
            .collect();
        assert_eq!(pass_7, [3, 4, 5]);
    }

    #[test]
    fn every_pixel_is_visited_once() {
        for (width, height) in [(1, 1), (3, 7), (10, 3), (17, 13)] {
            let mut seen = vec![0u8; width * height];
            for sub in sub_images(width, height, true) {
                for index in sub.pixel_indices {
                    seen[index] += 1;
                }
            }
            assert!(seen.iter().all(|&n| n == 1), "{width}x{height}");
        }
    }

    #[test]
    fn gather_then_scatter_restores() {
        let (width, height, bpp) = (5, 6, 2);
        let image: Vec<u8> = (0..(width * height * bpp) as u32).map(|v| v as u8).collect();
        let mut restored = vec![0; image.len()];
        let passes = sub_images(width, height, true)
            .into_iter()
            .zip(sub_images(width, height, true));
        for (sub, again) in passes {
            let mut packed = vec![];
            gather(&image, sub, bpp, &mut packed);
            scatter(packed.into_iter(), again, bpp, &mut restored);
        }
        assert_eq!(restored, image);
    }
}
