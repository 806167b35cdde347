use crate::error::TilesetError;
use macroquad::texture::Image;

/// Tightly packed RGBA8 pixel buffer, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

impl Bitmap {
    /// Transparent black bitmap of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Bitmap {
            width,
            height,
            bytes: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Wraps an RGBA8 buffer, checking its length against the size.
    pub fn from_rgba8(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self, TilesetError> {
        if bytes.len() != width as usize * height as usize * 4 {
            return Err(TilesetError::InvalidBitmap {
                width,
                height,
                len: bytes.len(),
            });
        }
        Ok(Bitmap {
            width,
            height,
            bytes,
        })
    }

    /// Width in pixels.
    #[inline] pub fn width(&self) -> u32 { self.width }
    /// Height in pixels.
    #[inline] pub fn height(&self) -> u32 { self.height }
    /// Raw RGBA8 bytes.
    #[inline] pub fn bytes(&self) -> &[u8] { &self.bytes }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Pixel at `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let o = self.offset(x, y);
        [self.bytes[o], self.bytes[o + 1], self.bytes[o + 2], self.bytes[o + 3]]
    }

    /// Overwrites the pixel at `(x, y)`. Panics when out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let o = self.offset(x, y);
        self.bytes[o..o + 4].copy_from_slice(&rgba);
    }

    /// Copies a `w`x`h` rectangle of `src` starting at `(sx, sy)` to `(dx, dy)`.
    #[allow(clippy::too_many_arguments)]
    pub fn blit(&mut self, src: &Bitmap, sx: u32, sy: u32, w: u32, h: u32, dx: u32, dy: u32) {
        let row_len = w as usize * 4;
        for row in 0..h {
            let s = src.offset(sx, sy + row);
            let d = self.offset(dx, dy + row);
            self.bytes[d..d + row_len].copy_from_slice(&src.bytes[s..s + row_len]);
        }
    }

    /// Copies column `from_x` over column `to_x` for the full height.
    pub fn copy_column(&mut self, from_x: u32, to_x: u32) {
        for y in 0..self.height {
            let px = self.pixel(from_x, y);
            self.set_pixel(to_x, y, px);
        }
    }
}

impl From<Image> for Bitmap {
    fn from(img: Image) -> Self {
        Bitmap {
            width: img.width as u32,
            height: img.height as u32,
            bytes: img.bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_buffer_length() {
        let err = Bitmap::from_rgba8(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, TilesetError::InvalidBitmap { len: 15, .. }));
    }

    #[test]
    fn converts_from_decoded_image() {
        let img = Image {
            bytes: vec![9; 3 * 2 * 4],
            width: 3,
            height: 2,
        };
        let bmp = Bitmap::from(img);
        assert_eq!((bmp.width(), bmp.height()), (3, 2));
        assert_eq!(bmp.bytes().len(), 24);
        assert_eq!(bmp.pixel(2, 1), [9, 9, 9, 9]);
    }

    #[test]
    fn blit_copies_rect_exactly() {
        let mut src = Bitmap::new(3, 3);
        src.set_pixel(1, 1, [1, 2, 3, 4]);
        src.set_pixel(2, 2, [5, 6, 7, 8]);

        let mut dst = Bitmap::new(4, 4);
        dst.blit(&src, 1, 1, 2, 2, 0, 0);

        assert_eq!(dst.pixel(0, 0), [1, 2, 3, 4]);
        assert_eq!(dst.pixel(1, 1), [5, 6, 7, 8]);
        assert_eq!(dst.pixel(2, 2), [0, 0, 0, 0]);
    }

    #[test]
    fn copy_column_covers_full_height() {
        let mut bmp = Bitmap::new(2, 3);
        for y in 0..3 {
            bmp.set_pixel(0, y, [y as u8, 0, 0, 255]);
        }
        bmp.copy_column(0, 1);
        for y in 0..3 {
            assert_eq!(bmp.pixel(1, y), [y as u8, 0, 0, 255]);
        }
    }
}
