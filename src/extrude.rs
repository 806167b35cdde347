//! Edge extrusion of tile sheets.
//!
//! Texture filtering near a tile border samples the neighbouring texels. In a
//! tightly packed sheet those belong to the next tile, which shows up as
//! seams when the map is scaled or scrolled by fractional amounts. The sheet
//! is therefore re-laid out with a 1px margin around the image and 2px of
//! spacing between tiles, and every tile's outermost pixels are duplicated
//! into the gap around it.

use std::borrow::Cow;

use macroquad::math::Rect;

use crate::bitmap::Bitmap;
use crate::error::TilesetError;

/// Gap between adjacent tiles in an extruded sheet.
pub const EXTRUDE_SPACING: u32 = 2;
/// Border around the whole extruded sheet.
pub const EXTRUDE_MARGIN: u32 = 1;

/// How [`extrude`] cuts the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtrudeOptions {
    /// Tile width in pixels; must divide the image width
    pub tile_width: u32,
    /// Tile height in pixels; must divide the image height
    pub tile_height: u32,
    /// Only zero/non-zero matters. The padding itself is always
    /// [`EXTRUDE_MARGIN`] and [`EXTRUDE_SPACING`].
    pub margin_size: u32,
}

/// Grid geometry of a tile sheet image.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    pub tile_width: u32,
    pub tile_height: u32,
    pub columns: u32,
    pub rows: u32,
    pub margin: u32,
    pub spacing: u32,
    pub image_width: u32,
    pub image_height: u32,
}

impl SheetLayout {
    /// Layout of the sheet after [`extrude`] has padded it.
    pub fn padded(self) -> SheetLayout {
        let columns = self.columns.max(1);
        let rows = self.rows.max(1);
        SheetLayout {
            margin: EXTRUDE_MARGIN,
            spacing: EXTRUDE_SPACING,
            image_width: self.image_width + (columns - 1) * EXTRUDE_SPACING + EXTRUDE_MARGIN * 2,
            image_height: self.image_height + (rows - 1) * EXTRUDE_SPACING + EXTRUDE_MARGIN * 2,
            ..self
        }
    }

    /// Source rectangle of the tile at grid position `(col, row)`.
    pub fn tile_rect(&self, col: u32, row: u32) -> Rect {
        let sx = self.margin + col * (self.tile_width + self.spacing);
        let sy = self.margin + row * (self.tile_height + self.spacing);
        Rect::new(
            sx as f32,
            sy as f32,
            self.tile_width as f32,
            self.tile_height as f32,
        )
    }
}

/// Splits `width`x`height` into whole tiles, failing on any remainder.
pub fn sheet_grid(
    width: u32,
    height: u32,
    tile_width: u32,
    tile_height: u32,
) -> Result<(u32, u32), TilesetError> {
    let malformed = || TilesetError::MalformedGeometry {
        image_width: width,
        image_height: height,
        tile_width,
        tile_height,
    };
    if tile_width == 0 || tile_height == 0 {
        return Err(malformed());
    }
    if width % tile_width != 0 || height % tile_height != 0 {
        return Err(malformed());
    }
    let columns = width / tile_width;
    let rows = height / tile_height;
    if columns == 0 || rows == 0 {
        return Err(malformed());
    }
    Ok((columns, rows))
}

/// Returns a padded copy of `src` with every tile's edge pixels replicated
/// into the surrounding gap. With `margin_size == 0` the source is returned
/// as is.
pub fn extrude<'a>(src: &'a Bitmap, opts: &ExtrudeOptions) -> Result<Cow<'a, Bitmap>, TilesetError> {
    if opts.margin_size == 0 {
        return Ok(Cow::Borrowed(src));
    }

    let tw = opts.tile_width;
    let th = opts.tile_height;
    let (columns, rows) = sheet_grid(src.width(), src.height(), tw, th)?;

    let out_w = src.width() + (columns - 1) * EXTRUDE_SPACING + EXTRUDE_MARGIN * 2;
    let out_h = src.height() + (rows - 1) * EXTRUDE_SPACING + EXTRUDE_MARGIN * 2;
    let mut out = Bitmap::new(out_w, out_h);

    // tiles into their padded slots
    for y in 0..rows {
        for x in 0..columns {
            let dx = x * (tw + EXTRUDE_SPACING) + EXTRUDE_MARGIN;
            let dy = y * (th + EXTRUDE_SPACING) + EXTRUDE_MARGIN;
            out.blit(src, x * tw, y * th, tw, th, dx, dy);
        }
    }

    // top and bottom rows, read from the unpadded source
    for y in 0..rows {
        let dy = y * (th + EXTRUDE_SPACING) + EXTRUDE_MARGIN;
        let top = y * th;
        let bottom = (y + 1) * th - 1;
        for x in 0..columns {
            let dx = x * (tw + EXTRUDE_SPACING) + EXTRUDE_MARGIN;
            for pixel in 0..tw {
                let sx = x * tw + pixel;
                out.set_pixel(dx + pixel, dy - 1, src.pixel(sx, top));
                out.set_pixel(dx + pixel, dy + th, src.pixel(sx, bottom));
            }
        }
    }

    // left and right columns over the full height, corners included
    for x in 0..columns {
        let left = EXTRUDE_MARGIN + (tw + EXTRUDE_SPACING) * x;
        let right = left + tw - 1;
        out.copy_column(left, left - 1);
        out.copy_column(right, right + 1);
    }

    log::debug!(
        "extruded {}x{} sheet ({}x{} tiles) to {}x{}",
        src.width(),
        src.height(),
        columns,
        rows,
        out_w,
        out_h
    );

    Ok(Cow::Owned(out))
}
