use std::collections::HashMap;

use macroquad::math::Rect;

use crate::backend::ImageLoader;
use crate::bitmap::Bitmap;
use crate::descriptor::{TileMeta, TilesetDescriptor};
use crate::error::{LoadError, TilesetError};
use crate::extrude::{extrude, ExtrudeOptions, SheetLayout};
use crate::gid::{self, LocalTileRef, TileId};
use crate::texture::{GraphicsContext, TextureRef, TextureUploader};

/// Everything a renderer needs to draw one gid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileProps<'a> {
    /// Grid position `(col, row)` within the sheet.
    pub coords: (u32, u32),
    /// Image slot holding the tile.
    pub img_index: usize,
    /// Mirrored horizontally
    pub flipped_x: bool,
    /// Mirrored vertically
    pub flipped_y: bool,
    /// Mirrored along the anti-diagonal
    pub flipped_ad: bool,
    /// Metadata registered for the tile, if any
    pub tile: Option<&'a TileMeta>,
}

/// Identifies one outstanding image load. Tickets from before a
/// [`Tileset::teardown`] are ignored on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    slot: usize,
    generation: u64,
}

impl LoadTicket {
    /// Image slot the load fills.
    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// An image the tileset still needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    /// Hand back to [`Tileset::complete_load`]
    pub ticket: LoadTicket,
    /// Path as written in the descriptor
    pub path: String,
}

/// A tileset with its extruded images and the GPU textures made from them.
pub struct Tileset<C: GraphicsContext> {
    desc: TilesetDescriptor,
    layout: SheetLayout,
    extrude: bool,
    image_paths: Vec<String>,
    images: Vec<Option<Bitmap>>,
    lid_to_tile: HashMap<u32, usize>,
    uploader: TextureUploader<C>,
    generation: u64,
}

impl<C: GraphicsContext> std::fmt::Debug for Tileset<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tileset")
            .field("name", &self.desc.name)
            .field("first_gid", &self.desc.first_gid)
            .field("tilecount", &self.desc.tilecount)
            .field("images", &self.image_paths)
            .field("uploader", &self.uploader)
            .finish()
    }
}

impl<C: GraphicsContext> Tileset<C> {
    /// Tileset whose images are extruded as they load.
    pub fn new(desc: TilesetDescriptor) -> Self {
        Self::with_extrusion(desc, true)
    }

    /// With `extrude == false` images are uploaded as loaded and the layout
    /// keeps the descriptor's own margin and spacing.
    pub fn with_extrusion(desc: TilesetDescriptor, extrude: bool) -> Self {
        let sheet = SheetLayout {
            tile_width: desc.tile_w,
            tile_height: desc.tile_h,
            columns: desc.columns,
            rows: desc.rows(),
            margin: desc.margin.unwrap_or(0),
            spacing: desc.spacing.unwrap_or(0),
            image_width: desc.image_w,
            image_height: desc.image_h,
        };
        let layout = if extrude && desc.image.is_some() {
            sheet.padded()
        } else {
            sheet
        };

        let mut image_paths = Vec::new();
        if let Some(image) = &desc.image {
            image_paths.push(image.clone());
        }
        let mut lid_to_tile = HashMap::new();
        for (i, tile) in desc.tiles.iter().enumerate() {
            lid_to_tile.insert(tile.id, i);
            if let Some(image) = &tile.image {
                image_paths.push(image.clone());
            }
        }
        let images = vec![None; image_paths.len()];

        Tileset {
            desc,
            layout,
            extrude,
            image_paths,
            images,
            lid_to_tile,
            uploader: TextureUploader::new(),
            generation: 0,
        }
    }

    /// The descriptor this tileset was built from.
    #[inline] pub fn desc(&self) -> &TilesetDescriptor { &self.desc }
    /// Gid of local tile 0.
    #[inline] pub fn first_gid(&self) -> u32 { self.desc.first_gid }
    /// Number of tiles.
    #[inline] pub fn tilecount(&self) -> u32 { self.desc.tilecount }

    /// Sheet geometry as uploaded, padding included.
    #[inline] pub fn layout(&self) -> SheetLayout { self.layout }

    /// One past the last gid of this tileset. Widened so that any
    /// descriptor values fit.
    pub fn last_gid(&self) -> u64 {
        self.desc.first_gid as u64 + self.desc.tilecount as u64
    }

    /// Local id of `gid`; may be negative or out of range.
    pub fn local_id(&self, gid: TileId) -> i64 {
        gid::local_id(gid, self.desc.first_gid)
    }

    /// `true` iff `0 <= index < tilecount`.
    pub fn contains_local_id(&self, index: i64) -> bool {
        gid::contains_local(index, self.desc.tilecount)
    }

    /// `true` when the index bits of `gid` fall in this tileset.
    pub fn contains_gid(&self, gid: TileId) -> bool {
        self.contains_local_id(self.local_id(gid))
    }

    /// Decoded tile and flips, `None` for empty or foreign gids.
    pub fn tile_ref(&self, gid: TileId) -> Option<LocalTileRef> {
        let tile = gid::decode(gid, self.desc.first_gid)?;
        self.contains_local_id(tile.local_index as i64).then_some(tile)
    }

    /// Metadata registered for `local_id`.
    pub fn tile_meta(&self, local_id: u32) -> Option<&TileMeta> {
        self.lid_to_tile.get(&local_id).map(|&i| &self.desc.tiles[i])
    }

    /// Gathers the draw properties of `gid`. `None` means draw nothing.
    pub fn tile_properties(&self, gid: TileId) -> Option<TileProps<'_>> {
        let tile = self.tile_ref(gid)?;
        let local = tile.local_index;
        let columns = self.desc.columns.max(1);

        Some(TileProps {
            coords: (local % columns, local / columns),
            img_index: if self.image_paths.len() > 1 { local as usize } else { 0 },
            flipped_x: tile.flip_x,
            flipped_y: tile.flip_y,
            flipped_ad: tile.flip_diagonal,
            tile: self.tile_meta(local),
        })
    }

    /// Source rectangle of a tile inside its texture. For image-collection
    /// tiles this needs the image to be loaded.
    pub fn source_rect(&self, props: &TileProps<'_>) -> Option<Rect> {
        if self.desc.image.is_some() {
            let (col, row) = props.coords;
            return Some(self.layout.tile_rect(col, row));
        }
        let image = self.images.get(props.img_index)?.as_ref()?;
        let pad = if self.extrude { 1.0 } else { 0.0 };
        Some(Rect::new(
            pad,
            pad,
            image.width() as f32 - 2.0 * pad,
            image.height() as f32 - 2.0 * pad,
        ))
    }

    /// Image paths in slot order: shared sheet first, then per-tile images.
    pub fn image_paths(&self) -> &[String] {
        &self.image_paths
    }

    /// Processed image of slot `index`, once loaded.
    pub fn image(&self, index: usize) -> Option<&Bitmap> {
        self.images.get(index)?.as_ref()
    }

    /// Loads still missing.
    pub fn image_requests(&self) -> Vec<ImageRequest> {
        self.image_paths
            .iter()
            .enumerate()
            .filter(|(slot, _)| self.images[*slot].is_none())
            .map(|(slot, path)| ImageRequest {
                ticket: LoadTicket {
                    slot,
                    generation: self.generation,
                },
                path: path.clone(),
            })
            .collect()
    }

    /// Applies the result of a load. Returns `Ok(true)` when the image was
    /// stored, `Ok(false)` when the result was failed, stale or redundant.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Bitmap, LoadError>,
    ) -> Result<bool, TilesetError> {
        if ticket.generation != self.generation {
            log::warn!(
                "ignoring stale load for image {} (generation {}, now {})",
                ticket.slot,
                ticket.generation,
                self.generation
            );
            return Ok(false);
        }
        let Some(slot) = self.images.get(ticket.slot) else {
            return Ok(false);
        };
        if slot.is_some() {
            log::debug!("image {} already loaded", ticket.slot);
            return Ok(false);
        }

        let raw = match result {
            Ok(raw) => raw,
            Err(err) => {
                log::warn!("{}", err);
                return Ok(false);
            }
        };

        let processed = self.process(raw, ticket.slot)?;
        self.images[ticket.slot] = Some(processed);

        if self.uploader.is_attached() {
            self.uploader.create_texture_for(ticket.slot, &self.images)?;
        }
        Ok(true)
    }

    fn process(&self, raw: Bitmap, slot: usize) -> Result<Bitmap, TilesetError> {
        if !self.extrude {
            return Ok(raw);
        }
        // shared sheets are cut into tiles, collection images are one tile each
        let (tile_width, tile_height) = if self.desc.image.is_some() && slot == 0 {
            (self.desc.tile_w, self.desc.tile_h)
        } else {
            (raw.width(), raw.height())
        };
        let opts = ExtrudeOptions {
            tile_width,
            tile_height,
            margin_size: 1,
        };
        Ok(extrude(&raw, &opts)?.into_owned())
    }

    /// Drives every outstanding request through `loader`.
    pub async fn load_images(&mut self, loader: &impl ImageLoader) -> Result<usize, TilesetError> {
        let mut loaded = 0;
        for req in self.image_requests() {
            let result = loader.load(&req.path).await;
            if self.complete_load(req.ticket, result)? {
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// Takes ownership of `ctx` and (re)creates textures for every loaded
    /// image.
    pub fn attach(&mut self, ctx: C) -> Result<(), TilesetError> {
        self.uploader.attach(ctx, &self.images)
    }

    /// Deletes all textures and hands the context back.
    pub fn detach(&mut self) -> Option<C> {
        self.uploader.detach()
    }

    /// See [`TextureUploader::bind`].
    pub fn bind(&mut self, start_slot: u32) {
        self.uploader.bind(start_slot)
    }

    /// See [`TextureUploader::try_bind`].
    pub fn try_bind(&mut self, start_slot: u32) -> Result<(), TilesetError> {
        self.uploader.try_bind(start_slot)
    }

    /// Texture of image slot `index` under the current context.
    pub fn texture(&self, index: usize) -> Option<TextureRef> {
        self.uploader.texture(index)
    }

    /// The texture owner, for inspecting the context and its textures.
    pub fn uploader(&self) -> &TextureUploader<C> {
        &self.uploader
    }

    /// Drops textures and images. Loads requested before this call are
    /// ignored when they complete.
    pub fn teardown(&mut self) -> Option<C> {
        let ctx = self.detach();
        self.generation += 1;
        for image in self.images.iter_mut() {
            *image = None;
        }
        ctx
    }
}
