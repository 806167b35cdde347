#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

//! Tiled tilesets for Macroquad: gid decoding, seam-free tile sheet
//! extrusion and texture upload that survives context loss.

mod backend;
mod bitmap;
mod descriptor;
mod error;
mod extrude;
pub mod gid;
mod properties;
mod texture;
mod tileset;

pub use backend::{ImageLoader, MacroquadContext, MacroquadImageLoader};
pub use bitmap::Bitmap;
pub use descriptor::{TileMeta, TilesetDescriptor};
pub use error::{LoadError, TilesetError};
pub use extrude::{extrude, sheet_grid, ExtrudeOptions, SheetLayout, EXTRUDE_MARGIN, EXTRUDE_SPACING};
pub use gid::{LocalTileRef, TileId};
pub use properties::{Properties, PropertyValue};
pub use texture::{Filter, GraphicsContext, SamplerParams, TextureRef, TextureUploader, Wrap};
pub use tileset::{ImageRequest, LoadTicket, TileProps, Tileset};
