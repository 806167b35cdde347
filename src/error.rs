use std::fmt;
use std::io;
use std::path::PathBuf;

/// Error type for tileset loading, extrusion and texture upload.
#[allow(missing_docs)]
#[derive(Debug)]
pub enum TilesetError {
    /// File I/O error while reading a descriptor
    Io { path: PathBuf, source: io::Error },
    /// Descriptor JSON could not be parsed
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// Unsupported file format (non-JSON)
    UnsupportedFormat(String),
    /// A property declared a type this crate does not understand
    UnsupportedPropertyType {
        path: PathBuf,
        name: String,
        kind: String,
    },
    /// The sheet does not divide evenly into tiles
    MalformedGeometry {
        image_width: u32,
        image_height: u32,
        tile_width: u32,
        tile_height: u32,
    },
    /// Pixel buffer length does not match `width * height * 4`
    InvalidBitmap {
        width: u32,
        height: u32,
        len: usize,
    },
    /// The graphics context refused to create a texture, or the image slot was empty
    TextureCreation { index: usize, reason: String },
    /// `bind` was requested while no graphics context is attached
    NoContext,
    /// A texture reference from an older context epoch was used
    StaleEpoch { expected: u64, found: u64 },
}

impl fmt::Display for TilesetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TilesetError::Io { path, source } => {
                write!(f, "I/O error reading {}: {}", path.display(), source)
            }
            TilesetError::Json { path, source } => {
                write!(f, "JSON parse error in {}: {}", path.display(), source)
            }
            TilesetError::UnsupportedFormat(path) => write!(f, "Unsupported file format: {}", path),
            TilesetError::UnsupportedPropertyType { path, name, kind } => write!(
                f,
                "Property '{}' in {} has unsupported type '{}'",
                name,
                path.display(),
                kind
            ),
            TilesetError::MalformedGeometry {
                image_width,
                image_height,
                tile_width,
                tile_height,
            } => write!(
                f,
                "Image of {}x{} does not divide into {}x{} tiles",
                image_width, image_height, tile_width, tile_height
            ),
            TilesetError::InvalidBitmap { width, height, len } => write!(
                f,
                "Bitmap of {}x{} needs {} bytes, got {}",
                width,
                height,
                (*width as usize) * (*height as usize) * 4,
                len
            ),
            TilesetError::TextureCreation { index, reason } => {
                write!(f, "Failed to create texture for image {}: {}", index, reason)
            }
            TilesetError::NoContext => write!(f, "No graphics context attached"),
            TilesetError::StaleEpoch { expected, found } => write!(
                f,
                "Texture belongs to context epoch {} but the current epoch is {}",
                found, expected
            ),
        }
    }
}

impl std::error::Error for TilesetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TilesetError::Io { source, .. } => Some(source),
            TilesetError::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Why an image slot could not be filled. Reported by the loader; the slot
/// stays empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    /// Path that was requested
    pub path: String,
    /// Loader's description of the failure
    pub reason: String,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to load image {}: {}", self.path, self.reason)
    }
}

impl std::error::Error for LoadError {}
