use serde::Deserialize;
use std::path::Path;

use crate::error::TilesetError;
use crate::properties::{properties_from_json, JsonProperty, Properties};

#[derive(Deserialize)]
struct JsonTile {
    id: u32,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

#[derive(Deserialize)]
struct JsonTileset {
    #[serde(default)]
    name: String,
    #[serde(default = "one")]
    firstgid: u32,
    tilecount: u32,
    tilewidth: u32,
    tileheight: u32,
    #[serde(default)]
    columns: u32,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    imagewidth: u32,
    #[serde(default)]
    imageheight: u32,
    #[serde(default)]
    margin: Option<u32>,
    #[serde(default)]
    spacing: Option<u32>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
    #[serde(default)]
    tiles: Vec<JsonTile>,
}

fn one() -> u32 {
    1
}

/// Metadata attached to one tile of a tileset.
#[derive(Debug, Clone, PartialEq)]
pub struct TileMeta {
    /// Local tile id
    pub id: u32,
    /// Own image for image-collection tilesets.
    pub image: Option<String>,
    /// Custom properties of the tile
    pub properties: Properties,
}

/// Immutable tileset geometry plus per-tile metadata.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub struct TilesetDescriptor {
    pub name: String,
    /// Gid of local tile 0
    pub first_gid: u32,
    pub tilecount: u32,
    pub tile_w: u32,
    pub tile_h: u32,
    /// Tiles per sheet row, 0 for image collections
    pub columns: u32,
    /// Shared sheet image, if any.
    pub image: Option<String>,
    pub image_w: u32,
    pub image_h: u32,
    /// Declared margin of the unprocessed sheet
    pub margin: Option<u32>,
    /// Declared spacing of the unprocessed sheet
    pub spacing: Option<u32>,
    pub properties: Properties,
    /// Tiles carrying metadata or their own image
    pub tiles: Vec<TileMeta>,
}

impl TilesetDescriptor {
    /// Minimal single-sheet descriptor, mostly useful for tests and tools.
    pub fn sheet(first_gid: u32, tile_w: u32, tile_h: u32, columns: u32, tilecount: u32) -> Self {
        let rows = if columns == 0 { 0 } else { tilecount.div_ceil(columns) };
        TilesetDescriptor {
            name: String::new(),
            first_gid,
            tilecount,
            tile_w,
            tile_h,
            columns,
            image: Some(String::from("tiles.png")),
            image_w: columns * tile_w,
            image_h: rows * tile_h,
            margin: None,
            spacing: None,
            properties: Properties::new(),
            tiles: Vec::new(),
        }
    }

    /// Parses descriptor JSON held in memory.
    pub fn from_json_str(json: &str) -> Result<Self, TilesetError> {
        Self::parse(json, Path::new("<inline>"))
    }

    /// Load a descriptor from a file path, only supporting JSON for now
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TilesetError> {
        let p = path.as_ref();
        if p.extension().and_then(|e| e.to_str()) != Some("json") {
            return Err(TilesetError::UnsupportedFormat(p.display().to_string()));
        }
        let txt = std::fs::read_to_string(p).map_err(|source| TilesetError::Io {
            path: p.to_path_buf(),
            source,
        })?;
        Self::parse(&txt, p)
    }

    fn parse(json: &str, origin: &Path) -> Result<Self, TilesetError> {
        let j: JsonTileset = serde_json::from_str(json).map_err(|source| TilesetError::Json {
            path: origin.to_path_buf(),
            source,
        })?;

        let tiles = j
            .tiles
            .into_iter()
            .map(|tile| -> Result<TileMeta, TilesetError> {
                Ok(TileMeta {
                    id: tile.id,
                    image: tile.image,
                    properties: properties_from_json(tile.properties, origin)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TilesetDescriptor {
            name: j.name,
            first_gid: j.firstgid,
            tilecount: j.tilecount,
            tile_w: j.tilewidth,
            tile_h: j.tileheight,
            columns: j.columns,
            image: j.image,
            image_w: j.imagewidth,
            image_h: j.imageheight,
            margin: j.margin,
            spacing: j.spacing,
            properties: properties_from_json(j.properties, origin)?,
            tiles,
        })
    }

    /// Rows of the sheet image, rounding a partial last row up.
    pub fn rows(&self) -> u32 {
        if self.tile_h == 0 {
            return 0;
        }
        self.image_h.div_ceil(self.tile_h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock went backwards")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("mq_tileset_desc_{nanos}"));
        fs::create_dir_all(&dir).expect("failed to create temp dir");
        dir
    }

    const SHEET: &str = r#"{
      "name":"terrain",
      "firstgid":1,
      "tilewidth":16,
      "tileheight":16,
      "tilecount":4,
      "columns":2,
      "image":"terrain.png",
      "imagewidth":32,
      "imageheight":32,
      "properties":[{"name":"biome","type":"string","value":"forest"}],
      "tiles":[
        {"id":3,"properties":[{"name":"damage","type":"int","value":10}]}
      ]
    }"#;

    #[test]
    fn parses_sheet_descriptor() {
        let desc = TilesetDescriptor::from_json_str(SHEET).expect("parse");
        assert_eq!(desc.name, "terrain");
        assert_eq!(desc.first_gid, 1);
        assert_eq!((desc.tile_w, desc.tile_h), (16, 16));
        assert_eq!(desc.columns, 2);
        assert_eq!(desc.rows(), 2);
        assert_eq!(desc.image.as_deref(), Some("terrain.png"));
        assert_eq!(desc.margin, None);
        assert_eq!(desc.properties.get_string("biome"), Some("forest"));
        assert_eq!(desc.tiles.len(), 1);
        assert_eq!(desc.tiles[0].properties.get_i32("damage"), Some(10));
    }

    #[test]
    fn parses_image_collection() {
        let json = r#"{
          "tilewidth":32, "tileheight":32, "tilecount":2, "columns":0,
          "tiles":[{"id":0,"image":"a.png"},{"id":1,"image":"b.png"}]
        }"#;
        let desc = TilesetDescriptor::from_json_str(json).expect("parse");
        assert_eq!(desc.first_gid, 1);
        assert_eq!(desc.image, None);
        assert_eq!(desc.tiles[1].image.as_deref(), Some("b.png"));
    }

    #[test]
    fn loads_from_file() {
        let dir = temp_dir();
        let path = dir.join("terrain.json");
        fs::write(&path, SHEET).expect("failed to write tileset");
        let desc = TilesetDescriptor::from_file(&path).expect("load");
        assert_eq!(desc.tilecount, 4);
    }

    #[test]
    fn property_errors_name_the_file() {
        let dir = temp_dir();
        let path = dir.join("bad_props.json");
        let json = r#"{
          "tilewidth":16, "tileheight":16, "tilecount":1, "columns":1,
          "tiles":[{"id":0,"properties":[{"name":"x","type":"mystery","value":1}]}]
        }"#;
        fs::write(&path, json).expect("failed to write tileset");

        let err = TilesetDescriptor::from_file(&path).unwrap_err();
        assert!(matches!(
            err,
            TilesetError::UnsupportedPropertyType { path: ref p, .. } if *p == path
        ));
    }

    #[test]
    fn returns_typed_errors() {
        let err = TilesetDescriptor::from_file("terrain.tsx").unwrap_err();
        assert!(matches!(err, TilesetError::UnsupportedFormat(_)));

        let err = TilesetDescriptor::from_file(temp_dir().join("missing.json")).unwrap_err();
        assert!(matches!(err, TilesetError::Io { .. }));

        let err = TilesetDescriptor::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, TilesetError::Json { .. }));
    }
}
