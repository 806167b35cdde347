//! Packed global tile ids.
//!
//! Bits 31/30/29 of a gid are the horizontal, vertical and anti-diagonal
//! flip flags; bits 0..=28 carry the index. A gid of `0` is "no tile".

/// Horizontal flip, bit 31.
pub const FLIP_H: u32 = 0x8000_0000;
/// Vertical flip, bit 30.
pub const FLIP_V: u32 = 0x4000_0000;
/// Anti-diagonal flip, bit 29.
pub const FLIP_D: u32 = 0x2000_0000;
/// All three flip bits.
pub const FLIP_ALL: u32 = FLIP_H | FLIP_V | FLIP_D;
/// Index bits, the lower 29.
pub const GID_MASK: u32 = 0x1FFF_FFFF;

/// A raw gid as it appears in map data, flip flags included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId(pub u32);

#[allow(missing_docs)]
impl TileId {
    #[inline] pub fn raw(self) -> u32 { self.0 }
    #[inline] pub fn clean(self) -> u32 { self.0 & GID_MASK }
    #[inline] pub fn is_empty(self) -> bool { self.0 == 0 }
    #[inline] pub fn flip_h(self) -> bool { (self.0 & FLIP_H) != 0 }
    #[inline] pub fn flip_v(self) -> bool { (self.0 & FLIP_V) != 0 }
    #[inline] pub fn flip_d(self) -> bool { (self.0 & FLIP_D) != 0 }
}

impl From<u32> for TileId {
    fn from(gid: u32) -> Self {
        TileId(gid)
    }
}

/// A gid resolved against a tileset's `first_gid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalTileRef {
    /// Index within the tileset, `0..tilecount`
    pub local_index: u32,
    /// Mirrored horizontally
    pub flip_x: bool,
    /// Mirrored vertically
    pub flip_y: bool,
    /// Mirrored along the anti-diagonal
    pub flip_diagonal: bool,
}

/// Local id of `gid` relative to `first_gid`. Negative when the gid belongs
/// to an earlier tileset.
#[inline]
pub fn local_id(gid: TileId, first_gid: u32) -> i64 {
    gid.clean() as i64 - first_gid as i64
}

/// `true` iff `0 <= index < tilecount`.
#[inline]
pub fn contains_local(index: i64, tilecount: u32) -> bool {
    index >= 0 && index < tilecount as i64
}

/// Decodes `gid` into a local tile reference. `None` for the empty gid and
/// for gids below `first_gid`; range checks against the tile count are left
/// to [`contains_local`].
pub fn decode(gid: TileId, first_gid: u32) -> Option<LocalTileRef> {
    if gid.is_empty() {
        return None;
    }
    let local = local_id(gid, first_gid);
    if local < 0 {
        return None;
    }
    Some(LocalTileRef {
        local_index: local as u32,
        flip_x: gid.flip_h(),
        flip_y: gid.flip_v(),
        flip_diagonal: gid.flip_d(),
    })
}

/// Inverse of [`decode`]. `None` when the index does not fit the 29 index
/// bits.
pub fn encode(tile: LocalTileRef, first_gid: u32) -> Option<TileId> {
    let mut gid = tile.local_index.checked_add(first_gid)?;
    if gid > GID_MASK {
        return None;
    }
    if tile.flip_x {
        gid |= FLIP_H;
    }
    if tile.flip_y {
        gid |= FLIP_V;
    }
    if tile.flip_diagonal {
        gid |= FLIP_D;
    }
    Some(TileId(gid))
}
