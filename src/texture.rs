//! GPU texture ownership across graphics-context loss.
//!
//! Every [`TextureUploader::attach`] starts a new epoch. Textures are tagged
//! with the epoch they were created under, and a [`TextureRef`] handed out
//! under an older epoch is rejected instead of reaching a dead handle.

use crate::bitmap::Bitmap;
use crate::error::TilesetError;

/// Texel filtering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    /// Closest texel
    Nearest,
    /// Bilinear blend of the four nearest texels
    Linear,
}

/// Addressing outside `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wrap {
    /// Repeat the edge texel
    ClampToEdge,
    /// Tile the texture
    Repeat,
}

/// Sampling state applied to every created texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerParams {
    /// Filter when magnifying
    pub mag_filter: Filter,
    /// Filter when minifying
    pub min_filter: Filter,
    /// Horizontal wrap
    pub wrap_s: Wrap,
    /// Vertical wrap
    pub wrap_t: Wrap,
}

impl Default for SamplerParams {
    /// Nearest filtering with clamped edges. Linear filtering would still
    /// bleed at high zoom even with extruded sheets.
    fn default() -> Self {
        SamplerParams {
            mag_filter: Filter::Nearest,
            min_filter: Filter::Nearest,
            wrap_s: Wrap::ClampToEdge,
            wrap_t: Wrap::ClampToEdge,
        }
    }
}

/// Texture primitives of a graphics context.
pub trait GraphicsContext {
    /// Backend texture handle.
    type Texture;

    /// Uploads `image` as RGBA8. `Err` carries the backend's reason.
    fn create_texture(&mut self, image: &Bitmap) -> Result<Self::Texture, String>;
    /// Applies filtering and wrapping to `texture`.
    fn set_sampler(&mut self, texture: &Self::Texture, params: SamplerParams);
    /// Attaches `texture` to sampler slot `slot`.
    fn bind_texture(&mut self, slot: u32, texture: &Self::Texture);
    /// Leaves sampler slot `slot` with no texture.
    fn unbind_texture(&mut self, slot: u32);
    /// Frees `texture`.
    fn delete_texture(&mut self, texture: Self::Texture);
}

#[derive(Debug)]
struct OwnedTexture<T> {
    handle: T,
    epoch: u64,
    params: SamplerParams,
}

/// Epoch-tagged reference to the texture of one image slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureRef {
    /// Image slot
    pub index: usize,
    /// Context epoch the texture was created under
    pub epoch: u64,
}

/// Owns one texture per image slot for the currently attached context.
pub struct TextureUploader<C: GraphicsContext> {
    ctx: Option<C>,
    textures: Vec<Option<OwnedTexture<C::Texture>>>,
    epoch: u64,
    params: SamplerParams,
}

impl<C: GraphicsContext> std::fmt::Debug for TextureUploader<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureUploader")
            .field("attached", &self.ctx.is_some())
            .field("epoch", &self.epoch)
            .field("textures", &self.texture_count())
            .finish()
    }
}

impl<C: GraphicsContext> Default for TextureUploader<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: GraphicsContext> TextureUploader<C> {
    /// Uploader with no context attached.
    pub fn new() -> Self {
        TextureUploader {
            ctx: None,
            textures: Vec::new(),
            epoch: 0,
            params: SamplerParams::default(),
        }
    }

    /// `true` while a context is attached.
    #[inline] pub fn is_attached(&self) -> bool { self.ctx.is_some() }
    /// Number of attaches so far.
    #[inline] pub fn epoch(&self) -> u64 { self.epoch }

    /// The attached context.
    pub fn context(&self) -> Option<&C> {
        self.ctx.as_ref()
    }

    /// The attached context, mutably.
    pub fn context_mut(&mut self) -> Option<&mut C> {
        self.ctx.as_mut()
    }

    /// Number of live textures.
    pub fn texture_count(&self) -> usize {
        self.textures.iter().filter(|t| t.is_some()).count()
    }

    /// Replaces the current context with `ctx` and creates a texture for
    /// every loaded image. Empty slots are filled later through
    /// [`create_texture_for`](Self::create_texture_for).
    ///
    /// If any texture fails, the ones created by this call are deleted and
    /// `ctx` stays attached with no textures.
    pub fn attach(&mut self, ctx: C, images: &[Option<Bitmap>]) -> Result<(), TilesetError> {
        self.detach();

        self.ctx = Some(ctx);
        self.epoch += 1;
        self.textures.clear();
        self.textures.resize_with(images.len(), || None);

        for (index, image) in images.iter().enumerate() {
            if image.is_none() {
                continue;
            }
            if let Err(err) = self.create_texture_for(index, images) {
                self.delete_all();
                return Err(err);
            }
        }
        log::debug!(
            "attached context (epoch {}), {} texture(s) created",
            self.epoch,
            self.texture_count()
        );
        Ok(())
    }

    /// Deletes every texture and releases the context. No-op when nothing is
    /// attached.
    pub fn detach(&mut self) -> Option<C> {
        self.ctx.as_ref()?;
        self.delete_all();
        self.textures.clear();
        log::debug!("detached context (epoch {})", self.epoch);
        self.ctx.take()
    }

    fn delete_all(&mut self) {
        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };
        for slot in self.textures.iter_mut() {
            if let Some(tex) = slot.take() {
                ctx.delete_texture(tex.handle);
            }
        }
    }

    /// Creates the texture for image slot `index`, replacing any texture
    /// already there.
    pub fn create_texture_for(
        &mut self,
        index: usize,
        images: &[Option<Bitmap>],
    ) -> Result<(), TilesetError> {
        let ctx = self.ctx.as_mut().ok_or(TilesetError::NoContext)?;
        let image = images
            .get(index)
            .and_then(|i| i.as_ref())
            .ok_or_else(|| TilesetError::TextureCreation {
                index,
                reason: String::from("image is not loaded"),
            })?;

        if self.textures.len() < images.len() {
            self.textures.resize_with(images.len(), || None);
        }
        if let Some(old) = self.textures[index].take() {
            ctx.delete_texture(old.handle);
        }

        let handle = ctx
            .create_texture(image)
            .map_err(|reason| TilesetError::TextureCreation { index, reason })?;
        ctx.set_sampler(&handle, self.params);

        log::debug!(
            "created {}x{} texture for image {} (epoch {})",
            image.width(),
            image.height(),
            index,
            self.epoch
        );
        self.textures[index] = Some(OwnedTexture {
            handle,
            epoch: self.epoch,
            params: self.params,
        });
        Ok(())
    }

    /// Binds texture `i` to slot `start_slot + i` for every image slot.
    /// Slots whose image has no texture yet are unbound.
    ///
    /// # Panics
    ///
    /// Panics if no context is attached.
    pub fn bind(&mut self, start_slot: u32) {
        if let Err(err) = self.try_bind(start_slot) {
            panic!("cannot call `bind` before `attach`: {err}");
        }
    }

    /// [`bind`](Self::bind) returning [`TilesetError::NoContext`] instead
    /// of panicking.
    pub fn try_bind(&mut self, start_slot: u32) -> Result<(), TilesetError> {
        let ctx = self.ctx.as_mut().ok_or(TilesetError::NoContext)?;
        for (i, tex) in self.textures.iter().enumerate() {
            let slot = start_slot + i as u32;
            match tex {
                Some(tex) => ctx.bind_texture(slot, &tex.handle),
                None => ctx.unbind_texture(slot),
            }
        }
        Ok(())
    }

    /// Reference to the texture of slot `index` under the current epoch.
    pub fn texture(&self, index: usize) -> Option<TextureRef> {
        let tex = self.textures.get(index)?.as_ref()?;
        Some(TextureRef {
            index,
            epoch: tex.epoch,
        })
    }

    /// Resolves `r`, rejecting references from an earlier context.
    pub fn get(&self, r: TextureRef) -> Result<&C::Texture, TilesetError> {
        if r.epoch != self.epoch || self.ctx.is_none() {
            return Err(TilesetError::StaleEpoch {
                expected: self.epoch,
                found: r.epoch,
            });
        }
        self.textures
            .get(r.index)
            .and_then(|t| t.as_ref())
            .map(|t| &t.handle)
            .ok_or_else(|| TilesetError::TextureCreation {
                index: r.index,
                reason: String::from("no texture in slot"),
            })
    }

    /// Sampling parameters the texture in slot `index` was created with.
    pub fn sampler(&self, index: usize) -> Option<SamplerParams> {
        self.textures.get(index)?.as_ref().map(|t| t.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingContext {
        next: u32,
        live: Vec<u32>,
        bound: Vec<(u32, u32)>,
        unbound: Vec<u32>,
        refuse: bool,
    }

    impl GraphicsContext for CountingContext {
        type Texture = u32;

        fn create_texture(&mut self, _image: &Bitmap) -> Result<u32, String> {
            if self.refuse {
                return Err(String::from("out of memory"));
            }
            self.next += 1;
            self.live.push(self.next);
            Ok(self.next)
        }

        fn set_sampler(&mut self, _texture: &u32, _params: SamplerParams) {}

        fn bind_texture(&mut self, slot: u32, texture: &u32) {
            self.bound.push((slot, *texture));
        }

        fn unbind_texture(&mut self, slot: u32) {
            self.unbound.push(slot);
        }

        fn delete_texture(&mut self, texture: u32) {
            self.live.retain(|t| *t != texture);
        }
    }

    fn images(n: usize) -> Vec<Option<Bitmap>> {
        (0..n).map(|_| Some(Bitmap::new(2, 2))).collect()
    }

    #[test]
    fn detach_before_attach_is_noop() {
        let mut up = TextureUploader::<CountingContext>::new();
        assert!(up.detach().is_none());
        assert!(up.detach().is_none());
    }

    #[test]
    fn attach_skips_unloaded_images() {
        let mut up = TextureUploader::new();
        let imgs = vec![Some(Bitmap::new(2, 2)), None, Some(Bitmap::new(2, 2))];
        up.attach(CountingContext::default(), &imgs).expect("attach");
        assert_eq!(up.texture_count(), 2);
        assert!(up.texture(1).is_none());
        assert_eq!(up.sampler(0), Some(SamplerParams::default()));
    }

    #[test]
    fn detach_deletes_everything() {
        let mut up = TextureUploader::new();
        up.attach(CountingContext::default(), &images(3)).expect("attach");
        let ctx = up.detach().expect("was attached");
        assert!(ctx.live.is_empty());
        assert_eq!(up.texture_count(), 0);
    }

    #[test]
    fn bind_uses_contiguous_slots() {
        let mut up = TextureUploader::new();
        up.attach(CountingContext::default(), &images(2)).expect("attach");
        up.bind(3);
        let ctx = up.context().expect("attached");
        assert_eq!(ctx.bound, vec![(3, 1), (4, 2)]);
    }

    #[test]
    fn bind_clears_slots_without_texture() {
        let mut up = TextureUploader::new();
        let imgs = vec![Some(Bitmap::new(2, 2)), None];
        up.attach(CountingContext::default(), &imgs).expect("attach");
        up.bind(5);
        let ctx = up.context().expect("attached");
        assert_eq!(ctx.bound, vec![(5, 1)]);
        assert_eq!(ctx.unbound, vec![6]);
    }

    #[test]
    #[should_panic(expected = "before `attach`")]
    fn bind_without_context_panics() {
        let mut up = TextureUploader::<CountingContext>::new();
        up.bind(0);
    }

    #[test]
    fn try_bind_without_context_errors() {
        let mut up = TextureUploader::<CountingContext>::new();
        assert!(matches!(up.try_bind(0), Err(TilesetError::NoContext)));
    }

    #[test]
    fn recreating_a_slot_deletes_the_old_texture() {
        let mut up = TextureUploader::new();
        let imgs = images(1);
        up.attach(CountingContext::default(), &imgs).expect("attach");
        up.create_texture_for(0, &imgs).expect("recreate");
        assert_eq!(up.context().expect("attached").live, vec![2]);
    }

    #[test]
    fn refs_from_old_epoch_are_rejected() {
        let mut up = TextureUploader::new();
        let imgs = images(1);
        up.attach(CountingContext::default(), &imgs).expect("attach");
        let old = up.texture(0).expect("texture");
        assert!(up.get(old).is_ok());

        let ctx = up.detach().expect("attached");
        assert!(matches!(up.get(old), Err(TilesetError::StaleEpoch { .. })));

        up.attach(ctx, &imgs).expect("reattach");
        assert!(matches!(up.get(old), Err(TilesetError::StaleEpoch { .. })));
        let fresh = up.texture(0).expect("texture");
        assert_eq!(fresh.epoch, old.epoch + 1);
        assert!(up.get(fresh).is_ok());
    }

    #[test]
    fn refused_allocation_surfaces_and_rolls_back() {
        let mut up = TextureUploader::new();
        let ctx = CountingContext {
            refuse: true,
            ..Default::default()
        };
        let err = up.attach(ctx, &images(2)).unwrap_err();
        assert!(matches!(err, TilesetError::TextureCreation { index: 0, .. }));
        assert!(up.is_attached());
        assert_eq!(up.texture_count(), 0);
    }

    #[test]
    fn missing_image_is_a_creation_error() {
        let mut up = TextureUploader::new();
        up.attach(CountingContext::default(), &[None]).expect("attach");
        let err = up.create_texture_for(0, &[None]).unwrap_err();
        assert!(matches!(err, TilesetError::TextureCreation { index: 0, .. }));
    }
}
