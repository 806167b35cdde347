//! Macroquad-backed collaborators: a [`GraphicsContext`] over
//! [`Texture2D`] and an [`ImageLoader`] over [`load_image`].
//!
//! Both must be used from inside a running macroquad window.

use std::path::{Path, PathBuf};

use macroquad::material::Material;
use macroquad::texture::{load_image, FilterMode, Texture2D};

use crate::bitmap::Bitmap;
use crate::error::LoadError;
use crate::texture::{Filter, GraphicsContext, SamplerParams, Wrap};

/// Asynchronous source of decoded images.
#[allow(async_fn_in_trait)]
pub trait ImageLoader {
    /// Fetches and decodes the image at `path`.
    async fn load(&self, path: &str) -> Result<Bitmap, LoadError>;
}

/// Loads images relative to a base directory, usually the one holding the
/// map or tileset JSON.
#[derive(Debug, Clone)]
pub struct MacroquadImageLoader {
    base_dir: PathBuf,
}

impl MacroquadImageLoader {
    /// Loader resolving paths against `base_dir`.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        MacroquadImageLoader {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }
}

impl ImageLoader for MacroquadImageLoader {
    async fn load(&self, path: &str) -> Result<Bitmap, LoadError> {
        let full = self.base_dir.join(path);
        let full_str = full.to_str().ok_or_else(|| LoadError {
            path: path.to_owned(),
            reason: String::from("path is not valid UTF-8"),
        })?;
        let img = load_image(full_str).await.map_err(|e| LoadError {
            path: path.to_owned(),
            reason: format!("{:?}", e),
        })?;
        Ok(Bitmap::from(img))
    }
}

/// Texture context over macroquad. Texture slots are mapped to sampler
/// uniforms `"{prefix}{slot}"` of an optional material; those names must be
/// declared in the material's `MaterialParams::textures`.
pub struct MacroquadContext {
    material: Option<Material>,
    sampler_prefix: String,
    bound: Vec<Option<Texture2D>>,
}

impl MacroquadContext {
    /// Context that only tracks bindings, for use with the default pipeline.
    pub fn new() -> Self {
        MacroquadContext {
            material: None,
            sampler_prefix: String::from("Tileset"),
            bound: Vec::new(),
        }
    }

    /// Context that also forwards bindings to `material`.
    pub fn with_material(material: Material, sampler_prefix: impl Into<String>) -> Self {
        MacroquadContext {
            material: Some(material),
            sampler_prefix: sampler_prefix.into(),
            bound: Vec::new(),
        }
    }

    /// Texture last bound to `slot`.
    pub fn bound(&self, slot: u32) -> Option<&Texture2D> {
        self.bound.get(slot as usize)?.as_ref()
    }
}

impl std::fmt::Debug for MacroquadContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MacroquadContext")
            .field("has_material", &self.material.is_some())
            .field("sampler_prefix", &self.sampler_prefix)
            .field("bound", &self.bound.iter().filter(|b| b.is_some()).count())
            .finish()
    }
}

impl Default for MacroquadContext {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsContext for MacroquadContext {
    type Texture = Texture2D;

    fn create_texture(&mut self, image: &Bitmap) -> Result<Texture2D, String> {
        let w = u16::try_from(image.width())
            .map_err(|_| format!("width {} exceeds texture limits", image.width()))?;
        let h = u16::try_from(image.height())
            .map_err(|_| format!("height {} exceeds texture limits", image.height()))?;
        Ok(Texture2D::from_rgba8(w, h, image.bytes()))
    }

    fn set_sampler(&mut self, texture: &Texture2D, params: SamplerParams) {
        // macroquad exposes one filter for both directions
        let mode = match params.mag_filter {
            Filter::Nearest => FilterMode::Nearest,
            Filter::Linear => FilterMode::Linear,
        };
        texture.set_filter(mode);
        // new miniquad textures already clamp to edge
        if params.wrap_s != Wrap::ClampToEdge || params.wrap_t != Wrap::ClampToEdge {
            log::warn!("repeat wrapping is not supported by the macroquad backend");
        }
    }

    fn bind_texture(&mut self, slot: u32, texture: &Texture2D) {
        let slot = slot as usize;
        if self.bound.len() <= slot {
            self.bound.resize(slot + 1, None);
        }
        self.bound[slot] = Some(texture.clone());
        if let Some(material) = &self.material {
            material.set_texture(&format!("{}{}", self.sampler_prefix, slot), texture.clone());
        }
    }

    fn unbind_texture(&mut self, slot: u32) {
        if let Some(b) = self.bound.get_mut(slot as usize) {
            *b = None;
        }
        if let Some(material) = &self.material {
            material.set_texture(&format!("{}{}", self.sampler_prefix, slot), Texture2D::empty());
        }
    }

    fn delete_texture(&mut self, texture: Texture2D) {
        let id = texture.raw_miniquad_id();
        for b in self.bound.iter_mut() {
            if b.as_ref().map(|t| t.raw_miniquad_id()) == Some(id) {
                *b = None;
            }
        }
        // the GPU texture is freed once the last clone drops
        drop(texture);
    }
}
