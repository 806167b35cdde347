use std::future::Future;
use std::task::{Context, Poll, Waker};

use macroquad_tiled_tileset::{Bitmap, GraphicsContext, ImageLoader, LoadError, SamplerParams};

/// Records every texture call instead of talking to a GPU.
#[derive(Debug, Default)]
pub struct RecordingContext {
    pub next_id: u32,
    pub live: Vec<u32>,
    pub created: Vec<(u32, u32, u32)>,
    pub samplers: Vec<(u32, SamplerParams)>,
    pub bound: Vec<(u32, u32)>,
    pub unbound: Vec<u32>,
    pub deleted: Vec<u32>,
    pub refuse: bool,
}

impl GraphicsContext for RecordingContext {
    type Texture = u32;

    fn create_texture(&mut self, image: &Bitmap) -> Result<u32, String> {
        if self.refuse {
            return Err(String::from("no texture memory"));
        }
        self.next_id += 1;
        self.live.push(self.next_id);
        self.created.push((self.next_id, image.width(), image.height()));
        Ok(self.next_id)
    }

    fn set_sampler(&mut self, texture: &u32, params: SamplerParams) {
        self.samplers.push((*texture, params));
    }

    fn bind_texture(&mut self, slot: u32, texture: &u32) {
        self.bound.push((slot, *texture));
    }

    fn unbind_texture(&mut self, slot: u32) {
        self.unbound.push(slot);
    }

    fn delete_texture(&mut self, texture: u32) {
        self.live.retain(|t| *t != texture);
        self.deleted.push(texture);
    }
}

/// Sheet where every pixel encodes its own coordinates.
pub fn numbered_sheet(width: u32, height: u32) -> Bitmap {
    let mut bmp = Bitmap::new(width, height);
    for y in 0..height {
        for x in 0..width {
            bmp.set_pixel(x, y, [x as u8, y as u8, 0x80, 0xFF]);
        }
    }
    bmp
}

/// Serves 4x4 images from memory; any path listed in `missing` fails.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    pub missing: Vec<&'static str>,
}

impl ImageLoader for MemoryLoader {
    async fn load(&self, path: &str) -> Result<Bitmap, LoadError> {
        if self.missing.iter().any(|m| *m == path) {
            return Err(LoadError {
                path: path.to_owned(),
                reason: String::from("not found"),
            });
        }
        Ok(numbered_sheet(4, 4))
    }
}

/// Polls `fut` to completion on the current thread.
pub fn block_on<F: Future>(fut: F) -> F::Output {
    let mut fut = std::pin::pin!(fut);
    let mut cx = Context::from_waker(Waker::noop());
    loop {
        if let Poll::Ready(out) = fut.as_mut().poll(&mut cx) {
            return out;
        }
    }
}
