use anyhow::Context;
use macroquad::prelude::*;
use macroquad_tiled_tileset::{MacroquadContext, MacroquadImageLoader, TileId, Tileset, TilesetDescriptor};
use std::path::Path;

fn window_conf() -> Conf {
    Conf {
        window_title: "Tileset Viewer".into(),
        window_width: 1280,
        window_height: 720,
        ..Default::default()
    }
}

async fn load(path: &str) -> anyhow::Result<Tileset<MacroquadContext>> {
    let desc = TilesetDescriptor::from_file(path).with_context(|| format!("Reading tileset {}", path))?;
    let base = Path::new(path).parent().unwrap_or_else(|| Path::new("./"));

    let mut tileset = Tileset::new(desc);
    tileset.attach(MacroquadContext::new())?;
    let loaded = tileset
        .load_images(&MacroquadImageLoader::new(base))
        .await
        .context("Loading tileset images")?;
    println!("loaded {} image(s)", loaded);
    Ok(tileset)
}

#[macroquad::main(window_conf)]
async fn main() {
    let path = std::env::args().nth(1).unwrap_or_else(|| String::from("assets/tileset.json"));
    let mut tileset = load(&path).await.expect("Failed to load tileset");
    let scale = 4.0;

    loop {
        clear_background(BLACK);
        tileset.bind(0);

        let first = tileset.first_gid();
        for local in 0..tileset.tilecount() {
            let Some(gid) = first.checked_add(local) else {
                break;
            };
            let Some(props) = tileset.tile_properties(TileId(gid)) else {
                continue;
            };
            let Some(src) = tileset.source_rect(&props) else {
                continue;
            };
            let Some(tex) = tileset
                .uploader()
                .context()
                .and_then(|ctx| ctx.bound(props.img_index as u32))
            else {
                continue;
            };
            let (col, row) = props.coords;
            draw_texture_ex(
                tex,
                20.0 + col as f32 * (src.w * scale + 4.0),
                60.0 + row as f32 * (src.h * scale + 4.0),
                WHITE,
                DrawTextureParams {
                    source: Some(src),
                    dest_size: Some(vec2(src.w * scale, src.h * scale)),
                    ..Default::default()
                },
            );
        }

        draw_text(&format!("FPS: {}", get_fps()), 20.0, 30.0, 30.0, RED);
        next_frame().await;
    }
}
