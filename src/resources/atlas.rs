use std::path::Path;

use anyhow::{Context, ensure};

use crate::config::{TEXTURE_BYTES_PER_PIXEL, TEXTURE_HEIGHT, TEXTURE_WIDTH};

/// Edge of one square of the built-in atlas pattern, in pixels.
const CHECKER: u32 = 43;
const CHECKER_LIGHT: [u8; 4] = [0xD8, 0xC8, 0xB8, 0xFF];
const CHECKER_DARK: [u8; 4] = [0x90, 0x70, 0x50, 0xFF];

/// Reads the image at `path` and converts it with [`decode_atlas`].
pub async fn load_atlas(path: &Path) -> anyhow::Result<Vec<u8>> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    decode_atlas(&data).with_context(|| format!("decoding {}", path.display()))
}

/// Decodes an encoded image into the raw bytes the atlas texture expects:
/// BGRA, bottom row first, exactly [`TEXTURE_WIDTH`] x [`TEXTURE_HEIGHT`].
///
/// The shaders address the atlas with the origin at the bottom left, so the
/// rows are flipped here rather than in the texture coordinates.
pub fn decode_atlas(encoded: &[u8]) -> anyhow::Result<Vec<u8>> {
    let img = image::load_from_memory(encoded)?;
    ensure!(
        img.width() == TEXTURE_WIDTH && img.height() == TEXTURE_HEIGHT,
        "atlas is {}x{}, expected {TEXTURE_WIDTH}x{TEXTURE_HEIGHT}",
        img.width(),
        img.height()
    );
    let mut rgba = img.flipv().to_rgba8();
    for pixel in rgba.pixels_mut() {
        pixel.0.swap(0, 2);
    }
    Ok(rgba.into_raw())
}

/// A generated atlas for runs without an image: a two-tone checker pattern
/// over the whole texture, already in BGRA and bottom row first.
pub fn default_atlas() -> Vec<u8> {
    let mut raw = Vec::with_capacity((TEXTURE_WIDTH * TEXTURE_HEIGHT * TEXTURE_BYTES_PER_PIXEL) as usize);
    for y in 0..TEXTURE_HEIGHT {
        for x in 0..TEXTURE_WIDTH {
            let dark = (x / CHECKER + y / CHECKER) % 2 == 1;
            raw.extend_from_slice(if dark { &CHECKER_DARK } else { &CHECKER_LIGHT });
        }
    }
    raw
}
