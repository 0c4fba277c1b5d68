/**
 * This module contains all logic for loading assets from external files
 * and for generating the ones that ship with the binary.
 */
pub mod atlas;
pub mod glyphs;

pub use atlas::{decode_atlas, default_atlas, load_atlas};
pub use glyphs::paint_glyph_strips;
