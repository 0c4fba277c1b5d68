//! Constants and runtime configuration.
//!
//! Everything that fixes the shape of the workload lives here: the atlas
//! dimensions the shaders are written against, the capacity of the instance
//! buffer, the eight selectable load levels and the layout of the status grid.
//! [`EngineConfig`] carries the few knobs that may change between runs.
//!
//! # Key types
//!
//! - [`LoadLevel`] is the closed set of instance counts the host can select
//! - [`EngineConfig`] is the runtime configuration, usually built via [`EngineConfig::from_env`]

use std::path::PathBuf;

/// Width in pixels of the atlas the shaders sample from.
pub const TEXTURE_WIDTH: u32 = 2952;
/// Height in pixels of the atlas the shaders sample from.
pub const TEXTURE_HEIGHT: u32 = 1967;
/// Bytes per atlas pixel (B, G, R, A).
pub const TEXTURE_BYTES_PER_PIXEL: u32 = 4;

/// Capacity of the instance-scale buffer. No load level may exceed it.
pub const MAX_INSTANCES: u32 = 1_500_000;
/// Scale written to every instance slot before the first frame.
pub const BASELINE_SCALE: f32 = 0.55;
/// Clear colour of every frame.
pub const BACKGROUND: [f32; 4] = [0.95, 0.95, 0.95, 1.0];

/// Vertices in the cube mesh: 6 faces, 2 triangles each.
pub const CUBE_VERTEX_COUNT: u32 = 36;

/// Character cells per status grid row.
pub const STATUS_COLUMNS: usize = 128;
/// Rows in the status grid. Row 0 is the bottom line of the screen.
pub const STATUS_ROWS: usize = 5;
/// Instances the vertex shader turns into text cells instead of cubes.
pub const TEXT_INSTANCES: u32 = (STATUS_COLUMNS * STATUS_ROWS) as u32;
/// Number of packed 32-bit words holding the grid, four glyphs per word.
pub const STATUS_WORDS: usize = STATUS_COLUMNS * STATUS_ROWS / 4;

pub const APP_NAME: &str = "GPU stress";
pub const WINDOW_POSITION: (i32, i32) = (380, 140);
pub const WINDOW_SIZE: (u32, u32) = (990, 750);

/// The instance counts the host can step through.
///
/// Every level fits into [`MAX_INSTANCES`], so a level can always be drawn
/// from the buffer allocated at init.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LoadLevel {
    #[default]
    Minimal,
    Light,
    Moderate,
    Medium,
    Heavy,
    Severe,
    Extreme,
    Maximum,
}

impl LoadLevel {
    pub const ALL: [LoadLevel; 8] = [
        LoadLevel::Minimal,
        LoadLevel::Light,
        LoadLevel::Moderate,
        LoadLevel::Medium,
        LoadLevel::Heavy,
        LoadLevel::Severe,
        LoadLevel::Extreme,
        LoadLevel::Maximum,
    ];

    /// Number of instances drawn per frame at this level.
    pub fn instances(self) -> u32 {
        match self {
            LoadLevel::Minimal => 1_000,
            LoadLevel::Light => 30_000,
            LoadLevel::Moderate => 100_000,
            LoadLevel::Medium => 300_000,
            LoadLevel::Heavy => 500_000,
            LoadLevel::Severe => 700_000,
            LoadLevel::Extreme => 1_000_000,
            LoadLevel::Maximum => 1_500_000,
        }
    }

    /// Bytes of instance data uploaded per frame at this level.
    pub fn upload_bytes(self) -> u64 {
        self.instances() as u64 * std::mem::size_of::<f32>() as u64
    }

    /// The next heavier level, or `None` at [`LoadLevel::Maximum`].
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// The next lighter level, or `None` at [`LoadLevel::Minimal`].
    pub fn prev(self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// What the host asks of the presentation surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelFormatRequest {
    pub color_bits: u8,
    pub depth_bits: u8,
    pub double_buffer: bool,
}

impl Default for PixelFormatRequest {
    fn default() -> Self {
        Self {
            color_bits: 16,
            depth_bits: 16,
            double_buffer: true,
        }
    }
}

/// Runtime configuration of the host and the rendering backend.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Image decoded into the atlas texture. `None` selects the generated
    /// atlas built into the binary.
    pub atlas_path: Option<PathBuf>,
    /// Cap presentation at the display refresh rate.
    pub vsync: bool,
    pub pixel_format: PixelFormatRequest,
    pub initial_load: LoadLevel,
    pub initial_depth_test: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            atlas_path: None,
            vsync: false,
            pixel_format: PixelFormatRequest::default(),
            initial_load: LoadLevel::default(),
            initial_depth_test: true,
        }
    }
}

impl EngineConfig {
    pub const ATLAS_ENV: &'static str = "GPU_STRESS_ATLAS";
    pub const VSYNC_ENV: &'static str = "GPU_STRESS_VSYNC";

    /// Defaults, overridden by `GPU_STRESS_ATLAS` and `GPU_STRESS_VSYNC`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var(Self::ATLAS_ENV) {
            config.atlas_path = Some(PathBuf::from(path));
        }
        if let Ok(value) = std::env::var(Self::VSYNC_ENV) {
            match parse_flag(&value) {
                Some(vsync) => config.vsync = vsync,
                None => log::warn!("Ignoring {}={value}: expected on/off", Self::VSYNC_ENV),
            }
        }
        config
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "on" | "true" | "yes" => Some(true),
        "0" | "off" | "false" | "no" => Some(false),
        _ => None,
    }
}
