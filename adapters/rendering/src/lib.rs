#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Rendering contracts and the bitmap encoder for sandpile adapters.

mod bitmap;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result as AnyResult};
use sandpile_core::{LatticeView, TOPPLE_THRESHOLD};

pub use bitmap::{encode, write_bitmap, BitmapError, BitmapLayout, PIXEL_DATA_OFFSET};

/// Number of entries stored in the bitmap color table.
pub const PALETTE_ENTRIES: usize = 16;

/// Palette entry stored in a bitmap color table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PaletteColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl PaletteColor {
    /// Creates a palette entry from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }

    /// Color table bytes in blue, green, red, reserved order.
    #[must_use]
    pub const fn to_bgr0(&self) -> [u8; 4] {
        [self.blue, self.green, self.red, 0]
    }
}

/// Colors indexed by grain count; counts at or above the threshold share the last entry.
pub const GRAIN_PALETTE: [PaletteColor; 5] = [
    PaletteColor::from_rgb(0xff, 0xff, 0xff),
    PaletteColor::from_rgb(0x00, 0xff, 0x00),
    PaletteColor::from_rgb(0xff, 0x00, 0xff),
    PaletteColor::from_rgb(0xff, 0xff, 0x00),
    PaletteColor::from_rgb(0x00, 0x00, 0x00),
];

/// Palette index used for a cell holding `grains` grains.
#[must_use]
pub fn color_index(grains: u64) -> u8 {
    grains.min(TOPPLE_THRESHOLD) as u8
}

/// Destination for lattice snapshots captured during a run.
pub trait SnapshotSink {
    /// Persists the view captured after `iteration` passes and describes where it went.
    fn capture(&mut self, iteration: u64, view: &LatticeView<'_>) -> AnyResult<PathBuf>;
}

/// Writes each snapshot as `state_<iteration>.bmp` inside a directory.
#[derive(Clone, Debug)]
pub struct BitmapDirectory {
    root: PathBuf,
}

impl BitmapDirectory {
    /// Creates a sink writing into `root`, which must already exist.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory receiving the bitmaps.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the bitmap captured after `iteration` passes.
    #[must_use]
    pub fn path_for(&self, iteration: u64) -> PathBuf {
        self.root.join(format!("state_{iteration}.bmp"))
    }
}

impl SnapshotSink for BitmapDirectory {
    fn capture(&mut self, iteration: u64, view: &LatticeView<'_>) -> AnyResult<PathBuf> {
        let path = self.path_for(iteration);
        write_bitmap(&path, view)
            .with_context(|| format!("failed to save state after iteration {iteration}"))?;
        Ok(path)
    }
}
