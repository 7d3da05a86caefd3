//! 4-bit indexed BMP encoding of lattice views.

use std::{
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
};

use sandpile_core::LatticeView;
use thiserror::Error;

use crate::{color_index, GRAIN_PALETTE, PALETTE_ENTRIES};

const SIGNATURE: [u8; 2] = *b"BM";
const FILE_HEADER_LEN: u32 = 14;
const INFO_HEADER_LEN: u32 = 40;
const PALETTE_LEN: u32 = PALETTE_ENTRIES as u32 * 4;
const BITS_PER_PIXEL: u16 = 4;
const PLANES: u16 = 1;
const COMPRESSION_NONE: u32 = 0;

/// Offset of the first pixel byte from the start of the file.
pub const PIXEL_DATA_OFFSET: u32 = FILE_HEADER_LEN + INFO_HEADER_LEN + PALETTE_LEN;

/// Errors reported while encoding or persisting a bitmap.
#[derive(Debug, Error)]
pub enum BitmapError {
    /// The lattice is too large to describe in the 32-bit header fields.
    #[error("lattice of {width}x{height} cells does not fit in a bitmap header")]
    Oversized {
        /// Columns in the lattice.
        width: usize,
        /// Rows in the lattice.
        height: usize,
    },
    /// The destination file could not be opened for writing.
    #[error("could not create bitmap file {}", .path.display())]
    Create {
        /// Destination that failed to open.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The encoded bytes could not be written to the destination.
    #[error("could not write bitmap file {}", .path.display())]
    Write {
        /// Destination that failed to accept the bytes.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

/// Sizes derived from the lattice dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitmapLayout {
    width: u32,
    height: u32,
    row_size: u32,
    pixel_array_size: u32,
    file_size: u32,
}

impl BitmapLayout {
    /// Computes the layout of a bitmap with one pixel per cell.
    pub fn new(width: usize, height: usize) -> Result<Self, BitmapError> {
        let oversized = || BitmapError::Oversized { width, height };
        let signed_width = i32::try_from(width).map_err(|_| oversized())?;
        let signed_height = i32::try_from(height).map_err(|_| oversized())?;
        let width = signed_width.unsigned_abs();
        let height = signed_height.unsigned_abs();

        let row_bits = u64::from(width) * u64::from(BITS_PER_PIXEL);
        let row_size = u32::try_from((row_bits + 31) / 32 * 4).map_err(|_| oversized())?;
        let pixel_array_size = row_size.checked_mul(height).ok_or_else(oversized)?;
        let file_size = pixel_array_size
            .checked_add(PIXEL_DATA_OFFSET)
            .ok_or_else(oversized)?;

        Ok(Self {
            width,
            height,
            row_size,
            pixel_array_size,
            file_size,
        })
    }

    /// Image width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per stored row, padded to a 4-byte boundary.
    #[must_use]
    pub const fn row_size(&self) -> u32 {
        self.row_size
    }

    /// Bytes in the pixel array.
    #[must_use]
    pub const fn pixel_array_size(&self) -> u32 {
        self.pixel_array_size
    }

    /// Bytes in the complete file.
    #[must_use]
    pub const fn file_size(&self) -> u32 {
        self.file_size
    }
}

/// Encodes the view as a bottom-up 4-bit indexed bitmap.
///
/// Stored rows run from the largest `y` to the smallest, so the smallest `y`
/// is drawn at the top of the image.
pub fn encode(view: &LatticeView<'_>) -> Result<Vec<u8>, BitmapError> {
    let layout = BitmapLayout::new(view.width(), view.height())?;
    let mut out = HeaderWriter::with_capacity(layout.file_size as usize);

    out.bytes(&SIGNATURE);
    out.u32(layout.file_size);
    out.u16(0);
    out.u16(0);
    out.u32(PIXEL_DATA_OFFSET);

    out.u32(INFO_HEADER_LEN);
    out.i32(layout.width as i32);
    out.i32(layout.height as i32);
    out.u16(PLANES);
    out.u16(BITS_PER_PIXEL);
    out.u32(COMPRESSION_NONE);
    out.u32(layout.pixel_array_size);
    out.i32(0);
    out.i32(0);
    out.u32(GRAIN_PALETTE.len() as u32);
    out.u32(0);

    for entry in 0..PALETTE_ENTRIES {
        match GRAIN_PALETTE.get(entry) {
            Some(color) => out.bytes(&color.to_bgr0()),
            None => out.bytes(&[0; 4]),
        }
    }

    let row_size = layout.row_size as usize;
    for row in view.rows().rev() {
        let start = out.len();
        for pair in row.chunks(2) {
            let high = color_index(pair[0]) << 4;
            let low = pair.get(1).map_or(0, |&grains| color_index(grains));
            out.bytes(&[high | low]);
        }
        out.pad_to(start + row_size);
    }

    Ok(out.finish())
}

/// Encodes the view and writes it to `path`, replacing any existing file.
pub fn write_bitmap(path: &Path, view: &LatticeView<'_>) -> Result<(), BitmapError> {
    let bytes = encode(view)?;
    let mut file = File::create(path).map_err(|source| BitmapError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    file.write_all(&bytes)
        .and_then(|()| file.flush())
        .map_err(|source| BitmapError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// Little-endian field writer for the bitmap headers.
struct HeaderWriter {
    buffer: Vec<u8>,
}

impl HeaderWriter {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    fn len(&self) -> usize {
        self.buffer.len()
    }

    fn bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    fn u16(&mut self, value: u16) {
        self.bytes(&value.to_le_bytes());
    }

    fn u32(&mut self, value: u32) {
        self.bytes(&value.to_le_bytes());
    }

    fn i32(&mut self, value: i32) {
        self.bytes(&value.to_le_bytes());
    }

    fn pad_to(&mut self, len: usize) {
        self.buffer.resize(len, 0);
    }

    fn finish(self) -> Vec<u8> {
        self.buffer
    }
}
