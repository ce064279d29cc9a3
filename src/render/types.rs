//! Core value types for the render subsystem.

use std::fmt;

use crate::document::PageId;

/// Pixel dimensions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True if either dimension is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Total pixel count.
    #[must_use]
    pub const fn area(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Pixel layout of a raw bitmap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb8,
    Rgba8,
    Gray8,
}

impl PixelFormat {
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// Uncompressed pixel data, as produced by the document rasterizer.
#[derive(Clone, PartialEq, Eq)]
pub struct RawBitmap {
    pub pixels: Vec<u8>,
    pub size: Size,
    /// Bytes per row (at least `width * bytes_per_pixel`).
    pub stride: usize,
    pub format: PixelFormat,
}

impl RawBitmap {
    /// Bitmap over tightly packed rows.
    #[must_use]
    pub fn packed(size: Size, format: PixelFormat, pixels: Vec<u8>) -> Self {
        let stride = size.width as usize * format.bytes_per_pixel();
        debug_assert_eq!(pixels.len(), stride * size.height as usize);
        Self {
            pixels,
            size,
            stride,
            format,
        }
    }
}

impl fmt::Debug for RawBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBitmap")
            .field("size", &self.size)
            .field("stride", &self.stride)
            .field("format", &self.format)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}

/// Identity of a cached render: page plus resolved output size.
///
/// The size is always the resolved render size (the output of
/// [`crate::document::PageProvider::preferred_size`]), never a raw request
/// box, so requests that differ in box but map to the same output
/// resolution share one cache entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RenderKey {
    pub page: PageId,
    pub size: Size,
}

/// Compressed bitmap plus the metadata needed to rebuild it.
#[derive(Clone)]
pub struct CompressedRender {
    pub data: Vec<u8>,
    pub size: Size,
    pub stride: usize,
    pub format: PixelFormat,
}

impl CompressedRender {
    /// Cache accounting cost in bytes.
    #[must_use]
    pub fn cost(&self) -> usize {
        self.data.len()
    }
}

impl fmt::Debug for CompressedRender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressedRender")
            .field("size", &self.size)
            .field("stride", &self.stride)
            .field("format", &self.format)
            .field("compressed_bytes", &self.data.len())
            .finish()
    }
}
