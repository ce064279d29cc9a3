//! Render-serving subsystem for slide presentation viewers.
//!
//! Turns "render page P to fit box B" requests into bitmaps, caching
//! compressed renders under a byte budget, deduplicating in-flight work and
//! speculatively warming nearby pages. Document access (page graph, role
//! resolution, rasterization) stays behind the [`PageProvider`] trait,
//! implemented by the embedding application.

pub mod config;
pub mod document;
pub mod render;

pub mod test_utils;

pub use config::{RenderConfig, Settings, format_byte_size, parse_byte_size};
pub use document::{PageId, PageProvider, RasterError, RedrawCause, ViewRole};
pub use render::{
    BoundedCache, CompressedRender, DefaultStrategy, DisabledStrategy, InFlightRegistry, NewRender,
    PixelFormat, PrefetchStrategy, RawBitmap, RenderFault, RenderKey, RenderService, Size,
    ViewRequest,
};
