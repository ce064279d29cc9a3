//! Compression of raw renders for cache storage.
//!
//! Cached entries hold zlib-compressed pixel data. [`encode`] and
//! [`decode`] round-trip bitmaps bit for bit.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use super::request::RenderFault;
use super::types::{CompressedRender, RawBitmap};

/// Compress a rasterized bitmap for cache storage.
pub fn encode(bitmap: &RawBitmap) -> Result<CompressedRender, RenderFault> {
    let mut encoder = ZlibEncoder::new(
        Vec::with_capacity(bitmap.pixels.len() / 4),
        Compression::fast(),
    );
    encoder.write_all(&bitmap.pixels)?;
    let data = encoder.finish()?;

    Ok(CompressedRender {
        data,
        size: bitmap.size,
        stride: bitmap.stride,
        format: bitmap.format,
    })
}

/// Rebuild a displayable bitmap from a cached render.
pub fn decode(render: &CompressedRender) -> Result<RawBitmap, RenderFault> {
    let expected = render.stride * render.size.height as usize;
    let mut pixels = Vec::with_capacity(expected);
    ZlibDecoder::new(render.data.as_slice()).read_to_end(&mut pixels)?;

    if pixels.len() != expected {
        return Err(RenderFault::generic(format!(
            "decoded {} bytes for a {} render, expected {expected}",
            pixels.len(),
            render.size,
        )));
    }

    Ok(RawBitmap {
        pixels,
        size: render.size,
        stride: render.stride,
        format: render.format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::types::{PixelFormat, Size};

    fn gradient_bitmap(size: Size) -> RawBitmap {
        let mut pixels = Vec::with_capacity(size.area() as usize * 3);
        for y in 0..size.height {
            for x in 0..size.width {
                pixels.push((x + y) as u8);
                pixels.push((x ^ y) as u8);
                pixels.push(x.wrapping_mul(31) as u8);
            }
        }
        RawBitmap::packed(size, PixelFormat::Rgb8, pixels)
    }

    #[test]
    fn round_trip_is_bit_exact() {
        let bitmap = gradient_bitmap(Size::new(123, 77));
        let compressed = encode(&bitmap).unwrap();
        let restored = decode(&compressed).unwrap();

        assert_eq!(restored.pixels, bitmap.pixels);
        assert_eq!(restored.size, bitmap.size);
        assert_eq!(restored.stride, bitmap.stride);
        assert_eq!(restored.format, bitmap.format);
    }

    #[test]
    fn compression_shrinks_flat_content() {
        let bitmap = RawBitmap::packed(
            Size::new(200, 200),
            PixelFormat::Rgb8,
            vec![0xAB; 200 * 200 * 3],
        );
        let compressed = encode(&bitmap).unwrap();
        assert!(compressed.cost() < bitmap.pixels.len() / 10);
    }

    #[test]
    fn corrupt_data_is_an_error() {
        let bitmap = gradient_bitmap(Size::new(50, 50));
        let mut compressed = encode(&bitmap).unwrap();
        compressed.data.truncate(compressed.data.len() / 2);

        assert!(decode(&compressed).is_err());
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let bitmap = gradient_bitmap(Size::new(50, 50));
        let mut compressed = encode(&bitmap).unwrap();
        // Claim a different geometry than the data decodes to.
        compressed.size = Size::new(50, 49);

        assert!(decode(&compressed).is_err());
    }
}
