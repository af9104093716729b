//! Texture converter (PNG/JPEG -> .ltex)

use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{ColorType, DynamicImage, ImageBuffer, Pixel};
use lumen_assets::formats::{Extent, mip_chain, pack_texture};
use lumen_assets::stream::write_asset_bytes;
use lumen_assets::{
    ComponentType, ExternalFormat, InternalFormat, PixelRecord, Swizzle, TextureDesc,
    TextureTarget, LUMEN_FORMAT,
};
use std::path::{Path, PathBuf};

/// A texture ready to be packed.
pub struct ConvertedTexture {
    pub record: PixelRecord,
    /// One buffer per mip level
    pub levels: Vec<Vec<u8>>,
}

impl ConvertedTexture {
    pub fn pack(&self) -> Result<Vec<u8>> {
        Ok(pack_texture(&self.record, &self.levels)?)
    }
}

/// Build a 2D texture from a decoded image.
///
/// Grey images keep one channel and grey+alpha two; the swizzle expands
/// them back to RGBA when sampled.
pub fn texture_from_image(img: &DynamicImage, mipmaps: bool) -> Result<ConvertedTexture> {
    let (internal_format, external_format, swizzle) = match img.color() {
        ColorType::L8 | ColorType::L16 => (
            InternalFormat::R8,
            ExternalFormat::Red,
            Some([Swizzle::Red, Swizzle::Red, Swizzle::Red, Swizzle::One]),
        ),
        ColorType::La8 | ColorType::La16 => (
            InternalFormat::Rg8,
            ExternalFormat::Rg,
            Some([Swizzle::Red, Swizzle::Red, Swizzle::Red, Swizzle::Green]),
        ),
        _ => (InternalFormat::Rgba8, ExternalFormat::Rgba, None),
    };
    let desc = TextureDesc {
        target: TextureTarget::Texture2D,
        internal_format,
        external_format,
        component_type: ComponentType::UnsignedByte,
        swizzle,
    };

    let base = Extent::new(img.width(), img.height(), 1);
    let extents = if mipmaps {
        mip_chain(desc.target, base)
    } else {
        vec![base]
    };

    let levels = match external_format {
        ExternalFormat::Red => build_levels(&img.to_luma8(), &extents),
        ExternalFormat::Rg => build_levels(&img.to_luma_alpha8(), &extents),
        _ => build_levels(&img.to_rgba8(), &extents),
    };
    let record = PixelRecord::layout(desc, &extents)?;
    Ok(ConvertedTexture { record, levels })
}

/// Level 0 is the image itself; each smaller level is resampled from it.
fn build_levels<P>(base: &ImageBuffer<P, Vec<u8>>, extents: &[Extent]) -> Vec<Vec<u8>>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    extents
        .iter()
        .enumerate()
        .map(|(level, extent)| {
            if level == 0 {
                base.as_raw().clone()
            } else {
                imageops::resize(base, extent.width, extent.height, FilterType::Triangle)
                    .into_raw()
            }
        })
        .collect()
}

/// Load and convert an image without touching the disk.
pub fn convert_to_memory(input: &Path, mipmaps: bool) -> Result<ConvertedTexture> {
    let img =
        image::open(input).with_context(|| format!("Failed to load image: {:?}", input))?;
    texture_from_image(&img, mipmaps)
}

pub fn default_output(input: &Path) -> PathBuf {
    input.with_extension(LUMEN_FORMAT.texture_ext)
}

/// Convert an image and write it next to the input or to `output`.
///
/// Returns the path written.
pub fn convert_image(input: &Path, output: Option<&Path>, mipmaps: bool) -> Result<PathBuf> {
    let texture = convert_to_memory(input, mipmaps)?;
    let bytes = texture.pack()?;
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output(input));

    write_asset_bytes(&output, &bytes)
        .with_context(|| format!("Failed to write output: {:?}", output))?;
    let level0 = &texture.record.mip_levels[0];
    tracing::info!(
        "Converted texture {:?} -> {:?}: {}x{}, {} mip level(s), {:?}",
        input,
        output,
        level0.width,
        level0.height,
        texture.record.mip_levels.len(),
        texture.record.internal_format
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, LumaA, Rgba, RgbaImage};

    #[test]
    fn test_rgba_mip_chain() {
        let img = RgbaImage::from_pixel(4, 2, Rgba([10, 20, 30, 255]));
        let texture = texture_from_image(&DynamicImage::ImageRgba8(img), true).unwrap();

        assert_eq!(texture.record.internal_format, InternalFormat::Rgba8);
        assert_eq!(texture.record.mip_levels.len(), 3);
        assert_eq!(texture.levels[0].len(), 32);
        assert_eq!(texture.levels[1].len(), 8);
        assert_eq!(texture.levels[2], vec![10, 20, 30, 255]);
        assert!(!texture.record.swizzle_enabled());
    }

    #[test]
    fn test_grey_uses_one_channel() {
        let img = GrayImage::from_pixel(2, 2, Luma([128]));
        let texture = texture_from_image(&DynamicImage::ImageLuma8(img), false).unwrap();
        assert_eq!(texture.record.external_format, ExternalFormat::Red);
        assert_eq!(texture.record.mip_levels.len(), 1);
        assert_eq!(texture.levels[0], vec![128; 4]);
        assert_eq!(
            texture.record.swizzle,
            Some([Swizzle::Red, Swizzle::Red, Swizzle::Red, Swizzle::One])
        );
    }

    #[test]
    fn test_grey_alpha_uses_two_channels() {
        let img = image::GrayAlphaImage::from_pixel(1, 1, LumaA([7, 200]));
        let texture = texture_from_image(&DynamicImage::ImageLumaA8(img), true).unwrap();
        assert_eq!(texture.record.internal_format, InternalFormat::Rg8);
        assert_eq!(texture.levels, vec![vec![7, 200]]);
        assert!(texture.pack().is_ok());
    }
}
