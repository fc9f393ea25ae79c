//! Image loading and preprocessing for text line crops.

use crate::config::RecognizerConfig;
use crate::error::{ImageError, Result};
use crate::traits::Preprocessor;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageBuffer, Pixel};
use ndarray::prelude::*;
use std::path::{Path, PathBuf};

/// Image file extensions picked up when scanning a folder.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// How a crop is fitted to the network input size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResizeMode {
    /// Stretch to `img_w x img_h`
    #[default]
    Stretch,
    /// Keep aspect ratio, then pad on the right with the last column
    KeepRatioPad,
}

/// Text line preprocessor.
///
/// Produces `(channels, img_h, img_w)` tensors normalized to `[-1, 1]`.
#[derive(Clone, Debug)]
pub struct LinePreprocessor {
    pub img_h: u32,
    pub img_w: u32,
    pub rgb: bool,
    pub mode: ResizeMode,
}

impl LinePreprocessor {
    pub fn from_config(config: &RecognizerConfig) -> Self {
        Self {
            img_h: config.img_h,
            img_w: config.img_w,
            rgb: config.rgb,
            mode: config.resize,
        }
    }

    pub fn channels(&self) -> usize {
        if self.rgb { 3 } else { 1 }
    }

    /// Width a crop is resized to before padding.
    fn target_width(&self, width: u32, height: u32) -> u32 {
        match self.mode {
            ResizeMode::Stretch => self.img_w,
            ResizeMode::KeepRatioPad => {
                let ratio = width as f64 / height as f64;
                let resized = (self.img_h as f64 * ratio).ceil() as u32;
                resized.clamp(1, self.img_w)
            }
        }
    }

    fn fit<P>(&self, buffer: &ImageBuffer<P, Vec<u8>>) -> Array3<f32>
    where
        P: Pixel<Subpixel = u8> + 'static,
    {
        let (width, height) = buffer.dimensions();
        let resized_w = self.target_width(width, height);
        let resized = imageops::resize(buffer, resized_w, self.img_h, FilterType::CatmullRom);

        let channels = P::CHANNEL_COUNT as usize;
        let (h, w) = (self.img_h as usize, self.img_w as usize);
        let mut tensor = Array3::<f32>::zeros((channels, h, w));

        for (x, y, pixel) in resized.enumerate_pixels() {
            for (c, &value) in pixel.channels().iter().enumerate() {
                tensor[[c, y as usize, x as usize]] = (value as f32 / 255.0 - 0.5) / 0.5;
            }
        }

        // Replicate the last resized column over the padding.
        let filled = resized_w as usize;
        if filled < w {
            let last = tensor.slice(s![.., .., filled - 1..filled]).to_owned();
            tensor.slice_mut(s![.., .., filled..]).assign(&last);
        }

        tensor
    }

    /// Load and preprocess every image in `paths`, stacked as a batch.
    pub fn load_batch(&self, paths: &[PathBuf]) -> Result<Array4<f32>> {
        let images = paths
            .iter()
            .map(|path| load_image(path))
            .collect::<Result<Vec<_>>>()?;
        self.batch(&images)
    }

    /// Preprocess and stack images into `(batch, channels, img_h, img_w)`.
    pub fn batch(&self, images: &[DynamicImage]) -> Result<Array4<f32>> {
        if images.is_empty() {
            return Err(ImageError::EmptyBatch.into());
        }

        let tensors = images
            .iter()
            .map(|image| self.preprocess(image))
            .collect::<Result<Vec<_>>>()?;
        let views: Vec<_> = tensors.iter().map(|t| t.view()).collect();

        Ok(ndarray::stack(Axis(0), &views)?)
    }
}

impl Preprocessor for LinePreprocessor {
    fn preprocess(&self, image: &DynamicImage) -> Result<Array3<f32>> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(ImageError::EmptyImage { width, height }.into());
        }

        Ok(if self.rgb {
            self.fit(&image.to_rgb8())
        } else {
            self.fit(&image.to_luma8())
        })
    }
}

/// Decode an image file.
pub fn load_image(path: impl AsRef<Path>) -> Result<DynamicImage> {
    Ok(image::open(path)?)
}

/// Recursively collect image files under `root`, sorted by path.
pub fn discover_images(root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![root.as_ref().to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if has_image_extension(&path) {
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    fn preprocessor(mode: ResizeMode) -> LinePreprocessor {
        LinePreprocessor {
            img_h: 32,
            img_w: 100,
            rgb: false,
            mode,
        }
    }

    #[test]
    fn stretch_fills_full_width() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(20, 10, Luma([255])));

        let tensor = preprocessor(ResizeMode::Stretch)
            .preprocess(&image)
            .unwrap();

        assert_eq!(tensor.dim(), (1, 32, 100));
        assert!(tensor.iter().all(|&v| (v - 1.0).abs() < 0.02));
    }

    #[test]
    fn keep_ratio_pads_with_last_column() {
        // 16x32 crop: ratio 0.5, resized to 16x32 then padded to 100.
        let mut buffer = GrayImage::from_pixel(16, 32, Luma([0]));
        for y in 0..32 {
            buffer.put_pixel(15, y, Luma([255]));
        }
        let image = DynamicImage::ImageLuma8(buffer);
        let pre = preprocessor(ResizeMode::KeepRatioPad);

        assert_eq!(pre.target_width(16, 32), 16);

        let tensor = pre.preprocess(&image).unwrap();

        assert_eq!(tensor.dim(), (1, 32, 100));
        assert!((tensor[[0, 10, 0]] + 1.0).abs() < 0.02);
        for x in 16..100 {
            assert_eq!(tensor[[0, 10, x]], tensor[[0, 10, 15]]);
        }
    }

    #[test]
    fn keep_ratio_caps_wide_crops() {
        let pre = preprocessor(ResizeMode::KeepRatioPad);

        assert_eq!(pre.target_width(400, 32), 100);
        assert_eq!(pre.target_width(1, 1000), 1);
    }

    #[test]
    fn rgb_keeps_three_channels() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([255, 0, 128])));
        let pre = LinePreprocessor {
            rgb: true,
            ..preprocessor(ResizeMode::Stretch)
        };

        let tensor = pre.preprocess(&image).unwrap();

        assert_eq!(tensor.dim(), (3, 32, 100));
        assert!((tensor[[0, 0, 0]] - 1.0).abs() < 0.02);
        assert!((tensor[[1, 0, 0]] + 1.0).abs() < 0.02);
    }

    #[test]
    fn batch_stacks_images() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(50, 20, Luma([128])));

        let batch = preprocessor(ResizeMode::Stretch)
            .batch(&[image.clone(), image])
            .unwrap();

        assert_eq!(batch.dim(), (2, 1, 32, 100));
    }

    #[test]
    fn empty_batch_is_rejected() {
        let err = preprocessor(ResizeMode::Stretch).batch(&[]).unwrap_err();

        assert!(matches!(err, crate::error::Error::Image(ImageError::EmptyBatch)));
    }

    #[test]
    fn discovers_images_recursively() {
        let root = std::env::temp_dir().join("glyphops-discover-test");
        let nested = root.join("nested");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.join("b.png"), b"").unwrap();
        std::fs::write(root.join("notes.txt"), b"").unwrap();
        std::fs::write(nested.join("a.JPG"), b"").unwrap();

        let found = discover_images(&root).unwrap();

        assert_eq!(found, vec![root.join("b.png"), nested.join("a.JPG")]);
    }
}
