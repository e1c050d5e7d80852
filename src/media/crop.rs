use std::io::Cursor;

use image::{imageops::FilterType, DynamicImage, ImageFormat};

use crate::Result;

/// Edge length of the square images shown in post carousels.
pub const CAROUSEL_SIDE: u32 = 800;

#[derive(Debug, Clone)]
pub struct PendingImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// State of one crop pass over the images attached to a post. Files are
/// cropped in submission order and the results keep that order.
#[derive(Debug, Default)]
pub struct CropSession {
    files: Vec<PendingImage>,
    current: usize,
    cropped: Vec<Vec<u8>>,
}

impl CropSession {
    pub fn new(files: Vec<PendingImage>) -> Self {
        Self {
            cropped: Vec::with_capacity(files.len()),
            files,
            current: 0,
        }
    }

    pub fn current(&self) -> Option<&PendingImage> {
        self.files.get(self.current)
    }

    pub fn accept(&mut self, cropped: Vec<u8>) {
        if self.current < self.files.len() {
            self.cropped.push(cropped);
            self.current += 1;
        }
    }

    pub fn cancel(&mut self) {
        self.files.clear();
        self.cropped.clear();
        self.current = 0;
    }

    pub fn is_done(&self) -> bool {
        self.current >= self.files.len()
    }

    pub fn finish(self) -> Vec<Vec<u8>> {
        self.cropped
    }

    /// Runs every pending file through [`crop_square`].
    pub fn crop_all(mut self, side: u32) -> Result<Vec<Vec<u8>>> {
        while let Some(file) = self.current() {
            tracing::debug!(file = %file.file_name, index = self.current, "Cropping image");
            let cropped = crop_square(&file.bytes, side)?;
            self.accept(cropped);
        }
        Ok(self.finish())
    }
}

/// Takes the centered square of the shorter edge, scales it to `side`×`side`
/// and re-encodes it as JPEG.
pub fn crop_square(bytes: &[u8], side: u32) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes)?;
    let (width, height) = (img.width(), img.height());
    let edge = width.min(height);

    let square = img
        .crop_imm((width - edge) / 2, (height - edge) / 2, edge, edge)
        .resize_exact(side, side, FilterType::Lanczos3);

    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(square.to_rgb8()).write_to(&mut out, ImageFormat::Jpeg)?;
    Ok(out.into_inner())
}

#[cfg(test)]
pub(crate) fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 40, 255]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}
