use image::{imageops::FilterType, Limits};
use ndarray::{Array, Ix4};
use thiserror::Error;

/// Side length of the square canvas the classifier was trained on.
pub const INPUT_SIZE: u32 = 224;
pub const INPUT_CHANNELS: usize = 3;

/// Largest width or height accepted from an upload.
pub const MAX_IMAGE_SIDE: u32 = 12_000;
/// Upper bound on what the decoder may allocate for one image.
pub const MAX_DECODE_ALLOC: u64 = 256 * 1024 * 1024;

fn decode_limits() -> Limits {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_IMAGE_SIDE);
    limits.max_image_height = Some(MAX_IMAGE_SIDE);
    limits.max_alloc = Some(MAX_DECODE_ALLOC);
    limits
}

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("Error reading image: {0}")]
    Read(#[from] std::io::Error),
    #[error("Error decoding image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decodes `image_data` and turns it into a `(1, 224, 224, 3)` NHWC tensor
/// with every channel scaled into `[0, 1]`.
///
/// The image is stretched to the canvas, so non-square inputs are distorted.
pub fn image_to_tensor(image_data: &[u8]) -> Result<Array<f32, Ix4>, PreprocessError> {
    let mut image_reader =
        image::ImageReader::new(std::io::Cursor::new(image_data)).with_guessed_format()?;
    image_reader.limits(decode_limits());
    let original_img = image_reader.decode()?;

    let img = original_img
        .resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::CatmullRom)
        .to_rgb8();

    let side = INPUT_SIZE as usize;
    let mut input = Array::zeros((1, side, side, INPUT_CHANNELS));
    for (x, y, pixel) in img.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let (x, y) = (x as usize, y as usize);
        input[[0, y, x, 0]] = (r as f32) / 255.;
        input[[0, y, x, 1]] = (g as f32) / 255.;
        input[[0, y, x, 2]] = (b as f32) / 255.;
    }

    Ok(input)
}
