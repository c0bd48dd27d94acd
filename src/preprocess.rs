use crate::error::PredictError;
use image::{imageops::FilterType, GenericImageView};
use ndarray::{Array, Ix4};

/// Classification models in the catalog all take 150x150 inputs.
pub const INPUT_SIZE: u32 = 150;

/// Decode raw image bytes into the tensor the classifiers expect: decode with
/// format guessing, bilinear resize to 150x150, scale pixel values into
/// [0, 1], and prepend a batch dimension. The channel count is inferred from
/// the decoded image, so the output shape is `[1, 150, 150, channels]`.
///
/// Runs from scratch on every request; inputs are request-unique so there is
/// nothing to cache.
pub fn image_to_tensor(image_data: &[u8]) -> Result<Array<f32, Ix4>, PredictError> {
    let image_reader = image::ImageReader::new(std::io::Cursor::new(image_data))
        .with_guessed_format()
        .map_err(|e| PredictError::Decode(e.to_string()))?;

    let decoded = image_reader
        .decode()
        .map_err(|e| PredictError::Decode(e.to_string()))?;

    let channels = usize::from(decoded.color().channel_count());
    let resized = decoded.resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

    let size = INPUT_SIZE as usize;
    let mut input = Array::zeros((1, size, size, channels));
    for (x, y, pixel) in resized.pixels() {
        let x = x as usize;
        let y = y as usize;
        let rgba = pixel.0;
        match channels {
            1 => input[[0, y, x, 0]] = f32::from(rgba[0]) / 255.,
            2 => {
                input[[0, y, x, 0]] = f32::from(rgba[0]) / 255.;
                input[[0, y, x, 1]] = f32::from(rgba[3]) / 255.;
            }
            4 => {
                for c in 0..4 {
                    input[[0, y, x, c]] = f32::from(rgba[c]) / 255.;
                }
            }
            _ => {
                for c in 0..3 {
                    input[[0, y, x, c]] = f32::from(rgba[c]) / 255.;
                }
            }
        }
    }

    Ok(input)
}
