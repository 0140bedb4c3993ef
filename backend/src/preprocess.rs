use image::imageops::{self, FilterType};
use ndarray::Array4;

use crate::error::ServiceError;

pub const INPUT_WIDTH: u32 = 224;
pub const INPUT_HEIGHT: u32 = 224;

/// Per-channel zero-centering means, applied positionally to channels
/// 0/1/2. The shipped weights were served with exactly this transform:
/// channel order stays RGB and no reorder happens before the subtraction.
/// Changing these constants or the resize filter breaks artifact
/// compatibility.
const CHANNEL_MEANS: [f32; 3] = [103.939, 116.779, 123.68];

/// Decodes an uploaded image and stages it as the (1, 224, 224, 3) f32
/// tensor the classifier expects. Any decodable image works: alpha is
/// dropped, grayscale is expanded, and the resize is non-aspect-preserving.
pub fn preprocess_image(image_data: &[u8]) -> Result<Array4<f32>, ServiceError> {
    let image = image::load_from_memory(image_data)?;
    let rgb = image.to_rgb8();
    let resized = imageops::resize(&rgb, INPUT_WIDTH, INPUT_HEIGHT, FilterType::Triangle);

    let mut tensor = Array4::<f32>::zeros((1, INPUT_HEIGHT as usize, INPUT_WIDTH as usize, 3));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for channel in 0..3 {
            tensor[[0, y as usize, x as usize, channel]] =
                pixel[channel] as f32 - CHANNEL_MEANS[channel];
        }
    }
    Ok(tensor)
}
