pub mod dataset;
pub mod idx;
pub mod image;

pub use dataset::{decode_digit, encode_digit, Dataset, IMAGE_PIXELS, IMAGE_SIDE};
pub use idx::{parse_idx_images, parse_idx_labels, IdxImages};
pub use self::image::{image_bytes_to_grayscale_input, load_grayscale_input};
