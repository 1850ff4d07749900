use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};

/// A solid-colour PNG of the given size.
pub fn encoded_sheet(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([rgb[0], rgb[1], rgb[2], 255]));
    encode_png(&image)
}

pub fn encode_png(image: &RgbaImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .expect("encoding a PNG into memory");
    buf.into_inner()
}
