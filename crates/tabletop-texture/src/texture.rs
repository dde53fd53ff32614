use image::{Rgba, RgbaImage};
use tabletop_core::{Point, Rgb};

/// A rendered tile image and where it sits relative to its cell's
/// top-left corner. Ordinary tiles have a zero offset; extended tiles
/// (villages) are taller than the cell and start above it.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    pub image: RgbaImage,
    pub offset: Point,
}

impl Texture {
    pub fn new(image: RgbaImage, offset: Point) -> Self {
        Self { image, offset }
    }

    /// A texture exactly covering its cell.
    pub fn cell(image: RgbaImage) -> Self {
        Self::new(image, Point::ZERO)
    }

    /// The opaque mid-grey square substituted for anything that cannot be
    /// produced.
    pub fn fallback(size: u32) -> Self {
        Self::cell(RgbaImage::from_pixel(
            size,
            size,
            Rgba(Rgb::FALLBACK_GREY.to_rgba(255)),
        ))
    }

    /// Whether the image reaches outside its cell.
    #[inline]
    pub fn is_extended(&self) -> bool {
        self.offset != Point::ZERO
    }
}
