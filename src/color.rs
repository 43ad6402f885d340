/// RGBA; each channel is 8 bit unsigned
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self::new_rgba(r, g, b, 255)
    }

    pub fn new_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn get_palette_color(i: usize) -> Self {
        match i % 8 {
            // https://codepen.io/chorijan/pen/azVzPO
            0 => Self::new(216, 51, 74),   // Ruby
            1 => Self::new(255, 232, 96),  // Lemon
            2 => Self::new(160, 212, 104), // Grass
            3 => Self::new(72, 207, 173),  // Mint
            4 => Self::new(79, 193, 233),  // Aqua
            5 => Self::new(93, 156, 236),  // Jeans
            6 => Self::new(128, 103, 183), // Plum
            _ => Self::new(172, 146, 236), // Lavender
        }
    }

    /// Colour table entry for a pixel value. The same value always gets the same colour;
    /// 0 (no-data) is fully transparent.
    pub fn for_label(value: u32) -> Self {
        if value == 0 {
            return Self::new_rgba(0, 0, 0, 0);
        }
        // Knuth multiplicative hash, so neighbouring labels look different
        let hash = value.wrapping_mul(2_654_435_761);
        let base = Self::get_palette_color((hash >> 24) as usize);
        let shade = ((hash >> 8) & 0x3f) as i32 - 32;
        let tint = |c: u8| (c as i32 + shade).clamp(0, 255) as u8;
        Self::new(tint(base.r), tint(base.g), tint(base.b))
    }
}
