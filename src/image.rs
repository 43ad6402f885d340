#[cfg(test)]
use std::fmt::{self, Write};

pub use bit_vec::BitVec;

use crate::PointI32;

/// Image with 1 bit per pixel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BinaryImage {
    pub pixels: BitVec,
    pub width: usize,
    pub height: usize,
}

impl BinaryImage {
    pub fn new_w_h(width: usize, height: usize) -> BinaryImage {
        BinaryImage {
            pixels: BitVec::from_elem(width * height, false),
            width,
            height,
        }
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> bool {
        let i = y * self.width + x;
        self.pixels.get(i).unwrap_or(false)
    }

    pub fn get_pixel_at_safe(&self, p: PointI32) -> bool {
        self.get_pixel_safe(p.x, p.y)
    }

    pub fn get_pixel_safe(&self, x: i32, y: i32) -> bool {
        if  x >= 0 && x < self.width as i32 &&
            y >= 0 && y < self.height as i32 {
            return self.get_pixel(x as usize, y as usize);
        }
        false
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, v: bool) {
        let i = y * self.width + x;
        self.pixels.set(i, v);
    }

    #[cfg(test)]
    pub fn area(&self) -> u64 {
        self.pixels.iter().filter(|x| *x).count() as u64
    }

    pub fn negative(&self) -> BinaryImage {
        let mut pixels = self.pixels.clone();
        pixels.negate();
        BinaryImage {
            pixels,
            width: self.width,
            height: self.height,
        }
    }

    #[cfg(test)]
    pub fn from_string(string: &str) -> Self {
        let mut width = 0;
        let mut height = 0;
        for line in string.lines() {
            if height == 0 {
                width = line.len();
            }
            height += 1;
        }
        let mut image = Self::new_w_h(width, height);
        for (y, line) in string.lines().enumerate() {
            for (x, c) in line.chars().enumerate() {
                image.set_pixel(x, y, c == '*');
            }
        }
        image
    }
}

#[cfg(test)]
impl fmt::Display for BinaryImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                f.write_char(if self.get_pixel(x, y) { '*' } else { '-' })?;
            }
            f.write_char('\n')?;
        }
        Ok(())
    }
}
