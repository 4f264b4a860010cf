use std::path::Path;

use anyhow::{anyhow, Result};

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// A buffer of color data, row-major with `(0,0)` in the top-left corner.
pub struct Canvas {
    width: u32,
    height: u32,
    buffer: Vec<Color>,
}

impl Color {
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn black() -> Self {
        Self::new(0., 0., 0.)
    }

    pub fn is_black(&self) -> bool {
        self.r == 0. && self.g == 0. && self.b == 0.
    }

    pub fn white() -> Self {
        Self::new(1., 1., 1.)
    }

    /// Clamp every channel into `[0, 1]`.
    pub fn clamp(&self) -> Self {
        Self::new(
            self.r.clamp(0., 1.),
            self.g.clamp(0., 1.),
            self.b.clamp(0., 1.),
        )
    }

    /// Quantize to 8 bits per channel, truncating.
    pub fn to_u8(&self) -> [u8; 3] {
        let convert = |x: f32| (x * 255.0).min(255.0).max(0.0) as u8;
        [convert(self.r), convert(self.g), convert(self.b)]
    }
}

impl std::ops::Mul<&Color> for f32 {
    type Output = Color;
    fn mul(self, rhs: &Color) -> Self::Output {
        Color::new(rhs.r * self, rhs.g * self, rhs.b * self)
    }
}

impl std::ops::Mul<Color> for f32 {
    type Output = Color;
    fn mul(self, rhs: Color) -> Self::Output {
        self * &rhs
    }
}

impl std::ops::Mul<f32> for Color {
    type Output = Color;
    fn mul(self, rhs: f32) -> Self::Output {
        rhs * &self
    }
}

impl std::ops::Mul for Color {
    type Output = Color;
    fn mul(self, rhs: Color) -> Self::Output {
        Color::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b)
    }
}

impl std::ops::Add for Color {
    type Output = Color;
    fn add(mut self, rhs: Color) -> Self::Output {
        self += rhs;
        self
    }
}

impl std::ops::AddAssign<&Color> for Color {
    fn add_assign(&mut self, rhs: &Color) {
        self.r += rhs.r;
        self.g += rhs.g;
        self.b += rhs.b;
    }
}

impl std::ops::AddAssign for Color {
    fn add_assign(&mut self, rhs: Color) {
        self.add_assign(&rhs)
    }
}

impl Canvas {
    /// Construct a new [`Canvas`].
    pub fn new(width: u32, height: u32) -> Self {
        let size = (width * height) as usize;
        let mut buffer = Vec::with_capacity(size);
        buffer.resize_with(size, Default::default);
        Self {
            width,
            height,
            buffer,
        }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.width as usize && y < self.height as usize,
            "pixel ({}, {}) is outside a {}x{} canvas",
            x,
            y,
            self.width,
            self.height
        );
        (self.width as usize) * y + x
    }

    /// Mutate a color in the [`Canvas`].
    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut Color {
        let ix = self.index(x, y);
        &mut self.buffer[ix]
    }

    /// Fetch a color in the [`Canvas`].
    pub fn get(&self, x: usize, y: usize) -> &Color {
        let ix = self.index(x, y);
        &self.buffer[ix]
    }

    /// Mutable access to every pixel along with its `(x, y)` coordinate.
    pub fn enumerate_pixels_mut(&mut self) -> impl Iterator<Item = ((u32, u32), &mut Color)> {
        let width = self.width.max(1) as usize;
        self.buffer
            .iter_mut()
            .enumerate()
            .map(move |(ix, color)| (((ix % width) as u32, (ix / width) as u32), color))
    }

    /// Return an iterator to the rows of the image, top first.
    pub fn rows(&self) -> impl Iterator<Item = &[Color]> {
        self.buffer.chunks(self.width.max(1) as usize)
    }

    /// Copy `chunk` into this canvas with its top-left corner at `(x, y)`.
    pub fn blit(&mut self, x: u32, y: u32, chunk: &Canvas) {
        for (row, colors) in chunk.rows().enumerate() {
            let start = self.index(x as usize, y as usize + row);
            self.buffer[start..start + colors.len()].copy_from_slice(colors);
        }
    }

    /// Return raw image RGB8 data for the image.
    pub fn data(&self) -> Vec<u8> {
        let size = (self.width * self.height) as usize;
        let mut data = Vec::with_capacity(size * 3);

        for color in &self.buffer {
            data.extend_from_slice(&color.to_u8())
        }

        data
    }

    /// Write the canvas out as an image, with the format picked from the extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let img = image::RgbImage::from_raw(self.width, self.height, self.data())
            .ok_or_else(|| anyhow!("canvas buffer does not match its dimensions"))?;
        img.save(path.as_ref())?;
        Ok(())
    }

    /// One character per pixel, picked by the brightest channel. Black is a space.
    pub fn to_ascii(&self) -> String {
        const SHADES: &[u8] = b" .:-=+*#%@";
        let top = (SHADES.len() - 1) as f32;

        let mut ascii = String::with_capacity((self.width as usize + 1) * self.height as usize);
        for row in self.rows() {
            ascii.extend(row.iter().map(|color| {
                let level = color.r.max(color.g).max(color.b).clamp(0., 1.);
                SHADES[(level * top).ceil() as usize] as char
            }));
            ascii.push('\n');
        }
        ascii
    }
}
