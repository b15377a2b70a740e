//! 8-bit sRGB colours and the small palette the demo draws with.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const RAYWHITE: Color = Color::rgb(245, 245, 245);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const GRAY: Color = Color::rgb(130, 130, 130);
    pub const LIME: Color = Color::rgb(0, 158, 47);
    pub const ORANGE: Color = Color::rgb(255, 161, 0);
    pub const RED: Color = Color::rgb(230, 41, 55);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Normalised sRGB components.
    pub fn to_srgb_f32(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a].map(|c| c as f32 / 255.0)
    }

    /// Linear components (alpha untouched), for clear colours and uniforms.
    pub fn to_linear_f32(self) -> [f32; 4] {
        let [r, g, b, a] = self.to_srgb_f32();
        [srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b), a]
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}
