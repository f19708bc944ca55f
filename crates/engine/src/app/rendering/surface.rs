use super::glyphs::{glyph_for, Glyph, GLYPH_HEIGHT, GLYPH_WIDTH, SPACE_GLYPH};

pub type Rgba = [u8; 4];

/// RGBA8 frame buffer every layer draws into during a tick.
///
/// All drawing is clipped to the buffer; off-surface coordinates are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    frame: Vec<u8>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    pub fn clear(&mut self, color: Rgba) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        let offset = self.byte_offset(x as i32, y as i32)?;
        let mut color = [0; 4];
        color.copy_from_slice(&self.frame[offset..offset + 4]);
        Some(color)
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, rect_width: i32, rect_height: i32, color: Rgba) {
        let start_x = x.max(0);
        let start_y = y.max(0);
        let end_x = x.saturating_add(rect_width).min(self.width as i32);
        let end_y = y.saturating_add(rect_height).min(self.height as i32);
        if end_x <= start_x || end_y <= start_y {
            return;
        }

        for py in start_y..end_y {
            for px in start_x..end_x {
                self.write_pixel(px, py, color);
            }
        }
    }

    /// Copies an RGBA8 image onto the surface. Fully transparent source pixels
    /// are skipped; everything else overwrites the destination.
    pub fn blit_rgba(&mut self, x: i32, y: i32, image_width: u32, image_height: u32, rgba: &[u8]) {
        let expected = image_width as usize * image_height as usize * 4;
        if rgba.len() < expected {
            return;
        }

        for row in 0..image_height as i32 {
            for col in 0..image_width as i32 {
                let source = (row as usize * image_width as usize + col as usize) * 4;
                let color = [
                    rgba[source],
                    rgba[source + 1],
                    rgba[source + 2],
                    rgba[source + 3],
                ];
                if color[3] == 0 {
                    continue;
                }
                self.write_pixel(x + col, y + row, color);
            }
        }
    }

    /// Draws text with the built-in 3x5 glyphs, each glyph pixel scaled to a
    /// `scale`x`scale` block. Unknown characters draw as blanks.
    pub fn draw_text(&mut self, x: i32, y: i32, text: &str, scale: i32, color: Rgba) {
        let scale = scale.max(1);
        let advance = (GLYPH_WIDTH + 1) * scale;
        let mut cursor_x = x;
        for ch in text.chars() {
            let glyph = glyph_for(ch).unwrap_or(SPACE_GLYPH);
            self.draw_glyph(cursor_x, y, glyph, scale, color);
            cursor_x += advance;
        }
    }

    fn draw_glyph(&mut self, x: i32, y: i32, glyph: Glyph, scale: i32, color: Rgba) {
        for (row_index, row_bits) in glyph.rows.iter().enumerate() {
            let glyph_y = y + row_index as i32 * scale;
            for col in 0..GLYPH_WIDTH {
                if (row_bits & (1 << (GLYPH_WIDTH - 1 - col))) == 0 {
                    continue;
                }
                self.fill_rect(x + col * scale, glyph_y, scale, scale, color);
            }
        }
    }

    fn write_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        if let Some(offset) = self.byte_offset(x, y) {
            self.frame[offset..offset + 4].copy_from_slice(&color);
        }
    }

    fn byte_offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let pixel_offset = (y as usize)
            .checked_mul(self.width as usize)?
            .checked_add(x as usize)?;
        pixel_offset.checked_mul(4)
    }
}

pub(crate) fn text_height(scale: i32) -> i32 {
    GLYPH_HEIGHT * scale.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = [255, 0, 0, 255];
    const BLUE: Rgba = [0, 0, 255, 255];

    #[test]
    fn new_surface_is_zeroed_and_sized() {
        let surface = Surface::new(4, 3);

        assert_eq!(surface.frame().len(), 4 * 3 * 4);
        assert!(surface.frame().iter().all(|byte| *byte == 0));
    }

    #[test]
    fn clear_fills_every_pixel() {
        let mut surface = Surface::new(3, 2);
        surface.clear(BLUE);

        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(surface.pixel(x, y), Some(BLUE));
            }
        }
    }

    #[test]
    fn fill_rect_is_clipped_to_surface() {
        let mut surface = Surface::new(4, 4);
        surface.fill_rect(-2, 2, 4, 10, RED);

        assert_eq!(surface.pixel(0, 2), Some(RED));
        assert_eq!(surface.pixel(1, 3), Some(RED));
        assert_eq!(surface.pixel(2, 2), Some([0, 0, 0, 0]));
        assert_eq!(surface.pixel(0, 1), Some([0, 0, 0, 0]));
    }

    #[test]
    fn pixel_out_of_bounds_is_none() {
        let surface = Surface::new(2, 2);
        assert_eq!(surface.pixel(2, 0), None);
        assert_eq!(surface.pixel(0, 2), None);
    }

    #[test]
    fn blit_skips_transparent_pixels() {
        let mut surface = Surface::new(3, 1);
        surface.clear(BLUE);
        let image = [255, 0, 0, 255, 9, 9, 9, 0];

        surface.blit_rgba(1, 0, 2, 1, &image);

        assert_eq!(surface.pixel(0, 0), Some(BLUE));
        assert_eq!(surface.pixel(1, 0), Some(RED));
        assert_eq!(surface.pixel(2, 0), Some(BLUE));
    }

    #[test]
    fn blit_ignores_short_buffers() {
        let mut surface = Surface::new(2, 2);
        surface.blit_rgba(0, 0, 2, 2, &[255; 4]);

        assert!(surface.frame().iter().all(|byte| *byte == 0));
    }

    #[test]
    fn draw_text_sets_glyph_pixels() {
        let mut surface = Surface::new(8, 8);
        surface.draw_text(0, 0, "1", 1, RED);

        // '1' row 0 is 0b010
        assert_eq!(surface.pixel(1, 0), Some(RED));
        assert_eq!(surface.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(surface.pixel(0, 4), Some(RED));
    }

    #[test]
    fn unknown_characters_draw_nothing() {
        let mut surface = Surface::new(16, 16);
        surface.draw_text(0, 0, "~~", 2, RED);

        assert!(surface.frame().iter().all(|byte| *byte == 0));
    }

    #[test]
    fn text_height_scales() {
        assert_eq!(text_height(1), 5);
        assert_eq!(text_height(3), 15);
        assert_eq!(text_height(0), 5);
    }
}
