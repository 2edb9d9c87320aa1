//! Tray glyph rendering.
//!
//! The glyph is a small window outline with a title bar. The body is filled
//! while the current page is on screen.

use image::{Rgba, RgbaImage};

use crate::manager::shell::Glyph;

pub const ICON_SIZE: u32 = 32;

const INSET: u32 = 3;
const STROKE: u32 = 2;
const TITLE_BAR: u32 = 7;

fn color(glyph: Glyph) -> Rgba<u8> {
    match glyph {
        Glyph::Light => Rgba([0xf5, 0xf5, 0xf5, 0xff]),
        Glyph::Dark => Rgba([0x1e, 0x1e, 0x1e, 0xff]),
    }
}

pub fn render(glyph: Glyph, active: bool) -> RgbaImage {
    let ink = color(glyph);
    let fill = Rgba([ink[0], ink[1], ink[2], 0x70]);
    let (lo, hi) = (INSET, ICON_SIZE - INSET);

    RgbaImage::from_fn(ICON_SIZE, ICON_SIZE, |x, y| {
        if x < lo || x >= hi || y < lo + 2 || y >= hi - 2 {
            return Rgba([0, 0, 0, 0]);
        }
        let top = lo + 2;
        let bottom = hi - 2;
        let on_border = x < lo + STROKE || x >= hi - STROKE || y < top + STROKE || y >= bottom - STROKE;
        if on_border || y < top + TITLE_BAR {
            ink
        } else if active {
            fill
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

/// Raw RGBA bytes plus dimensions, ready for `tauri::image::Image::new_owned`.
pub fn render_rgba(glyph: Glyph, active: bool) -> (Vec<u8>, u32, u32) {
    let image = render(glyph, active);
    let (width, height) = image.dimensions();
    (image.into_raw(), width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_glyph_fills_body() {
        let center = ICON_SIZE / 2 + 4;
        let idle = render(Glyph::Light, false);
        let active = render(Glyph::Light, true);
        assert_eq!(idle.get_pixel(center, center)[3], 0);
        assert!(active.get_pixel(center, center)[3] > 0);
        // Corners stay transparent.
        assert_eq!(active.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_glyph_colors_differ() {
        let light = render(Glyph::Light, false);
        let dark = render(Glyph::Dark, false);
        assert_ne!(light.get_pixel(INSET, INSET + 2), dark.get_pixel(INSET, INSET + 2));
        let (bytes, w, h) = render_rgba(Glyph::Dark, true);
        assert_eq!(bytes.len(), (w * h * 4) as usize);
    }
}
