use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb)
        })
        .collect()
}

fn to_color32(rgb: Srgb) -> Color32 {
    let rgb: Srgb<u8> = rgb.into_format();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

// ---------------------------------------------------------------------------
// Figure colours
// ---------------------------------------------------------------------------

/// Fixed colours for the two groups so they match across every figure.
pub fn group_color(index: usize) -> Color32 {
    match index {
        0 => Color32::from_rgb(0x1f, 0x77, 0xb4),
        1 => Color32::from_rgb(0xd6, 0x27, 0x28),
        n => generate_palette(n + 1)[n],
    }
}

/// Colour of mode `order` (1-based) out of `total` modes drawn.
pub fn mode_color(order: usize, total: usize) -> Color32 {
    let total = total.max(order).max(1);
    generate_palette(total)[order.saturating_sub(1).min(total - 1)]
}

/// Blue-white-red scale for cortical values in `[-1, 1]`.
pub fn diverging(value: f64) -> Color32 {
    let t = value.clamp(-1.0, 1.0) as f32;
    let white: LinSrgb = Srgb::new(1.0f32, 1.0, 1.0).into_linear();
    let end: LinSrgb = if t < 0.0 {
        Srgb::new(0.13f32, 0.4, 0.67).into_linear()
    } else {
        Srgb::new(0.7f32, 0.09, 0.17).into_linear()
    };
    let mixed = white.mix(end, t.abs());
    to_color32(Srgb::from_linear(mixed))
}
