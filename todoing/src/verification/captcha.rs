//! SVG captcha rendering.
//!
//! Images are small procedural SVGs delivered as base64 data URIs: a light
//! background, interference lines and noise dots, and six jittered, rotated
//! glyphs. The alphabet avoids lookalike characters (0/O, 1/l/I).

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use rand::prelude::RngExt;
use rand::rng;

const ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZabcdefghjkmnpqrstuvwxyz23456789";
const TEXT_LENGTH: usize = 6;
const WIDTH: u32 = 150;
const HEIGHT: u32 = 50;
const FONT_SIZE: f64 = 24.0;
const INTERFERENCE_LINES: usize = 5;
const NOISE_DOTS: usize = 30;

/// A rendered challenge: the uppercased answer and its image data URI.
pub struct Captcha {
    pub answer: String,
    pub image: String,
}

/// Placeholder image served when the captcha feature is off.
pub fn disabled_image() -> String {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="1" height="1"/>"#;
    format!("data:image/svg+xml;base64,{}", BASE64.encode(svg))
}

/// Renders a fresh challenge.
pub fn generate() -> Captcha {
    let mut rng = rng();

    let text: String = (0..TEXT_LENGTH)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();
    let svg = render_svg(&text, &mut rng);

    Captcha {
        answer: text.to_uppercase(),
        image: format!("data:image/svg+xml;base64,{}", BASE64.encode(svg)),
    }
}

fn render_svg<R: RngExt>(text: &str, rng: &mut R) -> String {
    let mut svg = String::with_capacity(4096);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}">"#
    ));
    svg.push_str(r##"<rect width="100%" height="100%" fill="#f0f0f0"/>"##);

    for _ in 0..INTERFERENCE_LINES {
        let (x1, y1) = (rng.random_range(0..WIDTH), rng.random_range(0..HEIGHT));
        let (x2, y2) = (rng.random_range(0..WIDTH), rng.random_range(0..HEIGHT));
        let color = random_color(rng);
        svg.push_str(&format!(
            r#"<line x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}" stroke="{color}" stroke-width="1"/>"#
        ));
    }

    for _ in 0..NOISE_DOTS {
        let cx = rng.random_range(0..WIDTH);
        let cy = rng.random_range(0..HEIGHT);
        let color = random_color(rng);
        svg.push_str(&format!(r#"<circle cx="{cx}" cy="{cy}" r="1" fill="{color}"/>"#));
    }

    let base_x = (WIDTH as f64 - TEXT_LENGTH as f64 * FONT_SIZE * 0.6) / 2.0;
    let base_y = f64::from(HEIGHT) / 2.0 + FONT_SIZE / 3.0;
    for (i, glyph) in text.chars().enumerate() {
        let x = base_x + i as f64 * FONT_SIZE * 0.7;
        let y = base_y + (rng.random::<f64>() - 0.5) * 10.0;
        let rotation = (rng.random::<f64>() - 0.5) * 30.0;
        let color = random_color(rng);
        svg.push_str(&format!(
            r#"<text x="{x:.1}" y="{y:.1}" font-size="{FONT_SIZE}" fill="{color}" font-family="Arial" transform="rotate({rotation:.1} {x:.1} {y:.1})">{glyph}</text>"#
        ));
    }

    svg.push_str("</svg>");
    svg
}

/// Dark-ish colors so glyphs and noise stay visible on the light background.
fn random_color<R: RngExt>(rng: &mut R) -> String {
    format!(
        "#{:02x}{:02x}{:02x}",
        rng.random_range(0..160),
        rng.random_range(0..160),
        rng.random_range(0..160)
    )
}
