//! Frame annotation for visual collaborators. Purely cosmetic.

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::analysis::{FrameScore, MAX_DISPLAY_SCORE};
use crate::detector::Region;

const FACE_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const EYE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const ATTENTIVE_COLOR: Rgb<u8> = Rgb([0, 200, 0]);
const DISTRACTED_COLOR: Rgb<u8> = Rgb([220, 0, 0]);
const BAR_BACKGROUND: Rgb<u8> = Rgb([40, 40, 40]);

const MARGIN: u32 = 10;

/// 8x8 glyphs drawn at twice their size
const GLYPH_SIZE: u32 = 8;
const TEXT_SCALE: u32 = 2;
const LINE_HEIGHT: u32 = GLYPH_SIZE * TEXT_SCALE;
const LINE_GAP: u32 = 8;

const LABEL_TOP: u32 = MARGIN;
const SCORE_TOP: u32 = LABEL_TOP + LINE_HEIGHT + LINE_GAP;
const BAR_TOP: u32 = SCORE_TOP + LINE_HEIGHT + LINE_GAP;
const BAR_HEIGHT: u32 = 12;

fn to_rect(region: &Region) -> Option<Rect> {
    if region.width == 0 || region.height == 0 {
        return None;
    }
    Some(Rect::at(region.x as i32, region.y as i32).of_size(region.width, region.height))
}

/// Draw `text` with the 8x8 bitmap font. Pixels outside the image are clipped;
/// characters without a glyph are left blank.
fn draw_text_mut(image: &mut RgbImage, x: u32, y: u32, text: &str, color: Rgb<u8>) {
    for (index, ch) in text.chars().enumerate() {
        let Some(glyph) = BASIC_FONTS.get(ch) else {
            continue;
        };
        let left = x as i64 + index as i64 * (GLYPH_SIZE * TEXT_SCALE) as i64;
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                // Bit 0 is the leftmost pixel
                if bits & (1 << col) == 0 {
                    continue;
                }
                let px = left + (col * TEXT_SCALE) as i64;
                let py = y as i64 + row as i64 * TEXT_SCALE as i64;
                if px > i32::MAX as i64 || py > i32::MAX as i64 {
                    continue;
                }
                draw_filled_rect_mut(
                    image,
                    Rect::at(px as i32, py as i32).of_size(TEXT_SCALE, TEXT_SCALE),
                    color,
                );
            }
        }
    }
}

/// Draw the primary face, the eyes (when at least two were found), the
/// status label and score as text, and a score bar coloured by status.
/// Frames without a face are returned as-is.
pub fn annotate(mut image: RgbImage, score: &FrameScore) -> RgbImage {
    let Some(face) = score.face else {
        return image;
    };

    if let Some(rect) = to_rect(&face) {
        draw_hollow_rect_mut(&mut image, rect, FACE_COLOR);
    }

    if score.eyes.len() >= 2 {
        // Eyes are face-relative; boxes outside the crop are not drawn
        for eye in score.eyes.iter().filter(|eye| eye.fits_within(face.width, face.height)) {
            if let Some(rect) = to_rect(&eye.offset(face.x, face.y)) {
                draw_hollow_rect_mut(&mut image, rect, EYE_COLOR);
            }
        }
    }

    let color = if score.is_attentive { ATTENTIVE_COLOR } else { DISTRACTED_COLOR };
    draw_text_mut(&mut image, MARGIN, LABEL_TOP, score.label().as_str(), color);
    draw_text_mut(&mut image, MARGIN, SCORE_TOP, &format!("Score: {}%", score.score), color);

    let (width, height) = image.dimensions();
    if width > 2 * MARGIN && height > BAR_TOP + BAR_HEIGHT {
        let bar_width = (width - 2 * MARGIN).min(2 * MAX_DISPLAY_SCORE);
        let fill = bar_width * score.score as u32 / MAX_DISPLAY_SCORE;

        draw_filled_rect_mut(
            &mut image,
            Rect::at(MARGIN as i32, BAR_TOP as i32).of_size(bar_width, BAR_HEIGHT),
            BAR_BACKGROUND,
        );
        if fill > 0 {
            draw_filled_rect_mut(
                &mut image,
                Rect::at(MARGIN as i32, BAR_TOP as i32).of_size(fill, BAR_HEIGHT),
                color,
            );
        }
    }

    image
}
