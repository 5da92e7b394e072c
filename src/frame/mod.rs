pub mod text;

pub use text::{wrap_text, TextRenderer};

use std::path::Path;

use image::{imageops, Rgb, RgbImage};
use tracing::warn;

use crate::config::Settings;
use crate::metadata::TrackMetadata;

pub const FRAME_WIDTH: u32 = 1920;
pub const FRAME_HEIGHT: u32 = 1080;

/// Padding between the frame edge and the artwork box.
const EDGE_PAD: u32 = 50;
/// Horizontal inset of the text column from the frame midpoint.
const TEXT_MARGIN: u32 = 50;

const TITLE_SIZE: f32 = 72.0;
const ARTIST_SIZE: f32 = 48.0;
const ALBUM_SIZE: f32 = 36.0;
const PLACEHOLDER_LABEL_SIZE: f32 = 36.0;

const TITLE_LINE_STEP: i32 = 80;
const ARTIST_GAP: i32 = 40;
const ARTIST_STEP: i32 = 60;

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const LIGHT_GRAY: Rgb<u8> = Rgb([211, 211, 211]);

/// Renders one still frame per track: artwork on the left half, wrapped
/// track text on the right.
///
/// Composition never fails: artwork load errors degrade to a placeholder box
/// and the text renderer always resolves to something drawable.
pub struct FrameComposer {
    renderer: TextRenderer,
}

impl FrameComposer {
    pub fn new(settings: &Settings) -> Self {
        Self {
            renderer: TextRenderer::load(settings.font_path.as_deref()),
        }
    }

    pub fn compose(&self, artwork: &Path, meta: &TrackMetadata) -> RgbImage {
        let mut frame = RgbImage::from_pixel(FRAME_WIDTH, FRAME_HEIGHT, BLACK);
        self.paint_artwork(&mut frame, artwork);
        self.paint_text(&mut frame, meta);
        frame
    }

    fn paint_artwork(&self, frame: &mut RgbImage, artwork: &Path) {
        let box_size = artwork_box_size();

        match image::open(artwork) {
            Ok(cover) => {
                // Fit within the box preserving aspect ratio, centered in
                // the left half on both axes.
                let cover = cover
                    .resize(box_size, box_size, imageops::FilterType::Lanczos3)
                    .to_rgb8();
                let (w, h) = cover.dimensions();
                let x = (FRAME_WIDTH / 2 - w) / 2;
                let y = (FRAME_HEIGHT - h) / 2;
                imageops::overlay(frame, &cover, x as i64, y as i64);
            }
            Err(e) => {
                warn!("Failed to load cover art {}: {e}", artwork.display());
                self.paint_placeholder(frame, box_size);
            }
        }
    }

    fn paint_placeholder(&self, frame: &mut RgbImage, box_size: u32) {
        let x = ((FRAME_WIDTH / 2 - box_size) / 2) as i32;
        let y = ((FRAME_HEIGHT - box_size) / 2) as i32;
        draw_rect_outline(frame, x, y, box_size, box_size, 2, WHITE);

        let label = "No Cover Art";
        let label_width = self.renderer.text_width(label, PLACEHOLDER_LABEL_SIZE) as i32;
        let label_x = x + (box_size as i32 - label_width) / 2;
        let label_y = y + (box_size as i32 - PLACEHOLDER_LABEL_SIZE as i32) / 2;
        self.renderer
            .draw(frame, label, label_x, label_y, PLACEHOLDER_LABEL_SIZE, WHITE);
    }

    fn paint_text(&self, frame: &mut RgbImage, meta: &TrackMetadata) {
        let text_x = (FRAME_WIDTH / 2 + TEXT_MARGIN) as i32;
        let column_width = FRAME_WIDTH / 2 - 2 * TEXT_MARGIN;
        let mut y = (FRAME_HEIGHT / 2) as i32 - 100;

        let title = meta.display_title();
        let lines = wrap_text(&title, column_width, |s| {
            self.renderer.text_width(s, TITLE_SIZE)
        });
        for line in &lines {
            self.renderer.draw(frame, line, text_x, y, TITLE_SIZE, WHITE);
            y += TITLE_LINE_STEP;
        }

        y += ARTIST_GAP;
        self.renderer
            .draw(frame, &meta.artist, text_x, y, ARTIST_SIZE, LIGHT_GRAY);
        y += ARTIST_STEP;
        self.renderer
            .draw(frame, &meta.album, text_x, y, ALBUM_SIZE, LIGHT_GRAY);
    }
}

/// Largest square that fits the left half with symmetric padding.
fn artwork_box_size() -> u32 {
    (FRAME_HEIGHT - 2 * EDGE_PAD).min(FRAME_WIDTH / 2 - 2 * EDGE_PAD)
}

fn draw_rect_outline(
    canvas: &mut RgbImage,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    thickness: u32,
    color: Rgb<u8>,
) {
    let (w, h, t) = (width as i32, height as i32, thickness as i32);
    for dy in 0..h {
        for dx in 0..w {
            let on_edge = dx < t || dy < t || dx >= w - t || dy >= h - t;
            if on_edge {
                put_pixel_checked(canvas, x + dx, y + dy, color);
            }
        }
    }
}

fn put_pixel_checked(canvas: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && x < canvas.width() as i32 && y < canvas.height() as i32 {
        canvas.put_pixel(x as u32, y as u32, color);
    }
}
