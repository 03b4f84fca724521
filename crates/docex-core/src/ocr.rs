//! OCR extension point.
//!
//! No engine ships with docex. A document profile may declare that it needs
//! OCR text; the processor then asks the configured [`OcrEngine`] for text
//! spans and appends them to the prompt instead of attaching the image.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// A recognized piece of text with its location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    /// Quadrilateral corners (x1, y1, x2, y2, x3, y3, x4, y4).
    pub region: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence (0.0 - 1.0).
    pub confidence: f32,
}

impl TextSpan {
    /// Axis-aligned bounding rectangle (min_x, min_y, max_x, max_y).
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.region[0], self.region[2], self.region[4], self.region[6]];
        let ys = [self.region[1], self.region[3], self.region[5], self.region[7]];

        let min_x = xs.iter().copied().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().copied().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Text recognition backend.
pub trait OcrEngine: Send + Sync {
    /// Recognize the text in an image file.
    fn extract(&self, image: &Path) -> Result<Vec<TextSpan>, OcrError>;
}

/// Join spans into plain text in reading order (top-to-bottom, left-to-right).
///
/// Spans whose top edges lie within `row_height` pixels share a line.
pub fn reading_order_text(spans: &[TextSpan], row_height: f32) -> String {
    let mut ordered: Vec<&TextSpan> = spans.iter().collect();
    ordered.sort_by(|a, b| {
        let (ax, ay, _, _) = a.rect();
        let (bx, by, _, _) = b.rect();
        let row_a = (ay / row_height) as i32;
        let row_b = (by / row_height) as i32;
        row_a
            .cmp(&row_b)
            .then(ax.partial_cmp(&bx).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut text = String::new();
    let mut current_row = None;
    for span in ordered {
        let row = (span.rect().1 / row_height) as i32;
        match current_row {
            Some(r) if r == row => text.push(' '),
            Some(_) => text.push('\n'),
            None => {}
        }
        current_row = Some(row);
        text.push_str(span.text.trim());
    }
    text
}
