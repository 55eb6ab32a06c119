//! Mapping of text item placements onto the overlay
//!
//! Document space has its origin at the bottom-left with y growing upward,
//! the overlay has its origin at the top-left with y growing downward. Each
//! quarter turn swaps which document axis lands on top and left.

use super::types::{Transform, ViewBox, normalize_degrees};

/// Overlay rectangle of one text item, in document units
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FragmentRect {
    pub top: f32,
    pub left: f32,
    /// Rendered glyph height. Quarter-turned text runs along the item width.
    pub height: f32,
}

/// Compute where a text item sits on the overlay for a given rotation.
///
/// `rotation` may be any value in degrees; only `rotation mod 360` selects
/// the mapping.
#[must_use]
pub fn fragment_rect(view_box: &ViewBox, rotation: i32, transform: &Transform) -> FragmentRect {
    let ViewBox {
        x_min,
        y_min,
        x_max,
        y_max,
    } = *view_box;
    let width = transform.width();
    let height = transform.height();
    let x = transform.x();
    let y = transform.y();

    match normalize_degrees(rotation) {
        270..=359 => FragmentRect {
            top: x_max - x - width,
            left: y_max - y,
            height: width,
        },
        180..=269 => FragmentRect {
            top: y_min + y,
            left: x_max - x,
            height,
        },
        90..=179 => FragmentRect {
            top: x_min + x,
            left: y_min + y,
            height: width,
        },
        _ => FragmentRect {
            top: y_max - y - height,
            left: x + x_min,
            height,
        },
    }
}
