//! Core types for text layer positioning

use serde::Serialize;

/// Page bounding box in document units
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ViewBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl ViewBox {
    #[must_use]
    pub const fn new(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    #[must_use]
    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    #[must_use]
    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }
}

/// Normalize degrees into [0, 360)
#[must_use]
pub const fn normalize_degrees(degrees: i32) -> i32 {
    degrees.rem_euclid(360)
}

/// Page geometry at a given scale
///
/// Never cached by the layer: a viewport is derived again from the page
/// handle whenever scale or page change.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Viewport {
    /// Unscaled page box in document units
    pub view_box: ViewBox,
    /// Display scale factor
    pub scale: f32,
    /// Intrinsic page rotation in [0, 360)
    pub rotation: i32,
    /// Scaled width, swapped with height for quarter turns
    pub width: f32,
    /// Scaled height, swapped with width for quarter turns
    pub height: f32,
}

impl Viewport {
    #[must_use]
    pub fn new(view_box: ViewBox, scale: f32, rotation: i32) -> Self {
        let rotation = normalize_degrees(rotation);
        let scaled_width = view_box.width() * scale;
        let scaled_height = view_box.height() * scale;
        let (width, height) = if rotation % 180 == 0 {
            (scaled_width, scaled_height)
        } else {
            (scaled_height, scaled_width)
        };

        Self {
            view_box,
            scale,
            rotation,
            width,
            height,
        }
    }
}

/// Placement descriptor of an extracted text item.
///
/// Layout is `[font_a, font_b, width, height, x, y]`. The first two entries are
/// font metrics and play no part in positioning.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Transform(pub [f32; 6]);

impl Transform {
    #[must_use]
    pub const fn new(values: [f32; 6]) -> Self {
        Self(values)
    }

    /// Build a transform from placement only, with zeroed font metrics
    #[must_use]
    pub const fn from_placement(width: f32, height: f32, x: f32, y: f32) -> Self {
        Self([0.0, 0.0, width, height, x, y])
    }

    #[must_use]
    pub const fn width(&self) -> f32 {
        self.0[2]
    }

    #[must_use]
    pub const fn height(&self) -> f32 {
        self.0[3]
    }

    #[must_use]
    pub const fn x(&self) -> f32 {
        self.0[4]
    }

    #[must_use]
    pub const fn y(&self) -> f32 {
        self.0[5]
    }
}

/// One extracted run of text
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TextItem {
    pub transform: Transform,
    pub text: String,
}

impl TextItem {
    pub fn new(transform: Transform, text: impl Into<String>) -> Self {
        Self {
            transform,
            text: text.into(),
        }
    }
}

/// Result of a text extraction for a single page
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextContent {
    pub items: Vec<TextItem>,
}

impl TextContent {
    #[must_use]
    pub fn new(items: Vec<TextItem>) -> Self {
        Self { items }
    }
}

/// Text placed on the overlay, in document units plus the display scale
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PositionedFragment {
    pub top: f32,
    pub left: f32,
    pub height: f32,
    pub scale: f32,
    pub text: String,
}

impl PositionedFragment {
    #[must_use]
    pub fn top_px(&self) -> f32 {
        self.top * self.scale
    }

    #[must_use]
    pub fn left_px(&self) -> f32 {
        self.left * self.scale
    }

    /// Rendered glyph height, used as the font size of the overlay span
    #[must_use]
    pub fn font_size_px(&self) -> f32 {
        self.height * self.scale
    }
}

/// Container the fragments are positioned in
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct OverlayFrame {
    pub width: f32,
    pub height: f32,
    /// Counter-rotation in degrees, `rotate - page rotation`
    pub rotation: i32,
}

/// Render model of a text layer
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LayerView {
    pub frame: OverlayFrame,
    pub fragments: Vec<PositionedFragment>,
}
