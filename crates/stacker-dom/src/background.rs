//! Background layers

use stacker_attr::mode;

/// What a background paints
#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundFill {
    /// ARGB colour
    Color(u32),
    /// Image reference, resolved by the host
    Url(String),
}

/// Image sizing
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BackgroundSize {
    #[default]
    Auto,
    Contain,
    Cover,
    Stretch,
    /// Pixels
    Absolute(f32),
    /// Fraction of the bounding box
    Fractional(f32),
}

impl BackgroundSize {
    /// Decode a background-size mode and its numeric value
    pub fn from_mode(m: u8, value: f32) -> Self {
        match m {
            mode::CONTAIN => Self::Contain,
            mode::COVER => Self::Cover,
            mode::STRETCH => Self::Stretch,
            mode::ABSOLUTE => Self::Absolute(value),
            mode::FRACTIONAL => Self::Fractional(value),
            _ => Self::Auto,
        }
    }
}

/// Box edge a background is clipped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundingBox {
    #[default]
    Border,
    Padding,
    Content,
}

impl BoundingBox {
    pub fn from_mode(m: u8) -> Self {
        match m {
            mode::BOX_PADDING => Self::Padding,
            mode::BOX_CONTENT => Self::Content,
            _ => Self::Border,
        }
    }
}

/// Background owned by a node
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundLayer {
    pub fill: BackgroundFill,
    pub size: BackgroundSize,
    pub bounding_box: BoundingBox,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_from_mode() {
        assert_eq!(BackgroundSize::from_mode(mode::COVER, 0.0), BackgroundSize::Cover);
        assert_eq!(BackgroundSize::from_mode(mode::FRACTIONAL, 0.5), BackgroundSize::Fractional(0.5));
        assert_eq!(BackgroundSize::from_mode(mode::UNDEFINED, 3.0), BackgroundSize::Auto);
    }

    #[test]
    fn test_box_defaults_to_border() {
        assert_eq!(BoundingBox::from_mode(mode::UNDEFINED), BoundingBox::Border);
        assert_eq!(BoundingBox::from_mode(mode::BOX_CONTENT), BoundingBox::Content);
    }
}
