//! Target dimensions per device class.
//!
//! Rules, first match wins:
//!
//! | Hints | Width | Height |
//! |---|---|---|
//! | portrait | landscape height, clamped to source width | landscape width, clamped to source height |
//! | featured or panorama | featured width | featured width scaled by source aspect |
//! | neither | landscape width | landscape height |
//!
//! The `Original` class always takes the source dimensions.

use crate::config::DeviceClassConfig;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("Malformed resolution '{0}', expected <width>:<height>")]
    Malformed(String),

    #[error("Resolution '{0}' has a zero dimension")]
    ZeroDimension(String),
}

/// A rendition tier. Viewport classes carry their constants; `Original` has none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceClass {
    Viewport(DeviceClassConfig),
    Original,
}

impl DeviceClass {
    pub fn name(&self) -> &str {
        match self {
            DeviceClass::Viewport(config) => &config.name,
            DeviceClass::Original => "original",
        }
    }

    /// Key of this class in a record's variant map; `None` for `Original`
    pub fn variant_slot(&self) -> Option<String> {
        match self {
            DeviceClass::Viewport(config) => Some(config.max_width.to_string()),
            DeviceClass::Original => None,
        }
    }
}

/// Every class an upload renders: the configured viewports followed by `Original`
pub fn device_classes(configs: &[DeviceClassConfig]) -> Vec<DeviceClass> {
    configs
        .iter()
        .cloned()
        .map(DeviceClass::Viewport)
        .chain(std::iter::once(DeviceClass::Original))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrientationHints {
    pub portrait: bool,
    pub panorama: bool,
    pub featured: bool,
}

/// Source image dimensions. Both components are non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceResolution {
    width: u32,
    height: u32,
}

impl SourceResolution {
    pub fn new(width: u32, height: u32) -> Result<Self, ResolutionError> {
        if width == 0 || height == 0 {
            return Err(ResolutionError::ZeroDimension(format!("{}:{}", width, height)));
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn get(&self, axis: Axis) -> u32 {
        match axis {
            Axis::Width => self.width(),
            Axis::Height => self.height(),
        }
    }
}

impl FromStr for SourceResolution {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ResolutionError::Malformed(s.to_string());

        let (width, height) = s.split_once(':').ok_or_else(malformed)?;
        let width = width.trim().parse::<u32>().map_err(|_| malformed())?;
        let height = height.trim().parse::<u32>().map_err(|_| malformed())?;

        Self::new(width, height).map_err(|_| ResolutionError::ZeroDimension(s.to_string()))
    }
}

impl fmt::Display for SourceResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for TargetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Size of one axis of the variant rendered for `class`
pub fn resolution(
    class: &DeviceClass,
    axis: Axis,
    hints: OrientationHints,
    source: SourceResolution,
) -> u32 {
    let DeviceClass::Viewport(config) = class else {
        return source.get(axis);
    };

    if hints.portrait {
        let swapped = match axis {
            Axis::Width => config.landscape_height,
            Axis::Height => config.landscape_width,
        };
        return swapped.min(source.get(axis));
    }

    if hints.featured || hints.panorama {
        return match axis {
            Axis::Width => config.featured_width,
            Axis::Height => {
                let scaled = f64::from(config.featured_width) * f64::from(source.height())
                    / f64::from(source.width());
                (scaled.round() as u32).max(1)
            }
        };
    }

    match axis {
        Axis::Width => config.landscape_width,
        Axis::Height => config.landscape_height,
    }
}

pub fn target_size(
    class: &DeviceClass,
    hints: OrientationHints,
    source: SourceResolution,
) -> TargetSize {
    TargetSize {
        width: resolution(class, Axis::Width, hints, source),
        height: resolution(class, Axis::Height, hints, source),
    }
}
