//! Image sizing and rendering.
//!
//! `resolution` decides how large each variant is; `renderer` produces the
//! encoded bytes. Neither touches the network.

pub mod renderer;
pub mod resolution;

pub use renderer::{probe_resolution, JpegRenderer, RenderError, Renderer};
pub use resolution::{
    device_classes, target_size, DeviceClass, OrientationHints, ResolutionError, SourceResolution,
};
