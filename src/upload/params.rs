use crate::imaging::{DeviceClass, OrientationHints, SourceResolution};

/// Everything the pipeline needs to know about one upload besides its bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadParams {
    pub category: String,
    pub description: String,
    /// Caller supplied file name without extension; prefixes every blob key
    pub file_stem: String,
    pub source_resolution: SourceResolution,
    pub featured: bool,
    pub portrait: bool,
    pub panorama: bool,
}

impl UploadParams {
    pub fn hints(&self) -> OrientationHints {
        OrientationHints {
            portrait: self.portrait,
            panorama: self.panorama,
            featured: self.featured,
        }
    }

    /// `{stem}-[{featured_tag}-]{class}-{timestamp}.{extension}`
    pub fn blob_key(
        &self,
        class: &DeviceClass,
        featured_tag: &str,
        attempt_time: i64,
        extension: &str,
    ) -> String {
        if self.featured {
            format!(
                "{}-{}-{}-{}.{}",
                self.file_stem,
                featured_tag,
                class.name(),
                attempt_time,
                extension
            )
        } else {
            format!(
                "{}-{}-{}.{}",
                self.file_stem,
                class.name(),
                attempt_time,
                extension
            )
        }
    }
}

/// Reduce a file name to a stem safe to use as a key prefix.
///
/// Drops everything from the last `.` and replaces path separators.
pub fn file_stem(file_name: &str) -> String {
    let stem = match file_name.rfind('.') {
        Some(index) if index > 0 => &file_name[..index],
        _ => file_name,
    };
    stem.replace(['/', '\\'], "_")
}
