pub mod arbiter;
pub mod clock;
pub mod editor;
pub mod error;
pub mod params;
pub mod pipeline;
pub mod retry;

pub use clock::MonotonicClock;
pub use editor::{EditParams, RecordEditor};
pub use error::PipelineError;
pub use params::{file_stem, UploadParams};
pub use pipeline::{UploadPipeline, UploadReport};
pub use retry::RetryPolicy;
