pub mod handlers;
pub mod request;
pub mod response;

pub use handlers::ImageService;
pub use request::{DeleteRequest, EditRequest, UploadRequest, UploadUrlRequest};
pub use response::ApiResponse;
