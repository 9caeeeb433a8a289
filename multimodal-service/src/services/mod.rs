pub mod providers;
pub mod uploads;

pub use providers::{GenerationProvider, Part, ProviderError};
pub use uploads::{TempUpload, UploadError, Uploads};
