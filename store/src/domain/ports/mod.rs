//! Domain ports for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod device_capture;
mod media_uploader;
mod storage_medium;

#[cfg(test)]
pub use device_capture::MockDeviceCapture;
pub use device_capture::{CaptureAccess, CaptureDenial, DeviceCapture, FixtureDeviceCapture};
#[cfg(test)]
pub use media_uploader::MockMediaUploader;
pub use media_uploader::{FixtureMediaUploader, MediaUpload, MediaUploader, UploadError};
#[cfg(test)]
pub use storage_medium::MockStorageMedium;
pub use storage_medium::{StorageKey, StorageMedium, StorageMediumError};
