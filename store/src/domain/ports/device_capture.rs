//! Port for the camera/microphone permission check that gates going live.

use std::fmt;

/// Why device capture was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureDenial {
    /// The user refused camera or microphone access.
    PermissionDenied,
    /// No camera or microphone is connected.
    NoDevice,
    /// Another application holds the device.
    DeviceBusy,
    /// Any other failure, with the platform's message.
    Other(String),
}

impl fmt::Display for CaptureDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied => {
                f.write_str("permission to use the camera or microphone was denied")
            }
            Self::NoDevice => f.write_str("no camera or microphone found"),
            Self::DeviceBusy => {
                f.write_str("the camera or microphone is in use by another application")
            }
            Self::Other(message) => f.write_str(message),
        }
    }
}

/// Outcome of a capture permission request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureAccess {
    /// Capture may start.
    Granted,
    /// Capture was refused.
    Denied(CaptureDenial),
}

impl CaptureAccess {
    /// Return `true` when capture was granted.
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// External capability that asks the platform for capture access.
#[cfg_attr(test, mockall::automock)]
pub trait DeviceCapture: Send + Sync {
    /// Request camera and microphone access.
    fn request_access(&self) -> CaptureAccess;
}

/// Capture port returning a preconfigured answer.
///
/// The CLI uses it to carry an explicit `--confirm-capture` decision; tests
/// use it where capture behaviour is not under test.
#[derive(Debug, Clone)]
pub struct FixtureDeviceCapture {
    access: CaptureAccess,
}

impl FixtureDeviceCapture {
    /// Always grant access.
    pub fn granted() -> Self {
        Self {
            access: CaptureAccess::Granted,
        }
    }

    /// Always deny access for `denial`.
    pub fn denied(denial: CaptureDenial) -> Self {
        Self {
            access: CaptureAccess::Denied(denial),
        }
    }
}

impl Default for FixtureDeviceCapture {
    fn default() -> Self {
        Self::granted()
    }
}

impl DeviceCapture for FixtureDeviceCapture {
    fn request_access(&self) -> CaptureAccess {
        self.access.clone()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn default_fixture_grants_access() {
        assert!(FixtureDeviceCapture::default().request_access().is_granted());
    }

    #[rstest]
    #[case(CaptureDenial::NoDevice, "no camera or microphone found")]
    #[case(CaptureDenial::Other("driver crashed".to_owned()), "driver crashed")]
    fn denial_reasons_render(#[case] denial: CaptureDenial, #[case] expected: &str) {
        let capture = FixtureDeviceCapture::denied(denial);
        match capture.request_access() {
            CaptureAccess::Denied(reason) => assert_eq!(reason.to_string(), expected),
            CaptureAccess::Granted => panic!("fixture should deny"),
        }
    }
}
