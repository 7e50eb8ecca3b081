#[cfg(feature = "ravel-vulkan")]
use ash::vk;
use std::sync::Arc;

pub type RavelResult<T> = Result<T, RavelError>;

/// Generic error that contains all the different kinds of errors that may occur when using the API
#[derive(Debug, Clone)]
pub enum RavelError {
    StringError(String),
    IoError(Arc<std::io::Error>),
    /// The caller described something that can't be built (for example render targets of
    /// different sizes in one pass). Nothing was created.
    ValidationFailure(String),
    /// GPU memory or descriptor pool exhaustion. There is no degraded mode, the frame loop should
    /// stop.
    AllocationFailure(String),
    /// A fence wait or queue submission failed. The frame loop can't make progress.
    SynchronizationFailure(String),
    #[cfg(feature = "ravel-vulkan")]
    VkError(vk::Result),
}

impl RavelError {
    /// True for the error kinds that leave the frame loop without a safe way to continue
    pub fn is_fatal(&self) -> bool {
        match self {
            RavelError::AllocationFailure(_) | RavelError::SynchronizationFailure(_) => true,
            #[cfg(feature = "ravel-vulkan")]
            RavelError::VkError(_) => true,
            _ => false,
        }
    }
}

impl std::error::Error for RavelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            RavelError::StringError(_) => None,
            RavelError::IoError(ref e) => Some(&**e),
            RavelError::ValidationFailure(_) => None,
            RavelError::AllocationFailure(_) => None,
            RavelError::SynchronizationFailure(_) => None,
            #[cfg(feature = "ravel-vulkan")]
            RavelError::VkError(ref e) => Some(e),
        }
    }
}

impl core::fmt::Display for RavelError {
    fn fmt(
        &self,
        fmt: &mut core::fmt::Formatter,
    ) -> core::fmt::Result {
        match *self {
            RavelError::StringError(ref e) => e.fmt(fmt),
            RavelError::IoError(ref e) => e.fmt(fmt),
            RavelError::ValidationFailure(ref e) => write!(fmt, "validation failure: {}", e),
            RavelError::AllocationFailure(ref e) => write!(fmt, "allocation failure: {}", e),
            RavelError::SynchronizationFailure(ref e) => {
                write!(fmt, "synchronization failure: {}", e)
            }
            #[cfg(feature = "ravel-vulkan")]
            RavelError::VkError(ref e) => e.fmt(fmt),
        }
    }
}

impl From<&str> for RavelError {
    fn from(str: &str) -> Self {
        RavelError::StringError(str.to_string())
    }
}

impl From<String> for RavelError {
    fn from(string: String) -> Self {
        RavelError::StringError(string)
    }
}

impl From<std::io::Error> for RavelError {
    fn from(error: std::io::Error) -> Self {
        RavelError::IoError(Arc::new(error))
    }
}

#[cfg(feature = "ravel-vulkan")]
impl From<vk::Result> for RavelError {
    fn from(result: vk::Result) -> Self {
        match result {
            vk::Result::ERROR_OUT_OF_HOST_MEMORY
            | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY
            | vk::Result::ERROR_OUT_OF_POOL_MEMORY
            | vk::Result::ERROR_FRAGMENTED_POOL => {
                RavelError::AllocationFailure(format!("{:?}", result))
            }
            vk::Result::ERROR_DEVICE_LOST | vk::Result::TIMEOUT => {
                RavelError::SynchronizationFailure(format!("{:?}", result))
            }
            _ => RavelError::VkError(result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_kinds() {
        assert!(RavelError::AllocationFailure("pool".to_string()).is_fatal());
        assert!(RavelError::SynchronizationFailure("fence".to_string()).is_fatal());
        assert!(!RavelError::ValidationFailure("extents".to_string()).is_fatal());
        assert!(!RavelError::from("message").is_fatal());
    }

    #[test]
    fn test_display() {
        let error = RavelError::ValidationFailure("render targets differ in size".to_string());
        assert_eq!(
            format!("{}", error),
            "validation failure: render targets differ in size"
        );
    }
}
