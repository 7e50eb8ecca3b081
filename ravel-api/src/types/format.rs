#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Texel formats the frame core knows how to allocate and barrier. Names follow the vulkan
/// format names.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum RavelFormat {
    UNDEFINED,
    R8_UNORM,
    R8G8B8A8_UNORM,
    R8G8B8A8_SRGB,
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,
    R16_SFLOAT,
    R16G16_SFLOAT,
    R16G16B16A16_SFLOAT,
    R32_SFLOAT,
    R32_UINT,
    R32G32B32A32_SFLOAT,
    B10G11R11_UFLOAT_PACK32,
    D16_UNORM,
    D32_SFLOAT,
    D24_UNORM_S8_UINT,
    D32_SFLOAT_S8_UINT,
}

impl Default for RavelFormat {
    fn default() -> Self {
        RavelFormat::UNDEFINED
    }
}

impl RavelFormat {
    pub fn has_depth(self) -> bool {
        match self {
            RavelFormat::D16_UNORM
            | RavelFormat::D32_SFLOAT
            | RavelFormat::D24_UNORM_S8_UINT
            | RavelFormat::D32_SFLOAT_S8_UINT => true,
            _ => false,
        }
    }

    pub fn has_stencil(self) -> bool {
        match self {
            RavelFormat::D24_UNORM_S8_UINT | RavelFormat::D32_SFLOAT_S8_UINT => true,
            _ => false,
        }
    }

    pub fn has_depth_or_stencil(self) -> bool {
        self.has_depth() || self.has_stencil()
    }

    pub fn is_srgb(self) -> bool {
        match self {
            RavelFormat::R8G8B8A8_SRGB | RavelFormat::B8G8R8A8_SRGB => true,
            _ => false,
        }
    }

    /// Size of one texel in bytes
    pub fn block_size_in_bytes(self) -> u32 {
        match self {
            RavelFormat::UNDEFINED => 0,
            RavelFormat::R8_UNORM => 1,
            RavelFormat::R16_SFLOAT | RavelFormat::D16_UNORM => 2,
            RavelFormat::R8G8B8A8_UNORM
            | RavelFormat::R8G8B8A8_SRGB
            | RavelFormat::B8G8R8A8_UNORM
            | RavelFormat::B8G8R8A8_SRGB
            | RavelFormat::R16G16_SFLOAT
            | RavelFormat::R32_SFLOAT
            | RavelFormat::R32_UINT
            | RavelFormat::B10G11R11_UFLOAT_PACK32
            | RavelFormat::D32_SFLOAT
            | RavelFormat::D24_UNORM_S8_UINT => 4,
            RavelFormat::D32_SFLOAT_S8_UINT | RavelFormat::R16G16B16A16_SFLOAT => 8,
            RavelFormat::R32G32B32A32_SFLOAT => 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_formats() {
        assert!(RavelFormat::D32_SFLOAT.has_depth());
        assert!(!RavelFormat::D32_SFLOAT.has_stencil());
        assert!(RavelFormat::D24_UNORM_S8_UINT.has_depth_or_stencil());
        assert!(RavelFormat::D24_UNORM_S8_UINT.has_stencil());
        assert!(!RavelFormat::R16G16B16A16_SFLOAT.has_depth_or_stencil());
    }
}
