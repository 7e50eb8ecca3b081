#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use ravel_api::{
    RavelExtents3D, RavelFormat, RavelTextureDef, RavelTextureDimensions, RavelTextureUsage,
};

/// How many mip levels an image has
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum MipPolicy {
    Single,
    /// A full chain down to 1x1
    FullChain,
    Count(u32),
}

impl Default for MipPolicy {
    fn default() -> Self {
        MipPolicy::Single
    }
}

/// Everything needed to create an image. Temporaries only share a pooled image if their
/// descriptions are exactly equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct ImageDescription {
    pub format: RavelFormat,
    pub extents: RavelExtents3D,
    pub dimensions: RavelTextureDimensions,
    pub usage: RavelTextureUsage,
    pub mip_policy: MipPolicy,
}

impl ImageDescription {
    pub fn new_2d(
        format: RavelFormat,
        width: u32,
        height: u32,
        usage: RavelTextureUsage,
    ) -> Self {
        ImageDescription {
            format,
            extents: RavelExtents3D {
                width,
                height,
                depth: 1,
            },
            dimensions: RavelTextureDimensions::Dim2D,
            usage,
            mip_policy: MipPolicy::Single,
        }
    }

    pub fn with_mip_policy(
        mut self,
        mip_policy: MipPolicy,
    ) -> Self {
        self.mip_policy = mip_policy;
        self
    }

    pub fn mip_count(&self) -> u32 {
        match self.mip_policy {
            MipPolicy::Single => 1,
            MipPolicy::FullChain => self.extents.full_mip_count(),
            MipPolicy::Count(count) => count,
        }
    }

    pub fn texture_def(&self) -> RavelTextureDef {
        RavelTextureDef {
            extents: self.extents,
            mip_count: self.mip_count(),
            format: self.format,
            usage: self.usage,
            dimensions: self.dimensions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mip_count() {
        let description = ImageDescription::new_2d(
            RavelFormat::R16G16B16A16_SFLOAT,
            256,
            64,
            RavelTextureUsage::SAMPLED,
        );
        assert_eq!(description.mip_count(), 1);
        assert_eq!(
            description
                .clone()
                .with_mip_policy(MipPolicy::FullChain)
                .mip_count(),
            9
        );
        assert_eq!(
            description
                .with_mip_policy(MipPolicy::Count(3))
                .texture_def()
                .mip_count,
            3
        );
    }

    #[test]
    fn test_equality_is_exact() {
        let a = ImageDescription::new_2d(
            RavelFormat::R8G8B8A8_UNORM,
            128,
            128,
            RavelTextureUsage::SAMPLED | RavelTextureUsage::STORAGE,
        );
        let mut b = a.clone();
        assert_eq!(a, b);

        b.usage = RavelTextureUsage::SAMPLED;
        assert_ne!(a, b);
    }
}
