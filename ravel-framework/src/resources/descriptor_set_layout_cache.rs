#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use fnv::FnvHashMap;
use ravel_api::{
    RavelDescriptorBinding, RavelDescriptorSetLayout, RavelDescriptorSetLayoutDef,
    RavelDescriptorType, RavelDeviceContext, RavelResult,
};

/// Binding indices a shader uses, grouped by the kind of resource bound there. Produced by
/// shader reflection outside this crate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct ReflectedBindings {
    pub sampled_images: Vec<u32>,
    pub storage_images: Vec<u32>,
    pub uniform_buffers: Vec<u32>,
    pub storage_buffers: Vec<u32>,
    pub samplers: Vec<u32>,
}

impl ReflectedBindings {
    pub fn descriptor_set_layout_def(&self) -> RavelDescriptorSetLayoutDef {
        let groups = [
            (&self.sampled_images, RavelDescriptorType::SampledImage),
            (&self.storage_images, RavelDescriptorType::StorageImage),
            (&self.uniform_buffers, RavelDescriptorType::UniformBuffer),
            (&self.storage_buffers, RavelDescriptorType::StorageBuffer),
            (&self.samplers, RavelDescriptorType::Sampler),
        ];

        let mut bindings = Vec::default();
        for (indices, descriptor_type) in groups {
            for &binding in indices {
                bindings.push(RavelDescriptorBinding {
                    binding,
                    descriptor_type,
                });
            }
        }

        bindings.sort_by_key(|x| x.binding);
        RavelDescriptorSetLayoutDef { bindings }
    }
}

/// Creates each distinct descriptor set layout once
#[derive(Default)]
pub(crate) struct DescriptorSetLayoutCache {
    layouts: FnvHashMap<RavelDescriptorSetLayoutDef, RavelDescriptorSetLayout>,
}

impl DescriptorSetLayoutCache {
    pub(crate) fn get_or_create(
        &mut self,
        device_context: &RavelDeviceContext,
        bindings: &ReflectedBindings,
    ) -> RavelResult<RavelDescriptorSetLayout> {
        let layout_def = bindings.descriptor_set_layout_def();
        if let Some(layout) = self.layouts.get(&layout_def) {
            return Ok(layout.clone());
        }

        log::debug!(
            "Creating descriptor set layout with {} bindings",
            layout_def.bindings.len()
        );
        let layout = device_context.create_descriptor_set_layout(&layout_def)?;
        self.layouts.insert(layout_def, layout.clone());
        Ok(layout)
    }

    pub(crate) fn len(&self) -> usize {
        self.layouts.len()
    }

    pub(crate) fn clear(&mut self) {
        self.layouts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_def_sorted_by_binding() {
        let bindings = ReflectedBindings {
            sampled_images: vec![2],
            storage_images: vec![0],
            samplers: vec![1],
            ..Default::default()
        };

        let layout_def = bindings.descriptor_set_layout_def();
        let types: Vec<_> = layout_def
            .bindings
            .iter()
            .map(|x| (x.binding, x.descriptor_type))
            .collect();
        assert_eq!(
            types,
            vec![
                (0, RavelDescriptorType::StorageImage),
                (1, RavelDescriptorType::Sampler),
                (2, RavelDescriptorType::SampledImage),
            ]
        );
    }

    #[test]
    fn test_cache_reuses_layouts() {
        let device_context = RavelDeviceContext::new_empty(&Default::default());
        let mut cache = DescriptorSetLayoutCache::default();

        let bindings = ReflectedBindings {
            storage_buffers: vec![0, 1],
            ..Default::default()
        };
        cache.get_or_create(&device_context, &bindings).unwrap();
        cache.get_or_create(&device_context, &bindings).unwrap();
        assert_eq!(cache.len(), 1);

        let duplicate = ReflectedBindings {
            storage_buffers: vec![0],
            uniform_buffers: vec![0],
            ..Default::default()
        };
        assert!(cache.get_or_create(&device_context, &duplicate).is_err());
        assert_eq!(cache.len(), 1);
    }
}
