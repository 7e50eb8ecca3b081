mod deferred_drop;
pub use deferred_drop::DeferredDropQueue;

mod descriptor_pool_allocator;
pub use descriptor_pool_allocator::DescriptorPoolAllocator;

mod descriptor_set_layout_cache;
pub(crate) use descriptor_set_layout_cache::DescriptorSetLayoutCache;
pub use descriptor_set_layout_cache::ReflectedBindings;

mod handles;
pub use handles::*;

mod image_description;
pub use image_description::*;

mod persistent_resources;
pub(crate) use persistent_resources::*;

mod resource_state_table;
pub use resource_state_table::*;
