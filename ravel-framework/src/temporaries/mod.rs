mod usage_intervals;
pub use usage_intervals::*;

mod temporary_resource_pool;
pub use temporary_resource_pool::TemporaryResourcePool;
