pub mod registry;
pub use registry::{ConnectionRegistry, RedisConnectionRegistry};
pub mod groups;
pub use groups::CompanyGroups;
pub mod filters;
pub mod broadcast;
pub mod gate;
