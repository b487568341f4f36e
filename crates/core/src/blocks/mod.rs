pub mod definition;
pub mod instance;
pub mod registry;
mod seed;

pub use definition::{BlockDefinition, FieldDescriptor, FieldType};
pub use instance::{BlockInstance, BlockMeta};
pub use registry::{BlockCategory, BlockRegistry, RegistryError};
