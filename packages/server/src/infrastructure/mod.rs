//! Infrastructure layer: concrete implementations of domain seams.

pub mod registry;

pub use registry::{InMemorySessionRegistry, RegistryError, SessionChannels, SessionHandle};
