//! Remote-backed data resources
//!
//! This module defines the capability traits the coordinator needs from the
//! connection info cache, the object container cache and the session
//! snapshot resource. Implementations own the storage; the coordinator only
//! reads and writes entries through these traits.

mod connection_info;
mod container;
mod session;

pub use connection_info::ConnectionInfoResource;
pub use container::ContainerResource;
pub use session::SessionResource;
