//! Hardware and transport abstraction traits
//!
//! These traits define the interface between the monitor logic and the
//! board-specific ADC and network link.

pub mod remote;
pub mod sample;

pub use remote::{RemoteStore, TransportError};
pub use sample::{SampleError, SampleSource};
