pub mod entities;
pub mod ports;
pub mod value_objects;

pub use entities::*;
pub use ports::*;
pub use release_errors::{ReleaseError, ReleaseResult};
pub use value_objects::*;
