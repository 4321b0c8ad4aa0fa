//! Registry implementations

pub mod npm;
pub mod throttled;

pub use npm::NpmRegistry;
pub use throttled::ThrottledRegistry;
