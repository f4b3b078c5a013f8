//! Raw framework bindings and objc2 helpers.

pub mod accessibility;
pub mod bridge;
pub mod core_foundation;

pub use accessibility::is_process_trusted;
