pub mod registry;

pub use registry::{CountingRegistry, create_test_checker};
