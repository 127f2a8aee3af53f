//! This module provides reusable test utilities:
//! - A manually driven timer facility
//! - Sweep and registry doubles
//! - Test configuration builders
//! - Common test data

pub mod failing_registry;
pub mod manual_timer;
pub mod recording_sweep;
pub mod test_config;
pub mod test_data;

// Re-export commonly used items
pub use failing_registry::FailingRegistry;
pub use manual_timer::ManualTimer;
pub use recording_sweep::{Behaviour, RecordingSweep, SharedSweep};
pub use test_config::TestConfigBuilder;
pub use test_data::*;
