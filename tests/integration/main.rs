//! Integration test entry point.
//!
//! Single harness binary: shared mock adapters live in `mock_hw`, the
//! scenario suites in their own modules.

mod mock_hw;

mod connectivity_tests;
mod provisioning_flow_tests;
mod sampling_tests;
mod watering_tests;
