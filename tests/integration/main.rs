//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises the node service
//! against mock adapters. All tests run on the host (x86_64) with no
//! real radio, broker or sensor required.

mod bring_up_tests;
mod mock_hw;
mod steady_state_tests;
