//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises the service against the
//! host-side adapters. All tests run on the host (x86_64) with no real
//! hardware required.

mod provisioning_flow_tests;
mod query_tests;
