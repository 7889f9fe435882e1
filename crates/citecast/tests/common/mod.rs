//! Shared test utilities for citecast integration tests.
//!
//! - `harness`: isolated database and storage per test
//! - `fakes`: scripted stand-ins for the PDF, lookup and LLM collaborators
//! - `stub_server`: loopback HTTP responder for the provider adapters

pub mod fakes;
pub mod harness;
pub mod stub_server;

#[allow(unused_imports)]
pub use fakes::*;
#[allow(unused_imports)]
pub use harness::TestHarness;
#[allow(unused_imports)]
pub use stub_server::{StubResponse, StubServer};
