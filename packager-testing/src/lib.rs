// SPDX-License-Identifier: GPL-3.0-only

//! Test doubles for the packager contracts
//!
//! [`FakeEngine`] answers engine queries from canned products, dependencies
//! and a disk usage table. [`FakeProbe`] simulates mounts and df figures and
//! records every mount and unmount it was asked for.

pub mod engine;
pub mod errors;
pub mod fixture;
pub mod probe;

pub use engine::FakeEngine;
pub use errors::{Result, TestingError};
pub use fixture::EngineFixture;
pub use probe::{FakeDevice, FakeProbe, ProbeCall};
