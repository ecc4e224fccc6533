// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TestingError {
    #[error("invalid engine fixture: {0}")]
    FixtureInvalid(#[from] toml::de::Error),
    #[error("product '{product}' references unknown package '{package}'")]
    UnknownPackage { product: String, package: String },
}

pub type Result<T> = std::result::Result<T, TestingError>;
