// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Crate-wide error type aggregating every pipeline stage's own error
//! enum, so the decision shim has one `?`-friendly type to propagate
//! before it maps outcomes down to authentication-stack status codes.

use crate::config::ConfigError;
use crate::directory::DirectoryError;
use crate::identity::IdentityError;
use crate::objects::ObjectError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HbacError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Object(#[from] ObjectError),
}
