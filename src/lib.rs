// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
//! Key store core: tagged parameter sets, key material records, a policy
//! checked alias table and asymmetric operations over pluggable providers.
#[cfg(all(feature = "crypto-rust", feature = "crypto-ring-rust"))]
compile_error!("Features `crypto-rust` and `crypto-ring-rust` are mutually exclusive");

#[cfg(not(any(feature = "crypto-rust", feature = "crypto-ring-rust")))]
compile_error!("One of the features `crypto-rust` or `crypto-ring-rust` must be enabled");

mod macros;

pub mod blob;
pub mod check;
pub mod config;
pub mod cursor;
pub mod dispatch;
pub mod error;
pub mod hash;
pub mod key_material;
pub mod param;
pub mod provider;
pub mod store;
pub mod tracer;

pub use blob::Blob;
pub use config::StoreConfig;
pub use dispatch::{decrypt, encrypt, generate_random, hash, sign, verify, KeyHandle};
pub use error::{ErrorKind, HuksError, Result};
pub use key_material::{KeyMaterial, KeyPart};
pub use param::{Param, ParamSet};
pub use store::{KeyState, KeyStore};
