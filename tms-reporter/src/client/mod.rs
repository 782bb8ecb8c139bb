// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`TmsClient`](tms_model::TmsClient) implementations.

mod memory;

pub use memory::*;
