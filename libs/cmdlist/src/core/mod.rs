// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

pub mod command_list;
pub mod config;
pub mod error;
pub mod rhi;
pub mod staging;

pub use command_list::{resource_base, CommandList, EncoderKind, Submission, TextureCopy};
pub use config::{CommandListConfig, StagingConfig};
pub use error::*;
pub use staging::StagingPool;
