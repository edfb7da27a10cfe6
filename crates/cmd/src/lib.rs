// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub mod commands;
pub mod common;

pub use commands::{cat_command, log_command, mv_command, rm_command, save_command, serve_command};
pub use common::{ConfigOverrides, RevsContext};
