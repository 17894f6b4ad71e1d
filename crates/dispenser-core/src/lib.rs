// Copyright (c) 2026 Dispenser Contributors
// SPDX-License-Identifier: Apache-2.0

//! dispenser-core
//!
//! First-come allocator for a fixed catalog of numbered territories.
//!
//! - Catalog sources: a JSON file or an in-memory list, read once
//! - [`AllocatorState`]: catalog order decides who is handed out next
//! - [`Dispenser`]: lock-guarded, cloneable handle shared by request handlers

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod allocator;
pub mod catalog;
pub mod clock;
pub mod dispenser;
pub mod error;
pub mod territory;

pub use crate::allocator::AllocatorState;
pub use crate::catalog::{CatalogSource, JsonFileCatalog, StaticCatalog};
pub use crate::dispenser::Dispenser;
pub use crate::error::{DispenserError, DispenserResult};
pub use crate::territory::{AssignmentRecord, Stats, Territory, TerritoryId};
