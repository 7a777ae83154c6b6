// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-side database operations.
//!
//! All queries use Diesel DSL against the `SQLite` connection and map rows
//! into domain types (or `*Data` structs where no domain type exists).

pub mod accounts;
pub mod availability;
pub mod billing;
pub mod directory;
pub mod seasons;
