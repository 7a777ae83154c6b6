// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Write-side database operations.
//!
//! Multi-row writes run inside `conn.transaction(..)` so partial state is
//! never visible.

pub mod accounts;
pub mod availability;
pub mod billing;
pub mod directory;
pub mod seasons;
