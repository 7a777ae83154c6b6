// Copyright (C) 2026 Défi Vélo
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{DomainError, SeasonState};

#[test]
fn test_domain_error_display() {
    let err: DomainError = DomainError::InvalidCanton(String::from("Vaud"));
    assert_eq!(
        format!("{err}"),
        "Invalid canton code 'Vaud': must be two letters"
    );

    let err: DomainError = DomainError::InvalidSeasonTransition {
        from: SeasonState::Planning,
        to: SeasonState::Finished,
    };
    assert_eq!(
        format!("{err}"),
        "Cannot transition season from Planning to Finished"
    );

    let err: DomainError = DomainError::SeasonStateForbids {
        state: SeasonState::Archived,
        operation: "create session",
    };
    assert_eq!(
        format!("{err}"),
        "Operation 'create session' is not allowed while the season is Archived"
    );

    let err: DomainError = DomainError::TooManyHelpers { count: 5 };
    assert_eq!(format!("{err}"), "A qualification allows at most 2 helpers, got 5");

    let err: DomainError = DomainError::InvoiceLocked {
        reference: String::from("DV-2026-4"),
    };
    assert_eq!(
        format!("{err}"),
        "Invoice DV-2026-4 is no longer a draft and cannot be modified"
    );

    let err: DomainError = DomainError::CostOverflow;
    assert_eq!(format!("{err}"), "Arithmetic overflow while computing costs");
}

#[test]
fn test_domain_error_is_std_error() {
    let err: Box<dyn std::error::Error> = Box::new(DomainError::InvalidSessionTimes);
    assert!(err.source().is_none());
}
