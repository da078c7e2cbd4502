// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Detection of gaps in the travel log.
//!
//! Consecutive legs must agree on which side of the border the traveller
//! is: if one flight lands abroad the next one has to depart from abroad.
//! A mismatch means a flight is missing from the log, so the days between
//! the two legs cannot be attributed to either side.

use crate::flight::FlightLeg;
use crate::period::Period;
use std::fmt;
use tracing::warn;

#[cfg(feature = "serde")]
use serde::Serialize;

fn side(is_uk: bool) -> &'static str {
    if is_uk {
        "UK"
    } else {
        "NON-UK"
    }
}

/// A UK/non-UK mismatch between one leg's arrival and the next leg's departure.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ConsistencyError {
    /// Position in the sorted log of the leg whose origin disagrees.
    pub index: usize,
    /// The untrusted span between the two legs.
    pub gap: Period,
    /// Arrival code of the previous leg, if there was one.
    pub previous_place: Option<String>,
    pub previous_was_uk: bool,
    pub origin: String,
    pub origin_is_uk: bool,
}

impl fmt::Display for ConsistencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let previous = self
            .previous_place
            .as_deref()
            .unwrap_or_else(|| side(self.previous_was_uk));
        write!(
            f,
            "{}d {previous}@{} {} - {} {}@{}",
            self.gap.duration_days(),
            self.gap.start.short(),
            side(self.previous_was_uk),
            side(self.origin_is_uk),
            self.origin,
            self.gap.end.short(),
        )
    }
}

/// Collects consistency errors while the timeline is walked.
///
/// Checking never stops the walk; the caller diverts the gap to the error
/// bucket and carries on.
#[derive(Debug, Default)]
pub struct ConsistencyChecker {
    errors: Vec<ConsistencyError>,
}

impl ConsistencyChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compares the state left by the previous leg with `leg`'s origin.
    ///
    /// Returns `true` (and records the error) when they disagree.
    pub fn check(
        &mut self,
        index: usize,
        gap: Period,
        previous_place: Option<&str>,
        previous_was_uk: bool,
        leg: &FlightLeg,
    ) -> bool {
        if previous_was_uk == leg.origin_is_uk {
            return false;
        }
        let error = ConsistencyError {
            index,
            gap,
            previous_place: previous_place.map(str::to_string),
            previous_was_uk,
            origin: leg.origin.clone(),
            origin_is_uk: leg.origin_is_uk,
        };
        warn!(index, "inconsistent legs: {error}");
        self.errors.push(error);
        true
    }

    pub fn into_errors(self) -> Vec<ConsistencyError> {
        self.errors
    }
}
