//! Range-boundary policies for BETWEEN / NOT BETWEEN.
//!
//! Null handling is table-driven and intentionally asymmetric:
//!
//! BETWEEN (value v, bounds s, e)
//! - v null                        → false, every policy
//! - s null, mixed START_INCL_END_EXCL → lower side unbounded
//! - e null, mixed START_EXCL_END_INCL → upper side unbounded
//! - any other null bound          → false
//!
//! NOT BETWEEN (value v, bounds s, e)
//! - v null: INCL/INCL → s null || e null
//!           INCL/EXCL → s null && e not null
//!           EXCL/INCL → s not null && e null
//!           EXCL/EXCL → false
//! - v not null, any bound null    → false
//!
//! With a non-null value and non-null, comparable bounds the two are exact
//! complements. Incomparable (mixed-variant) operands fail both.

use crate::value::{Value, strict_order_cmp};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};

///
/// Inclusion
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Inclusion {
    StartExclusiveEndExclusive,
    StartExclusiveEndInclusive,
    #[default]
    StartInclusiveEndExclusive,
    StartInclusiveEndInclusive,
}

impl Inclusion {
    pub const ALL: [Self; 4] = [
        Self::StartExclusiveEndExclusive,
        Self::StartExclusiveEndInclusive,
        Self::StartInclusiveEndExclusive,
        Self::StartInclusiveEndInclusive,
    ];

    #[must_use]
    pub const fn is_start_inclusive(self) -> bool {
        matches!(
            self,
            Self::StartInclusiveEndExclusive | Self::StartInclusiveEndInclusive
        )
    }

    #[must_use]
    pub const fn is_end_inclusive(self) -> bool {
        matches!(
            self,
            Self::StartExclusiveEndInclusive | Self::StartInclusiveEndInclusive
        )
    }

    /// BETWEEN semantics; see the module table for null handling.
    #[must_use]
    pub fn in_range(self, value: &Value, start: &Value, end: &Value) -> bool {
        if value.is_null() {
            return false;
        }

        let lower_ok = if start.is_null() {
            matches!(self, Self::StartInclusiveEndExclusive)
        } else {
            self.start_accepts(value, start).unwrap_or(false)
        };
        let upper_ok = if end.is_null() {
            matches!(self, Self::StartExclusiveEndInclusive)
        } else {
            self.end_accepts(value, end).unwrap_or(false)
        };

        lower_ok && upper_ok
    }

    /// NOT BETWEEN semantics; see the module table for null handling.
    #[must_use]
    pub fn not_in_range(self, value: &Value, start: &Value, end: &Value) -> bool {
        if value.is_null() {
            return match self {
                Self::StartInclusiveEndInclusive => start.is_null() || end.is_null(),
                Self::StartInclusiveEndExclusive => start.is_null() && !end.is_null(),
                Self::StartExclusiveEndInclusive => !start.is_null() && end.is_null(),
                Self::StartExclusiveEndExclusive => false,
            };
        }
        if start.is_null() || end.is_null() {
            return false;
        }

        match (self.start_accepts(value, start), self.end_accepts(value, end)) {
            (Some(lower), Some(upper)) => !(lower && upper),
            _ => false,
        }
    }

    fn start_accepts(self, value: &Value, start: &Value) -> Option<bool> {
        let ord = strict_order_cmp(start, value)?;

        Some(if self.is_start_inclusive() {
            ord != Ordering::Greater
        } else {
            ord == Ordering::Less
        })
    }

    fn end_accepts(self, value: &Value, end: &Value) -> Option<bool> {
        let ord = strict_order_cmp(end, value)?;

        Some(if self.is_end_inclusive() {
            ord != Ordering::Less
        } else {
            ord == Ordering::Greater
        })
    }
}

impl fmt::Display for Inclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (open, close) = match self {
            Self::StartExclusiveEndExclusive => ("(", ")"),
            Self::StartExclusiveEndInclusive => ("(", "]"),
            Self::StartInclusiveEndExclusive => ("[", ")"),
            Self::StartInclusiveEndInclusive => ("[", "]"),
        };
        write!(f, "{open}{close}")
    }
}
