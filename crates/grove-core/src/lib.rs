//! Pure decision engine: level tables, profile interpretation, claim
//! eligibility, and cycle arithmetic. No I/O and no ambient clock — callers
//! pass `now` explicitly so every decision is reproducible under test.

pub mod cycle;
pub mod eligibility;
pub mod levels;
pub mod profile;
