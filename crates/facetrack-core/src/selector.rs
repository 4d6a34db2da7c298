//! Candidate selection: reduce a detector's per-frame output to the one
//! region worth tracking.
//!
//! The policy is largest footprint wins. Normalized area is a usable proxy
//! for subject distance with a single camera, so the biggest face is treated
//! as the closest and therefore the most prominent one.

use crate::error::CoreResult;
use crate::types::Candidate;

/// Picks the most prominent candidate from one frame's detections.
///
/// Selection maximizes `width * height`. Ties keep the first candidate in
/// input order, so the result is deterministic for equal-area regions.
/// An empty slice selects nothing.
///
/// # Errors
///
/// Returns a validation error if any candidate is structurally invalid
/// (non-finite fields, negative dimensions, score outside `[0, 1]`).
/// Malformed detector output is rejected rather than silently skipped.
pub fn select(candidates: &[Candidate]) -> CoreResult<Option<Candidate>> {
    let mut best: Option<&Candidate> = None;
    for candidate in candidates {
        candidate.validate()?;
        // Strictly-greater keeps the earliest candidate on equal areas.
        match best {
            Some(current) if candidate.area() <= current.area() => {}
            _ => best = Some(candidate),
        }
    }
    Ok(best.copied())
}
