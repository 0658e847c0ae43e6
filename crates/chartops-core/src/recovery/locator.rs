//! Stage 2: object location
//!
//! Narrows candidate text to the first plausible object. The brace slice is
//! positional, not depth-aware: with several sibling objects it spans from the
//! first `{` to the last `}` and the parse that follows fails.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// An object holding at most one nested object
    static ref SHALLOW_OBJECT: Regex =
        Regex::new(r"\{[^{}]*(?:\{[^{}]*\}[^{}]*)?\}").unwrap();
}

/// Return the part of `candidate` most likely to be the command object
pub fn locate_object(candidate: &str) -> &str {
    if let Some(found) = SHALLOW_OBJECT.find(candidate) {
        return found.as_str();
    }

    slice_braces(candidate)
}

/// First `{` through last `}`, or the input unchanged when there is no such span
fn slice_braces(candidate: &str) -> &str {
    match (candidate.find('{'), candidate.rfind('}')) {
        (Some(first), Some(last)) if last > first => &candidate[first..=last],
        _ => candidate,
    }
}
