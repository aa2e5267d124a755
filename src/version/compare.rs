//! Numeric-aware version comparison
//!
//! Versions are reduced to their runs of ASCII digits (`"v1.10.0-rc.2"` ->
//! `[1, 10, 0, 2]`) and compared component by component, so `"1.0.9"` sorts
//! before `"1.0.10"`. Missing trailing components count as zero.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("digit pattern is valid"));

/// Compare two version strings.
///
/// Total over all inputs: a string without digits behaves like `"0"`.
///
/// Examples:
/// - "1.0.9" vs "1.0.10" -> Less
/// - "1.2" vs "1.2.0" -> Equal
/// - "2.0.0" vs "1.9.9" -> Greater
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a = numeric_components(a);
    let b = numeric_components(b);
    let len = a.len().max(b.len());

    (0..len)
        .map(|i| {
            let left = a.get(i).copied().unwrap_or("0");
            let right = b.get(i).copied().unwrap_or("0");
            compare_numeric(left, right)
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Returns true if `candidate` is strictly newer than `current`.
pub fn is_newer(current: &str, candidate: &str) -> bool {
    compare_versions(current, candidate) == Ordering::Less
}

fn numeric_components(version: &str) -> Vec<&str> {
    DIGITS.find_iter(version).map(|m| m.as_str()).collect()
}

/// Compares two digit strings by value without parsing, so arbitrarily
/// long components cannot overflow.
fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
