//! Level clustering: map the distinct heading sizes onto H1..H4.

use std::collections::HashMap;

use crate::types::HeadingLevel;

use super::headings::Heading;
use super::stats::size_key;

/// Attach a level to every heading based on its clustered size.
///
/// Distinct rounded sizes are ranked descending; the largest becomes H1,
/// the 4th-largest and everything below it H4. An empty slice is left
/// unchanged.
pub fn assign_levels(headings: &mut [Heading]) {
    if headings.is_empty() {
        return;
    }

    let mut keys: Vec<i32> = headings.iter().map(|h| size_key(h.size)).collect();
    keys.sort_unstable_by(|a, b| b.cmp(a));
    keys.dedup();

    let rank_of: HashMap<i32, usize> = keys.into_iter().enumerate().map(|(i, k)| (k, i)).collect();

    for heading in headings.iter_mut() {
        let rank = rank_of[&size_key(heading.size)];
        heading.level = Some(HeadingLevel::from_rank(rank));
    }
}
