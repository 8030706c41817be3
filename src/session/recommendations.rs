/// Startup recommendations
///
/// A random handful of pattern entries, shown so new users can see what
/// kinds of requests work offline.

use crate::patterns::{PatternEntry, PatternTable};

pub const DEFAULT_RECOMMENDATIONS: usize = 8;

/// Pick up to `count` distinct entries from the table
///
/// # Arguments
/// * `table` - Table to sample from
/// * `count` - How many entries to return (fewer if the table is smaller)
/// * `rng` - Random source; seed it for repeatable picks
pub fn sample(table: &PatternTable, count: usize, rng: &mut fastrand::Rng) -> Vec<PatternEntry> {
    let mut indices: Vec<usize> = (0..table.len()).collect();
    rng.shuffle(&mut indices);

    indices
        .into_iter()
        .take(count)
        .map(|i| table.entries()[i].clone())
        .collect()
}
