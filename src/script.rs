// Edit-script computation: typed runs over two byte sequences.
//
// SequenceMatcher-style diff: repeatedly find the longest matching block
// between the two inputs and recurse on the unmatched regions either side.
// The resulting runs partition both inputs monotonically, which is the only
// property the patch encoder relies on; run quality affects patch size, not
// correctness.

use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Runs
// ---------------------------------------------------------------------------

/// One edit-script run over half-open index ranges into the two inputs.
///
/// A full script partitions `0..original.len()` and `0..new.len()`: each
/// range starts where the previous range on that axis ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Run {
    /// `original[old_start..old_end] == new[new_start..new_end]`.
    Equal {
        old_start: usize,
        old_end: usize,
        new_start: usize,
        new_end: usize,
    },
    /// `original[old_start..old_end]` has no counterpart in the new input.
    Delete { old_start: usize, old_end: usize },
    /// `new[new_start..new_end]` has no counterpart in the original.
    Insert { new_start: usize, new_end: usize },
    /// `original[old_start..old_end]` is replaced by
    /// `new[new_start..new_end]`.
    Replace {
        old_start: usize,
        old_end: usize,
        new_start: usize,
        new_end: usize,
    },
}

// ---------------------------------------------------------------------------
// Matching blocks
// ---------------------------------------------------------------------------

/// A maximal matching block: `original[old..old + len] == new[new..new + len]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    old: usize,
    new: usize,
    len: usize,
}

/// Positions of each byte value in `new`, for O(1) candidate lookup.
fn index_positions(new: &[u8]) -> Vec<Vec<usize>> {
    let mut positions = vec![Vec::new(); 256];
    for (j, &b) in new.iter().enumerate() {
        positions[b as usize].push(j);
    }
    positions
}

/// Find the longest block matching between `original[old_lo..old_hi]` and
/// `new[new_lo..new_hi]`. Of equally long blocks, the earliest in the
/// original (then earliest in the new input) wins.
fn longest_match(
    original: &[u8],
    positions: &[Vec<usize>],
    old_lo: usize,
    old_hi: usize,
    new_lo: usize,
    new_hi: usize,
) -> Block {
    let mut best = Block {
        old: old_lo,
        new: new_lo,
        len: 0,
    };
    // run_lens[j] = length of the match ending at original[i], new[j].
    let mut run_lens: HashMap<usize, usize> = HashMap::new();
    for (i, &byte) in original
        .iter()
        .enumerate()
        .take(old_hi)
        .skip(old_lo)
    {
        let mut next_lens = HashMap::new();
        for &j in &positions[byte as usize] {
            if j < new_lo {
                continue;
            }
            if j >= new_hi {
                break;
            }
            let len = j
                .checked_sub(1)
                .and_then(|prev| run_lens.get(&prev))
                .copied()
                .unwrap_or(0)
                + 1;
            next_lens.insert(j, len);
            if len > best.len {
                best = Block {
                    old: i + 1 - len,
                    new: j + 1 - len,
                    len,
                };
            }
        }
        run_lens = next_lens;
    }
    best
}

/// All maximal matching blocks, in ascending order, with adjacent blocks
/// merged and a zero-length terminal block appended.
fn matching_blocks(original: &[u8], new: &[u8]) -> Vec<Block> {
    let positions = index_positions(new);
    let mut queue = vec![(0, original.len(), 0, new.len())];
    let mut found = Vec::new();

    while let Some((old_lo, old_hi, new_lo, new_hi)) = queue.pop() {
        let block = longest_match(original, &positions, old_lo, old_hi, new_lo, new_hi);
        if block.len > 0 {
            found.push(block);
            if old_lo < block.old && new_lo < block.new {
                queue.push((old_lo, block.old, new_lo, block.new));
            }
            if block.old + block.len < old_hi && block.new + block.len < new_hi {
                queue.push((block.old + block.len, old_hi, block.new + block.len, new_hi));
            }
        }
    }
    found.sort_unstable_by_key(|b| (b.old, b.new));

    // Merge blocks that ended up adjacent on both axes.
    let mut merged: Vec<Block> = Vec::with_capacity(found.len() + 1);
    for block in found {
        match merged.last_mut() {
            Some(last)
                if last.old + last.len == block.old && last.new + last.len == block.new =>
            {
                last.len += block.len;
            }
            _ => merged.push(block),
        }
    }
    merged.push(Block {
        old: original.len(),
        new: new.len(),
        len: 0,
    });
    merged
}

// ---------------------------------------------------------------------------
// Runs from blocks
// ---------------------------------------------------------------------------

fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix(a: &[u8], b: &[u8]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Compute the edit script between `original` and `new`.
///
/// The returned runs partition both inputs in order; zero-length runs are
/// never produced. The common prefix and suffix are split off before the
/// block search, which keeps the quadratic matching confined to the region
/// that actually changed.
pub fn diff_runs(original: &[u8], new: &[u8]) -> Vec<Run> {
    let prefix = common_prefix(original, new);
    if prefix == original.len() && prefix == new.len() {
        return if prefix == 0 {
            Vec::new()
        } else {
            vec![Run::Equal {
                old_start: 0,
                old_end: prefix,
                new_start: 0,
                new_end: prefix,
            }]
        };
    }
    let suffix = common_suffix(&original[prefix..], &new[prefix..]);
    let old_mid_end = original.len() - suffix;
    let new_mid_end = new.len() - suffix;

    let mut runs = Vec::new();
    if prefix > 0 {
        runs.push(Run::Equal {
            old_start: 0,
            old_end: prefix,
            new_start: 0,
            new_end: prefix,
        });
    }
    let mut old_pos = prefix;
    let mut new_pos = prefix;

    for block in matching_blocks(&original[prefix..old_mid_end], &new[prefix..new_mid_end]) {
        let block = Block {
            old: block.old + prefix,
            new: block.new + prefix,
            len: block.len,
        };
        if old_pos < block.old && new_pos < block.new {
            runs.push(Run::Replace {
                old_start: old_pos,
                old_end: block.old,
                new_start: new_pos,
                new_end: block.new,
            });
        } else if old_pos < block.old {
            runs.push(Run::Delete {
                old_start: old_pos,
                old_end: block.old,
            });
        } else if new_pos < block.new {
            runs.push(Run::Insert {
                new_start: new_pos,
                new_end: block.new,
            });
        }
        if block.len > 0 {
            runs.push(Run::Equal {
                old_start: block.old,
                old_end: block.old + block.len,
                new_start: block.new,
                new_end: block.new + block.len,
            });
        }
        old_pos = block.old + block.len;
        new_pos = block.new + block.len;
    }
    if suffix > 0 {
        runs.push(Run::Equal {
            old_start: old_mid_end,
            old_end: original.len(),
            new_start: new_mid_end,
            new_end: new.len(),
        });
    }
    runs
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
