//! Minimum Steiner tree over the metric closure (Dreyfus–Wagner).
//!
//! Input: the cost oracle, the terminals and the non-terminals eligible as
//! Steiner points. Output: the tree cost, its super-edges (pairs of points
//! joined by some shortest path) and the Steiner points it uses.
//!
//! `f[mask][v]` is the cheapest tree spanning the terminals in `mask` plus
//! `v`; `g[mask][u]` is the same restricted to trees that branch at `u`.
//! Runs in `O(3^k * n + 2^k * n^2)` for `k` terminals and `n` points.

use std::collections::BTreeSet;

use crate::config::TERMINAL_HARD_CAP;
use crate::graph::{CostOracle, VertexId};

use super::progress::{CancelToken, Cancelled};

const INF: u64 = u64::MAX;

/// A minimum Steiner tree in the metric closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SteinerTree {
    pub cost: u32,
    /// Normalised `(min, max)` vertex pairs
    pub super_edges: BTreeSet<(VertexId, VertexId)>,
    /// Non-terminal vertices used by the tree
    pub steiner_points: BTreeSet<VertexId>,
}

/// Normalise an unordered vertex pair.
pub fn super_edge(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

enum Step {
    /// Reconstruct `f[mask][v]`
    Link { mask: usize, v: usize },
    /// Reconstruct `g[mask][u]`
    Branch { mask: usize, u: usize },
}

/// Compute a minimum Steiner tree connecting `terminals`, using only
/// `eligible` vertices as Steiner points.
///
/// Returns `Ok(None)` when the terminals cannot be connected or there are
/// more than [`TERMINAL_HARD_CAP`] of them.
pub fn steiner_tree<O>(
    oracle: &O,
    terminals: &[VertexId],
    eligible: &[VertexId],
    cancel: &CancelToken,
) -> Result<Option<SteinerTree>, Cancelled>
where
    O: CostOracle + ?Sized,
{
    let k = terminals.len();
    if k > TERMINAL_HARD_CAP {
        log::warn!(
            "{} terminals exceed the Steiner tree limit of {}",
            k,
            TERMINAL_HARD_CAP
        );
        return Ok(None);
    }
    if k == 0 {
        return Ok(None);
    }
    if k == 1 {
        return Ok(Some(SteinerTree {
            cost: 0,
            super_edges: BTreeSet::new(),
            steiner_points: BTreeSet::new(),
        }));
    }

    // Terminals first so that terminal i sits at point index i
    let terminal_set: BTreeSet<VertexId> = terminals.iter().copied().collect();
    let mut points: Vec<VertexId> = terminals.to_vec();
    points.extend(
        eligible
            .iter()
            .copied()
            .filter(|v| !terminal_set.contains(v))
            .collect::<BTreeSet<_>>(),
    );
    let m = points.len();

    let mut dist = vec![INF; m * m];
    for i in 0..m {
        for j in 0..m {
            dist[i * m + j] = if i == j {
                0
            } else {
                oracle.cost(points[i], points[j]).map_or(INF, u64::from)
            };
        }
    }
    let d = |i: usize, j: usize| dist[i * m + j];

    let Some(full) = 1usize.checked_shl(k as u32).map(|size| size - 1) else {
        return Ok(None);
    };
    let mut f = vec![INF; (full + 1) * m];
    let mut g = vec![INF; (full + 1) * m];
    let mut link = vec![0usize; (full + 1) * m];
    let mut split = vec![0usize; (full + 1) * m];

    for mask in 1..=full {
        cancel.check()?;
        let row = mask * m;

        if mask.is_power_of_two() {
            let t = mask.trailing_zeros() as usize;
            g[row + t] = 0;
        } else {
            // Submasks holding the lowest bit cover each split once
            let low = mask & mask.wrapping_neg();
            for u in 0..m {
                let mut best = INF;
                let mut best_split = 0;
                let mut sub = (mask - 1) & mask;
                while sub > 0 {
                    if sub & low != 0 {
                        let left = f[sub * m + u];
                        let right = f[(mask ^ sub) * m + u];
                        if left != INF && right != INF && left + right < best {
                            best = left + right;
                            best_split = sub;
                        }
                    }
                    sub = (sub - 1) & mask;
                }
                g[row + u] = best;
                split[row + u] = best_split;
            }
        }

        for v in 0..m {
            let mut best = g[row + v];
            let mut best_link = v;
            for u in 0..m {
                if u == v || g[row + u] == INF || d(u, v) == INF {
                    continue;
                }
                let cost = g[row + u] + d(u, v);
                if cost < best {
                    best = cost;
                    best_link = u;
                }
            }
            f[row + v] = best;
            link[row + v] = best_link;
        }
    }

    if f[full * m] == INF {
        return Ok(None);
    }

    let mut super_edges = BTreeSet::new();
    let mut stack = vec![Step::Link { mask: full, v: 0 }];
    while let Some(step) = stack.pop() {
        match step {
            Step::Link { mask, v } => {
                let u = link[mask * m + v];
                if u != v {
                    super_edges.insert(super_edge(points[u], points[v]));
                }
                stack.push(Step::Branch { mask, u });
            }
            Step::Branch { mask, u } => {
                if mask.is_power_of_two() {
                    continue;
                }
                let sub = split[mask * m + u];
                stack.push(Step::Link { mask: sub, v: u });
                stack.push(Step::Link {
                    mask: mask ^ sub,
                    v: u,
                });
            }
        }
    }

    let mut cost: u64 = 0;
    let mut steiner_points = BTreeSet::new();
    for &(a, b) in &super_edges {
        cost += oracle.cost(a, b).map_or(0, u64::from);
        for vertex in [a, b] {
            if !terminal_set.contains(&vertex) {
                steiner_points.insert(vertex);
            }
        }
    }

    Ok(Some(SteinerTree {
        cost: u32::try_from(cost).unwrap_or(u32::MAX),
        super_edges,
        steiner_points,
    }))
}
