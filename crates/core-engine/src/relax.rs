//! Parity-interleaved relaxation update.

use core_grid::{CellRule, CellValue, Subgrid};
use core_mesh::{LinkClosed, NeighborLinks};
use std::sync::atomic::Ordering;

use crate::{RELAXATION_STEPS, exchange};

/// Rewrite every interior cell of checkerboard color `parity` with the
/// rule's next value, in place.
///
/// A cell of parity `p` reads only its Chebyshev-1 neighborhood, and every
/// orthogonal neighbor has parity `1 - p`, so within one pass the writes
/// never feed the reads and no double buffer is needed. Across the two
/// passes of a step the second color does observe the first color's fresh
/// values; the halo exchange schedule gives remote neighbors exactly the
/// same visibility, keeping results independent of how the problem is
/// partitioned.
pub fn update_parity<V: CellValue>(sub: &mut Subgrid<V>, rule: &dyn CellRule<V>, parity: usize) {
    debug_assert!(parity < 2, "parity is a checkerboard color");
    let m = sub.dim();
    for i in 1..=m {
        let first = if (i + 1) % 2 == parity { 1 } else { 2 };
        for j in (first..=m).step_by(2) {
            let next = rule.next(sub, i, j);
            sub.set(i, j, next);
        }
    }
}

/// One full relaxation step: refresh the halo color the first update reads,
/// update parity 0, refresh the other color, update parity 1.
pub fn relaxation_step<V: CellValue>(
    sub: &mut Subgrid<V>,
    links: &NeighborLinks<V>,
    rule: &dyn CellRule<V>,
) -> Result<(), LinkClosed> {
    exchange(sub, links, 1)?;
    update_parity(sub, rule, 0);
    exchange(sub, links, 0)?;
    update_parity(sub, rule, 1);
    RELAXATION_STEPS.fetch_add(1, Ordering::Relaxed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_grid::parity_of;

    #[test]
    fn update_touches_only_one_color() {
        let mut sub = Subgrid::filled(4, 0i32);
        let stamp = |_: &Subgrid<i32>, _: usize, _: usize| 9;
        update_parity(&mut sub, &stamp, 0);
        for i in 0..sub.side() {
            for j in 0..sub.side() {
                let interior = (1..=4).contains(&i) && (1..=4).contains(&j);
                let expected = if interior && parity_of(i, j) == 0 { 9 } else { 0 };
                assert_eq!(sub.get(i, j), expected, "cell ({i}, {j})");
            }
        }
    }

    #[test]
    fn identity_rule_conserves_the_grid() {
        let mut sub = Subgrid::from_seed(4, |i, j| (i * 10 + j) as i64);
        let before = sub.clone();
        let identity = |g: &Subgrid<i64>, i: usize, j: usize| g.get(i, j);
        relaxation_step(&mut sub, &NeighborLinks::default(), &identity).unwrap();
        assert_eq!(sub, before);
    }

    #[test]
    fn second_color_reads_first_color_updates() {
        // Single worker, m = 2, north boundary 1, everything else 0, rule =
        // mean of the four orthogonal neighbors. The parity-1 pass runs
        // after the parity-0 pass wrote (1,1) = 0.25 and reads it.
        let mut sub = Subgrid::from_seed(2, |i, _| if i == 0 { 1.0 } else { 0.0 });
        let mean = |g: &Subgrid<f64>, i: usize, j: usize| {
            0.25 * (g.get(i - 1, j) + g.get(i + 1, j) + g.get(i, j - 1) + g.get(i, j + 1))
        };
        relaxation_step(&mut sub, &NeighborLinks::default(), &mean).unwrap();
        assert_eq!(sub.get(1, 1), 0.25);
        assert_eq!(sub.get(1, 2), 0.3125);
        assert_eq!(sub.get(2, 1), 0.0625);
        assert_eq!(sub.get(2, 2), 0.0);
    }
}
