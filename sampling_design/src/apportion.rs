//! Largest remainder (Hamilton) apportionment.
//!
//! This is the single allocation primitive behind every quota table: zones,
//! gender, education and age groups all go through [`apportion`].

use log::debug;

/// Distributes `total` units across categories in proportion to `weights`.
///
/// Every category first gets the floor of its ideal share
/// `total * weight / sum(weights)`. The units left over go one by one to the
/// categories with the largest fractional remainders. Ties go to the earliest
/// category, so the result only depends on the inputs.
///
/// The result has the length of `weights` and always sums to `total`, except
/// when no category has a positive weight: then everything is zero. Negative
/// and non-finite weights count as zero.
///
/// ```
/// use sampling_design::apportion;
/// assert_eq!(apportion(7, &[50.0, 30.0, 20.0]), vec![4, 2, 1]);
/// assert_eq!(apportion(7, &[0.0, 0.0]), vec![0, 0]);
/// ```
pub fn apportion(total: u64, weights: &[f64]) -> Vec<u64> {
    let clean: Vec<f64> = weights
        .iter()
        .map(|w| if w.is_finite() && *w > 0.0 { *w } else { 0.0 })
        .collect();
    let weight_sum: f64 = clean.iter().sum();
    if total == 0 || !(weight_sum > 0.0) || !weight_sum.is_finite() {
        return vec![0; weights.len()];
    }

    let ideal: Vec<f64> = clean
        .iter()
        .map(|w| (w / weight_sum) * total as f64)
        .collect();
    let mut quotas: Vec<u64> = ideal.iter().map(|q| q.floor() as u64).collect();
    let remainders: Vec<f64> = ideal
        .iter()
        .zip(quotas.iter())
        .map(|(q, f)| q - *f as f64)
        .collect();

    let assigned: u64 = quotas.iter().sum();
    if assigned < total {
        distribute_leftovers(total - assigned, &mut quotas, &remainders, &clean);
    } else if assigned > total {
        // Only reachable through floating point drift on the ideal shares.
        trim_over_allocation(assigned - total, &mut quotas, &remainders);
    }
    debug!(
        "apportion: total={} weights={:?} -> {:?}",
        total, weights, quotas
    );
    debug_assert_eq!(quotas.iter().sum::<u64>(), total);
    quotas
}

/// Hands out `extra` units by decreasing remainder. Categories without weight
/// never receive anything.
fn distribute_leftovers(extra: u64, quotas: &mut [u64], remainders: &[f64], weights: &[f64]) {
    let mut ranking: Vec<usize> = (0..quotas.len()).filter(|idx| weights[*idx] > 0.0).collect();
    // Stable sort: equal remainders keep their index order.
    ranking.sort_by(|a, b| remainders[*b].total_cmp(&remainders[*a]));
    if ranking.is_empty() {
        return;
    }
    for step in 0..extra {
        // Cycles only if the drift left more units than categories.
        let idx = ranking[(step as usize) % ranking.len()];
        quotas[idx] += 1;
    }
}

/// Takes back `excess` units, starting from the smallest remainders.
fn trim_over_allocation(excess: u64, quotas: &mut [u64], remainders: &[f64]) {
    let mut ranking: Vec<usize> = (0..quotas.len()).collect();
    ranking.sort_by(|a, b| remainders[*a].total_cmp(&remainders[*b]));
    let mut left = excess;
    while left > 0 {
        let mut progressed = false;
        for idx in ranking.iter() {
            if left == 0 {
                break;
            }
            if quotas[*idx] > 0 {
                quotas[*idx] -= 1;
                left -= 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn worked_example() {
        assert_eq!(apportion(7, &[50.0, 30.0, 20.0]), vec![4, 2, 1]);
    }

    #[test]
    fn exact_shares_need_no_remainder() {
        assert_eq!(apportion(10, &[50.0, 30.0, 20.0]), vec![5, 3, 2]);
        assert_eq!(apportion(500, &[1.0, 1.0, 2.0]), vec![125, 125, 250]);
    }

    #[test]
    fn ties_go_to_the_earliest_category() {
        assert_eq!(apportion(1, &[1.0, 1.0, 1.0]), vec![1, 0, 0]);
        assert_eq!(apportion(2, &[1.0, 1.0, 1.0]), vec![1, 1, 0]);
        assert_eq!(apportion(5, &[1.0, 2.0, 1.0, 2.0]), vec![1, 2, 1, 1]);
    }

    #[test]
    fn zero_weights() {
        assert_eq!(apportion(10, &[0.0, 0.0, 0.0]), vec![0, 0, 0]);
        assert_eq!(apportion(0, &[1.0, 2.0]), vec![0, 0]);
        assert_eq!(apportion(10, &[]), Vec::<u64>::new());
    }

    #[test]
    fn zero_weight_category_gets_nothing() {
        assert_eq!(apportion(3, &[1.0, 0.0, 1.0]), vec![2, 0, 1]);
        assert_eq!(apportion(11, &[0.0, 5.0, 5.0]), vec![0, 6, 5]);
    }

    #[test]
    fn invalid_weights_count_as_zero() {
        assert_eq!(apportion(4, &[-3.0, 1.0, f64::NAN, 1.0]), vec![0, 2, 0, 2]);
        assert_eq!(apportion(4, &[f64::INFINITY, 1.0]), vec![0, 4]);
    }

    #[test]
    fn percentages_that_do_not_sum_to_100() {
        // Rounded percentages rarely sum exactly to 100.
        let res = apportion(630, &[33.333333, 33.333333, 33.333333]);
        assert_eq!(res, vec![210, 210, 210]);
        let res = apportion(401, &[51.37, 48.63]);
        assert_eq!(res.iter().sum::<u64>(), 401);
    }

    proptest! {
        #[test]
        fn sum_is_exact(total in 0u64..100_000, weights in prop::collection::vec(0.0f64..1e7, 1..40)) {
            let res = apportion(total, &weights);
            prop_assert_eq!(res.len(), weights.len());
            if weights.iter().any(|w| *w > 0.0) {
                prop_assert_eq!(res.iter().sum::<u64>(), total);
            } else {
                prop_assert!(res.iter().all(|x| *x == 0));
            }
        }

        #[test]
        fn shares_stay_within_one_unit(total in 1u64..50_000, weights in prop::collection::vec(1u32..1_000_000, 1..30)) {
            let ws: Vec<f64> = weights.iter().map(|w| *w as f64).collect();
            let sum: f64 = ws.iter().sum();
            let res = apportion(total, &ws);
            for (q, w) in res.iter().zip(ws.iter()) {
                let ideal = (w / sum) * total as f64;
                prop_assert!((*q as f64 - ideal).abs() < 1.0 + 1e-9, "quota {} for ideal share {}", q, ideal);
            }
        }

        #[test]
        fn deterministic(total in 0u64..10_000, weights in prop::collection::vec(0u32..100, 0..20)) {
            let ws: Vec<f64> = weights.iter().map(|w| *w as f64).collect();
            prop_assert_eq!(apportion(total, &ws), apportion(total, &ws));
        }
    }
}
