use log::{debug, info};

use crate::apportion::apportion;
use crate::config::*;

/// Distributes a sample across the electoral zones of a municipality.
///
/// Zones get their quota by largest remainder over their electorate. Each
/// zone quota is then split by gender in proportion to the zone electorate,
/// rounding the female quota (half to even) and giving the rest to the male
/// quota. A zone without electors receives nothing.
pub fn allocate_zone_quotas(zones: &[Zone], sample: u64) -> Result<ZoneQuotaTable, SamplingErrors> {
    check_zones(zones)?;
    let electors: u64 = zones.iter().map(|z| z.electors_total).sum();
    if electors == 0 && sample > 0 {
        return Err(SamplingErrors::InvalidPopulation(
            "the zones have no electors to distribute the sample on".to_string(),
        ));
    }

    let weights: Vec<f64> = zones.iter().map(|z| z.electors_total as f64).collect();
    let zone_totals = apportion(sample, &weights);

    let mut quotas: Vec<ZoneQuota> = Vec::with_capacity(zones.len());
    for (zone, quota_total) in zones.iter().zip(zone_totals) {
        let (quota_female, quota_male) = split_by_gender(zone, quota_total);
        debug!(
            "allocate_zone_quotas: zone {}: electors={} quota={} female={} male={}",
            zone.zone_id, zone.electors_total, quota_total, quota_female, quota_male
        );
        quotas.push(ZoneQuota {
            zone_id: zone.zone_id.clone(),
            quota_total,
            quota_female,
            quota_male,
        });
    }
    info!("Allocated {} interviews over {} zones", sample, zones.len());
    ZoneQuotaTable::new(quotas, sample)
}

fn check_zones(zones: &[Zone]) -> Result<(), SamplingErrors> {
    if zones.is_empty() {
        return Err(SamplingErrors::InvalidPopulation(
            "the municipality has no electoral zone".to_string(),
        ));
    }
    for z in zones.iter() {
        if z.electors_female > z.electors_total {
            return Err(SamplingErrors::InvalidPopulation(format!(
                "zone {} has {} female electors out of {}",
                z.zone_id, z.electors_female, z.electors_total
            )));
        }
    }
    Ok(())
}

fn split_by_gender(zone: &Zone, quota: u64) -> (u64, u64) {
    if zone.electors_total == 0 {
        return (0, quota);
    }
    let female = (quota as f64 * zone.electors_female as f64 / zone.electors_total as f64).round_ties_even() as u64;
    (female, quota - female)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn zone(id: &str, total: u64, female: u64) -> Zone {
        Zone {
            zone_id: id.to_string(),
            electors_total: total,
            electors_female: female,
            electors_male: total - female,
            sections: 1,
        }
    }

    #[test]
    fn three_zones() {
        let zones = vec![
            zone("1", 50_000, 26_000),
            zone("2", 30_000, 15_000),
            zone("3", 20_000, 9_000),
        ];
        let res = allocate_zone_quotas(&zones, 7).unwrap();
        let totals: Vec<u64> = res.quotas().iter().map(|q| q.quota_total).collect();
        assert_eq!(totals, vec![4, 2, 1]);
        // 4 * 0.52 = 2.08, 2 * 0.5 = 1, 1 * 0.45 = 0.45
        let female: Vec<u64> = res.quotas().iter().map(|q| q.quota_female).collect();
        assert_eq!(female, vec![2, 1, 0]);
        assert_eq!(res.total_female() + res.total_male(), 7);
        assert_eq!(res.sample(), 7);
    }

    #[test]
    fn gender_split_rounds_half_to_even() {
        let zones = vec![zone("10", 1_000, 500), zone("11", 1_000, 500)];
        let res = allocate_zone_quotas(&zones, 10).unwrap();
        // 5 * 0.5 = 2.5 rounds to 2.
        assert_eq!(res.quotas()[0].quota_female, 2);
        assert_eq!(res.quotas()[0].quota_male, 3);
    }

    #[test]
    fn empty_zone_gets_no_quota() {
        let zones = vec![zone("1", 1_000, 520), zone("2", 0, 0), zone("3", 3_000, 1_400)];
        let res = allocate_zone_quotas(&zones, 400).unwrap();
        let q = &res.quotas()[1];
        assert_eq!((q.quota_total, q.quota_female, q.quota_male), (0, 0, 0));
        assert_eq!(res.quotas()[0].quota_total, 100);
        assert_eq!(res.quotas()[2].quota_total, 300);
    }

    #[test]
    fn rejects_degenerate_zones() {
        assert!(matches!(
            allocate_zone_quotas(&[], 400),
            Err(SamplingErrors::InvalidPopulation(_))
        ));
        assert!(allocate_zone_quotas(&[zone("1", 0, 0)], 400).is_err());
        let bad = Zone {
            zone_id: "9".to_string(),
            electors_total: 10,
            electors_female: 11,
            electors_male: 0,
            sections: 1,
        };
        assert!(allocate_zone_quotas(&[bad], 400).is_err());
    }

    #[test]
    fn zero_sample() {
        let res = allocate_zone_quotas(&[zone("1", 0, 0)], 0).unwrap();
        assert_eq!(res.quotas()[0].quota_total, 0);
    }

    proptest! {
        #[test]
        fn quotas_are_consistent(
            sample in 0u64..5_000,
            zones in prop::collection::vec((1u64..200_000, 0u32..=100), 1..60)
        ) {
            let zones: Vec<Zone> = zones
                .iter()
                .enumerate()
                .map(|(idx, (total, pct))| zone(&idx.to_string(), *total, total * (*pct as u64) / 100))
                .collect();
            let res = allocate_zone_quotas(&zones, sample).unwrap();
            prop_assert_eq!(res.quotas().len(), zones.len());
            prop_assert_eq!(res.quotas().iter().map(|q| q.quota_total).sum::<u64>(), sample);
            for q in res.quotas() {
                prop_assert_eq!(q.quota_female + q.quota_male, q.quota_total);
            }
        }
    }
}
