use crate::domain::record::RecommendationRecord;
use crate::pipeline::filter::FilteredView;
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub const TOP_N: usize = 3;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RankingResult {
    /// Best record per broker, keyed by broker name.
    pub broker_top_picks: BTreeMap<String, RecommendationRecord>,
    pub top_companies: Vec<RecommendationRecord>,
    pub top_brokers: Vec<RecommendationRecord>,
}

pub fn rank(view: &FilteredView) -> RankingResult {
    let broker_top_picks = broker_top_picks(&view.records);
    let top_companies = top_companies(&view.records, TOP_N);
    let top_brokers = top_brokers(&broker_top_picks, TOP_N);

    RankingResult {
        broker_top_picks,
        top_companies,
        top_brokers,
    }
}

/// Keeps the first record seen at each broker's maximum profit potential.
pub fn broker_top_picks(
    records: &[RecommendationRecord],
) -> BTreeMap<String, RecommendationRecord> {
    let mut best: BTreeMap<String, &RecommendationRecord> = BTreeMap::new();
    for record in records {
        match best.get(&record.broker) {
            Some(current) if record.profit_potential <= current.profit_potential => {}
            _ => {
                best.insert(record.broker.clone(), record);
            }
        }
    }
    best.into_iter()
        .map(|(broker, record)| (broker, record.clone()))
        .collect()
}

/// Ranks every record, not only the per-broker picks. Company names may repeat.
pub fn top_companies(records: &[RecommendationRecord], n: usize) -> Vec<RecommendationRecord> {
    let mut sorted: Vec<&RecommendationRecord> = records.iter().collect();
    // Stable sort keeps source order among equal profits.
    sorted.sort_by(|a, b| by_profit_desc(a, b));
    sorted.into_iter().take(n).cloned().collect()
}

pub fn top_brokers(
    picks: &BTreeMap<String, RecommendationRecord>,
    n: usize,
) -> Vec<RecommendationRecord> {
    let mut sorted: Vec<&RecommendationRecord> = picks.values().collect();
    sorted.sort_by(|a, b| by_profit_desc(a, b).then_with(|| a.broker.cmp(&b.broker)));
    sorted.into_iter().take(n).cloned().collect()
}

fn by_profit_desc(a: &RecommendationRecord, b: &RecommendationRecord) -> Ordering {
    b.profit_potential
        .partial_cmp(&a.profit_potential)
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::Recommendation;
    use crate::pipeline::filter::{filter, FilterOptions};
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rec(broker: &str, company: &str, date: NaiveDate, profit: f64) -> RecommendationRecord {
        RecommendationRecord {
            broker: broker.to_string(),
            company: company.to_string(),
            reporting_date: date,
            recommendation: Recommendation::Buy,
            profit_potential: profit,
        }
    }

    fn companies(records: &[RecommendationRecord]) -> Vec<&str> {
        records.iter().map(|r| r.company.as_str()).collect()
    }

    fn brokers(records: &[RecommendationRecord]) -> Vec<&str> {
        records.iter().map(|r| r.broker.as_str()).collect()
    }

    #[test]
    fn worked_scenario() {
        let mut z = rec("BrokerB", "CoZ", d(2024, 1, 3), 5.0);
        z.recommendation = Recommendation::Sell;
        let records = vec![
            rec("BrokerA", "CoX", d(2024, 1, 1), 10.0),
            rec("BrokerA", "CoY", d(2024, 1, 2), 25.0),
            z,
        ];

        let view = filter(&records, &FilterOptions::default(), d(2024, 2, 1));
        assert_eq!(view.records.len(), 3);

        let result = rank(&view);
        assert_eq!(result.broker_top_picks.len(), 2);
        assert_eq!(result.broker_top_picks["BrokerA"].company, "CoY");
        assert_eq!(result.broker_top_picks["BrokerB"].company, "CoZ");

        assert_eq!(companies(&result.top_companies), vec!["CoY", "CoX", "CoZ"]);
        assert_eq!(brokers(&result.top_brokers), vec!["BrokerA", "BrokerB"]);
        assert_eq!(result.top_brokers[0].profit_potential, 25.0);
        assert_eq!(result.top_brokers[1].profit_potential, 5.0);
    }

    #[test]
    fn top_pick_ties_keep_first_occurrence() {
        let records = vec![
            rec("A", "First", d(2024, 1, 1), 8.0),
            rec("A", "Second", d(2024, 1, 2), 8.0),
            rec("A", "Lower", d(2024, 1, 3), 2.0),
        ];
        let picks = broker_top_picks(&records);
        assert_eq!(picks.len(), 1);
        assert_eq!(picks["A"].company, "First");
    }

    #[test]
    fn top_pick_dominates_its_broker() {
        let records = vec![
            rec("A", "a1", d(2024, 1, 1), -3.0),
            rec("B", "b1", d(2024, 1, 1), 4.0),
            rec("A", "a2", d(2024, 1, 2), 7.5),
            rec("C", "c1", d(2024, 1, 2), -1.0),
            rec("B", "b2", d(2024, 1, 3), 4.5),
            rec("A", "a3", d(2024, 1, 4), 7.0),
        ];
        let picks = broker_top_picks(&records);
        assert_eq!(picks.len(), 3);
        for (broker, pick) in &picks {
            for r in records.iter().filter(|r| &r.broker == broker) {
                assert!(pick.profit_potential >= r.profit_potential);
            }
        }
    }

    #[test]
    fn top_companies_are_not_deduplicated_and_ties_are_stable() {
        let records = vec![
            rec("A", "TCS", d(2024, 1, 1), 12.0),
            rec("B", "Wipro", d(2024, 1, 1), 20.0),
            rec("C", "TCS", d(2024, 1, 2), 20.0),
            rec("D", "Infosys", d(2024, 1, 2), 1.0),
        ];
        let top = top_companies(&records, TOP_N);
        assert_eq!(companies(&top), vec!["Wipro", "TCS", "TCS"]);
        assert_eq!(brokers(&top), vec!["B", "C", "A"]);
    }

    #[test]
    fn top_brokers_break_ties_alphabetically() {
        let records = vec![
            rec("Kotak", "x", d(2024, 1, 1), 9.0),
            rec("Axis", "y", d(2024, 1, 1), 9.0),
            rec("HDFC", "z", d(2024, 1, 1), 9.0),
            rec("ICICI", "w", d(2024, 1, 1), 9.0),
        ];
        let result = top_brokers(&broker_top_picks(&records), TOP_N);
        assert_eq!(brokers(&result), vec!["Axis", "HDFC", "ICICI"]);

        let mut reversed = records.clone();
        reversed.reverse();
        assert_eq!(result, top_brokers(&broker_top_picks(&reversed), TOP_N));
    }

    #[test]
    fn outputs_are_capped_and_sorted() {
        let records: Vec<_> = (0..7)
            .map(|i| {
                let profit = ((i * 37) % 11) as f64 - 5.0;
                rec(&format!("B{}", i % 4), &format!("Co{i}"), d(2024, 1, 1), profit)
            })
            .collect();
        let view = filter(&records, &FilterOptions::default(), d(2024, 1, 15));
        let result = rank(&view);

        assert_eq!(result.top_companies.len(), 3.min(records.len()));
        assert_eq!(result.top_brokers.len(), 3.min(result.broker_top_picks.len()));
        for pair in result.top_companies.windows(2) {
            assert!(pair[0].profit_potential >= pair[1].profit_potential);
        }
        for pair in result.top_brokers.windows(2) {
            assert!(pair[0].profit_potential >= pair[1].profit_potential);
        }
    }

    #[test]
    fn short_inputs_are_not_padded() {
        let records = vec![rec("A", "Only", d(2024, 1, 1), 3.0)];
        let view = filter(&records, &FilterOptions::default(), d(2024, 1, 2));
        let result = rank(&view);
        assert_eq!(result.top_companies.len(), 1);
        assert_eq!(result.top_brokers.len(), 1);
    }

    #[test]
    fn empty_view_ranks_to_empty_result() {
        let view = filter(&[], &FilterOptions::default(), d(2024, 1, 2));
        assert_eq!(rank(&view), RankingResult::default());
    }
}
