// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::model::{CountySummary, normalize_fips};
use std::collections::HashMap;

/// Upper bound on search suggestions shown in the popover.
pub const MAX_SUGGESTIONS: usize = 3;

/// The fetched county list plus its derived lookup views.
///
/// Built once per list load and read-only afterwards. The original fetch
/// order is preserved in `counties`; the fips mapping carries no order.
#[derive(Debug, Clone, PartialEq)]
pub struct CountyIndex {
    counties: Vec<CountySummary>,
    by_fips: HashMap<String, usize>,
    max_loss: f64,
}

impl Default for CountyIndex {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl CountyIndex {
    pub fn new(counties: Vec<CountySummary>) -> Self {
        let by_fips = counties
            .iter()
            .enumerate()
            .map(|(index, county)| (normalize_fips(&county.fips), index))
            .collect();
        // Floor at 1 so shading never divides by zero.
        let max_loss = counties
            .iter()
            .map(|county| county.el_total_sum)
            .fold(1.0_f64, f64::max);
        Self {
            counties,
            by_fips,
            max_loss,
        }
    }

    pub fn len(&self) -> usize {
        self.counties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counties.is_empty()
    }

    pub fn max_loss(&self) -> f64 {
        self.max_loss
    }

    pub fn get(&self, fips: &str) -> Option<&CountySummary> {
        self.by_fips
            .get(&normalize_fips(fips))
            .map(|index| &self.counties[*index])
    }

    /// Counties sorted descending by aggregate loss.
    ///
    /// The sort must be stable so that equal-loss counties keep their fetch
    /// order across repeated computation; `sort_by` guarantees that.
    pub fn ranked(&self) -> Vec<&CountySummary> {
        let mut out: Vec<&CountySummary> = self.counties.iter().collect();
        out.sort_by(|a, b| b.el_total_sum.total_cmp(&a.el_total_sum));
        out
    }

    /// Case-insensitive substring matches on county name, highest loss
    /// first, capped at [`MAX_SUGGESTIONS`]. A blank query suggests nothing.
    pub fn suggestions(&self, query: &str) -> Vec<&CountySummary> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let mut matches: Vec<&CountySummary> = self
            .counties
            .iter()
            .filter(|county| county.name.to_lowercase().contains(&needle))
            .collect();
        matches.sort_by(|a, b| b.el_total_sum.total_cmp(&a.el_total_sum));
        matches.truncate(MAX_SUGGESTIONS);
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::{CountyIndex, MAX_SUGGESTIONS};
    use crate::model::CountySummary;

    fn county(fips: &str, name: &str, el_total_sum: f64) -> CountySummary {
        CountySummary {
            fips: fips.to_owned(),
            name: name.to_owned(),
            state: "TX".to_owned(),
            p50: 0.0,
            p90: 0.0,
            el_total_sum,
        }
    }

    fn sample_index() -> CountyIndex {
        CountyIndex::new(vec![
            county("48201", "Harris", 900.0),
            county("48113", "Dallas", 400.0),
            county("48439", "Tarrant", 400.0),
            county("48029", "Bexar", 650.0),
            county("48453", "Travis", 120.0),
        ])
    }

    #[test]
    fn lookup_normalizes_fips() {
        let index = CountyIndex::new(vec![county("1001", "Autauga", 5.0)]);
        assert_eq!(index.get("01001").map(|c| c.name.as_str()), Some("Autauga"));
        assert_eq!(index.get("1001").map(|c| c.name.as_str()), Some("Autauga"));
        assert!(index.get("99999").is_none());
    }

    #[test]
    fn max_loss_is_floored_at_one() {
        assert_eq!(CountyIndex::default().max_loss(), 1.0);
        let tiny = CountyIndex::new(vec![county("48001", "Anderson", 0.25)]);
        assert_eq!(tiny.max_loss(), 1.0);
        assert_eq!(sample_index().max_loss(), 900.0);
    }

    #[test]
    fn ranked_sorts_descending_by_loss() {
        let index = sample_index();
        let ranked = index.ranked();
        let names: Vec<&str> = ranked.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Harris", "Bexar", "Dallas", "Tarrant", "Travis"]);
    }

    #[test]
    fn ranked_is_a_stable_permutation() {
        let index = sample_index();
        // Dallas and Tarrant tie; Dallas was fetched first and must stay
        // first on every computation.
        for _ in 0..3 {
            let ranked = index.ranked();
            let dallas = ranked.iter().position(|c| c.name == "Dallas");
            let tarrant = ranked.iter().position(|c| c.name == "Tarrant");
            assert!(dallas < tarrant);
            assert_eq!(ranked.len(), index.len());
        }
    }

    #[test]
    fn suggestions_for_blank_query_are_empty() {
        let index = sample_index();
        assert!(index.suggestions("").is_empty());
        assert!(index.suggestions("   ").is_empty());
    }

    #[test]
    fn suggestions_match_case_insensitively_and_cap_at_three() {
        let index = CountyIndex::new(vec![
            county("48007", "Aransas", 2.0),
            county("48009", "Archer", 8.0),
            county("48011", "Armstrong", 3.0),
            county("48065", "Carson", 5.0),
            county("48439", "Tarrant", 9.0),
        ]);
        let matches = index.suggestions("AR");
        assert_eq!(matches.len(), MAX_SUGGESTIONS);
        let names: Vec<&str> = matches.iter().map(|c| c.name.as_str()).collect();
        // Highest loss first among the five case-insensitive "ar" matches.
        assert_eq!(names, vec!["Tarrant", "Archer", "Carson"]);
        for name in names {
            assert!(name.to_lowercase().contains("ar"));
        }
    }

    #[test]
    fn suggestions_match_substrings_anywhere_in_the_name() {
        let index = sample_index();
        let matches = index.suggestions("rri");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "Harris");
    }
}
