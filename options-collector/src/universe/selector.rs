//! Options universe selection.
//!
//! Narrows the venue's full chain to the contracts worth sampling each
//! cycle:
//! - Strikes strictly inside a band around the reference price
//!   (default: open interval (70%, 130%))
//! - The nearest and the farthest expirations (default: two of each)
//! - Both rights for every strike/expiration pair

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::data::{ContractSpec, OptionRight};

/// Selection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseSelector {
    /// Half-width of the strike band, percent of the reference price.
    pub strike_band_pct: u32,
    /// Number of nearest-term expirations to keep.
    pub near_expirations: usize,
    /// Number of farthest-term expirations to keep.
    pub far_expirations: usize,
}

impl Default for UniverseSelector {
    fn default() -> Self {
        Self {
            strike_band_pct: 30,
            near_expirations: 2,
            far_expirations: 2,
        }
    }
}

/// Strikes and expirations selected for one cycle, both ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Universe {
    pub reference_price: Decimal,
    pub strikes: Vec<Decimal>,
    pub expirations: Vec<NaiveDate>,
}

impl Universe {
    pub fn is_empty(&self) -> bool {
        self.strikes.is_empty() || self.expirations.is_empty()
    }

    /// Number of candidate contracts (both rights).
    pub fn candidate_count(&self) -> usize {
        self.strikes.len() * self.expirations.len() * OptionRight::ALL.len()
    }

    /// Full `rights × expirations × strikes` product of contract
    /// specifications, before qualification.
    pub fn contract_specs(
        &self,
        symbol: &str,
        exchange: &str,
        trading_class: &str,
    ) -> Vec<ContractSpec> {
        let mut specs = Vec::with_capacity(self.candidate_count());
        for right in OptionRight::ALL {
            for &expiration in &self.expirations {
                for &strike in &self.strikes {
                    specs.push(ContractSpec {
                        symbol: symbol.to_string(),
                        expiration,
                        strike,
                        right,
                        exchange: exchange.to_string(),
                        trading_class: trading_class.to_string(),
                    });
                }
            }
        }
        specs
    }
}

impl UniverseSelector {
    /// Exclusive strike bounds around the reference price.
    pub fn strike_bounds(&self, reference_price: Decimal) -> (Decimal, Decimal) {
        let hundred = Decimal::from(100);
        let band = Decimal::from(self.strike_band_pct);
        (
            reference_price * (hundred - band) / hundred,
            reference_price * (hundred + band) / hundred,
        )
    }

    /// Strikes strictly inside the band, ascending and de-duplicated.
    pub fn select_strikes(&self, reference_price: Decimal, available: &[Decimal]) -> Vec<Decimal> {
        let (lower, upper) = self.strike_bounds(reference_price);
        available
            .iter()
            .copied()
            .filter(|s| *s > lower && *s < upper)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Nearest and farthest expirations, ascending; overlaps collapse.
    pub fn select_expirations(&self, available: &[NaiveDate]) -> Vec<NaiveDate> {
        let sorted: Vec<NaiveDate> = available
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let near = sorted.iter().take(self.near_expirations);
        let far = sorted
            .iter()
            .skip(sorted.len().saturating_sub(self.far_expirations));

        near.chain(far)
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Select the universe for one cycle.
    pub fn select(
        &self,
        reference_price: Decimal,
        available_strikes: &[Decimal],
        available_expirations: &[NaiveDate],
    ) -> Universe {
        Universe {
            reference_price,
            strikes: self.select_strikes(reference_price, available_strikes),
            expirations: self.select_expirations(available_expirations),
        }
    }
}

/// Select a universe with the default band and expiration counts.
pub fn select_universe(
    reference_price: Decimal,
    available_strikes: &[Decimal],
    available_expirations: &[NaiveDate],
) -> Universe {
    UniverseSelector::default().select(reference_price, available_strikes, available_expirations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn expirations(n: u32) -> Vec<NaiveDate> {
        (1..=n)
            .map(|d| NaiveDate::from_ymd_opt(2025, 7, d).unwrap())
            .collect()
    }

    #[test]
    fn test_strike_band_is_open_interval() {
        let strikes = [
            dec!(65),
            dec!(70),
            dec!(95),
            dec!(100),
            dec!(105),
            dec!(130),
            dec!(135),
        ];
        let universe = select_universe(dec!(100), &strikes, &expirations(6));
        assert_eq!(universe.strikes, vec![dec!(95), dec!(100), dec!(105)]);
    }

    #[test]
    fn test_strike_just_inside_boundary_kept() {
        let strikes = [dec!(70.00), dec!(70.01), dec!(129.99), dec!(130.00)];
        let universe = select_universe(dec!(100), &strikes, &expirations(1));
        assert_eq!(universe.strikes, vec![dec!(70.01), dec!(129.99)]);
    }

    #[test]
    fn test_expirations_near_and_far() {
        let exps = expirations(6);
        let universe = select_universe(dec!(100), &[dec!(100)], &exps);
        assert_eq!(universe.expirations, vec![exps[0], exps[1], exps[4], exps[5]]);
    }

    #[test]
    fn test_expirations_unsorted_input() {
        let mut exps = expirations(6);
        exps.reverse();
        exps.push(exps[0]);
        let selected = UniverseSelector::default().select_expirations(&exps);
        let sorted = expirations(6);
        assert_eq!(selected, vec![sorted[0], sorted[1], sorted[4], sorted[5]]);
    }

    #[test]
    fn test_expirations_overlap_deduplicated() {
        let selector = UniverseSelector::default();
        for n in 0..=4 {
            let exps = expirations(n);
            let selected = selector.select_expirations(&exps);
            assert_eq!(selected, exps, "n = {}", n);
        }
    }

    #[test]
    fn test_end_to_end_selection() {
        let strikes: Vec<Decimal> = [350, 400, 450, 500, 550, 600, 650]
            .into_iter()
            .map(Decimal::from)
            .collect();
        let exps = expirations(5);

        let selector = UniverseSelector::default();
        assert_eq!(selector.strike_bounds(dec!(500)), (dec!(350), dec!(650)));

        let universe = selector.select(dec!(500), &strikes, &exps);
        assert_eq!(
            universe.strikes,
            vec![dec!(400), dec!(450), dec!(500), dec!(550), dec!(600)]
        );
        assert_eq!(universe.expirations, vec![exps[0], exps[1], exps[3], exps[4]]);
        assert_eq!(universe.candidate_count(), 40);
    }

    #[test]
    fn test_contract_specs_product() {
        let exps = expirations(2);
        let universe = select_universe(dec!(100), &[dec!(95), dec!(100), dec!(105)], &exps);
        let specs = universe.contract_specs("SPY", "SMART", "SPY");

        assert_eq!(specs.len(), 12);
        assert_eq!(specs.len(), universe.candidate_count());
        assert!(specs[..6].iter().all(|s| s.right == OptionRight::Call));
        assert!(specs[6..].iter().all(|s| s.right == OptionRight::Put));
        assert_eq!(specs[0].expiration, exps[0]);
        assert_eq!(specs[0].strike, dec!(95));
        assert_eq!(specs[3].expiration, exps[1]);
        assert_eq!(specs[0].trading_class, "SPY");
    }

    #[test]
    fn test_custom_band() {
        let selector = UniverseSelector {
            strike_band_pct: 5,
            ..Default::default()
        };
        let strikes = [dec!(94), dec!(95), dec!(96), dec!(104), dec!(105)];
        assert_eq!(
            selector.select_strikes(dec!(100), &strikes),
            vec![dec!(96), dec!(104)]
        );
    }

    #[test]
    fn test_empty_universe() {
        let universe = select_universe(dec!(100), &[dec!(10)], &expirations(3));
        assert!(universe.is_empty());
        assert!(universe.contract_specs("SPY", "SMART", "SPY").is_empty());
    }
}
