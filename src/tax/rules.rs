//! Fiscal-year rule tables: slab schedule, rebate, special gains rates,
//! cess and per-head deduction caps.

use crate::vocab::Head;
use crate::warnings::RunError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;

/// Indian fiscal year key in "YYYY-YY" form (e.g. "2023-24").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYear(pub String);

impl FiscalYear {
    pub fn new(key: impl Into<String>) -> Self {
        FiscalYear(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FiscalYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One progressive bracket: income up to `upper_bound` (or unbounded for
/// the final slab) is taxed at `rate` on the margin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slab {
    #[serde(default)]
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}

/// Immutable rule table for one fiscal year. Selecting the wrong year's
/// table is a caller error, not core-internal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRules {
    pub slabs: Vec<Slab>,
    pub rebate_threshold: Decimal,
    pub rebate_cap: Decimal,
    pub stcg_rate: Decimal,
    pub ltcg_rate: Decimal,
    pub ltcg_exemption: Decimal,
    pub cess_rate: Decimal,
    /// Caps keyed by head key (e.g. "deduction_80c").
    #[serde(default)]
    pub deduction_caps: BTreeMap<String, Decimal>,
}

impl TaxRules {
    /// Built-in old-regime tables. Other years must supply a JSON table.
    pub fn builtin(fy: &FiscalYear) -> Option<TaxRules> {
        match fy.as_str() {
            // Old-regime slabs unchanged across these years.
            "2022-23" | "2023-24" => Some(TaxRules {
                slabs: vec![
                    Slab {
                        upper_bound: Some(dec!(250000)),
                        rate: Decimal::ZERO,
                    },
                    Slab {
                        upper_bound: Some(dec!(500000)),
                        rate: dec!(0.05),
                    },
                    Slab {
                        upper_bound: Some(dec!(1000000)),
                        rate: dec!(0.20),
                    },
                    Slab {
                        upper_bound: None,
                        rate: dec!(0.30),
                    },
                ],
                rebate_threshold: dec!(500000),
                rebate_cap: dec!(12500),
                stcg_rate: dec!(0.15),
                ltcg_rate: dec!(0.10),
                ltcg_exemption: dec!(100000),
                cess_rate: dec!(0.04),
                deduction_caps: BTreeMap::from([(
                    Head::Deduction80c.key().to_string(),
                    dec!(150000),
                )]),
            }),
            _ => None,
        }
    }

    /// Load a rule table from JSON, validating it. Any defect is fatal.
    pub fn from_json<R: Read>(reader: R) -> Result<TaxRules, RunError> {
        let rules: TaxRules =
            serde_json::from_reader(reader).map_err(|e| RunError::InvalidRuleTable {
                reason: e.to_string(),
            })?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), RunError> {
        let invalid = |reason: &str| {
            Err(RunError::InvalidRuleTable {
                reason: reason.to_string(),
            })
        };
        if self.slabs.is_empty() {
            return invalid("no slabs defined");
        }
        let mut prev = Decimal::ZERO;
        for (i, slab) in self.slabs.iter().enumerate() {
            if slab.rate < Decimal::ZERO || slab.rate > Decimal::ONE {
                return invalid("slab rate outside [0, 1]");
            }
            match slab.upper_bound {
                Some(bound) => {
                    if i == self.slabs.len() - 1 {
                        return invalid("final slab must be unbounded");
                    }
                    if bound <= prev {
                        return invalid("slab upper bounds must be strictly increasing");
                    }
                    prev = bound;
                }
                None => {
                    if i != self.slabs.len() - 1 {
                        return invalid("only the final slab may be unbounded");
                    }
                }
            }
        }
        for (name, rate) in [
            ("stcg_rate", self.stcg_rate),
            ("ltcg_rate", self.ltcg_rate),
            ("cess_rate", self.cess_rate),
        ] {
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return invalid(&format!("{name} outside [0, 1]"));
            }
        }
        if self.rebate_threshold < Decimal::ZERO
            || self.rebate_cap < Decimal::ZERO
            || self.ltcg_exemption < Decimal::ZERO
        {
            return invalid("thresholds and exemptions must be non-negative");
        }
        if self.deduction_caps.values().any(|c| *c < Decimal::ZERO) {
            return invalid("deduction caps must be non-negative");
        }
        Ok(())
    }

    pub fn deduction_cap(&self, head: Head) -> Option<Decimal> {
        self.deduction_caps.get(head.key()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_rules() -> TaxRules {
        TaxRules::builtin(&FiscalYear::new("2023-24")).unwrap()
    }

    #[test]
    fn builtin_2023_24_present() {
        let rules = valid_rules();
        assert_eq!(rules.slabs.len(), 4);
        assert_eq!(rules.rebate_cap, dec!(12500));
        assert_eq!(rules.deduction_cap(Head::Deduction80c), Some(dec!(150000)));
        assert_eq!(rules.deduction_cap(Head::Deduction80d), None);
        rules.validate().unwrap();
    }

    #[test]
    fn unknown_year_has_no_builtin() {
        assert!(TaxRules::builtin(&FiscalYear::new("2031-32")).is_none());
    }

    #[test]
    fn json_round_trip() {
        let rules = valid_rules();
        let json = serde_json::to_string(&rules).unwrap();
        let loaded = TaxRules::from_json(json.as_bytes()).unwrap();
        assert_eq!(loaded, rules);
    }

    #[test]
    fn malformed_json_is_fatal() {
        let err = TaxRules::from_json("{\"slabs\": []".as_bytes()).unwrap_err();
        assert!(matches!(err, RunError::InvalidRuleTable { .. }));
    }

    #[test]
    fn bounded_final_slab_rejected() {
        let mut rules = valid_rules();
        rules.slabs.last_mut().unwrap().upper_bound = Some(dec!(5000000));
        assert!(rules.validate().is_err());
    }

    #[test]
    fn non_increasing_bounds_rejected() {
        let mut rules = valid_rules();
        rules.slabs[1].upper_bound = Some(dec!(250000));
        assert!(rules.validate().is_err());
    }

    #[test]
    fn rate_above_one_rejected() {
        let mut rules = valid_rules();
        rules.stcg_rate = dec!(1.5);
        assert!(rules.validate().is_err());
    }

    #[test]
    fn empty_slabs_rejected() {
        let mut rules = valid_rules();
        rules.slabs.clear();
        assert!(rules.validate().is_err());
    }
}
