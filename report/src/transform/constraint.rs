//! Typed filter constraints.
//!
//! A [`FilterSpec`] is built once from the `key=value` filter configuration.
//! Each non-empty entry becomes one [`Constraint`]:
//!
//! | Config key                  | Constraint                         |
//! |-----------------------------|------------------------------------|
//! | quantity column (`QTY`)     | [`Constraint::Threshold`] per outlet |
//! | prefix key (`NAMA_SLS2_AWAL`) | [`Constraint::Prefix`] on the salesperson name |
//! | any other column            | [`Constraint::Membership`]         |

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ConfigError, ConfigResult};
use crate::logs::log_warning;
use crate::models::Schema;

/// Strict comparison used by threshold constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    GreaterThan,
    LessThan,
}

impl Comparison {
    pub fn symbol(self) -> char {
        match self {
            Comparison::GreaterThan => '>',
            Comparison::LessThan => '<',
        }
    }

    /// `lhs <op> rhs`, never inclusive.
    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparison::GreaterThan => lhs > rhs,
            Comparison::LessThan => lhs < rhs,
        }
    }
}

/// Aggregate filter: keep the groups of `group_by` whose summed `column`
/// satisfies `comparison` against `magnitude`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub column: String,
    pub group_by: String,
    pub comparison: Comparison,
    pub magnitude: f64,
}

impl Threshold {
    /// Parse an expression such as `>2` or `< 10.5`.
    pub fn parse(expr: &str, column: impl Into<String>, group_by: impl Into<String>) -> ConfigResult<Self> {
        let trimmed = expr.trim();
        let mut chars = trimmed.chars();
        let comparison = match chars.next() {
            Some('>') => Comparison::GreaterThan,
            Some('<') => Comparison::LessThan,
            _ => return Err(ConfigError::UnsupportedOperator(expr.to_string())),
        };

        let magnitude = chars
            .as_str()
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|m| m.is_finite())
            .ok_or_else(|| ConfigError::InvalidMagnitude(expr.to_string()))?;

        Ok(Self {
            column: column.into(),
            group_by: group_by.into(),
            comparison,
            magnitude,
        })
    }

    pub fn accepts(&self, sum: f64) -> bool {
        self.comparison.holds(sum, self.magnitude)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sum({}) per {} {} {}",
            self.column,
            self.group_by,
            self.comparison.symbol(),
            self.magnitude
        )
    }
}

/// One filter rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Constraint {
    /// Keep rows whose value (as a string) is one of `values`.
    Membership { column: String, values: Vec<String> },
    /// Keep rows whose text value starts with `prefix` (case-sensitive).
    Prefix { column: String, prefix: String },
    /// Per-group quantity threshold.
    Threshold(Threshold),
}

impl Constraint {
    /// Column the constraint reads.
    pub fn column(&self) -> &str {
        match self {
            Constraint::Membership { column, .. } | Constraint::Prefix { column, .. } => column,
            Constraint::Threshold(t) => &t.column,
        }
    }

    /// Evaluation phase: thresholds run on the widest outlet base, then the
    /// prefix, then generic memberships.
    pub fn phase(&self) -> u8 {
        match self {
            Constraint::Threshold(_) => 0,
            Constraint::Prefix { .. } => 1,
            Constraint::Membership { .. } => 2,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Constraint::Membership { .. } => "membership",
            Constraint::Prefix { .. } => "prefix",
            Constraint::Threshold(_) => "threshold",
        }
    }
}

/// Complete filter configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    constraints: Vec<Constraint>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from parsed `key=value` entries, in file order.
    ///
    /// Empty entries are dropped. Fails on a malformed threshold expression.
    pub fn from_entries(entries: &[(String, Vec<String>)], schema: &Schema) -> ConfigResult<Self> {
        let mut spec = Self::new();

        for (key, values) in entries {
            let Some(first) = values.first() else {
                continue;
            };

            if *key == schema.quantity {
                if values.len() > 1 {
                    log_warning(format!(
                        "{} accepts a single threshold, using '{}' and ignoring the rest",
                        key, first
                    ));
                }
                spec.push(Constraint::Threshold(Threshold::parse(first, &schema.quantity, &schema.outlet)?));
            } else if *key == schema.salesperson_prefix_key {
                if values.len() > 1 {
                    log_warning(format!(
                        "{} accepts a single prefix, using '{}' and ignoring the rest",
                        key, first
                    ));
                }
                spec.push(Constraint::Prefix {
                    column: schema.salesperson.clone(),
                    prefix: first.clone(),
                });
            } else {
                spec.push(Constraint::Membership {
                    column: key.clone(),
                    values: values.clone(),
                });
            }
        }

        Ok(spec)
    }

    /// Add a constraint; empty memberships and prefixes are ignored.
    pub fn push(&mut self, constraint: Constraint) {
        let empty = match &constraint {
            Constraint::Membership { values, .. } => values.is_empty(),
            Constraint::Prefix { prefix, .. } => prefix.is_empty(),
            Constraint::Threshold(_) => false,
        };
        if !empty {
            self.constraints.push(constraint);
        }
    }

    pub fn with(mut self, constraint: Constraint) -> Self {
        self.push(constraint);
        self
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Constraints in evaluation order (stable within a phase).
    pub fn ordered(&self) -> Vec<&Constraint> {
        let mut ordered: Vec<&Constraint> = self.constraints.iter().collect();
        ordered.sort_by_key(|c| c.phase());
        ordered
    }

    /// The first threshold constraint, if any.
    pub fn threshold(&self) -> Option<&Threshold> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::Threshold(t) => Some(t),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::{LogLevel, LOG_BROADCASTER};
    use tokio::sync::broadcast::error::TryRecvError;

    fn entry(key: &str, values: &[&str]) -> (String, Vec<String>) {
        (key.to_string(), values.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn test_parse_threshold() {
        let t = Threshold::parse(">2", "QTY", "KODE OUTLET").unwrap();
        assert_eq!(t.comparison, Comparison::GreaterThan);
        assert_eq!(t.magnitude, 2.0);
        assert!(t.accepts(3.0));
        assert!(!t.accepts(2.0));

        let t = Threshold::parse(" < 10.5 ", "QTY", "KODE OUTLET").unwrap();
        assert_eq!(t.comparison, Comparison::LessThan);
        assert!(t.accepts(10.0));
        assert!(!t.accepts(10.5));
    }

    #[test]
    fn test_parse_threshold_rejects_other_operators() {
        for expr in ["=2", ">=2", "2", ""] {
            let err = Threshold::parse(expr, "QTY", "KODE OUTLET").unwrap_err();
            match expr {
                ">=2" => assert!(matches!(err, ConfigError::InvalidMagnitude(_))),
                _ => assert!(matches!(err, ConfigError::UnsupportedOperator(_)), "{expr}"),
            }
        }
    }

    #[test]
    fn test_parse_threshold_rejects_non_numeric_magnitude() {
        for expr in [">abc", "<", ">inf", ">NaN"] {
            let err = Threshold::parse(expr, "QTY", "KODE OUTLET").unwrap_err();
            assert!(matches!(err, ConfigError::InvalidMagnitude(_)), "{expr}");
        }
    }

    #[test]
    fn test_from_entries_builds_typed_constraints() {
        let schema = Schema::default();
        let entries = vec![
            entry("KODE OUTLET", &[]),
            entry("KD_BRG", &["303174"]),
            entry("QTY", &[">2"]),
            entry("NAMA_SLS2_AWAL", &["AE"]),
        ];

        let spec = FilterSpec::from_entries(&entries, &schema).unwrap();

        assert_eq!(spec.constraints().len(), 3);
        let ordered = spec.ordered();
        assert_eq!(ordered[0].kind(), "threshold");
        assert_eq!(ordered[1].kind(), "prefix");
        assert_eq!(ordered[1].column(), "NAMA SLS2");
        assert_eq!(ordered[2].column(), "KD_BRG");
        assert_eq!(spec.threshold().unwrap().group_by, "KODE OUTLET");
    }

    #[test]
    fn test_from_entries_propagates_bad_threshold() {
        let entries = vec![entry("QTY", &["=5"])];
        let result = FilterSpec::from_entries(&entries, &Schema::default());
        assert!(matches!(result, Err(ConfigError::UnsupportedOperator(_))));
    }

    #[test]
    fn test_extra_prefix_values_are_reported() {
        let mut rx = LOG_BROADCASTER.subscribe();
        let entries = vec![entry("NAMA_SLS2_AWAL", &["AE", "BX"])];

        let spec = FilterSpec::from_entries(&entries, &Schema::default()).unwrap();
        assert_eq!(
            spec.constraints(),
            &[Constraint::Prefix { column: "NAMA SLS2".into(), prefix: "AE".into() }]
        );

        let mut warned = false;
        loop {
            match rx.try_recv() {
                Ok(entry) => {
                    warned |= entry.level == LogLevel::Warning
                        && entry.message.contains("NAMA_SLS2_AWAL accepts a single prefix");
                }
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        assert!(warned);
    }

    #[test]
    fn test_all_empty_entries_give_empty_spec() {
        let entries = vec![entry("CHANNEL", &[]), entry("QTY", &[]), entry("NAMA_SLS2_AWAL", &[])];
        let spec = FilterSpec::from_entries(&entries, &Schema::default()).unwrap();
        assert!(spec.is_empty());
    }
}
