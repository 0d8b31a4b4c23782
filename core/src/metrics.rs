//! Structured metric tables and the simulated-vs-theoretical comparison.
//!
//! RULE: A degenerate denominator is reported as InsufficientData,
//! never as an error and never as NaN.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum MetricValue {
    Value(f64),
    InsufficientData,
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Value(v) => Some(*v),
            MetricValue::InsufficientData => None,
        }
    }
}

impl From<Option<f64>> for MetricValue {
    fn from(v: Option<f64>) -> Self {
        match v {
            Some(v) if v.is_finite() => MetricValue::Value(v),
            _ => MetricValue::InsufficientData,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metric {
    pub name:  String,
    pub value: MetricValue,
}

/// An ordered `name -> value` mapping. Order is display order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetricTable {
    pub title:   String,
    pub entries: Vec<Metric>,
}

impl MetricTable {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), entries: Vec::new() }
    }

    pub fn push(&mut self, name: impl Into<String>, value: f64) {
        self.push_value(name, Some(value).into());
    }

    pub fn push_opt(&mut self, name: impl Into<String>, value: Option<f64>) {
        self.push_value(name, value.into());
    }

    pub fn push_value(&mut self, name: impl Into<String>, value: MetricValue) {
        self.entries.push(Metric { name: name.into(), value });
    }

    pub fn value(&self, name: &str) -> Option<MetricValue> {
        self.entries.iter().find(|m| m.name == name).map(|m| m.value)
    }

    /// Numeric value, or None when missing or InsufficientData.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.value(name).and_then(|v| v.as_f64())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Metric> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Pairs a simulated metric with its closed-form counterpart.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonKey {
    pub label:       String,
    pub simulated:   String,
    pub theoretical: String,
}

impl ComparisonKey {
    pub fn new(
        label: impl Into<String>,
        simulated: impl Into<String>,
        theoretical: impl Into<String>,
    ) -> Self {
        Self {
            label:       label.into(),
            simulated:   simulated.into(),
            theoretical: theoretical.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonRow {
    pub label:       String,
    pub simulated:   MetricValue,
    pub theoretical: MetricValue,
    pub difference:  MetricValue,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Comparison {
    Rows { rows: Vec<ComparisonRow> },
    NotApplicable { reason: String },
}

/// Build the side-by-side table. Missing values on either side
/// leave the difference as InsufficientData.
pub fn compare(
    simulated: &MetricTable,
    theoretical: &MetricTable,
    keys: &[ComparisonKey],
) -> Vec<ComparisonRow> {
    keys.iter()
        .map(|k| {
            let sim = simulated.value(&k.simulated).unwrap_or(MetricValue::InsufficientData);
            let theo = theoretical.value(&k.theoretical).unwrap_or(MetricValue::InsufficientData);
            let difference = match (sim.as_f64(), theo.as_f64()) {
                (Some(s), Some(t)) => MetricValue::Value((s - t).abs()),
                _ => MetricValue::InsufficientData,
            };
            ComparisonRow {
                label: k.label.clone(),
                simulated: sim,
                theoretical: theo,
                difference,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_values_become_insufficient_data() {
        let mut t = MetricTable::new("t");
        t.push("nan", f64::NAN);
        t.push_opt("none", None);
        t.push("ok", 1.5);
        assert_eq!(t.value("nan"), Some(MetricValue::InsufficientData));
        assert_eq!(t.value("none"), Some(MetricValue::InsufficientData));
        assert_eq!(t.get("ok"), Some(1.5));
        assert_eq!(t.get("missing"), None);
    }

    #[test]
    fn compare_reports_absolute_difference() {
        let mut sim = MetricTable::new("sim");
        sim.push("rho", 0.48);
        sim.push_opt("lq", None);
        let mut theo = MetricTable::new("theo");
        theo.push("rho", 0.5);
        theo.push("lq", 0.5);

        let rows = compare(
            &sim,
            &theo,
            &[
                ComparisonKey::new("Utilization", "rho", "rho"),
                ComparisonKey::new("Lq", "lq", "lq"),
            ],
        );
        assert_eq!(rows.len(), 2);
        let d = rows[0].difference.as_f64().unwrap();
        assert!((d - 0.02).abs() < 1e-12);
        assert_eq!(rows[1].difference, MetricValue::InsufficientData);
    }
}
