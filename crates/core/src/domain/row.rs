use crate::domain::rating::RatingLabel;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Column holding the composite technical rating score.
pub const RECOMMEND_ALL: &str = "Recommend.All";

/// One security's snapshot, keyed by screener column name in selection order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanRow(Map<String, Value>);

impl ScanRow {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(column.into(), value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replaces the numeric score in `column` with its rating label.
    ///
    /// A value that already is an exact label is left alone, so applying this twice is a no-op.
    pub fn apply_rating(&mut self, column: &str) -> RatingLabel {
        if let Some(label) = self.existing_label(column) {
            return label;
        }

        let score = parse_numeric_or_default(self.get(column), 0.0);
        let label = RatingLabel::from_score(score);
        self.insert(column, Value::String(label.as_str().to_string()));
        label
    }

    fn existing_label(&self, column: &str) -> Option<RatingLabel> {
        self.get(column)?.as_str()?.parse().ok()
    }
}

impl From<Map<String, Value>> for ScanRow {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for ScanRow {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Best-effort numeric coercion. Anything that is not a number, a numeric string or a
/// boolean yields `default`.
pub fn parse_numeric_or_default(value: Option<&Value>, default: f64) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(default),
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Null) | Some(Value::Array(_)) | Some(Value::Object(_)) | None => default,
    }
}
