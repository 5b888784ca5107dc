use serde::Serialize;
use serde_json::{json, Value};

pub const DEFAULT_MARKET: &str = "america";
const DEFAULT_LIMIT: u32 = 50;

/// Scanner comparison operators, named as the scan endpoint expects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    #[serde(rename = "equal")]
    Equal,
    #[serde(rename = "nequal")]
    NotEqual,
    #[serde(rename = "greater")]
    Greater,
    #[serde(rename = "egreater")]
    GreaterOrEqual,
    #[serde(rename = "less")]
    Less,
    #[serde(rename = "eless")]
    LessOrEqual,
    InRange,
    NotInRange,
}

/// Right-hand side of a comparison: a literal or another column.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(Value),
    Column(Column),
}

impl From<Column> for Operand {
    fn from(c: Column) -> Self {
        Operand::Column(c)
    }
}

macro_rules! literal_operand {
    ($($t:ty),*) => {
        $(impl From<$t> for Operand {
            fn from(v: $t) -> Self {
                Operand::Value(json!(v))
            }
        })*
    };
}

literal_operand!(i32, i64, u32, u64, f64, bool, &str, String);

impl Operand {
    fn to_wire(&self) -> Value {
        match self {
            Operand::Value(v) => v.clone(),
            Operand::Column(c) => Value::String(c.name.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    name: String,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn compare(self, operation: Operation, right: impl Into<Operand>) -> Condition {
        Condition {
            left: self,
            operation,
            right: right.into(),
        }
    }

    pub fn eq(self, right: impl Into<Operand>) -> Condition {
        self.compare(Operation::Equal, right)
    }

    pub fn ne(self, right: impl Into<Operand>) -> Condition {
        self.compare(Operation::NotEqual, right)
    }

    pub fn gt(self, right: impl Into<Operand>) -> Condition {
        self.compare(Operation::Greater, right)
    }

    pub fn ge(self, right: impl Into<Operand>) -> Condition {
        self.compare(Operation::GreaterOrEqual, right)
    }

    pub fn lt(self, right: impl Into<Operand>) -> Condition {
        self.compare(Operation::Less, right)
    }

    pub fn le(self, right: impl Into<Operand>) -> Condition {
        self.compare(Operation::LessOrEqual, right)
    }

    pub fn isin<I, V>(self, values: I) -> Condition
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.compare(Operation::InRange, Operand::Value(Value::Array(values)))
    }

    pub fn not_in<I, V>(self, values: I) -> Condition
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.compare(Operation::NotInRange, Operand::Value(Value::Array(values)))
    }

    /// Inclusive range check; bounds may be literals or columns.
    pub fn between(self, low: impl Into<Operand>, high: impl Into<Operand>) -> Condition {
        let bounds = vec![low.into().to_wire(), high.into().to_wire()];
        self.compare(Operation::InRange, Operand::Value(Value::Array(bounds)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    left: Column,
    operation: Operation,
    right: Operand,
}

impl Condition {
    pub fn operation(&self) -> Operation {
        self.operation
    }

    fn to_wire(&self) -> Value {
        json!({
            "left": self.left.name,
            "operation": self.operation,
            "right": self.right.to_wire(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Sort {
    column: String,
    ascending: bool,
}

/// Builder for a scanner request. Built fresh per request and consumed by a
/// [`ScreenerClient`](crate::screener::ScreenerClient).
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    markets: Vec<String>,
    columns: Vec<String>,
    filter: Vec<Condition>,
    sort: Option<Sort>,
    offset: u32,
    limit: u32,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            markets: vec![DEFAULT_MARKET.to_string()],
            columns: vec!["name".to_string(), "close".to_string(), "volume".to_string()],
            filter: Vec::new(),
            sort: None,
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn set_markets<I, S>(mut self, markets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.markets = markets.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the filter; all conditions must hold.
    pub fn where_(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        self.filter = conditions.into_iter().collect();
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.sort = Some(Sort {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.filter
    }

    /// Market path segment of the scan URL.
    pub fn url_market(&self) -> &str {
        match self.markets.as_slice() {
            [single] => single,
            _ => "global",
        }
    }

    pub fn to_payload(&self) -> Value {
        let mut payload = json!({
            "markets": self.markets,
            "symbols": {"query": {"types": []}, "tickers": []},
            "options": {"lang": "en"},
            "columns": self.columns,
            "filter": self.filter.iter().map(Condition::to_wire).collect::<Vec<_>>(),
            "range": [self.offset, self.offset.saturating_add(self.limit)],
        });
        if let Some(sort) = &self.sort {
            payload["sort"] = json!({
                "sortBy": sort.column,
                "sortOrder": if sort.ascending { "asc" } else { "desc" },
                "nullsFirst": false,
            });
        }
        payload
    }
}

/// US listings closing at their one-month high on above-average volume.
pub fn tradingview_data_query() -> Query {
    Query::new()
        .select([
            "name",
            "Recommend.All",
            "close",
            "change_from_open",
            "volume",
            "RSI",
            "EMA5",
            "EMA10",
            "High.1M",
            "average_volume_10d_calc",
        ])
        .set_markets(["america"])
        .where_([
            Column::new("High.1M").eq(Column::new("close")),
            Column::new("RSI").gt(30),
            Column::new("exchange").isin(["NASDAQ", "NYSE", "AMEX", "NYSE ARCA"]),
            Column::new("close").gt(1.5),
            Column::new("volume").gt(Column::new("average_volume_10d_calc")),
        ])
        .order_by("name", false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query_targets_america_with_default_range() {
        let payload = Query::new().to_payload();
        assert_eq!(payload["markets"], json!(["america"]));
        assert_eq!(payload["range"], json!([0, 50]));
        assert!(payload.get("sort").is_none());
        assert_eq!(Query::new().url_market(), "america");
    }

    #[test]
    fn url_market_is_global_for_multiple_markets() {
        let q = Query::new().set_markets(["america", "uk"]);
        assert_eq!(q.url_market(), "global");
    }

    #[test]
    fn offset_and_limit_shape_the_range() {
        let payload = Query::new().offset(100).limit(25).to_payload();
        assert_eq!(payload["range"], json!([100, 125]));
    }

    #[test]
    fn between_and_not_in_serialize_as_ranges() {
        let q = Query::new().where_([
            Column::new("RSI").between(30, 70),
            Column::new("exchange").not_in(["OTC"]),
            Column::new("close").le(Column::new("EMA10")),
        ]);
        assert_eq!(
            q.to_payload()["filter"],
            json!([
                {"left": "RSI", "operation": "in_range", "right": [30, 70]},
                {"left": "exchange", "operation": "not_in_range", "right": ["OTC"]},
                {"left": "close", "operation": "eless", "right": "EMA10"},
            ])
        );
    }

    #[test]
    fn tradingview_data_query_payload() {
        let q = tradingview_data_query();
        assert_eq!(q.url_market(), "america");
        assert_eq!(q.columns().len(), 10);
        assert_eq!(q.conditions().len(), 5);

        let payload = q.to_payload();
        assert_eq!(
            payload["columns"],
            json!([
                "name",
                "Recommend.All",
                "close",
                "change_from_open",
                "volume",
                "RSI",
                "EMA5",
                "EMA10",
                "High.1M",
                "average_volume_10d_calc"
            ])
        );
        assert_eq!(
            payload["filter"],
            json!([
                {"left": "High.1M", "operation": "equal", "right": "close"},
                {"left": "RSI", "operation": "greater", "right": 30},
                {"left": "exchange", "operation": "in_range", "right": ["NASDAQ", "NYSE", "AMEX", "NYSE ARCA"]},
                {"left": "close", "operation": "greater", "right": 1.5},
                {"left": "volume", "operation": "greater", "right": "average_volume_10d_calc"},
            ])
        );
        assert_eq!(
            payload["sort"],
            json!({"sortBy": "name", "sortOrder": "desc", "nullsFirst": false})
        );
    }
}
