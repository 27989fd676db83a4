use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::ValidationError;

/// Column names of the fetch artifact, in file order.
pub const PRICE_COLUMNS: [&str; 7] = [
    "Datetime", "Open", "High", "Low", "Close", "AdjClose", "Volume",
];

/// One row of the fetch artifact. Values are carried as raw text; a field is
/// `None` when the row ended before reaching it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    #[serde(rename = "Datetime", default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
    #[serde(rename = "Open", default, skip_serializing_if = "Option::is_none")]
    pub open: Option<String>,
    #[serde(rename = "High", default, skip_serializing_if = "Option::is_none")]
    pub high: Option<String>,
    #[serde(rename = "Low", default, skip_serializing_if = "Option::is_none")]
    pub low: Option<String>,
    #[serde(rename = "Close", default, skip_serializing_if = "Option::is_none")]
    pub close: Option<String>,
    #[serde(rename = "AdjClose", default, skip_serializing_if = "Option::is_none")]
    pub adj_close: Option<String>,
    #[serde(rename = "Volume", default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
}

impl PriceRecord {
    /// Assigns fields positionally; anything past the seventh value is ignored.
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut values = fields.into_iter().map(Into::into);
        Self {
            datetime: values.next(),
            open: values.next(),
            high: values.next(),
            low: values.next(),
            close: values.next(),
            adj_close: values.next(),
            volume: values.next(),
        }
    }

    /// Field values in column order, paired with their column names.
    pub fn columns(&self) -> [(&'static str, Option<&str>); 7] {
        [
            (PRICE_COLUMNS[0], self.datetime.as_deref()),
            (PRICE_COLUMNS[1], self.open.as_deref()),
            (PRICE_COLUMNS[2], self.high.as_deref()),
            (PRICE_COLUMNS[3], self.low.as_deref()),
            (PRICE_COLUMNS[4], self.close.as_deref()),
            (PRICE_COLUMNS[5], self.adj_close.as_deref()),
            (PRICE_COLUMNS[6], self.volume.as_deref()),
        ]
    }
}

/// Horizontal price band reported by the analysis step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportRange {
    pub min: f64,
    pub max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation_count: Option<u32>,
}

impl SupportRange {
    pub fn new(min: f64, max: f64, observation_count: Option<u32>) -> Result<Self, ValidationError> {
        if !min.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "min" });
        }
        if !max.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "max" });
        }
        if max < min {
            return Err(ValidationError::InvertedRange);
        }

        Ok(Self {
            min,
            max,
            observation_count,
        })
    }
}

/// A price record optionally annotated with one support range.
///
/// Support flags are derived from `support`, so a point reports `support: true`
/// exactly when both bounds are present and ordered.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedDataPoint {
    pub record: PriceRecord,
    pub support: Option<SupportRange>,
}

impl EnrichedDataPoint {
    pub fn new(record: PriceRecord, support: Option<SupportRange>) -> Self {
        Self { record, support }
    }

    pub const fn has_support(&self) -> bool {
        self.support.is_some()
    }

    pub fn support_min(&self) -> Option<f64> {
        self.support.map(|range| range.min)
    }

    pub fn support_max(&self) -> Option<f64> {
        self.support.map(|range| range.max)
    }
}

impl Serialize for EnrichedDataPoint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        for (name, value) in self.record.columns() {
            if let Some(value) = value {
                map.serialize_entry(name, value)?;
            }
        }
        if let Some(range) = &self.support {
            map.serialize_entry("support", &true)?;
            map.serialize_entry("supportMin", &range.min)?;
            map.serialize_entry("supportMax", &range.max)?;
            if let Some(count) = range.observation_count {
                map.serialize_entry("supportCount", &count)?;
            }
        }
        map.end()
    }
}
