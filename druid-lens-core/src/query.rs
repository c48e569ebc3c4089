use druid_lens_common::Result;
use serde::{Deserialize, Serialize};

use crate::histogram::BinGeometry;

/// output name the bucketed dimension is reported under
pub const BIN_OUTPUT_NAME: &str = "bin";
pub const COUNT_AGGREGATION_NAME: &str = "count";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub lower: f64,
    pub upper: f64,
}

impl ValueRange {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

impl From<(f64, f64)> for ValueRange {
    fn from((lower, upper): (f64, f64)) -> Self {
        Self { lower, upper }
    }
}

/// second dimension restricting the rows a histogram counts
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionFilter {
    pub dimension: String,
    pub range: ValueRange,
}

// --- wire document ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum QueryType {
    #[serde(rename = "groupBy")]
    GroupBy,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutputType {
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ordering {
    Numeric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExtractionFn {
    Bucket { size: f64, offset: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DimensionSpec {
    #[serde(rename_all = "camelCase")]
    Extraction {
        dimension: String,
        output_name: String,
        extraction_fn: ExtractionFn,
        output_type: OutputType,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Filter {
    And {
        fields: Vec<Filter>,
    },
    Bound {
        dimension: String,
        lower: f64,
        upper: f64,
        ordering: Ordering,
    },
}

impl Filter {
    pub fn bound(dimension: &str, range: ValueRange) -> Self {
        Filter::Bound {
            dimension: dimension.to_owned(),
            lower: range.lower,
            upper: range.upper,
            ordering: Ordering::Numeric,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Aggregation {
    Count { name: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDocument {
    pub query_type: QueryType,
    pub data_source: String,
    pub intervals: Vec<String>,
    pub granularity: Granularity,
    pub dimensions: Vec<DimensionSpec>,
    pub filter: Filter,
    pub aggregations: Vec<Aggregation>,
}

impl QueryDocument {
    /// conjuncts of the top-level AND filter
    pub fn filter_fields(&self) -> &[Filter] {
        match &self.filter {
            Filter::And { fields } => fields,
            single => std::slice::from_ref(single),
        }
    }
}

/// groupBy query bucketing `dimension` into `bin_count` bins over `range`
pub struct HistogramQuery<'a> {
    pub datasource: &'a str,
    pub intervals: &'a [String],
    pub dimension: &'a str,
    pub range: ValueRange,
    pub bin_count: usize,
    pub filter: Option<&'a DimensionFilter>,
}

impl HistogramQuery<'_> {
    pub fn build(&self) -> Result<QueryDocument> {
        self.build_with_geometry().map(|(doc, _)| doc)
    }

    /// document plus the geometry its bucket transform was derived from
    pub fn build_with_geometry(&self) -> Result<(QueryDocument, BinGeometry)> {
        let geometry = BinGeometry::new(self.range, self.bin_count)?;
        Ok((build_query(self, &geometry), geometry))
    }
}

fn build_query(q: &HistogramQuery<'_>, geometry: &BinGeometry) -> QueryDocument {
    let mut fields = vec![Filter::bound(q.dimension, q.range)];
    if let Some(f) = q.filter {
        fields.push(Filter::bound(&f.dimension, f.range));
    }
    QueryDocument {
        query_type: QueryType::GroupBy,
        data_source: q.datasource.to_owned(),
        intervals: q.intervals.to_vec(),
        granularity: Granularity::All,
        dimensions: vec![DimensionSpec::Extraction {
            dimension: q.dimension.to_owned(),
            output_name: BIN_OUTPUT_NAME.into(),
            extraction_fn: ExtractionFn::Bucket {
                size: geometry.bin_size(),
                offset: geometry.offset(),
            },
            output_type: OutputType::Float,
        }],
        filter: Filter::And { fields },
        aggregations: vec![Aggregation::Count {
            name: COUNT_AGGREGATION_NAME.into(),
        }],
    }
}
