pub mod histogram;
pub mod query;
pub mod sample;
pub mod source;
pub mod statistic;
pub mod transport;

pub use druid_lens_common::{Config, DruidLensError, Result, SourceConfig};
pub use histogram::{reduce_histogram, BinEvent, BinGeometry, RawRecord};
pub use query::{DimensionFilter, Filter, HistogramQuery, QueryDocument, ValueRange};
pub use sample::{SelectionMask, SyntheticValues, ViewSpec};
pub use source::{
    ComponentId, ComponentKind, DruidHistogramSource, HistogramRequest, Selection, VirtualDataset,
};
pub use statistic::{Statistic, StatisticValue};
pub use transport::{decode_response, HttpTransport, QueryTransport};
