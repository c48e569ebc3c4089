use std::fmt;

use druid_lens_common::{DruidLensError, Result, SourceConfig};
use rayon::prelude::*;

use crate::histogram::reduce_histogram;
use crate::query::{DimensionFilter, HistogramQuery, QueryDocument, ValueRange};
use crate::sample::{shape_size, SelectionMask, SyntheticValues, ViewSpec};
use crate::statistic::{partial_reduction, placeholder, Statistic, StatisticValue};
use crate::transport::{HttpTransport, QueryTransport};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComponentId {
    /// named dimension stored in the broker
    Main(String),
    /// positional index along one axis of the virtual shape
    Pixel(usize),
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentId::Main(name) => write!(f, "{name}"),
            ComponentId::Pixel(axis) => write!(f, "Pixel Axis {axis}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Numerical,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::Numerical => write!(f, "numerical"),
        }
    }
}

/// Front-end selection state attached to a histogram request.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Selection {
    #[default]
    All,
    /// contiguous `[lower, upper]` selection on one dimension
    Range {
        dimension: String,
        lower: f64,
        upper: f64,
    },
    /// any other shape (polygon, categorical, compound, ...); histograms ignore it
    Other { description: String },
}

impl Selection {
    pub fn range_filter(&self) -> Option<DimensionFilter> {
        match self {
            Selection::Range { dimension, lower, upper } => Some(DimensionFilter {
                dimension: dimension.clone(),
                range: ValueRange::new(*lower, *upper),
            }),
            Selection::All => None,
            Selection::Other { description } => {
                log::debug!("selection {description} is not a single range, histogram is unfiltered");
                None
            }
        }
    }
}

impl From<DimensionFilter> for Selection {
    fn from(f: DimensionFilter) -> Self {
        Selection::Range { dimension: f.dimension, lower: f.range.lower, upper: f.range.upper }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramRequest {
    pub dimension: String,
    pub range: ValueRange,
    pub bin_count: usize,
    pub selection: Selection,
}

/// Capability surface a visual-exploration front end drives a lazily evaluated dataset through.
pub trait VirtualDataset {
    fn label(&self) -> &str;
    fn shape(&self) -> Vec<u64>;
    fn main_components(&self) -> Vec<ComponentId>;
    fn kind(&self, component: &ComponentId) -> ComponentKind;

    /// `axes == None` reduces over every axis
    fn compute_statistic(
        &self,
        statistic: Statistic,
        component: &ComponentId,
        axes: Option<&[usize]>,
    ) -> StatisticValue;

    fn compute_histogram(
        &self,
        component: &ComponentId,
        range: ValueRange,
        bin_count: usize,
        selection: Option<&Selection>,
    ) -> Result<Vec<u64>>;

    fn get_values(&self, component: &ComponentId, view: Option<&ViewSpec>) -> SyntheticValues;

    /// membership of each element of `view` in `selection`
    fn get_mask(&self, selection: &Selection, view: Option<&ViewSpec>) -> SelectionMask;

    fn ndim(&self) -> usize {
        self.shape().len()
    }

    fn size(&self) -> u64 {
        shape_size(&self.shape())
    }

    fn pixel_component_ids(&self) -> Vec<ComponentId> {
        (0..self.ndim()).map(ComponentId::Pixel).collect()
    }
}

/// Druid datasource exposed as a virtual dataset. Histograms are answered by a groupBy query
/// per call; statistics and raw values are synthetic.
pub struct DruidHistogramSource<T = HttpTransport> {
    config: SourceConfig,
    transport: T,
}

impl DruidHistogramSource<HttpTransport> {
    pub fn new(config: SourceConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self { config, transport })
    }
}

impl<T: QueryTransport> DruidHistogramSource<T> {
    pub fn with_transport(config: SourceConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    fn query<'a>(
        &'a self,
        dimension: &'a str,
        range: ValueRange,
        bin_count: usize,
        filter: Option<&'a DimensionFilter>,
    ) -> HistogramQuery<'a> {
        HistogramQuery {
            datasource: &self.config.datasource,
            intervals: &self.config.intervals,
            dimension,
            range,
            bin_count,
            filter,
        }
    }

    pub fn histogram_query(
        &self,
        dimension: &str,
        range: ValueRange,
        bin_count: usize,
        filter: Option<&DimensionFilter>,
    ) -> Result<QueryDocument> {
        self.query(dimension, range, bin_count, filter).build()
    }

    /// build → post → reduce, one broker round trip
    pub fn histogram(
        &self,
        dimension: &str,
        range: ValueRange,
        bin_count: usize,
        selection: Option<&Selection>,
    ) -> Result<Vec<u64>> {
        let filter = selection.and_then(Selection::range_filter);
        let (doc, geometry) = self
            .query(dimension, range, bin_count, filter.as_ref())
            .build_with_geometry()?;
        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "groupBy on {}.{dimension}: {}",
                self.config.datasource,
                serde_json::to_string(&doc).unwrap_or_default()
            );
        }
        let records = self.transport.post_query(&doc)?;
        Ok(reduce_histogram(&records, &geometry))
    }

    /// Independent histograms on the rayon pool; results keep request order.
    pub fn compute_histograms(&self, requests: &[HistogramRequest]) -> Vec<Result<Vec<u64>>> {
        requests
            .par_iter()
            .map(|r| self.histogram(&r.dimension, r.range, r.bin_count, Some(&r.selection)))
            .collect()
    }

    /// every component reads the same synthetic stand-in, sized to the view
    fn view_values(&self, view: Option<&ViewSpec>) -> SyntheticValues {
        let shape = match view {
            Some(v) => v.shape(self.config.row_count),
            None => self.shape(),
        };
        SyntheticValues::new(shape_size(&shape))
    }

    fn axis_extent(&self, component: &ComponentId) -> Option<u64> {
        match component {
            ComponentId::Pixel(axis) => self.shape().get(*axis).copied(),
            ComponentId::Main(_) => None,
        }
    }
}

impl<T: QueryTransport> VirtualDataset for DruidHistogramSource<T> {
    fn label(&self) -> &str {
        &self.config.datasource
    }

    fn shape(&self) -> Vec<u64> {
        vec![self.config.row_count]
    }

    fn main_components(&self) -> Vec<ComponentId> {
        self.config
            .dimensions
            .iter()
            .map(|d| ComponentId::Main(d.clone()))
            .collect()
    }

    fn kind(&self, _component: &ComponentId) -> ComponentKind {
        ComponentKind::Numerical
    }

    fn compute_statistic(
        &self,
        statistic: Statistic,
        component: &ComponentId,
        axes: Option<&[usize]>,
    ) -> StatisticValue {
        match axes {
            None => StatisticValue::Scalar(placeholder(
                statistic,
                self.axis_extent(component),
                self.size(),
            )),
            Some(axes) => partial_reduction(&self.shape(), axes),
        }
    }

    fn compute_histogram(
        &self,
        component: &ComponentId,
        range: ValueRange,
        bin_count: usize,
        selection: Option<&Selection>,
    ) -> Result<Vec<u64>> {
        match component {
            ComponentId::Main(dimension) => self.histogram(dimension, range, bin_count, selection),
            ComponentId::Pixel(axis) => Err(DruidLensError::Other(format!(
                "pixel axis {axis} is not stored in {} and cannot be binned",
                self.config.datasource
            ))),
        }
    }

    fn get_values(&self, _component: &ComponentId, view: Option<&ViewSpec>) -> SyntheticValues {
        self.view_values(view)
    }

    fn get_mask(&self, selection: &Selection, view: Option<&ViewSpec>) -> SelectionMask {
        let bounds = match selection {
            Selection::Range { lower, upper, .. } => Some((*lower, *upper)),
            Selection::All => None,
            Selection::Other { description } => {
                log::debug!("selection {description} cannot be evaluated, every element is kept");
                None
            }
        };
        SelectionMask::new(self.view_values(view), bounds)
    }
}
