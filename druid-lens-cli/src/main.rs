mod render;

use clap::{Parser, Subcommand};
use druid_lens_common::Config;
use druid_lens_core::{
    ComponentId, DimensionFilter, DruidHistogramSource, HistogramRequest, Selection, Statistic,
    StatisticValue, ValueRange, ViewSpec, VirtualDataset,
};

fn parse_range(s: &str) -> Result<ValueRange, String> { // "lo,hi"
    let (lo, hi) = s.split_once(',').ok_or_else(|| format!("expected lo,hi: {s}"))?;
    let lower: f64 = lo.trim().parse().map_err(|_| format!("not a float: {lo}"))?;
    let upper: f64 = hi.trim().parse().map_err(|_| format!("not a float: {hi}"))?;
    if lower <= upper { Ok(ValueRange::new(lower, upper)) } else { Err(format!("lower {lower} exceeds upper {upper}")) }
}

fn parse_filter(s: &str) -> Result<DimensionFilter, String> { // "dim:lo:hi"
    let mut parts = s.rsplitn(3, ':');
    let (hi, lo, dim) = match (parts.next(), parts.next(), parts.next()) {
        (Some(hi), Some(lo), Some(dim)) if !dim.is_empty() => (hi, lo, dim),
        _ => return Err(format!("expected dimension:lo:hi, got {s}")),
    };
    let range = parse_range(&format!("{lo},{hi}"))?;
    Ok(DimensionFilter { dimension: dim.to_owned(), range })
}

fn parse_bins(s: &str) -> Result<usize, String> {
    let v: usize = s.parse().map_err(|_| format!("not a bin count: {s}"))?;
    if v > 0 { Ok(v) } else { Err("bin count must be positive".into()) }
}

fn parse_component(name: &str) -> ComponentId {
    match name.strip_prefix("pixel:").and_then(|a| a.parse().ok()) {
        Some(axis) => ComponentId::Pixel(axis),
        None => ComponentId::Main(name.to_owned()),
    }
}

#[derive(Parser)]
#[command(name = "druid-lens", version, about = "Histograms and synthetic statistics over a Druid datasource")]
struct Cli {
    /// broker base URL, overrides [source].endpoint
    #[arg(long, global = true)]
    endpoint: Option<String>,
    /// overrides [source].datasource
    #[arg(long, global = true)]
    datasource: Option<String>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Components,
    /// print the groupBy document without contacting the broker
    Query {
        dimension: String,
        #[arg(long, value_parser = parse_range, allow_hyphen_values = true)] range: Option<ValueRange>,
        #[arg(long, value_parser = parse_bins)] bins: Option<usize>,
        #[arg(long, value_parser = parse_filter)] filter: Option<DimensionFilter>,
    },
    Histogram {
        dimension: String,
        #[arg(long, value_parser = parse_range, allow_hyphen_values = true)] range: Option<ValueRange>,
        #[arg(long, value_parser = parse_bins)] bins: Option<usize>,
        #[arg(long, value_parser = parse_filter)] filter: Option<DimensionFilter>,
        #[arg(long)] json: bool,
    },
    /// histogram every component in parallel
    Sweep {
        #[arg(long, value_parser = parse_range, allow_hyphen_values = true)] range: Option<ValueRange>,
        #[arg(long, value_parser = parse_bins)] bins: Option<usize>,
    },
    Stat {
        statistic: String,
        /// dimension name, or pixel:<axis>
        component: String,
        #[arg(long)] percentile: Option<f64>,
        #[arg(long, value_delimiter = ',')] axis: Option<Vec<usize>>,
    },
    Sample {
        component: String,
        #[arg(long, allow_hyphen_values = true)] start: Option<i64>,
        #[arg(long, allow_hyphen_values = true)] stop: Option<i64>,
        #[arg(long, default_value_t = 1, allow_hyphen_values = true)] step: i64,
    },
    /// count the elements of a view that fall inside a range selection
    Mask {
        #[arg(value_parser = parse_filter, allow_hyphen_values = true)] selection: DimensionFilter,
        #[arg(long, allow_hyphen_values = true)] start: Option<i64>,
        #[arg(long, allow_hyphen_values = true)] stop: Option<i64>,
        #[arg(long, default_value_t = 1, allow_hyphen_values = true)] step: i64,
    },
    Config { #[arg(long)] save: bool },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let mut config = Config::load().unwrap_or_else(|e| {
        log::warn!("ignoring unreadable config: {e}");
        Config::default()
    });
    if let Some(endpoint) = cli.endpoint { config.source.endpoint = endpoint; }
    if let Some(datasource) = cli.datasource { config.source.datasource = datasource; }

    match cli.command {
        Commands::Components => run_components(&config)?,
        Commands::Query { dimension, range, bins, filter } => {
            let src = DruidHistogramSource::new(config.source.clone())?;
            let range = range.unwrap_or_else(|| config.histogram.default_range.into());
            let bins = bins.unwrap_or(config.histogram.default_bins);
            let doc = src.histogram_query(&dimension, range, bins, filter.as_ref())?;
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        Commands::Histogram { dimension, range, bins, filter, json } => {
            run_histogram(&config, dimension, range, bins, filter, json)?
        }
        Commands::Sweep { range, bins } => run_sweep(&config, range, bins)?,
        Commands::Stat { statistic, component, percentile, axis } => {
            let src = DruidHistogramSource::new(config.source)?;
            let stat = Statistic::from_name(&statistic, percentile)?;
            match src.compute_statistic(stat, &parse_component(&component), axis.as_deref()) {
                StatisticValue::Scalar(v) => println!("{v}"),
                StatisticValue::Array { shape, values } => {
                    println!("shape: {shape:?}");
                    render::print_values(values);
                }
            }
        }
        Commands::Sample { component, start, stop, step } => {
            let src = DruidHistogramSource::new(config.source)?;
            let view = ViewSpec::Slice { start, stop, step };
            render::print_values(src.get_values(&parse_component(&component), Some(&view)));
        }
        Commands::Mask { selection, start, stop, step } => {
            let src = DruidHistogramSource::new(config.source)?;
            let view = ViewSpec::Slice { start, stop, step };
            let mask = src.get_mask(&Selection::from(selection), Some(&view));
            let total = mask.len();
            let selected = mask.filter(|m| *m).count();
            println!("{selected} of {total} selected");
        }
        Commands::Config { save } => {
            if save {
                config.save()?;
                println!("Config saved to {}", Config::config_path().display());
            }
            print!("{}", config.to_toml_string()?);
        }
    }
    Ok(())
}

fn run_components(config: &Config) -> anyhow::Result<()> {
    let src = DruidHistogramSource::new(config.source.clone())?;
    println!("{:<20} {}", "Label:", src.label());
    println!("{:<20} {:?}", "Shape:", src.shape());
    println!("{:<20} {}", "Broker:", src.config().query_url());
    for c in src.main_components().iter().chain(src.pixel_component_ids().iter()) {
        println!("  {:<18} {}", c.to_string(), src.kind(c));
    }
    Ok(())
}

fn run_histogram(
    config: &Config,
    dimension: String,
    range: Option<ValueRange>,
    bins: Option<usize>,
    filter: Option<DimensionFilter>,
    json: bool,
) -> anyhow::Result<()> {
    let src = DruidHistogramSource::new(config.source.clone())?;
    let range = range.unwrap_or_else(|| config.histogram.default_range.into());
    let bins = bins.unwrap_or(config.histogram.default_bins);
    let selection = filter.map(Selection::from).unwrap_or_default();
    let counts = src.compute_histogram(&ComponentId::Main(dimension.clone()), range, bins, Some(&selection))?;
    if json {
        println!("{}", serde_json::to_string(&counts)?);
    } else {
        println!("{dimension} [{}, {}] / {bins}", range.lower, range.upper);
        render::print_histogram(range, &counts);
    }
    Ok(())
}

fn run_sweep(config: &Config, range: Option<ValueRange>, bins: Option<usize>) -> anyhow::Result<()> {
    let src = DruidHistogramSource::new(config.source.clone())?;
    let range = range.unwrap_or_else(|| config.histogram.default_range.into());
    let bins = bins.unwrap_or(config.histogram.default_bins);
    let requests: Vec<HistogramRequest> = src
        .main_components()
        .iter()
        .map(|c| HistogramRequest { dimension: c.to_string(), range, bin_count: bins, selection: Selection::All })
        .collect();
    let results = src.compute_histograms(&requests);
    let mut failures = 0usize;
    for (req, res) in requests.iter().zip(results) {
        println!("{}", req.dimension);
        match res {
            Ok(counts) => render::print_histogram(range, &counts),
            Err(e) => { failures += 1; eprintln!("  error: {e}"); }
        }
    }
    if failures == requests.len() && !requests.is_empty() { anyhow::bail!("every histogram in the sweep failed"); }
    Ok(())
}

#[cfg(test)]
mod tests_arg_parsers {
    use super::*;

    #[test] fn range_ok() { assert_eq!(parse_range("0,5").unwrap(), ValueRange::new(0.0, 5.0)); }
    #[test] fn range_negative_lower() { assert_eq!(parse_range("-1.5, 2").unwrap(), ValueRange::new(-1.5, 2.0)); }
    #[test] fn range_inverted() { assert!(parse_range("5,0").is_err()); }
    #[test] fn range_missing_comma() { assert!(parse_range("5").is_err()); }
    #[test] fn bins_zero() { assert!(parse_bins("0").is_err()); }
    #[test] fn bins_ok() { assert_eq!(parse_bins("30").unwrap(), 30); }

    #[test]
    fn filter_ok() {
        let f = parse_filter("passenger_count:1:2").unwrap();
        assert_eq!(f.dimension, "passenger_count");
        assert_eq!(f.range, ValueRange::new(1.0, 2.0));
    }

    #[test] fn filter_missing_dimension() { assert!(parse_filter(":1:2").is_err()); }
    #[test] fn filter_too_short() { assert!(parse_filter("1:2").is_err()); }

    #[test]
    fn components() {
        assert_eq!(parse_component("pixel:0"), ComponentId::Pixel(0));
        assert_eq!(parse_component("trip_distance"), ComponentId::Main("trip_distance".into()));
    }
}
