use druid_lens_common::{DruidLensError, Result, SourceConfig};

use crate::histogram::RawRecord;
use crate::query::QueryDocument;

/// Executes a query document against the broker and returns its decoded records.
///
/// Implementations are shared across threads by the parallel sweep, hence `Send + Sync`.
pub trait QueryTransport: Send + Sync {
    fn post_query(&self, query: &QueryDocument) -> Result<Vec<RawRecord>>;
}

/// blocking HTTP POST to `<endpoint>/<query_path>`
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpTransport {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| DruidLensError::Transport(e.to_string()))?;
        Ok(Self { client, url: config.query_url() })
    }
}

impl QueryTransport for HttpTransport {
    fn post_query(&self, query: &QueryDocument) -> Result<Vec<RawRecord>> {
        let resp = self
            .client
            .post(&self.url)
            .json(query)
            .send()
            .map_err(|e| DruidLensError::Transport(format!("POST {} failed: {e}", self.url)))?;
        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| DruidLensError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(DruidLensError::Transport(format!(
                "broker returned HTTP {status} for {}: {}",
                self.url,
                truncate(&body, 200)
            )));
        }
        let records = decode_response(&body)?;
        log::debug!("received {} records from {}", records.len(), self.url);
        Ok(records)
    }
}

/// Decodes a groupBy response body. Any record missing `event.bin` or `event.count`
/// fails the whole body.
pub fn decode_response(body: &str) -> Result<Vec<RawRecord>> {
    serde_json::from_str(body).map_err(|e| DruidLensError::ResponseShape(e.to_string()))
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
