use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::dataset::Dataset;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to reach data endpoint: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("data endpoint returned HTTP {status}")]
    Http { status: StatusCode },
    #[error("unexpected response format: {reason}")]
    Format { reason: String },
}

/// The two body shapes the endpoint is known to produce: a flat array of
/// row objects, or separate column names plus row value arrays.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawFeed {
    Columnar {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    Records(Vec<serde_json::Map<String, Value>>),
}

pub struct FeedClient {
    client: Client,
    url: String,
}

impl FeedClient {
    pub fn new(url: &str) -> Result<Self, FeedError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(15))
                .user_agent("screener/0.1")
                .build()?,
            url: url.to_string(),
        })
    }

    /// One GET, no retries. The caller decides what to show on failure.
    pub async fn fetch_dataset(&self) -> Result<Dataset, FeedError> {
        let resp = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(FeedError::Http {
                status: resp.status(),
            });
        }

        let text = resp.text().await?;
        decode_feed(&text)
    }
}

/// Decode a response body into a dataset. Pure so the wire shapes can be
/// exercised without a server.
pub fn decode_feed(body: &str) -> Result<Dataset, FeedError> {
    let raw: RawFeed = serde_json::from_str(body).map_err(|e| FeedError::Format {
        reason: format!("{} | body starts: {}", e, snippet(body)),
    })?;
    Ok(match raw {
        RawFeed::Columnar { columns, rows } => Dataset::from_columnar(columns, &rows),
        RawFeed::Records(records) => Dataset::from_records(&records),
    })
}

fn snippet(body: &str) -> String {
    let short: String = body.chars().take(120).collect();
    if short.len() < body.len() {
        format!("{}...", short.trim_end())
    } else {
        short
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Cell;

    #[test]
    fn decodes_columnar_shape() {
        let ds = decode_feed(
            r#"{"columns":["Symbol","Market Cap"],"rows":[["AAA","2,000 B"],["BBB"]]}"#,
        )
        .unwrap();
        assert_eq!(ds.columns, vec!["Symbol", "Market Cap"]);
        assert_eq!(ds.rows.len(), 2);
        // Short rows pad with missing trailing cells.
        assert_eq!(ds.rows[1][1], Cell::Missing);
    }

    #[test]
    fn decodes_record_shape_preserving_key_order() {
        let ds = decode_feed(
            r#"[{"Symbol":"AAA","Company Name":"Alpha Co","1D Change":"5.23"},
                {"Symbol":"BBB","Company Name":"Beta Co","1D Change":"-0.4"}]"#,
        )
        .unwrap();
        assert_eq!(ds.columns, vec!["Symbol", "Company Name", "1D Change"]);
        assert_eq!(ds.rows[1][0], Cell::Text("BBB".into()));
    }

    #[test]
    fn rejects_invalid_json() {
        let err = decode_feed("<html>oops</html>").unwrap_err();
        assert!(matches!(err, FeedError::Format { .. }));
    }

    #[test]
    fn rejects_unrecognized_shape() {
        let err = decode_feed(r#"{"sheets":[1,2,3]}"#).unwrap_err();
        assert!(matches!(err, FeedError::Format { .. }));
    }
}
