//! [`HttpSource`]: the live feeds over HTTP.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{
  Error, Result,
  source::{Feed, FeedSource},
};

/// Endpoint for each feed. The CSV feeds are optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedUrls {
  pub data:             String,
  pub states_daily:     String,
  pub districts_daily:  String,
  pub case_time_series: Option<String>,
  pub states:           Option<String>,
}

impl Default for FeedUrls {
  fn default() -> Self {
    Self {
      data:             "https://api.covid19india.org/data.json".into(),
      states_daily:     "https://api.covid19india.org/states_daily.json".into(),
      districts_daily:  "https://api.covid19india.org/districts_daily.json"
        .into(),
      case_time_series: None,
      states:           None,
    }
  }
}

impl FeedUrls {
  pub fn get(&self, feed: Feed) -> Option<&str> {
    match feed {
      Feed::Data => Some(&self.data),
      Feed::StatesDaily => Some(&self.states_daily),
      Feed::DistrictsDaily => Some(&self.districts_daily),
      Feed::CaseTimeSeries => self.case_time_series.as_deref(),
      Feed::StateTotals => self.states.as_deref(),
    }
  }
}

/// Fetches feeds with a shared [`reqwest::Client`].
///
/// Cheap to clone; the inner client is `Arc`-based.
#[derive(Debug, Clone)]
pub struct HttpSource {
  client: Client,
  urls:   FeedUrls,
}

impl HttpSource {
  pub fn new(urls: FeedUrls) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .map_err(Error::Client)?;
    Ok(Self { client, urls })
  }

  pub fn urls(&self) -> &FeedUrls { &self.urls }

  async fn get(&self, feed: Feed) -> Result<(String, Response)> {
    let url = self.urls.get(feed).ok_or(Error::NotConfigured(feed))?;
    debug!(%feed, url, "fetching feed");

    let resp = self.client.get(url).send().await.map_err(|source| {
      Error::Fetch {
        feed,
        url: url.to_string(),
        source,
      }
    })?;

    if !resp.status().is_success() {
      return Err(Error::Status {
        feed,
        url: url.to_string(),
        status: resp.status(),
      });
    }
    Ok((url.to_string(), resp))
  }
}

impl FeedSource for HttpSource {
  fn provides(&self, feed: Feed) -> bool { self.urls.get(feed).is_some() }

  async fn fetch_json(&self, feed: Feed) -> Result<Value> {
    let text = self.fetch_text(feed).await?;
    serde_json::from_str(&text).map_err(|source| Error::Decode { feed, source })
  }

  async fn fetch_text(&self, feed: Feed) -> Result<String> {
    let (url, resp) = self.get(feed).await?;
    resp.text().await.map_err(|source| Error::Fetch { feed, url, source })
  }
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn optional_feeds_are_not_provided_by_default() {
    let source = HttpSource::new(FeedUrls::default()).unwrap();
    assert!(source.provides(Feed::Data));
    assert!(source.provides(Feed::DistrictsDaily));
    assert!(!source.provides(Feed::CaseTimeSeries));
    assert!(!source.provides(Feed::StateTotals));
  }

  #[test]
  fn default_urls_publish_each_required_feed_under_its_file_name() {
    let urls = FeedUrls::default();
    for feed in Feed::iter().filter(|f| f.is_required()) {
      let url = urls.get(feed).unwrap();
      let suffix = format!("/{}", feed.file_name());
      assert!(url.ends_with(&suffix), "{feed}: {url}");
    }
  }

  #[tokio::test]
  async fn unconfigured_feed_fails_without_a_request() {
    let source = HttpSource::new(FeedUrls::default()).unwrap();
    let err = source.fetch_text(Feed::StateTotals).await.unwrap_err();
    assert!(matches!(err, Error::NotConfigured(Feed::StateTotals)));
    assert!(err.is_fetch());
  }
}
