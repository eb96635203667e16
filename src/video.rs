//! Video-search collaborator (YouTube Data API v3 `search`).
//!
//! Used to attach a tutorial video to yoga recommendations after validation.
//! Enrichment is best effort: a failed or empty lookup leaves `video: None`
//! and never touches the already-validated text fields.

use std::time::Duration;

use futures::future::join_all;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::domain::{VideoRef, YogaRecommendation};

#[derive(Debug, Error)]
pub enum VideoSearchError {
  #[error("video search request failed: {0}")]
  Network(#[from] reqwest::Error),
  #[error("video search returned HTTP {0}")]
  Status(u16),
}

#[derive(Clone)]
pub struct VideoSearch {
  client: reqwest::Client,
  api_key: String,
  base_url: String,
}

impl VideoSearch {
  pub fn new(api_key: String, base_url: String) -> Result<Self, VideoSearchError> {
    let client = reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?;
    Ok(Self { client, api_key, base_url: base_url.trim_end_matches('/').to_string() })
  }

  /// Construct from YOUTUBE_API_KEY / YOUTUBE_BASE_URL; None without a key.
  pub fn from_env() -> Option<Self> {
    let key = std::env::var("YOUTUBE_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base = std::env::var("YOUTUBE_BASE_URL").unwrap_or_else(|_| "https://www.googleapis.com/youtube/v3".into());
    match Self::new(key, base) {
      Ok(v) => Some(v),
      Err(e) => {
        warn!(target: "video", error = %e, "Video search disabled");
        None
      }
    }
  }

  #[instrument(level = "debug", skip(self), fields(term_len = term.len()))]
  pub async fn search(&self, term: &str, max_results: u8) -> Result<Vec<VideoRef>, VideoSearchError> {
    let max = max_results.to_string();
    let res = self.client
      .get(format!("{}/search", self.base_url))
      .header(USER_AGENT, "lifemate-backend/0.1")
      .query(&[
        ("part", "snippet"),
        ("type", "video"),
        ("q", term),
        ("maxResults", max.as_str()),
        ("key", self.api_key.as_str()),
      ])
      .send()
      .await?;

    if !res.status().is_success() {
      return Err(VideoSearchError::Status(res.status().as_u16()));
    }
    let body: SearchResponse = res.json().await?;
    Ok(body.items.into_iter().filter_map(SearchItem::into_video).collect())
  }

  /// Attach the first matching video to each recommendation, concurrently.
  /// Each lookup is keyed by its own recommendation's search term.
  #[instrument(level = "info", skip_all, fields(count = recs.len()))]
  pub async fn enrich(&self, recs: Vec<YogaRecommendation>) -> Vec<YogaRecommendation> {
    let lookups = recs.iter().map(|r| self.search(&r.youtube_search_term, 1));
    let results = join_all(lookups).await;

    recs
      .into_iter()
      .zip(results)
      .map(|(mut rec, found)| {
        match found {
          Ok(videos) => rec.video = videos.into_iter().next(),
          Err(e) => warn!(target: "video", id = %rec.id, error = %e, "Video lookup failed; keeping recommendation without video"),
        }
        if rec.video.is_none() {
          debug!(target: "video", id = %rec.id, "No video match");
        }
        rec
      })
      .collect()
  }
}

#[derive(Deserialize)]
struct SearchResponse {
  #[serde(default)]
  items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
  id: SearchId,
  snippet: Option<Snippet>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
  video_id: Option<String>,
}

#[derive(Deserialize)]
struct Snippet {
  #[serde(default)]
  title: String,
  #[serde(default)]
  thumbnails: Thumbnails,
}

#[derive(Deserialize, Default)]
struct Thumbnails {
  high: Option<Thumb>,
  medium: Option<Thumb>,
  default: Option<Thumb>,
}

#[derive(Deserialize)]
struct Thumb {
  url: String,
}

impl SearchItem {
  fn into_video(self) -> Option<VideoRef> {
    let video_id = self.id.video_id?;
    let (title, thumbs) = match self.snippet {
      Some(s) => (s.title, s.thumbnails),
      None => (String::new(), Thumbnails::default()),
    };
    let thumbnail_url = thumbs
      .high
      .or(thumbs.medium)
      .or(thumbs.default)
      .map(|t| t.url)
      .unwrap_or_else(|| format!("https://i.ytimg.com/vi/{video_id}/hqdefault.jpg"));
    Some(VideoRef { video_id, title, thumbnail_url })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Source;
  use mockito::Matcher;
  use serde_json::json;

  fn rec(id: &str, term: &str) -> YogaRecommendation {
    YogaRecommendation {
      id: id.into(),
      title: id.into(),
      description: "d".into(),
      reason: "r".into(),
      youtube_search_term: term.into(),
      video: None,
      source: Source::Ai,
    }
  }

  #[tokio::test]
  async fn search_maps_items_and_skips_channels() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/search")
      .match_query(Matcher::UrlEncoded("q".into(), "cat cow pose".into()))
      .with_status(200)
      .with_body(
        json!({ "items": [
          { "id": { "kind": "youtube#channel" }, "snippet": { "title": "A channel" } },
          { "id": { "videoId": "abc123" }, "snippet": { "title": "Cat-Cow", "thumbnails": { "medium": { "url": "https://t/m.jpg" } } } }
        ]})
        .to_string(),
      )
      .create_async()
      .await;

    let vs = VideoSearch::new("k".into(), server.url()).unwrap();
    let found = vs.search("cat cow pose", 2).await.unwrap();
    assert_eq!(found, vec![VideoRef { video_id: "abc123".into(), title: "Cat-Cow".into(), thumbnail_url: "https://t/m.jpg".into() }]);
  }

  #[tokio::test]
  async fn enrich_correlates_per_item_and_tolerates_failures() {
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/search")
      .match_query(Matcher::UrlEncoded("q".into(), "tree pose".into()))
      .with_status(200)
      .with_body(json!({ "items": [{ "id": { "videoId": "tree1" }, "snippet": { "title": "Tree" } }] }).to_string())
      .create_async()
      .await;
    server
      .mock("GET", "/search")
      .match_query(Matcher::UrlEncoded("q".into(), "bridge pose".into()))
      .with_status(403)
      .create_async()
      .await;
    server
      .mock("GET", "/search")
      .match_query(Matcher::UrlEncoded("q".into(), "unknown pose".into()))
      .with_status(200)
      .with_body(json!({ "items": [] }).to_string())
      .create_async()
      .await;

    let vs = VideoSearch::new("k".into(), server.url()).unwrap();
    let out = vs
      .enrich(vec![rec("a", "tree pose"), rec("b", "bridge pose"), rec("c", "unknown pose")])
      .await;

    assert_eq!(out.len(), 3);
    assert_eq!(out[0].video.as_ref().map(|v| v.video_id.as_str()), Some("tree1"));
    assert_eq!(out[0].video.as_ref().map(|v| v.thumbnail_url.as_str()), Some("https://i.ytimg.com/vi/tree1/hqdefault.jpg"));
    assert!(out[1].video.is_none());
    assert!(out[2].video.is_none());
    assert_eq!(out[1].title, "b");
  }
}
