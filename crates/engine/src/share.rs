//! Shareable links.
//!
//! Builds links carrying a start (`t`) and optional end (`e`) and reads
//! them back from an incoming page URL.

use async_trait::async_trait;
use reqwest::Url;
use scrubkit_common::error::{ScrubError, ScrubResult};
use scrubkit_model::{SharedRange, ShareSelection, END_PARAM, START_PARAM};

/// `page_url` with its `t`/`e` parameters replaced by the selection. Other
/// query parameters are kept in order.
pub fn share_url(page_url: &str, selection: &ShareSelection) -> ScrubResult<String> {
    let mut url = parse(page_url)?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != START_PARAM && key != END_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.set_query(None);
    {
        let mut query = url.query_pairs_mut();
        for (key, value) in &kept {
            query.append_pair(key, value);
        }
        for (key, value) in selection.query_pairs() {
            query.append_pair(key, &value);
        }
    }
    Ok(url.into())
}

/// The range requested by an incoming page URL, if it carries one.
pub fn incoming_range(page_url: &str) -> ScrubResult<Option<SharedRange>> {
    let url = parse(page_url)?;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    Ok(SharedRange::from_query(
        pairs.iter().map(|(key, value)| (key.as_str(), value.as_str())),
    ))
}

fn parse(page_url: &str) -> ScrubResult<Url> {
    Url::parse(page_url).map_err(|e| ScrubError::Config {
        message: format!("invalid page URL {page_url:?}: {e}"),
    })
}

/// System clipboard.
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> ScrubResult<()>;
}

/// Feedback shown next to the copy button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyStatus {
    #[default]
    Idle,
    Copied,
    Failed,
}

/// Build the link for `selection` and put it on the clipboard.
pub async fn copy_share_link(
    clipboard: &dyn Clipboard,
    page_url: &str,
    selection: &ShareSelection,
) -> CopyStatus {
    let link = match share_url(page_url, selection) {
        Ok(link) => link,
        Err(e) => {
            tracing::warn!(error = %e, "Cannot build share link");
            return CopyStatus::Failed;
        }
    };
    match clipboard.write_text(&link).await {
        Ok(()) => {
            tracing::debug!(link = %link, "Share link copied");
            CopyStatus::Copied
        }
        Err(e) => {
            tracing::warn!(error = %e, "Clipboard write failed");
            CopyStatus::Failed
        }
    }
}
