use crate::error::EngineError;
use crate::map::ResolutionMap;
use async_trait::async_trait;
use std::fmt::Debug;
use tracing::warn;
use url::Url;

/// What the transport returned for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retrieved {
    pub ok: bool,
    pub status: u16,
    /// Address after redirects, when the transport knows it.
    pub final_url: Option<Url>,
    pub body: String,
}

impl Retrieved {
    /// A `200` response served from `url`.
    #[must_use]
    pub fn success(url: Url, body: impl Into<String>) -> Self {
        Self { ok: true, status: 200, final_url: Some(url), body: body.into() }
    }

    #[must_use]
    pub fn status(status: u16) -> Self {
        Self { ok: (200..300).contains(&status), status, final_url: None, body: String::new() }
    }
}

/// Fetches the text of a map by URL.
///
/// `Err` means no response was produced. A response with `ok == false` is a
/// valid `Ok` value; interpreting it is up to the caller.
#[async_trait]
pub trait Retriever: Debug + Send + Sync {
    async fn retrieve(&self, url: &Url) -> Result<Retrieved, EngineError>;
}

/// Retrieves and parses a map. Every failure is logged and reported as `None`.
///
/// On success the address the map was served from comes back with it.
pub(crate) async fn retrieve_map(retriever: &dyn Retriever, url: &Url) -> Option<(ResolutionMap, Url)> {
    let response = match retriever.retrieve(url).await {
        Ok(response) => response,
        Err(e) => {
            warn!(url = %url, error = %e, "Unable to download import map");
            return None;
        },
    };

    if !response.ok {
        warn!(url = %url, status = response.status, "Import map request was not successful");
        return None;
    }

    match ResolutionMap::parse(&response.body) {
        Ok(map) => Some((map, response.final_url.unwrap_or_else(|| url.clone()))),
        Err(e) => {
            warn!(url = %url, error = %e, "Import map response is not valid JSON");
            None
        },
    }
}
