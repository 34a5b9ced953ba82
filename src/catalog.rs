//! DLC listing from the Steam store
//!
//! One blocking request per run against the store's `dlcforapp` endpoint.

use serde::Deserialize;
use thiserror::Error;

use crate::cream_ini::DlcEntry;
use crate::logging::{log_download, log_info};

pub const STEAM_DLC_URL: &str = "https://store.steampowered.com/api/dlcforapp/?appid=";

/// The store rejects requests without a browser-like agent string
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/110.0";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("DLC catalog at {url} is unavailable: {reason}")]
    Unavailable {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    #[error("DLC catalog response from {url} is malformed: {reason}")]
    Malformed { url: String, reason: String },
}

#[derive(Deserialize)]
struct DlcForAppResponse {
    dlc: Vec<DlcEntry>,
}

/// Client for the DLC catalog
#[derive(Debug, Clone)]
pub struct CatalogClient {
    base_url: String,
}

impl Default for CatalogClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogClient {
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(STEAM_DLC_URL)
    }

    /// Use a different endpoint; the App ID is appended verbatim
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn url_for(&self, app_id: u32) -> String {
        format!("{}{}", self.base_url, app_id)
    }

    /// Fetch the DLC list for `app_id`, in catalog order
    pub fn fetch_dlcs(&self, app_id: u32) -> Result<Vec<DlcEntry>, CatalogError> {
        let url = self.url_for(app_id);
        log_download(&format!("Fetching the DLC list from {}", url));

        let response = match ureq::get(&url).set("User-Agent", USER_AGENT).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                return Err(unavailable(url, Some(status), format!("HTTP {}", status)));
            }
            Err(e) => return Err(unavailable(url, None, e.to_string())),
        };

        if response.status() != 200 {
            let status = response.status();
            return Err(unavailable(url, Some(status), format!("HTTP {}", status)));
        }

        let body: DlcForAppResponse = response.into_json().map_err(|e| CatalogError::Malformed {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        log_info("DLCs found:");
        for dlc in &body.dlc {
            log_info(&format!("{} ({})", dlc.name, dlc.id));
        }
        Ok(body.dlc)
    }
}

fn unavailable(url: String, status: Option<u16>, reason: String) -> CatalogError {
    CatalogError::Unavailable {
        url,
        status,
        reason,
    }
}
