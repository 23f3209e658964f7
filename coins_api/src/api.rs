use std::sync::Arc;

use chrono::Utc;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
    StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::CoinsConfig,
    data_objects::CryptoPaymentsPage,
    signing::{sign_request, ACCESS_KEY, ACCESS_NONCE, ACCESS_SIGNATURE},
    CoinsApiError,
};

pub const CRYPTO_PAYMENTS_PATH: &str = "/api/v3/crypto-payments";

#[derive(Clone)]
pub struct CoinsApi {
    config: CoinsConfig,
    client: Arc<Client>,
}

impl CoinsApi {
    pub fn new(config: CoinsConfig) -> Result<Self, CoinsApiError> {
        let mut headers = HeaderMap::with_capacity(3);
        let key = HeaderValue::from_str(config.api_key.reveal().as_str())
            .map_err(|e| CoinsApiError::Initialization(e.to_string()))?;
        headers.insert(ACCESS_KEY, key);
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.insert("accept", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| CoinsApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &CoinsConfig {
        &self.config
    }

    /// Sends a signed request. The query string is part of the signed URL, so parameters are appended here rather
    /// than through `RequestBuilder::query`.
    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<B>,
    ) -> Result<T, CoinsApiError> {
        let url = self.url(path, params);
        let body = body
            .map(|b| serde_json::to_string(&b))
            .transpose()
            .map_err(|e| CoinsApiError::RestRequestError(e.to_string()))?;
        let nonce = Utc::now().timestamp_millis().to_string();
        let signature = sign_request(self.config.api_secret.reveal(), &nonce, &url, body.as_deref())?;
        trace!("Sending REST query: {method} {url}");
        let mut req = self.client.request(method, &url).header(ACCESS_NONCE, nonce).header(ACCESS_SIGNATURE, signature);
        if let Some(body) = body {
            req = req.body(body);
        }
        let response = req.send().await.map_err(|e| CoinsApiError::RestResponseError(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            trace!("REST query successful. {status}");
            response.json::<T>().await.map_err(|e| CoinsApiError::JsonError(e.to_string()))
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("The ledger API is throttling requests to {url}");
            Err(CoinsApiError::Throttled)
        } else {
            let message = response.text().await.map_err(|e| CoinsApiError::RestResponseError(e.to_string()))?;
            Err(CoinsApiError::QueryError { status: status.as_u16(), message })
        }
    }

    pub fn url(&self, path: &str, params: &[(&str, &str)]) -> String {
        let base = format!("{}{path}", self.config.base_url);
        if params.is_empty() {
            return base;
        }
        let query = params.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<String>>().join("&");
        format!("{base}?{query}")
    }

    /// Fetches one page of the ledger. Page numbers start at 1 and the newest entries come first.
    pub async fn fetch_crypto_payments(&self, page: u32, per_page: u32) -> Result<CryptoPaymentsPage, CoinsApiError> {
        let page_str = page.to_string();
        let per_page_str = per_page.to_string();
        let params = [("page", page_str.as_str()), ("per_page", per_page_str.as_str())];
        debug!("Fetching ledger page {page} ({per_page} per page)");
        let result = self.rest_query::<CryptoPaymentsPage, ()>(Method::GET, CRYPTO_PAYMENTS_PATH, &params, None).await?;
        debug!(
            "Fetched {} entries on page {page}. Total: {}. Next page: {:?}",
            result.entries.len(),
            result.meta.total_count,
            result.meta.next_page
        );
        Ok(result)
    }
}
