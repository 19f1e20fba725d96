use reqwest::{Client, StatusCode};

use super::error::MalError;
use super::types::{MalAnimeNode, MalListStatus, MalSearchResponse};
use crate::traits::{CatalogClient, CatalogEntry, EntryFields, ListEntry, StatusCommand};

const BASE_URL: &str = "https://api.myanimelist.net";

/// Default number of search results requested from MAL.
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

/// MyAnimeList API v2 client for a single authenticated user.
///
/// Token acquisition and refresh happen elsewhere; the client only carries a
/// bearer token that is valid for the lifetime of the instance.
pub struct MalClient {
    access_token: String,
    client_id: Option<String>,
    search_limit: u32,
    http: Client,
}

impl MalClient {
    pub fn new(access_token: String) -> Self {
        Self {
            access_token,
            client_id: None,
            search_limit: DEFAULT_SEARCH_LIMIT,
            http: Client::new(),
        }
    }

    /// Send the application client ID alongside the bearer token.
    pub fn with_client_id(mut self, client_id: Option<String>) -> Self {
        self.client_id = client_id;
        self
    }

    pub fn with_search_limit(mut self, limit: u32) -> Self {
        self.search_limit = limit.clamp(1, 100);
        self
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let req = self
            .http
            .get(url)
            .header("Authorization", self.auth_header());
        match &self.client_id {
            Some(id) => req.header("X-MAL-CLIENT-ID", id),
            None => req,
        }
    }

    /// Check the HTTP response for errors and return the body text on failure.
    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, MalError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "MAL API error");
            Err(MalError::Api {
                status,
                message: body,
            })
        }
    }
}

/// Build the MAL `fields` query parameter. `id` and `title` are always returned.
pub fn mal_fields(fields: EntryFields) -> String {
    let mut names = vec!["id", "title"];
    if fields.contains(EntryFields::ALTERNATIVE_TITLES) {
        names.push("alternative_titles");
    }
    if fields.contains(EntryFields::EPISODES) {
        names.push("num_episodes");
    }
    if fields.contains(EntryFields::RELATIONS) {
        names.push("related_anime");
    }
    if fields.contains(EntryFields::LIST_STATUS) {
        names.push("my_list_status");
    }
    names.join(",")
}

/// Form parameters for `PATCH my_list_status`. Only fields set on the command are sent.
pub fn status_params(command: &StatusCommand, today: chrono::NaiveDate) -> Vec<(&'static str, String)> {
    let mut params: Vec<(&str, String)> = vec![("status", command.status.as_str().to_string())];
    if let Some(ep) = command.episodes_watched {
        params.push(("num_watched_episodes", ep.to_string()));
    }
    if let Some(rewatching) = command.is_rewatching {
        params.push((
            "is_rewatching",
            if rewatching { "true" } else { "false" }.into(),
        ));
    }
    if let Some(count) = command.times_rewatched {
        params.push(("num_times_rewatched", count.to_string()));
    }
    let date = today.format("%Y-%m-%d").to_string();
    if command.start_date_now {
        params.push(("start_date", date.clone()));
    }
    if command.finish_date_now {
        params.push(("finish_date", date));
    }
    params
}

impl CatalogClient for MalClient {
    type Error = MalError;

    async fn search_by_title(
        &self,
        query: &str,
        fields: EntryFields,
    ) -> Result<Vec<CatalogEntry>, MalError> {
        let limit = self.search_limit.to_string();
        let resp = self
            .get(&format!("{BASE_URL}/v2/anime"))
            .query(&[
                ("q", query),
                ("limit", limit.as_str()),
                ("fields", mal_fields(fields).as_str()),
            ])
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        let search: MalSearchResponse = resp
            .json()
            .await
            .map_err(|e| MalError::Parse(e.to_string()))?;

        tracing::debug!(query, results = search.data.len(), "MAL search");
        Ok(search
            .data
            .into_iter()
            .map(|n| n.node.into_catalog_entry())
            .collect())
    }

    async fn get_entry_detail(
        &self,
        entry_id: u64,
        fields: EntryFields,
    ) -> Result<Option<CatalogEntry>, MalError> {
        let resp = self
            .get(&format!("{BASE_URL}/v2/anime/{entry_id}"))
            .query(&[("fields", mal_fields(fields))])
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = Self::check_response(resp).await?;
        let node: MalAnimeNode = resp
            .json()
            .await
            .map_err(|e| MalError::Parse(e.to_string()))?;

        Ok(Some(node.into_catalog_entry()))
    }

    async fn submit_status_update(
        &self,
        entry_id: u64,
        command: &StatusCommand,
    ) -> Result<ListEntry, MalError> {
        let url = format!("{BASE_URL}/v2/anime/{entry_id}/my_list_status");
        // MAL requires a form-encoded body for PATCH, not JSON.
        let params = status_params(command, chrono::Local::now().date_naive());

        let mut req = self
            .http
            .patch(&url)
            .header("Authorization", self.auth_header())
            .form(&params);
        if let Some(id) = &self.client_id {
            req = req.header("X-MAL-CLIENT-ID", id);
        }

        let resp = Self::check_response(req.send().await?).await?;
        let status: MalListStatus = resp
            .json()
            .await
            .map_err(|e| MalError::Parse(e.to_string()))?;

        status
            .into_list_entry()
            .ok_or_else(|| MalError::Parse("update response has no list status".into()))
    }
}
