//! `/businesses`: filtered search with cursor pagination, and lookups by id.

use crate::client::{OutscraperClient, check_envelope};
use crate::error::{OutscraperError, Result};
use crate::models::{Business, BusinessFilters, BusinessSearchResult};
use crate::transport::ApiRequest;
use futures_util::stream::{self, Stream, TryStreamExt};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

pub const MAX_PAGE_SIZE: u32 = 1000;

/// One search request. `cursor` resumes a previous listing.
#[derive(Debug, Clone, PartialEq)]
pub struct BusinessQuery {
    pub filters: Map<String, Value>,
    pub limit: u32,
    pub cursor: Option<String>,
    pub include_total: bool,
    pub fields: Vec<String>,
}

impl Default for BusinessQuery {
    fn default() -> Self {
        Self {
            filters: Map::new(),
            limit: 10,
            cursor: None,
            include_total: false,
            fields: Vec::new(),
        }
    }
}

impl BusinessQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filters(mut self, filters: &BusinessFilters) -> Self {
        self.filters = match filters.to_payload() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self
    }

    /// Filters given as a raw JSON object, for keys the typed set lacks.
    pub fn raw_filters(mut self, filters: Map<String, Value>) -> Self {
        self.filters = filters;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn include_total(mut self, include: bool) -> Self {
        self.include_total = include;
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    fn payload(&self) -> Value {
        let mut payload = json!({
            "filters": self.filters,
            "limit": self.limit,
            "cursor": self.cursor,
            "include_total": self.include_total,
        });
        if !self.fields.is_empty() {
            payload["fields"] = json!(self.fields);
        }
        payload
    }
}

pub struct BusinessesApi<'a> {
    client: &'a OutscraperClient,
}

impl<'a> BusinessesApi<'a> {
    pub(crate) fn new(client: &'a OutscraperClient) -> Self {
        Self { client }
    }

    /// Fetch one page.
    pub async fn search(&self, query: &BusinessQuery) -> Result<BusinessSearchResult> {
        if !(1..=MAX_PAGE_SIZE).contains(&query.limit) {
            return Err(OutscraperError::InvalidArgument(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}, got {}",
                query.limit
            )));
        }

        let request = ApiRequest::post("/businesses", query.payload());
        let body = self.client.send_json(&request).await?;
        check_envelope(&body)?;

        let items: Vec<Business> = match body.get("items") {
            Some(Value::Array(items)) => items.iter().cloned().map(Business::from_value).collect(),
            _ => Vec::new(),
        };
        let next_cursor = body
            .get("next_cursor")
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        let has_more = body.get("has_more").and_then(Value::as_bool).unwrap_or(false) || next_cursor.is_some();

        debug!("businesses page: {} items, more: {}", items.len(), has_more);
        Ok(BusinessSearchResult {
            items,
            next_cursor,
            has_more,
        })
    }

    /// Every business matching `query`, page by page from `query.cursor`.
    ///
    /// Pages are fetched lazily as the stream is polled.
    pub fn iter_search(&self, query: BusinessQuery) -> impl Stream<Item = Result<Business>> + '_ {
        stream::try_unfold(Some(query), move |state| async move {
            let Some(mut query) = state else {
                return Ok::<_, OutscraperError>(None);
            };

            let page = self.search(&query).await?;
            let next = match page.next_cursor {
                Some(cursor) => {
                    query.cursor = Some(cursor);
                    Some(query)
                }
                None => {
                    if page.has_more {
                        warn!("businesses page reported more results without a cursor; stopping");
                    }
                    None
                }
            };
            Ok(Some((page.items, next)))
        })
        .map_ok(|items| stream::iter(items.into_iter().map(Ok::<Business, OutscraperError>)))
        .try_flatten()
    }

    /// A single business by its Outscraper id.
    pub async fn get_details(&self, business_id: &str, fields: &[String]) -> Result<Business> {
        let mut request = ApiRequest::get(format!("/businesses/{business_id}"));
        if !fields.is_empty() {
            request = request.param("fields", fields.join(","));
        }

        let body = self.client.send_json(&request).await?;
        check_envelope(&body)?;
        match body {
            Value::Object(map) => Ok(Business::from(map)),
            other => Err(OutscraperError::decode(
                &request.path,
                format!("expected an object, got {other}"),
            )),
        }
    }
}
