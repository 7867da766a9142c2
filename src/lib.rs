//! Client for the Outscraper scraping API.
//!
//! Every endpoint is a descriptor in [`endpoints::catalog`] and goes through
//! [`OutscraperClient::call`]. Requests the service queues are polled on the
//! request archive until they finish, unless the caller asks for the job
//! handle.

pub mod businesses;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod output;
pub mod transport;
pub mod utils;

pub use businesses::{BusinessQuery, BusinessesApi};
pub use client::{CallPlan, EndpointCall, OutscraperClient};
pub use config::{AppConfig, ClientConfig};
pub use endpoints::Endpoint;
pub use error::{OutscraperError, Result};
pub use models::{
    ArchiveRecord, Business, BusinessFilters, BusinessSearchResult, EndpointResult, Page,
    QueuedRequest, RequestStatus, TaskPage,
};
pub use transport::{ApiRequest, HttpTransport, RawResponse, Transport};
