//! Discogs collection access and description extraction.
//!
//! The collection is fetched page by page from the Discogs API (or loaded from
//! a previously persisted document) and reduced to one vinyl description per
//! release for the enrichment pipeline.

mod client;
mod descriptions;
mod models;

pub use client::{DiscogsClient, FetchError, FetchedCollection, DEFAULT_DISCOGS_URL, PER_PAGE};
pub use descriptions::{extract_descriptions, DescriptionMap, DESCRIPTION_SEPARATOR};
pub use models::{BasicInformation, CollectionPage, CollectionRecord, Format, Pagination, RecordId};
