//! The endpoint table. Field defaults and async thresholds are per endpoint
//! and intentionally not unified: neighbouring endpoints differ in where
//! the service starts queueing.

use super::AsyncParam::{Computed, Omitted, Requested};
use super::AsyncRule::{Always, Never, When};
use super::FieldDefault::{Bool, Int, Null, Str};
use super::HttpMethod::{Get, Post};
use super::QueryFormat::{Directions, Plain};
use super::Trigger::{AllOf, ParamEquals, ParamOver, QueriesOver};
use super::{Endpoint, Field, Trigger};

// ── Shared fields ─────────────────────────────────────────────────────────────

const FIELDS: Field = Field::new("fields", "fields", Null).comma_list();
const UI: Field = Field::new("ui", "ui", Null);
const WEBHOOK: Field = Field::new("webhook", "webhook", Null);
const LANGUAGE: Field = Field::new("language", "language", Str("en"));
const REGION: Field = Field::new("region", "region", Null);
const COORDINATES: Field = Field::new("coordinates", "coordinates", Null);
const CUTOFF: Field = Field::new("cutoff", "cutoff", Null).timestamp();
const ENRICHMENT: Field = Field::new("enrichment", "enrichment", Str("")).list();
const LIMIT_100: Field = Field::new("limit", "limit", Int(100));

// ── Shared thresholds ─────────────────────────────────────────────────────────

const MANY_QUERIES: &[Trigger] = &[QueriesOver(1)];
const BATCH_OF_10: &[Trigger] = &[QueriesOver(10)];
const BATCH_OF_50: &[Trigger] = &[QueriesOver(50)];
const LARGE_LIMIT: &[Trigger] = &[ParamOver { field: "limit", limit: 499 }, QueriesOver(10)];

const fn endpoint(name: &'static str, path: &'static str) -> Endpoint {
    Endpoint {
        name,
        aliases: &[],
        method: Get,
        path,
        query_format: Plain,
        fields: &[],
        rule: When(MANY_QUERIES),
        async_param: Computed,
        async_by_default: false,
    }
}

// ── Search engines ────────────────────────────────────────────────────────────

pub static GOOGLE_SEARCH: Endpoint = Endpoint {
    rule: When(&[QueriesOver(1), ParamOver { field: "pages_per_query", limit: 1 }]),
    async_param: Requested,
    fields: &[
        Field::new("pages_per_query", "pagesPerQuery", Int(1)),
        Field::new("uule", "uule", Null),
        LANGUAGE,
        REGION,
        FIELDS,
        UI,
        WEBHOOK,
    ],
    ..endpoint("google_search", "/google-search-v3")
};

pub static GOOGLE_SEARCH_NEWS: Endpoint = Endpoint {
    rule: When(&[QueriesOver(1), ParamOver { field: "pages_per_query", limit: 1 }]),
    async_param: Requested,
    fields: &[
        Field::new("pages_per_query", "pagesPerQuery", Int(1)),
        Field::new("uule", "uule", Null),
        Field::new("tbs", "tbs", Null),
        LANGUAGE,
        REGION,
        FIELDS,
        UI,
        WEBHOOK,
    ],
    ..endpoint("google_search_news", "/google-search-news")
};

pub static GOOGLE_SEARCH_V1: Endpoint = Endpoint {
    rule: Always,
    async_param: Omitted,
    fields: &[LANGUAGE, REGION],
    ..endpoint("google_search_v1", "/search")
};

// ── Google Maps ───────────────────────────────────────────────────────────────

pub static GOOGLE_MAPS_SEARCH: Endpoint = Endpoint {
    method: Post,
    rule: When(&[
        AllOf(&[QueriesOver(10), ParamOver { field: "limit", limit: 1 }]),
        QueriesOver(50),
    ]),
    fields: &[
        LANGUAGE,
        REGION,
        Field::new("limit", "organizationsPerQueryLimit", Int(20)),
        Field::new("skip", "skipPlaces", Int(0)),
        Field::new("coordinates", "coordinates", Str("")),
        Field::new("drop_duplicates", "dropDuplicates", Bool(false)),
        ENRICHMENT,
        FIELDS,
        Field::new("ui", "ui", Bool(false)),
        Field::new("webhook", "webhook", Str("")),
    ],
    ..endpoint("google_maps_search", "/google-maps-search")
};

pub static GOOGLE_MAPS_SEARCH_V1: Endpoint = Endpoint {
    rule: Always,
    async_param: Omitted,
    fields: &[
        COORDINATES,
        LANGUAGE,
        REGION,
        Field::new("limit", "organizationsPerQueryLimit", Int(500)),
        Field::new("extract_contacts", "extractContacts", Bool(false)),
        Field::new("drop_duplicates", "dropDuplicates", Bool(false)),
        FIELDS,
    ],
    ..endpoint("google_maps_search_v1", "/maps/search")
};

pub static GOOGLE_MAPS_SEARCH_V2: Endpoint = Endpoint {
    rule: Never,
    fields: &[
        LANGUAGE,
        REGION,
        Field::new("limit", "organizationsPerQueryLimit", Int(20)),
        Field::new("drop_duplicates", "dropDuplicates", Bool(false)),
    ],
    ..endpoint("google_maps_search_v2", "/maps/search-v2")
};

pub static GOOGLE_MAPS_SEARCH_V3: Endpoint = Endpoint {
    rule: When(&[AllOf(&[QueriesOver(10), ParamOver { field: "limit", limit: 1 }])]),
    fields: &[
        LANGUAGE,
        REGION,
        Field::new("limit", "organizationsPerQueryLimit", Int(20)),
        Field::new("skip", "skipPlaces", Int(0)),
        Field::new("drop_duplicates", "dropDuplicates", Bool(false)),
        ENRICHMENT,
        FIELDS,
        UI,
        WEBHOOK,
    ],
    ..endpoint("google_maps_search_v3", "/maps/search-v3")
};

pub static GOOGLE_MAPS_DIRECTIONS: Endpoint = Endpoint {
    query_format: Directions,
    rule: When(BATCH_OF_10),
    fields: &[
        Field::new("departure_time", "departure_time", Null).timestamp(),
        Field::new("finish_time", "finish_time", Null).timestamp(),
        Field::new("interval", "interval", Int(60)),
        Field::new("travel_mode", "travel_mode", Str("best")),
        LANGUAGE,
        REGION,
        FIELDS,
        UI,
        WEBHOOK,
    ],
    ..endpoint("google_maps_directions", "/maps/directions")
};

pub static GOOGLE_MAPS_REVIEWS: Endpoint = Endpoint {
    aliases: &["google_maps_business_reviews"],
    rule: When(&[
        ParamOver { field: "reviews_limit", limit: 499 },
        ParamEquals { field: "reviews_limit", value: 0 },
        QueriesOver(10),
    ]),
    fields: &[
        Field::new("reviews_limit", "reviewsLimit", Int(10)),
        Field::new("limit", "limit", Int(1)),
        Field::new("sort", "sort", Str("most_relevant")),
        Field::new("start", "start", Null).timestamp(),
        CUTOFF,
        Field::new("cutoff_rating", "cutoffRating", Null),
        Field::new("ignore_empty", "ignoreEmpty", Bool(false)),
        Field::new("reviews_query", "reviewsQuery", Null),
        Field::new("last_pagination_id", "lastPaginationId", Null),
        Field::new("source", "source", Null),
        LANGUAGE,
        REGION,
        FIELDS,
        UI,
        WEBHOOK,
    ],
    ..endpoint("google_maps_reviews", "/maps/reviews-v3")
};

pub static GOOGLE_MAPS_REVIEWS_V2: Endpoint = Endpoint {
    rule: Always,
    async_param: Omitted,
    fields: &[
        Field::new("reviews_limit", "reviewsLimit", Int(100)),
        Field::new("limit", "limit", Int(1)),
        Field::new("sort", "sort", Str("most_relevant")),
        Field::new("skip", "skip", Int(0)),
        Field::new("start", "start", Null).timestamp(),
        CUTOFF,
        Field::new("cutoff_rating", "cutoffRating", Null),
        Field::new("ignore_empty", "ignoreEmpty", Bool(false)),
        COORDINATES,
        LANGUAGE,
        REGION,
        FIELDS,
    ],
    ..endpoint("google_maps_reviews_v2", "/maps/reviews-v2")
};

pub static GOOGLE_MAPS_PHOTOS: Endpoint = Endpoint {
    rule: When(&[
        ParamOver { field: "photos_limit", limit: 499 },
        ParamEquals { field: "photos_limit", value: 0 },
        QueriesOver(10),
    ]),
    fields: &[
        Field::new("photos_limit", "photosLimit", Int(100)),
        Field::new("limit", "limit", Int(1)),
        Field::new("tag", "tag", Null),
        LANGUAGE,
        REGION,
        FIELDS,
        UI,
        WEBHOOK,
    ],
    ..endpoint("google_maps_photos", "/maps/photos-v3")
};

pub static GOOGLE_MAPS_PHOTOS_V1: Endpoint = Endpoint {
    rule: Always,
    async_param: Omitted,
    fields: &[
        Field::new("photos_limit", "photosLimit", Int(100)),
        Field::new("limit", "limit", Int(1)),
        COORDINATES,
        LANGUAGE,
        REGION,
    ],
    ..endpoint("google_maps_photos_v1", "/maps/photos")
};

// ── App stores & video ────────────────────────────────────────────────────────

pub static GOOGLE_PLAY_REVIEWS: Endpoint = Endpoint {
    rule: When(&[
        ParamOver { field: "reviews_limit", limit: 499 },
        ParamEquals { field: "reviews_limit", value: 0 },
        QueriesOver(10),
    ]),
    fields: &[
        Field::new("reviews_limit", "limit", Int(100)),
        Field::new("sort", "sort", Str("most_relevant")),
        CUTOFF,
        Field::new("rating", "rating", Null),
        LANGUAGE,
        FIELDS,
        UI,
        WEBHOOK,
    ],
    ..endpoint("google_play_reviews", "/google-play/reviews")
};

pub static APPLE_STORE_REVIEWS: Endpoint = Endpoint {
    rule: When(LARGE_LIMIT),
    fields: &[LIMIT_100, Field::new("sort", "sort", Str("mosthelpful")), CUTOFF, FIELDS, UI, WEBHOOK],
    ..endpoint("apple_store_reviews", "/appstore/reviews")
};

pub static YOUTUBE_COMMENTS: Endpoint = Endpoint {
    rule: When(&[ParamOver { field: "per_query", limit: 499 }, QueriesOver(10)]),
    fields: &[
        Field::new("per_query", "perQuery", Int(100)),
        LANGUAGE,
        REGION,
        FIELDS,
        UI,
        WEBHOOK,
    ],
    ..endpoint("youtube_comments", "/youtube-comments")
};

// ── Contacts & enrichment ─────────────────────────────────────────────────────

pub static CONTACTS_AND_LEADS: Endpoint = Endpoint {
    fields: &[
        FIELDS,
        Field::new("preferred_contacts", "preferred_contacts", Null).list(),
        Field::new("contacts_per_company", "contacts_per_company", Int(3)),
        Field::new("emails_per_contact", "emails_per_contact", Int(1)),
        Field::new("skip_contacts", "skip_contacts", Int(0)),
        Field::new("general_emails", "general_emails", Bool(false)),
        Field::new("ui", "ui", Bool(false)),
        WEBHOOK,
    ],
    ..endpoint("contacts_and_leads", "/contacts-and-leads")
};

pub static EMAILS_AND_CONTACTS: Endpoint = Endpoint {
    rule: Always,
    async_param: Omitted,
    fields: &[FIELDS],
    ..endpoint("emails_and_contacts", "/emails-and-contacts")
};

pub static PHONES_ENRICHER: Endpoint = Endpoint {
    rule: Always,
    async_param: Omitted,
    fields: &[FIELDS],
    ..endpoint("phones_enricher", "/phones-enricher")
};

pub static COMPANY_INSIGHTS: Endpoint = Endpoint {
    fields: &[FIELDS, ENRICHMENT],
    ..endpoint("company_insights", "/company-insights")
};

pub static VALIDATE_EMAILS: Endpoint = Endpoint {
    fields: &[],
    ..endpoint("validate_emails", "/email-validator")
};

pub static WHITEPAGES_PHONES: Endpoint = Endpoint {
    fields: &[FIELDS, UI, WEBHOOK],
    ..endpoint("whitepages_phones", "/whitepages-phones")
};

pub static WHITEPAGES_ADDRESSES: Endpoint = Endpoint {
    fields: &[FIELDS, UI, WEBHOOK],
    ..endpoint("whitepages_addresses", "/whitepages-addresses")
};

pub static SIMILARWEB: Endpoint = Endpoint {
    fields: &[FIELDS, UI, WEBHOOK],
    ..endpoint("similarweb", "/similarweb")
};

pub static COMPANY_WEBSITES_FINDER: Endpoint = Endpoint {
    fields: &[FIELDS, UI, WEBHOOK],
    ..endpoint("company_websites_finder", "/company-website-finder")
};

// ── E-commerce ────────────────────────────────────────────────────────────────

pub static AMAZON_PRODUCTS: Endpoint = Endpoint {
    rule: When(&[AllOf(&[QueriesOver(1), ParamOver { field: "limit", limit: 1 }])]),
    fields: &[
        Field::new("limit", "limit", Int(24)),
        Field::new("domain", "domain", Str("amazon.com")),
        Field::new("postal_code", "postal_code", Str("11201")),
        FIELDS,
        UI,
        WEBHOOK,
    ],
    ..endpoint("amazon_products", "/amazon/products-v2")
};

pub static AMAZON_REVIEWS: Endpoint = Endpoint {
    rule: When(&[AllOf(&[QueriesOver(1), ParamOver { field: "limit", limit: 10 }])]),
    fields: &[
        Field::new("limit", "limit", Int(10)),
        Field::new("sort", "sort", Str("helpful")),
        Field::new("filter_by_reviewer", "filterByReviewer", Str("all_reviews")),
        Field::new("filter_by_star", "filterByStar", Str("all_stars")),
        Field::new("domain", "domain", Null),
        FIELDS,
        UI,
        WEBHOOK,
    ],
    ..endpoint("amazon_reviews", "/amazon/reviews")
};

// ── Review platforms & directories ────────────────────────────────────────────

pub static YELP_SEARCH: Endpoint = Endpoint {
    rule: When(BATCH_OF_10),
    fields: &[LIMIT_100, FIELDS, UI, WEBHOOK],
    ..endpoint("yelp_search", "/yelp-search")
};

pub static YELP_REVIEWS: Endpoint = Endpoint {
    rule: When(LARGE_LIMIT),
    fields: &[LIMIT_100, Field::new("sort", "sort", Str("relevance_desc")), CUTOFF, FIELDS, UI, WEBHOOK],
    ..endpoint("yelp_reviews", "/yelp/reviews")
};

pub static TRIPADVISOR_REVIEWS: Endpoint = Endpoint {
    rule: When(LARGE_LIMIT),
    fields: &[LIMIT_100, CUTOFF, FIELDS, UI, WEBHOOK],
    ..endpoint("tripadvisor_reviews", "/tripadvisor/reviews")
};

pub static G2_REVIEWS: Endpoint = Endpoint {
    rule: When(LARGE_LIMIT),
    fields: &[LIMIT_100, Field::new("sort", "sort", Str("g2_default")), CUTOFF, FIELDS, UI, WEBHOOK],
    ..endpoint("g2_reviews", "/g2/reviews")
};

pub static TRUSTPILOT_REVIEWS: Endpoint = Endpoint {
    rule: When(LARGE_LIMIT),
    fields: &[
        LIMIT_100,
        Field::new("languages", "languages", Str("default")),
        Field::new("sort", "sort", Str("")),
        CUTOFF,
        FIELDS,
        UI,
        WEBHOOK,
    ],
    ..endpoint("trustpilot_reviews", "/trustpilot/reviews")
};

pub static TRUSTPILOT_SEARCH: Endpoint = Endpoint {
    fields: &[LIMIT_100, Field::new("skip", "skip", Int(0)), ENRICHMENT, FIELDS, UI, WEBHOOK],
    ..endpoint("trustpilot_search", "/trustpilot")
};

pub static TRUSTPILOT: Endpoint = Endpoint {
    fields: &[ENRICHMENT, FIELDS, UI, WEBHOOK],
    ..endpoint("trustpilot", "/trustpilot")
};

pub static GLASSDOOR_REVIEWS: Endpoint = Endpoint {
    rule: When(LARGE_LIMIT),
    fields: &[LIMIT_100, Field::new("sort", "sort", Str("DATE")), CUTOFF, FIELDS, UI, WEBHOOK],
    ..endpoint("glassdoor_reviews", "/glassdoor/reviews")
};

pub static CAPTERRA_REVIEWS: Endpoint = Endpoint {
    rule: When(LARGE_LIMIT),
    fields: &[
        LIMIT_100,
        Field::new("sort", "sort", Str("MOST_HELPFUL")),
        CUTOFF,
        LANGUAGE,
        REGION,
        FIELDS,
        UI,
        WEBHOOK,
    ],
    ..endpoint("capterra_reviews", "/capterra-reviews")
};

pub static YELLOWPAGES_SEARCH: Endpoint = Endpoint {
    rule: When(BATCH_OF_10),
    async_by_default: true,
    fields: &[
        Field::new("location", "location", Str("New York, NY")),
        LIMIT_100,
        REGION,
        ENRICHMENT,
        FIELDS,
        UI,
        WEBHOOK,
    ],
    ..endpoint("yellowpages_search", "/yellowpages-search")
};

// ── Geocoding ─────────────────────────────────────────────────────────────────

pub static GEOCODING: Endpoint = Endpoint {
    rule: When(BATCH_OF_50),
    fields: &[FIELDS, UI, WEBHOOK],
    ..endpoint("geocoding", "/geocoding")
};

pub static REVERSE_GEOCODING: Endpoint = Endpoint {
    rule: When(BATCH_OF_50),
    fields: &[FIELDS, UI, WEBHOOK],
    ..endpoint("reverse_geocoding", "/reverse-geocoding")
};

// ── Lookup ────────────────────────────────────────────────────────────────────

pub static ALL: &[&Endpoint] = &[
    &GOOGLE_SEARCH,
    &GOOGLE_SEARCH_NEWS,
    &GOOGLE_SEARCH_V1,
    &GOOGLE_MAPS_SEARCH,
    &GOOGLE_MAPS_SEARCH_V1,
    &GOOGLE_MAPS_SEARCH_V2,
    &GOOGLE_MAPS_SEARCH_V3,
    &GOOGLE_MAPS_DIRECTIONS,
    &GOOGLE_MAPS_REVIEWS,
    &GOOGLE_MAPS_REVIEWS_V2,
    &GOOGLE_MAPS_PHOTOS,
    &GOOGLE_MAPS_PHOTOS_V1,
    &GOOGLE_PLAY_REVIEWS,
    &APPLE_STORE_REVIEWS,
    &YOUTUBE_COMMENTS,
    &CONTACTS_AND_LEADS,
    &EMAILS_AND_CONTACTS,
    &PHONES_ENRICHER,
    &COMPANY_INSIGHTS,
    &VALIDATE_EMAILS,
    &WHITEPAGES_PHONES,
    &WHITEPAGES_ADDRESSES,
    &SIMILARWEB,
    &COMPANY_WEBSITES_FINDER,
    &AMAZON_PRODUCTS,
    &AMAZON_REVIEWS,
    &YELP_SEARCH,
    &YELP_REVIEWS,
    &TRIPADVISOR_REVIEWS,
    &G2_REVIEWS,
    &TRUSTPILOT_REVIEWS,
    &TRUSTPILOT_SEARCH,
    &TRUSTPILOT,
    &GLASSDOOR_REVIEWS,
    &CAPTERRA_REVIEWS,
    &YELLOWPAGES_SEARCH,
    &GEOCODING,
    &REVERSE_GEOCODING,
];

/// Look an endpoint up by name or deprecated alias.
pub fn find(name: &str) -> Option<&'static Endpoint> {
    ALL.iter()
        .copied()
        .find(|ep| ep.name == name || ep.aliases.contains(&name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let mut seen = HashSet::new();
        for ep in ALL {
            assert!(seen.insert(ep.name), "duplicate endpoint {}", ep.name);
            for alias in ep.aliases {
                assert!(seen.insert(alias), "alias {} collides", alias);
            }
        }
    }

    #[test]
    fn test_field_tables_are_well_formed() {
        for ep in ALL {
            let mut names = HashSet::new();
            for field in ep.fields {
                assert!(names.insert(field.name), "{}: duplicate field {}", ep.name, field.name);
                assert_ne!(field.remote, "query", "{}: query is implicit", ep.name);
                assert_ne!(field.remote, "async", "{}: async is derived", ep.name);
            }
            assert!(ep.path.starts_with('/'), "{}: bad path", ep.name);
        }
    }

    #[test]
    fn test_find_resolves_aliases() {
        assert_eq!(find("google_maps_reviews").map(|e| e.path), Some("/maps/reviews-v3"));
        assert_eq!(
            find("google_maps_business_reviews").map(|e| e.path),
            Some("/maps/reviews-v3")
        );
        assert!(find("bing_search").is_none());
    }

    #[test]
    fn test_only_maps_search_posts() {
        let posting: Vec<_> = ALL
            .iter()
            .filter(|e| e.method == Post)
            .map(|e| e.name)
            .collect();
        assert_eq!(posting, vec!["google_maps_search"]);
    }

    #[test]
    fn test_yellowpages_defaults_to_async() {
        assert!(YELLOWPAGES_SEARCH.async_by_default);
        assert_eq!(ALL.iter().filter(|e| e.async_by_default).count(), 1);
    }
}
