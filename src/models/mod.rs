use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Request archive ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequestStatus {
    Pending,
    Success,
    /// Any other terminal status the service reports.
    Other(String),
}

impl From<String> for RequestStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Pending" => RequestStatus::Pending,
            "Success" => RequestStatus::Success,
            _ => RequestStatus::Other(s),
        }
    }
}

impl From<RequestStatus> for String {
    fn from(status: RequestStatus) -> Self {
        match status {
            RequestStatus::Pending => "Pending".to_string(),
            RequestStatus::Success => "Success".to_string(),
            RequestStatus::Other(s) => s,
        }
    }
}

/// A job as stored under `/requests/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub status: RequestStatus,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ArchiveRecord {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// Handle of a request queued on the service side.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedRequest {
    pub id: String,
    /// Full response body, which also carries `status` and `results_location`.
    pub raw: Value,
}

/// What an endpoint call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum EndpointResult {
    /// Results, either from a synchronous answer or a finished archive.
    Data(Vec<Value>),
    /// The request was queued and the caller asked not to wait.
    Queued(QueuedRequest),
}

impl EndpointResult {
    pub fn data(&self) -> Option<&[Value]> {
        match self {
            EndpointResult::Data(d) => Some(d),
            EndpointResult::Queued(_) => None,
        }
    }

    pub fn into_data(self) -> Option<Vec<Value>> {
        match self {
            EndpointResult::Data(d) => Some(d),
            EndpointResult::Queued(_) => None,
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        match self {
            EndpointResult::Queued(q) => Some(&q.id),
            EndpointResult::Data(_) => None,
        }
    }
}

// ── Platform UI tasks ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPage {
    #[serde(default)]
    pub tasks: Vec<Value>,
    #[serde(default)]
    pub has_more: bool,
}

// ── Businesses ────────────────────────────────────────────────────────────────

/// Filters accepted by `/businesses`; unset values stay out of the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessFilters {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub os_ids: Vec<String>,

    #[serde(default, skip_serializing_if = "is_blank")]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub states: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cities: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub counties: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub postal_codes: Vec<String>,

    #[serde(default, skip_serializing_if = "is_blank")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_exclude: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_types: Vec<String>,

    /// Range expression such as `"4.5+"`.
    #[serde(default, skip_serializing_if = "is_blank")]
    pub rating: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub reviews: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_website: Option<bool>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub domain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_phone: Option<bool>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub business_statuses: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_service: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub geo_filters: Vec<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,

    #[serde(default, skip_serializing_if = "is_blank")]
    pub located_os_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broad_match: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_only: Option<bool>,
}

fn is_blank(v: &Option<String>) -> bool {
    v.as_deref().is_none_or(str::is_empty)
}

impl BusinessFilters {
    pub fn to_payload(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }
}

/// A business record. Named fields are typed views over the raw payload,
/// which is kept whole in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Business {
    pub os_id: Option<String>,
    pub place_id: Option<String>,
    pub google_id: Option<String>,

    pub name: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub rating: Option<f64>,
    pub reviews: Option<i64>,
    pub photo: Option<String>,
    pub types: Option<Vec<String>>,

    pub extra: Map<String, Value>,
}

fn field<T: DeserializeOwned>(data: &Map<String, Value>, key: &str) -> Option<T> {
    data.get(key)
        .filter(|v| !v.is_null())
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

impl From<Map<String, Value>> for Business {
    fn from(data: Map<String, Value>) -> Self {
        Business {
            os_id: field(&data, "os_id"),
            place_id: field(&data, "place_id"),
            google_id: field(&data, "google_id"),
            name: field(&data, "name"),
            phone: field(&data, "phone"),
            website: field(&data, "website"),
            address: field(&data, "address"),
            state: field(&data, "state"),
            postal_code: field(&data, "postal_code"),
            rating: field(&data, "rating"),
            reviews: field(&data, "reviews"),
            photo: field(&data, "photo"),
            types: field(&data, "types"),
            extra: data,
        }
    }
}

impl From<Business> for Map<String, Value> {
    fn from(b: Business) -> Self {
        b.into_map(true)
    }
}

impl Business {
    /// Build from any JSON value; non-objects yield an empty record.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => map.into(),
            _ => Business::default(),
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.clone().into_map(true))
    }

    /// Named fields that are set, then every raw key not already present.
    pub fn into_map(self, include_extra: bool) -> Map<String, Value> {
        let mut out = Map::new();
        let extra = &self.extra;

        named(&mut out, extra, "os_id", self.os_id);
        named(&mut out, extra, "place_id", self.place_id);
        named(&mut out, extra, "google_id", self.google_id);
        named(&mut out, extra, "name", self.name);
        named(&mut out, extra, "phone", self.phone);
        named(&mut out, extra, "website", self.website);
        named(&mut out, extra, "address", self.address);
        named(&mut out, extra, "state", self.state);
        named(&mut out, extra, "postal_code", self.postal_code);
        named(&mut out, extra, "rating", self.rating);
        named(&mut out, extra, "reviews", self.reviews);
        named(&mut out, extra, "photo", self.photo);
        named(&mut out, extra, "types", self.types);

        if include_extra {
            for (k, v) in self.extra {
                out.entry(k).or_insert(v);
            }
        }
        out
    }
}

// An unchanged field is written back with its raw representation, so `5`
// does not turn into `5.0`.
fn named<T>(out: &mut Map<String, Value>, extra: &Map<String, Value>, key: &str, value: Option<T>)
where
    T: Serialize + DeserializeOwned + PartialEq,
{
    let Some(value) = value else { return };
    let raw = extra
        .get(key)
        .filter(|_| field::<T>(extra, key).as_ref() == Some(&value))
        .cloned();
    let encoded = raw.unwrap_or_else(|| serde_json::to_value(&value).unwrap_or(Value::Null));
    out.insert(key.to_string(), encoded);
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref()
    }
}

pub type BusinessSearchResult = Page<Business>;
