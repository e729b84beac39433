//! Minimal Flickr REST API client.
//!
//! Only the handful of methods needed to list the photos of a public album
//! are covered. Responses are decoded into typed structs at this boundary so
//! that the rest of the crate never deals with raw JSON.

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::Error;

pub const DEFAULT_API_URL: &str = "https://api.flickr.com/services/rest/";

/// Maximum page size accepted by `flickr.photosets.getPhotos`.
pub const PER_PAGE: u32 = 500;

/// Extra fields requested for each photo. `description` is undocumented for
/// this method but honored.
pub const PHOTO_EXTRAS: &str = "license,date_upload,date_taken,owner_name,original_format,geo,\
tags,views,path_alias,url_sq,url_t,url_s,url_m,url_l,url_h,url_k,url_3k,url_o,description";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// The API wraps free text in `{"_content": "..."}` objects.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Content {
    #[serde(rename = "_content", default)]
    pub content: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct User {
    pub id: String,
    pub username: Option<Content>,
}

/// One photo entry of an album page, as returned by the API.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawPhoto {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub ownername: Option<String>,
    pub pathalias: Option<String>,
    pub description: Option<Content>,
    pub datetaken: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub dateupload: Option<String>,
    pub tags: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub views: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub license: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub accuracy: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub width_m: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub height_m: Option<u32>,
    pub url_sq: Option<String>,
    pub url_t: Option<String>,
    pub url_s: Option<String>,
    pub url_m: Option<String>,
    pub url_l: Option<String>,
    pub url_h: Option<String>,
    pub url_k: Option<String>,
    pub url_3k: Option<String>,
    pub url_o: Option<String>,
}

/// One page of `flickr.photosets.getPhotos`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AlbumPage {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32_or_zero")]
    pub page: u32,
    #[serde(default, deserialize_with = "lenient_u32_or_zero")]
    pub pages: u32,
    #[serde(default, deserialize_with = "lenient_u32_or_zero")]
    pub total: u32,
    #[serde(rename = "photo", default)]
    pub photos: Vec<RawPhoto>,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Deserialize)]
struct AlbumEnvelope {
    photoset: AlbumPage,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    match Option::<NumberOrString>::deserialize(d)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrString::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("'{s}' is not a number"))),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<NumberOrString>::deserialize(d)? {
        None => None,
        Some(NumberOrString::Number(n)) => Some(n.to_string()),
        Some(NumberOrString::Text(s)) => Some(s),
    })
}

fn lenient_u32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    match lenient_f64(d)? {
        None => Ok(None),
        Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64 => Ok(Some(n as u32)),
        Some(n) => Err(serde::de::Error::custom(format!(
            "{n} is not a valid count"
        ))),
    }
}

fn lenient_u32_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    lenient_u32(d).map(Option::unwrap_or_default)
}

/// The calls the pipeline needs from Flickr.
pub trait FlickrApi {
    /// Resolves the owner of the page at `url`.
    fn lookup_user(&self, url: &str) -> Result<User, Error>;

    /// Fetches page `page` (1-based) of the photos of an album.
    fn album_page(&self, album_id: &str, user_id: &str, page: u32) -> Result<AlbumPage, Error>;
}

/// Credentials for the Flickr API. Only public albums are read, so calls are
/// made with the key alone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
}

/// Blocking HTTP client for the Flickr REST endpoint.
pub struct FlickrClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
}

impl FlickrClient {
    pub fn new(endpoint: &str, credentials: &Credentials) -> Result<Self, Error> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            api_key: credentials.api_key.clone(),
        })
    }

    /// Builds a client and checks that the API key is accepted.
    pub fn connect(endpoint: &str, credentials: &Credentials) -> Result<Self, Error> {
        let client = Self::new(endpoint, credentials)?;
        client.call::<Value>("flickr.test.echo", &[])?;
        debug!("API key accepted by {}", client.endpoint);
        Ok(client)
    }

    fn call<T: DeserializeOwned>(&self, method: &str, params: &[(&str, &str)]) -> Result<T, Error> {
        debug!("Calling {} with {:?}", method, params);
        let body: Value = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("method", method),
                ("api_key", self.api_key.as_str()),
                ("format", "json"),
                ("nojsoncallback", "1"),
            ])
            .query(params)
            .send()?
            .error_for_status()?
            .json()?;
        decode_response(body)
    }
}

/// Turns a JSON envelope into `T`, mapping `"stat": "fail"` to an API error.
pub fn decode_response<T: DeserializeOwned>(body: Value) -> Result<T, Error> {
    if body.get("stat").and_then(Value::as_str) == Some("fail") {
        let code = body.get("code").and_then(Value::as_i64).unwrap_or(-1);
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(Error::Api { code, message });
    }
    Ok(serde_json::from_value(body)?)
}

impl FlickrApi for FlickrClient {
    fn lookup_user(&self, url: &str) -> Result<User, Error> {
        let envelope: UserEnvelope = self.call("flickr.urls.lookupUser", &[("url", url)])?;
        Ok(envelope.user)
    }

    fn album_page(&self, album_id: &str, user_id: &str, page: u32) -> Result<AlbumPage, Error> {
        let page = page.to_string();
        let per_page = PER_PAGE.to_string();
        let envelope: AlbumEnvelope = self.call(
            "flickr.photosets.getPhotos",
            &[
                ("photoset_id", album_id),
                ("user_id", user_id),
                ("extras", PHOTO_EXTRAS),
                ("page", page.as_str()),
                ("per_page", per_page.as_str()),
            ],
        )?;
        Ok(envelope.photoset)
    }
}
