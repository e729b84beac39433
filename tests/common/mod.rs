//! Fake Flickr REST endpoint shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::runtime::Runtime;

pub const API_KEY: &str = "test-key";
pub const USER_ID: &str = "12345678@N00";
pub const ALBUM_ID: &str = "72157700000000001";
pub const ALBUM_URL: &str = "https://www.flickr.com/photos/jdoe/albums/72157700000000001";

const REST_PATH: &str = "/services/rest/";

pub type Requests = Arc<Mutex<Vec<HashMap<String, String>>>>;

/// A photo as the API returns it. A zero latitude means no location.
pub fn photo(id: &str, latitude: f64) -> Value {
    let (lat, lon) = if latitude == 0.0 {
        (json!(0), json!(0))
    } else {
        (json!(latitude.to_string()), json!("6.8899"))
    };
    json!({
        "id": id,
        "secret": "abcdef",
        "server": "65535",
        "title": format!("Photo {id}"),
        "pathalias": "jdoe",
        "ownername": "J. Doe",
        "description": {"_content": format!("  About {id}  ")},
        "datetaken": "2019-07-14 10:21:03",
        "dateupload": "1563099663",
        "latitude": lat,
        "longitude": lon,
        "accuracy": "16",
        "url_sq": format!("https://live.staticflickr.com/65535/{id}_sq.jpg"),
        "height_sq": 75,
        "width_sq": 75,
        "url_m": format!("https://live.staticflickr.com/65535/{id}_m.jpg"),
        "height_m": 333,
        "width_m": "500",
    })
}

#[derive(Clone)]
struct AppState {
    title: String,
    pages: Arc<Vec<Vec<Value>>>,
    requests: Requests,
}

impl AppState {
    fn album_page(&self, params: &HashMap<String, String>) -> Value {
        if params.get("photoset_id").map(String::as_str) != Some(ALBUM_ID) {
            return json!({"stat": "fail", "code": 1, "message": "Photoset not found"});
        }
        let page: usize = params
            .get("page")
            .and_then(|p| p.parse().ok())
            .unwrap_or(1);
        let total: usize = self.pages.iter().map(Vec::len).sum();
        let photos = self.pages.get(page.saturating_sub(1)).cloned().unwrap_or_default();
        json!({
            "photoset": {
                "id": ALBUM_ID,
                "owner": USER_ID,
                "ownername": "J. Doe",
                "title": self.title,
                "page": page,
                "per_page": "500",
                "pages": self.pages.len(),
                "total": total.to_string(),
                "photo": photos,
            },
            "stat": "ok",
        })
    }
}

async fn rest(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.requests.lock().unwrap().push(params.clone());
    if params.get("api_key").map(String::as_str) != Some(API_KEY) {
        return Json(json!({
            "stat": "fail",
            "code": 100,
            "message": "Invalid API Key (Key has invalid format)",
        }));
    }
    let method = params.get("method").cloned().unwrap_or_default();
    Json(match method.as_str() {
        "flickr.test.echo" => json!({"method": {"_content": "flickr.test.echo"}, "stat": "ok"}),
        "flickr.urls.lookupUser" => json!({
            "user": {"id": USER_ID, "username": {"_content": "jdoe"}},
            "stat": "ok",
        }),
        "flickr.photosets.getPhotos" => state.album_page(&params),
        _ => json!({"stat": "fail", "code": 112, "message": "Method not found"}),
    })
}

/// A running fake API. Stops when dropped.
pub struct FakeFlickr {
    _runtime: Runtime,
    pub url: String,
    pub requests: Requests,
}

impl FakeFlickr {
    /// Serves one album whose pages hold the given photos.
    pub fn start(title: &str, pages: Vec<Vec<Value>>) -> Self {
        let runtime = Runtime::new().expect("tokio runtime");
        let requests = Requests::default();
        let state = AppState {
            title: title.to_string(),
            pages: Arc::new(pages),
            requests: Arc::clone(&requests),
        };
        let app = Router::new().route(REST_PATH, get(rest)).with_state(state);
        let listener = runtime
            .block_on(TcpListener::bind("127.0.0.1:0"))
            .expect("bind fake API");
        let addr = listener.local_addr().expect("local address");
        runtime.spawn(async move { axum::serve(listener, app).await });
        FakeFlickr {
            _runtime: runtime,
            url: format!("http://{addr}{REST_PATH}"),
            requests,
        }
    }

    /// Pages requested from `flickr.photosets.getPhotos`, in order.
    pub fn requested_pages(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.get("method").map(String::as_str) == Some("flickr.photosets.getPhotos"))
            .map(|r| r.get("page").cloned().unwrap_or_default())
            .collect()
    }
}
