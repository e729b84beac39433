//! Normalized, georeferenced photo records.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};

use crate::flickr::RawPhoto;
use crate::Error;

const PHOTO_PAGE_HOST: &str = "www.flickr.com";
const DATE_TAKEN_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
}

impl Orientation {
    /// Square photos count as landscape.
    pub fn from_size(width: u32, height: u32) -> Self {
        if height > width {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }
}

/// A photo with a location, ready to be rendered.
///
/// Serialized field names are the names available to templates.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PhotoRecord {
    pub id: String,
    pub title: String,
    pub ownername: Option<String>,
    pub pathalias: Option<String>,
    pub description: String,
    pub datetaken: String,
    /// Parsed `datetaken`, seen by templates as `datetaken_p`.
    #[serde(rename = "datetaken_p", serialize_with = "serialize_date_taken")]
    pub taken_at: NaiveDateTime,
    pub dateupload: Option<String>,
    pub tags: Option<String>,
    pub views: Option<String>,
    pub license: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<u32>,
    pub width_m: u32,
    pub height_m: u32,
    pub url_sq: String,
    pub url_t: Option<String>,
    pub url_s: Option<String>,
    pub url_m: String,
    pub url_l: Option<String>,
    pub url_h: Option<String>,
    pub url_k: Option<String>,
    pub url_3k: Option<String>,
    pub url_o: Option<String>,
    pub page_url: String,
    /// Longitude first, as KML expects.
    pub lonlat: [f64; 2],
    pub img_url: String,
    pub icon_url: String,
    pub orientation: Orientation,
}

fn serialize_date_taken<S: Serializer>(date: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&date.format(DATE_TAKEN_FORMAT))
}

/// Builds the public page URL of a photo, seen inside its album.
///
/// ```
/// use flickr2kml::photo::photo_page_url;
/// assert_eq!(
///     photo_page_url(Some("jdoe"), "12345@N00", "987", "42"),
///     "https://www.flickr.com/photos/jdoe/987/in/album-42/"
/// );
/// assert_eq!(
///     photo_page_url(Some(""), "12345@N00", "987", "42"),
///     "https://www.flickr.com/photos/12345@N00/987/in/album-42/"
/// );
/// ```
pub fn photo_page_url(pathalias: Option<&str>, user_id: &str, photo_id: &str, album_id: &str) -> String {
    let user_path = match pathalias {
        Some(alias) if !alias.is_empty() => alias,
        _ => user_id,
    };
    format!("https://{PHOTO_PAGE_HOST}/photos/{user_path}/{photo_id}/in/album-{album_id}/")
}

/// Parses the `datetaken` format of the API (`2019-07-14 10:21:03`).
///
/// ```
/// use flickr2kml::photo::parse_date_taken;
/// assert!(parse_date_taken("2019-07-14 10:21:03").is_some());
/// assert!(parse_date_taken("2019-07-14T10:21:03").is_some());
/// assert!(parse_date_taken("2019-07-14").is_some());
/// assert!(parse_date_taken("last summer").is_none());
/// ```
pub fn parse_date_taken(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATE_TAKEN_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn required<T>(value: Option<T>, photo_id: &str, field: &str) -> Result<T, Error> {
    value.ok_or_else(|| Error::malformed(photo_id, format!("missing field '{field}'")))
}

/// Converts a raw API entry into a record.
///
/// Returns `Ok(None)` for photos without a location (the API reports a
/// latitude of zero for those).
pub fn normalize(raw: RawPhoto, user_id: &str, album_id: &str) -> Result<Option<PhotoRecord>, Error> {
    let latitude = match raw.latitude {
        Some(lat) if lat != 0.0 => lat,
        _ => return Ok(None),
    };
    let id = raw.id;
    let longitude = required(raw.longitude, &id, "longitude")?;
    let url_m = required(raw.url_m, &id, "url_m")?;
    let url_sq = required(raw.url_sq, &id, "url_sq")?;
    let width_m = required(raw.width_m, &id, "width_m")?;
    let height_m = required(raw.height_m, &id, "height_m")?;
    let datetaken = required(raw.datetaken, &id, "datetaken")?;
    let taken_at = parse_date_taken(&datetaken)
        .ok_or_else(|| Error::malformed(&id, format!("unparseable date taken '{datetaken}'")))?;
    let description = raw
        .description
        .map(|d| d.content.trim().to_string())
        .unwrap_or_default();

    Ok(Some(PhotoRecord {
        page_url: photo_page_url(raw.pathalias.as_deref(), user_id, &id, album_id),
        lonlat: [longitude, latitude],
        img_url: url_m.clone(),
        icon_url: url_sq.clone(),
        orientation: Orientation::from_size(width_m, height_m),
        id,
        title: raw.title,
        ownername: raw.ownername,
        pathalias: raw.pathalias,
        description,
        datetaken,
        taken_at,
        dateupload: raw.dateupload,
        tags: raw.tags,
        views: raw.views,
        license: raw.license,
        latitude,
        longitude,
        accuracy: raw.accuracy,
        width_m,
        height_m,
        url_sq,
        url_t: raw.url_t,
        url_s: raw.url_s,
        url_m,
        url_l: raw.url_l,
        url_h: raw.url_h,
        url_k: raw.url_k,
        url_3k: raw.url_3k,
        url_o: raw.url_o,
    }))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;
    use speculoos::prelude::*;

    use super::*;
    use crate::flickr::Content;

    const USER: &str = "12345678@N00";
    const ALBUM: &str = "72157600000000000";

    fn geo_photo() -> RawPhoto {
        RawPhoto {
            id: "4242".to_string(),
            title: "Lac Blanc".to_string(),
            pathalias: Some("jdoe".to_string()),
            description: Some(Content {
                content: "  Early morning \n".to_string(),
            }),
            datetaken: Some("2019-07-14 06:21:03".to_string()),
            latitude: Some(45.9786),
            longitude: Some(6.8899),
            width_m: Some(500),
            height_m: Some(333),
            url_sq: Some("https://live.staticflickr.com/1/4242_sq.jpg".to_string()),
            url_m: Some("https://live.staticflickr.com/1/4242_m.jpg".to_string()),
            ..Default::default()
        }
    }

    #[rstest]
    #[case(Some(0.0))]
    #[case(None)]
    fn not_georeferenced_is_skipped(#[case] latitude: Option<f64>) {
        let mut raw = geo_photo();
        raw.latitude = latitude;
        let r = normalize(raw, USER, ALBUM).unwrap();
        assert_that!(r).is_none();
    }

    #[test]
    fn zero_latitude_skip_ignores_missing_fields() {
        let raw: RawPhoto = serde_json::from_value(json!({"id": "1", "latitude": "0"})).unwrap();
        assert_that!(normalize(raw, USER, ALBUM).unwrap()).is_none();
    }

    #[test]
    fn derived_fields() {
        let r = normalize(geo_photo(), USER, ALBUM).unwrap().unwrap();
        assert_that!(r.lonlat).is_equal_to([6.8899, 45.9786]);
        assert_that!(r.description.as_str()).is_equal_to("Early morning");
        assert_that!(r.img_url.as_str()).is_equal_to("https://live.staticflickr.com/1/4242_m.jpg");
        assert_that!(r.icon_url.as_str()).is_equal_to("https://live.staticflickr.com/1/4242_sq.jpg");
        assert_that!(r.orientation).is_equal_to(Orientation::Landscape);
        assert_that!(r.taken_at.to_string().as_str()).is_equal_to("2019-07-14 06:21:03");
    }

    #[rstest]
    #[case(Some("jdoe"), "https://www.flickr.com/photos/jdoe/4242/in/album-72157600000000000/")]
    #[case(None, "https://www.flickr.com/photos/12345678@N00/4242/in/album-72157600000000000/")]
    #[case(Some(""), "https://www.flickr.com/photos/12345678@N00/4242/in/album-72157600000000000/")]
    fn page_url_owner_path(#[case] alias: Option<&str>, #[case] expected: &str) {
        let mut raw = geo_photo();
        raw.pathalias = alias.map(String::from);
        let r = normalize(raw, USER, ALBUM).unwrap().unwrap();
        assert_that!(r.page_url.as_str()).is_equal_to(expected);
    }

    #[rstest]
    #[case(500, 333, Orientation::Landscape)]
    #[case(333, 500, Orientation::Portrait)]
    #[case(500, 500, Orientation::Landscape)]
    fn orientation(#[case] width: u32, #[case] height: u32, #[case] expected: Orientation) {
        let mut raw = geo_photo();
        raw.width_m = Some(width);
        raw.height_m = Some(height);
        let r = normalize(raw, USER, ALBUM).unwrap().unwrap();
        assert_that!(r.orientation).is_equal_to(expected);
    }

    #[test]
    fn missing_description_is_empty() {
        let mut raw = geo_photo();
        raw.description = None;
        let r = normalize(raw, USER, ALBUM).unwrap().unwrap();
        assert_that!(r.description.as_str()).is_equal_to("");
    }

    #[test]
    fn missing_medium_url_is_malformed() {
        let mut raw = geo_photo();
        raw.url_m = None;
        match normalize(raw, USER, ALBUM) {
            Err(Error::MalformedPhoto { photo_id, reason }) => {
                assert_that!(photo_id.as_str()).is_equal_to("4242");
                assert_that!(reason).contains("url_m");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn bad_date_is_malformed() {
        let mut raw = geo_photo();
        raw.datetaken = Some("yesterday".to_string());
        assert!(matches!(
            normalize(raw, USER, ALBUM),
            Err(Error::MalformedPhoto { .. })
        ));
    }

    #[test]
    fn parsed_date_is_exposed_as_datetaken_p() {
        let mut raw = geo_photo();
        raw.datetaken = Some("2019-07-14".to_string());
        let r = normalize(raw, USER, ALBUM).unwrap().unwrap();
        let v = serde_json::to_value(&r).unwrap();
        assert_that!(v["datetaken_p"]).is_equal_to(json!("2019-07-14 00:00:00"));
        assert_that!(v["datetaken"]).is_equal_to(json!("2019-07-14"));
        assert_that!(v.get("taken_at")).is_none();
    }

    #[test]
    fn orientation_serializes_lowercase() {
        let v = serde_json::to_value(Orientation::Portrait).unwrap();
        assert_that!(v).is_equal_to(json!("portrait"));
    }
}
