//! Walks all pages of an album, keeping only georeferenced photos.

use log::{debug, info};

use crate::flickr::FlickrApi;
use crate::photo::{normalize, PhotoRecord};
use crate::Error;

/// The georeferenced photos of an album, in album order.
#[derive(Debug, Default)]
pub struct AlbumPhotos {
    pub title: Option<String>,
    pub records: Vec<PhotoRecord>,
    /// Number of photos in the album, with or without location.
    pub total: u32,
}

impl AlbumPhotos {
    /// Photos of the album that were dropped for lacking a location.
    pub fn skipped(&self) -> u32 {
        let geo = u32::try_from(self.records.len()).unwrap_or(u32::MAX);
        self.total.saturating_sub(geo)
    }
}

/// Fetches every page of an album and normalizes its photos.
///
/// Pages are requested one after the other, since the page count is only
/// known from the previous response.
pub fn fetch_geo_photos<A: FlickrApi + ?Sized>(
    api: &A,
    album_id: &str,
    user_id: &str,
) -> Result<AlbumPhotos, Error> {
    let mut album = AlbumPhotos::default();
    let mut page = 1;
    loop {
        let result = api.album_page(album_id, user_id, page)?;
        if page == 1 {
            info!(
                "Processing album '{}' with {} photos...",
                result.title.as_deref().unwrap_or(album_id),
                result.total
            );
            album.title = result.title;
        }
        album.total = result.total;
        let before = album.records.len();
        for raw in result.photos {
            if let Some(record) = normalize(raw, user_id, album_id)? {
                album.records.push(record);
            }
        }
        debug!(
            "Page {}/{}: {} georeferenced photos",
            page,
            result.pages,
            album.records.len() - before
        );
        if page >= result.pages {
            break;
        }
        page += 1;
    }
    Ok(album)
}
