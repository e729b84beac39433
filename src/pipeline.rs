//! End to end run: album → records → placemarks → KML file.

use std::path::PathBuf;

use log::{info, warn};

use crate::album::fetch_geo_photos;
use crate::flickr::{Credentials, FlickrApi, FlickrClient};
use crate::kml::{write_kml, KmlDocument, MarkerStyle, Placemark, PlacemarkStyle};
use crate::photo::PhotoRecord;
use crate::template::{Renderer, TemplateSource};
use crate::{AlbumRef, Error, TemplateArgs};

/// Everything a run needs, already validated.
#[derive(Clone, Debug)]
pub struct Settings {
    pub output: PathBuf,
    pub album: AlbumRef,
    pub template: TemplateSource,
    pub name_template: Option<PathBuf>,
    pub template_args: TemplateArgs,
    pub marker_style: MarkerStyle,
    pub credentials: Credentials,
    pub api_url: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Written { path: PathBuf, placemarks: usize },
    /// The album has no photo with a location; nothing was written.
    NoGeoPhotos,
}

fn build_placemark(
    renderer: &Renderer,
    record: &PhotoRecord,
    style: MarkerStyle,
) -> Result<Placemark, Error> {
    Ok(Placemark {
        name: renderer.render_name(record)?,
        description: renderer.render_description(record)?,
        lonlat: record.lonlat,
        style: match style {
            MarkerStyle::Pushpin => PlacemarkStyle::Shared,
            MarkerStyle::Thumbnail => PlacemarkStyle::Icon(record.icon_url.clone()),
        },
    })
}

/// Runs the whole pipeline against the Flickr REST API.
pub fn run(settings: &Settings) -> Result<Outcome, Error> {
    let client = FlickrClient::connect(&settings.api_url, &settings.credentials)?;
    run_with(&client, settings)
}

/// Runs the pipeline against any API implementation.
pub fn run_with<A: FlickrApi + ?Sized>(api: &A, settings: &Settings) -> Result<Outcome, Error> {
    // Templates are checked before any photo is fetched.
    let renderer = Renderer::new(
        &settings.template,
        settings.name_template.as_deref(),
        settings.template_args.clone(),
    )?;

    let user = api.lookup_user(&settings.album.url)?;
    let album = fetch_geo_photos(api, &settings.album.album_id, &user.id)?;

    let skipped = album.skipped();
    if skipped > 0 {
        warn!("{} photos in the album are not georeferenced", skipped);
    }
    if album.records.is_empty() {
        warn!("No georeferenced photo found in album! No KML will be generated.");
        return Ok(Outcome::NoGeoPhotos);
    }

    let placemarks = album
        .records
        .iter()
        .map(|record| build_placemark(&renderer, record, settings.marker_style))
        .collect::<Result<Vec<_>, _>>()?;
    let count = placemarks.len();
    let doc = KmlDocument {
        name: album.title,
        placemarks,
    };
    write_kml(&doc, &settings.output)?;
    info!(
        "Wrote {} placemarks to {}",
        count,
        settings.output.display()
    );
    Ok(Outcome::Written {
        path: settings.output.clone(),
        placemarks: count,
    })
}
