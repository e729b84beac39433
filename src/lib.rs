use std::collections::HashMap;

use log::debug;

pub mod album;
pub mod cli;
pub mod config;
pub mod error;
pub mod flickr;
pub mod kml;
pub mod photo;
pub mod pipeline;
pub mod template;

pub use error::Error;

const ALBUM_URL_MARKER: &str = "flickr.com/photos/";

/// User supplied template variables, keyed by name.
pub type TemplateArgs = HashMap<String, String>;

/// An album, as given on the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlbumRef {
    pub album_id: String,
    pub url: String,
}

/// Extracts the album id from a Flickr album URL. Both the `albums` and the
/// older `sets` forms are accepted.
/// Example:
/// ```
/// use flickr2kml::parse_album_url;
/// let album = parse_album_url("https://www.flickr.com/photos/jdoe/albums/72157712345678901").unwrap();
/// assert_eq!(album.album_id, "72157712345678901");
/// assert_eq!(parse_album_url("flickr.com/photos/jdoe/sets/42/").unwrap().album_id, "42");
/// assert!(parse_album_url("https://www.flickr.com/photos/jdoe/albums/").is_err());
/// assert!(parse_album_url("https://example.com/photos/jdoe/albums/42").is_err());
/// ```
pub fn parse_album_url(url: &str) -> Result<AlbumRef, Error> {
    for (start, _) in url.match_indices(ALBUM_URL_MARKER) {
        let mut segments = url[start + ALBUM_URL_MARKER.len()..].split('/');
        let owner = segments.next().unwrap_or_default();
        let kind = segments.next().unwrap_or_default();
        let id: String = segments
            .next()
            .unwrap_or_default()
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        if !owner.is_empty() && (kind == "albums" || kind == "sets") && !id.is_empty() {
            return Ok(AlbumRef {
                album_id: id,
                url: url.to_string(),
            });
        }
    }
    Err(Error::InvalidParameter(format!(
        "Not a Flickr album URL: '{url}'"
    )))
}

/// Parses `KEY=VALUE` template arguments. The key is trimmed, the value is
/// kept as is and may itself contain `=`. All malformed arguments are
/// reported together.
/// Example:
/// ```
/// use flickr2kml::parse_template_args;
/// let args = parse_template_args(&["SIZE=300", "COLOR=red"]).unwrap();
/// assert_eq!(args["SIZE"], "300");
/// assert_eq!(args["COLOR"], "red");
/// assert_eq!(parse_template_args::<&str>(&[]).unwrap().len(), 0);
/// let err = parse_template_args(&["bad", "SIZE=1", "worse"]).unwrap_err();
/// assert_eq!(err.to_string(), "There were invalid template arguments: 'bad','worse'");
/// ```
pub fn parse_template_args<S: AsRef<str>>(args: &[S]) -> Result<TemplateArgs, Error> {
    let mut errors = vec![];
    let mut parsed = TemplateArgs::new();
    for arg in args {
        let arg = arg.as_ref();
        match arg.split_once('=') {
            Some((key, value)) => {
                let key = key.trim();
                debug!("Arg : '{}' => '{}'", key, value);
                parsed.insert(key.to_string(), value.to_string());
            }
            None => errors.push(format!("'{arg}'")),
        }
    }
    if !errors.is_empty() {
        return Err(Error::InvalidParameter(format!(
            "There were invalid template arguments: {}",
            errors.join(",")
        )));
    }
    Ok(parsed)
}
