//! KML document encoding.

use std::fs::{self, OpenOptions};
use std::path::Path;

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::Error;

const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";
const PUSHPIN_STYLE_ID: &str = "pushpin";
/// Makes the balloon show the description and nothing else.
const BALLOON_TEXT: &str = "$[description]";

/// How placemarks are drawn, chosen once per document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MarkerStyle {
    /// One shared default marker for every placemark.
    Pushpin,
    /// Each placemark shows the photo thumbnail.
    #[default]
    Thumbnail,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PlacemarkStyle {
    /// Refers to the document-wide pushpin style.
    Shared,
    /// Own style with the given icon.
    Icon(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Placemark {
    pub name: Option<String>,
    /// HTML, embedded verbatim.
    pub description: String,
    pub lonlat: [f64; 2],
    pub style: PlacemarkStyle,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct KmlDocument {
    pub name: Option<String>,
    pub placemarks: Vec<Placemark>,
}

impl KmlDocument {
    fn uses_shared_style(&self) -> bool {
        self.placemarks
            .iter()
            .any(|p| p.style == PlacemarkStyle::Shared)
    }
}

/// Splits text into CDATA section bodies so that no section contains `]]>`.
///
/// ```
/// use flickr2kml::kml::cdata_sections;
/// assert_eq!(cdata_sections("<b>x</b>"), vec!["<b>x</b>"]);
/// assert_eq!(cdata_sections("a]]>b"), vec!["a]]", ">b"]);
/// assert_eq!(cdata_sections(""), vec![""]);
/// ```
pub fn cdata_sections(text: &str) -> Vec<String> {
    let parts: Vec<&str> = text.split("]]>").collect();
    let last = parts.len() - 1;
    parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            let mut section = String::new();
            if i > 0 {
                section.push('>');
            }
            section.push_str(part);
            if i < last {
                section.push_str("]]");
            }
            section
        })
        .collect()
}

fn encode_err(e: impl std::fmt::Display) -> Error {
    Error::Encode(e.to_string())
}

struct KmlWriter {
    xml: Writer<Vec<u8>>,
}

impl KmlWriter {
    fn event(&mut self, event: Event) -> Result<(), Error> {
        self.xml.write_event(event).map_err(encode_err)
    }

    fn start(&mut self, tag: &str) -> Result<(), Error> {
        self.event(Event::Start(BytesStart::new(tag)))
    }

    fn start_with_id(&mut self, tag: &str, id: &str) -> Result<(), Error> {
        let mut elem = BytesStart::new(tag);
        elem.push_attribute(("id", id));
        self.event(Event::Start(elem))
    }

    fn end(&mut self, tag: &str) -> Result<(), Error> {
        self.event(Event::End(BytesEnd::new(tag)))
    }

    fn text_element(&mut self, tag: &str, text: &str) -> Result<(), Error> {
        self.start(tag)?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(tag)
    }

    fn balloon_style(&mut self) -> Result<(), Error> {
        self.start("BalloonStyle")?;
        self.text_element("text", BALLOON_TEXT)?;
        self.end("BalloonStyle")
    }

    fn pushpin_style(&mut self) -> Result<(), Error> {
        self.start_with_id("Style", PUSHPIN_STYLE_ID)?;
        self.balloon_style()?;
        self.end("Style")
    }

    fn icon_style(&mut self, href: &str) -> Result<(), Error> {
        self.start("Style")?;
        self.start("IconStyle")?;
        self.start("Icon")?;
        self.text_element("href", href)?;
        self.end("Icon")?;
        self.end("IconStyle")?;
        self.balloon_style()?;
        self.end("Style")
    }

    fn placemark(&mut self, placemark: &Placemark) -> Result<(), Error> {
        self.start("Placemark")?;
        if let Some(name) = &placemark.name {
            self.text_element("name", name)?;
        }
        self.start("description")?;
        for section in cdata_sections(&placemark.description) {
            self.event(Event::CData(BytesCData::new(section)))?;
        }
        self.end("description")?;
        match &placemark.style {
            PlacemarkStyle::Shared => {
                self.text_element("styleUrl", &format!("#{PUSHPIN_STYLE_ID}"))?
            }
            PlacemarkStyle::Icon(href) => self.icon_style(href)?,
        }
        self.start("Point")?;
        let [lon, lat] = placemark.lonlat;
        self.text_element("coordinates", &format!("{lon},{lat}"))?;
        self.end("Point")?;
        self.end("Placemark")
    }
}

/// Encodes the whole document in memory.
pub fn encode_kml(doc: &KmlDocument) -> Result<Vec<u8>, Error> {
    let mut w = KmlWriter {
        xml: Writer::new_with_indent(Vec::new(), b' ', 2),
    };
    w.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut root = BytesStart::new("kml");
    root.push_attribute(("xmlns", KML_NAMESPACE));
    w.event(Event::Start(root))?;
    w.start("Document")?;
    if let Some(name) = &doc.name {
        w.text_element("name", name)?;
    }
    if doc.uses_shared_style() {
        w.pushpin_style()?;
    }
    for placemark in &doc.placemarks {
        w.placemark(placemark)?;
    }
    w.end("Document")?;
    w.end("kml")?;
    let mut bytes = w.xml.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

/// Checks that `path` can be written without touching it. An existing file
/// is opened for appending; otherwise a scratch file is created and removed
/// in its directory.
pub fn check_writable(path: &Path) -> Result<(), Error> {
    let write_err = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };
    if path.exists() {
        OpenOptions::new().append(true).open(path).map_err(write_err)?;
        return Ok(());
    }
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    Ok(())
}

/// Encodes the document and writes it to `path` in one go.
pub fn write_kml(doc: &KmlDocument, path: &Path) -> Result<(), Error> {
    let bytes = encode_kml(doc)?;
    fs::write(path, bytes).map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })
}
