//! Placemark text rendering with tera.
//!
//! Each record is serialized into a flat context, then the user supplied
//! template arguments are layered on top of it: an argument with the same
//! name as a photo field replaces that field.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use tera::{Context, Tera};

use crate::error::TemplateKind;
use crate::photo::PhotoRecord;
use crate::{Error, TemplateArgs};

/// Template argument used by the built-in templates for the image size.
pub const SIZE_ARG: &str = "SIZE";
pub const DEFAULT_SIZE: &str = "500";

const GEARTH_TEMPLATE: &str = include_str!("templates/gearth.html");
const MYMAPS_TEMPLATE: &str = include_str!("templates/mymaps.html");

// Autoescape is decided by tera from the template name.
const DESCRIPTION_NAME: &str = "description.html";
const NAME_NAME: &str = "name.txt";

/// Where the description template comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TemplateSource {
    /// Balloon layout for Google Earth.
    GoogleEarth,
    /// Layout for imports into Google My Maps.
    MyMaps,
    File(PathBuf),
}

impl From<&str> for TemplateSource {
    /// `gearth` and `mymaps` select a built-in template, anything else is a
    /// path.
    fn from(s: &str) -> Self {
        match s {
            "gearth" => TemplateSource::GoogleEarth,
            "mymaps" => TemplateSource::MyMaps,
            path => TemplateSource::File(PathBuf::from(path)),
        }
    }
}

impl TemplateSource {
    fn load(&self) -> Result<String, Error> {
        match self {
            TemplateSource::GoogleEarth => Ok(GEARTH_TEMPLATE.to_string()),
            TemplateSource::MyMaps => Ok(MYMAPS_TEMPLATE.to_string()),
            TemplateSource::File(path) => read_template(path),
        }
    }
}

/// HTML escaping as Jinja does it: unlike tera's default, `/` is left alone
/// so URLs stay readable.
///
/// ```
/// use flickr2kml::template::escape_html;
/// assert_eq!(escape_html("https://x.com/a?b=1&c=<\"'>"),
///            "https://x.com/a?b=1&amp;c=&lt;&#34;&#39;&gt;");
/// ```
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn read_template(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|source| Error::TemplateRead {
        path: path.to_path_buf(),
        source,
    })
}

pub struct Renderer {
    tera: Tera,
    has_name: bool,
    args: TemplateArgs,
}

impl Renderer {
    /// Loads and parses the templates. `SIZE` is added to `args` when the
    /// caller did not set it.
    pub fn new(
        description: &TemplateSource,
        name: Option<&Path>,
        mut args: TemplateArgs,
    ) -> Result<Self, Error> {
        debug!("Description template: {:?}, name template: {:?}", description, name);
        let mut tera = Tera::default();
        tera.autoescape_on(vec![DESCRIPTION_NAME]);
        tera.set_escape_fn(escape_html);

        let text = description.load()?;
        tera.add_raw_template(DESCRIPTION_NAME, &text)
            .map_err(|source| Error::TemplateParse {
                kind: TemplateKind::Description,
                source,
            })?;

        if let Some(path) = name {
            let text = read_template(path)?;
            tera.add_raw_template(NAME_NAME, &text)
                .map_err(|source| Error::TemplateParse {
                    kind: TemplateKind::Name,
                    source,
                })?;
        }

        args.entry(SIZE_ARG.to_string())
            .or_insert_with(|| DEFAULT_SIZE.to_string());

        Ok(Self {
            tera,
            has_name: name.is_some(),
            args,
        })
    }

    /// The variables visible to the templates for `record`.
    pub fn context(&self, record: &PhotoRecord) -> Result<Context, Error> {
        let mut context = Context::from_serialize(record).map_err(|source| {
            Error::TemplateRender {
                kind: TemplateKind::Description,
                photo_id: record.id.clone(),
                source,
            }
        })?;
        for (key, value) in &self.args {
            context.insert(key.as_str(), value);
        }
        Ok(context)
    }

    fn render(&self, kind: TemplateKind, record: &PhotoRecord) -> Result<String, Error> {
        let template = match kind {
            TemplateKind::Description => DESCRIPTION_NAME,
            TemplateKind::Name => NAME_NAME,
        };
        let context = self.context(record)?;
        self.tera.render(template, &context).map_err(|source| {
            debug!("Failed context: {}", context.clone().into_json());
            Error::TemplateRender {
                kind,
                photo_id: record.id.clone(),
                source,
            }
        })
    }

    /// HTML description, escaped by the engine.
    pub fn render_description(&self, record: &PhotoRecord) -> Result<String, Error> {
        self.render(TemplateKind::Description, record)
    }

    /// Plain text name, if a name template was given.
    pub fn render_name(&self, record: &PhotoRecord) -> Result<Option<String>, Error> {
        if !self.has_name {
            return Ok(None);
        }
        self.render(TemplateKind::Name, record).map(Some)
    }
}
