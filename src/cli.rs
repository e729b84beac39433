use std::env;
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

use gumdrop::Options;
use log::{debug, Level, LevelFilter};

use crate::config::load_config;
use crate::flickr::{Credentials, DEFAULT_API_URL};
use crate::kml::{check_writable, MarkerStyle};
use crate::pipeline::Settings;
use crate::template::TemplateSource;
use crate::{parse_album_url, parse_template_args, Error};

pub const API_KEY_ENV: &str = "FLICKR_API_KEY";
const SYSTEMD_LOG_ENV: &str = "RUST_LOG_SYSTEMD";

/// Generate a KML file for the georeferenced photos in a Flickr album.
#[derive(Debug, Options)]
pub struct CliOptions {
    #[options(free, help = "path of the KML file to write")]
    pub output: Vec<PathBuf>,

    #[options(help = "print help message")]
    pub help: bool,

    #[options(help = "URL of the Flickr album", meta = "URL", required)]
    pub flickr_album: String,

    #[options(
        help = "placemark description template: gearth, mymaps or a path to a custom template",
        meta = "NAME|PATH",
        default = "gearth"
    )]
    pub template: String,

    #[options(help = "path to a template for the placemark name", meta = "PATH")]
    pub name_template: Option<PathBuf>,

    #[options(
        help = "variable to pass to the templates (can be repeated)",
        short = "a",
        meta = "KEY=VALUE"
    )]
    pub template_arg: Vec<String>,

    #[options(help = "make each placemark a simple pushpin instead of a thumbnail")]
    pub pushpin: bool,

    #[options(no_short, help = "path to the API credentials file", meta = "PATH")]
    pub config: Option<PathBuf>,

    #[options(no_short, help = "Flickr API key (or $FLICKR_API_KEY)", meta = "KEY")]
    pub api_key: Option<String>,

    #[options(
        no_short,
        help = "Flickr REST endpoint",
        meta = "URL",
        default = "https://api.flickr.com/services/rest/"
    )]
    pub api_url: String,

    #[options(help = "show debug messages and full error details")]
    pub debug: bool,
}

pub fn parse_args_from<S: AsRef<str>>(args: &[S]) -> Result<CliOptions, String> {
    CliOptions::parse_args_default(args).map_err(|e| e.to_string())
}

fn syslog_priority(level: Level) -> u8 {
    match level {
        Level::Error => 3,
        Level::Warn => 4,
        Level::Info => 6,
        Level::Debug | Level::Trace => 7,
    }
}

/// Installs the global logger. `RUST_LOG` is honored, `debug` lowers this
/// crate's level to debug.
pub fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if debug {
        builder.filter_module(env!("CARGO_CRATE_NAME"), LevelFilter::Debug);
    }
    if env::var_os(SYSTEMD_LOG_ENV).is_some() {
        builder.format(|buf, record| {
            writeln!(
                buf,
                "<{}>{}: {}",
                syslog_priority(record.level()),
                record.target(),
                record.args()
            )
        });
    } else {
        builder.format(|buf, record| {
            let style = buf.default_level_style(record.level());
            writeln!(buf, "{style}{}{style:#}", record.args())
        });
    }
    // A logger may already be set when running under a test harness.
    let _ = builder.try_init();
}

fn pick(cli: Option<String>, env_var: &str, file: Option<String>) -> Option<String> {
    cli.or_else(|| env::var(env_var).ok().filter(|v| !v.is_empty()))
        .or(file)
}

/// Validates parsed options and resolves credentials.
///
/// Credentials come from the command line first, then the environment,
/// then the credentials file.
pub fn settings_from_options(opts: CliOptions) -> Result<Settings, Error> {
    let output = match opts.output.as_slice() {
        [path] => path.clone(),
        [] => return Err(Error::InvalidParameter("Missing output KML path".to_string())),
        _ => {
            return Err(Error::InvalidParameter(
                "Only one output KML path can be given".to_string(),
            ))
        }
    };
    if output.is_dir() {
        return Err(Error::InvalidParameter(format!(
            "Output path '{}' is a directory",
            output.display()
        )));
    }
    check_writable(&output)?;
    let album = parse_album_url(&opts.flickr_album)?;
    let template_args = parse_template_args(&opts.template_arg)?;

    let file = load_config(opts.config.as_deref())?;
    let api_key = pick(opts.api_key, API_KEY_ENV, file.api_key).ok_or_else(|| {
        Error::InvalidParameter(format!(
            "Missing Flickr API key: use --api-key, ${API_KEY_ENV} or the config file"
        ))
    })?;

    Ok(Settings {
        output,
        album,
        template: TemplateSource::from(opts.template.as_str()),
        name_template: opts.name_template,
        template_args,
        marker_style: if opts.pushpin {
            MarkerStyle::Pushpin
        } else {
            MarkerStyle::Thumbnail
        },
        credentials: Credentials { api_key },
        api_url: if opts.api_url.is_empty() {
            DEFAULT_API_URL.to_string()
        } else {
            opts.api_url
        },
    })
}

/// Parses the process arguments and sets up logging.
///
/// Returns `Ok(None)` when help was requested and printed.
pub fn init_binary() -> Result<Option<CliOptions>, String> {
    let args: Vec<String> = env::args_os()
        .skip(1)
        .map(OsString::into_string)
        .collect::<Result<_, _>>()
        .map_err(|a| format!("Argument {:?} is not valid UTF-8", a))?;
    let opts = parse_args_from(&args)?;
    init_logging(opts.debug);
    if opts.help_requested() {
        debug!("Help requested, showing usage and exiting.");
        eprintln!("Usage: {} [OPTIONS] OUTPUT_KML", env!("CARGO_PKG_NAME"));
        eprintln!();
        eprintln!("{}", CliOptions::usage());
        return Ok(None);
    }
    debug!("Starting up with the following options: {:?}", opts);
    Ok(Some(opts))
}
