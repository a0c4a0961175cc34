//! Request classification.
//!
//! Every request maps to exactly one [`Route`]; matchers are tried in order
//! and the first hit wins.

use std::path::{Component, Path, PathBuf};

use crate::api::Format;
use crate::config::Config;
use crate::request::Request;


#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Existing file under the web root
    StaticFile(PathBuf),
    /// Catalog re-encoded as XML
    Conversion,
    /// Person table dump
    StoreExport(Format),
    /// Probable directory reference missing its trailing slash
    Redirect(String),
    NotFound,
    Unsupported,
}

type Matcher = fn(&str, &Config) -> Option<Route>;

const MATCHERS: &[Matcher] = &[
    match_conversion,
    match_store_export,
    match_static,
];


pub fn classify(req: &Request, cfg: &Config) -> Route {
    if !req.is_supported() {
        return Route::Unsupported;
    }
    let path = req.route_path();
    MATCHERS.iter()
        .find_map(|matcher| matcher(path, cfg))
        .unwrap_or(Route::NotFound)
}

fn match_conversion(path: &str, cfg: &Config) -> Option<Route> {
    path.ends_with(&cfg.catalog.route_suffix).then(|| Route::Conversion)
}

fn match_store_export(path: &str, cfg: &Config) -> Option<Route> {
    if path == cfg.store.json_route {
        Some(Route::StoreExport(Format::Json))
    } else if path == cfg.store.xml_route {
        Some(Route::StoreExport(Format::Xml))
    } else {
        None
    }
}

fn match_static(path: &str, cfg: &Config) -> Option<Route> {
    if path.ends_with('/') {
        let with_default = format!("{}{}", path, cfg.files.default_document);
        return Some(resolve_static(&with_default, &cfg.files.web_root));
    }
    Some(resolve_static(path, &cfg.files.web_root))
}


/// Look `path` up under `web_root`. A missing target without extension and
/// without trailing slash is taken for a directory and redirected.
pub fn resolve_static(path: &str, web_root: &Path) -> Route {
    let relative = match relative_path(path) {
        Some(relative) => relative,
        None => return Route::NotFound,
    };

    let file = web_root.join(relative);
    if file.is_file() {
        return Route::StaticFile(file);
    }
    if !has_extension(path) && !path.ends_with('/') {
        return Route::Redirect(format!("{}/", path));
    }
    Route::NotFound
}

/// URL path to a relative filesystem path; `None` when it would leave the web root.
fn relative_path(path: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(segment) => relative.push(segment),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(relative)
}

fn has_extension(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or(path);
    Path::new(last)
        .extension()
        .map_or(false, |ext| !ext.is_empty())
}
