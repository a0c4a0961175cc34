use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::api::{CatalogEntry, Format};
use crate::config::Config;
use crate::context::Context;
use crate::db::DB;
use crate::mime::{get_content_type, APPLICATION_XML, TEXT_HTML, TEXT_PLAIN};
use crate::response::{
    reason_phrase, Response, HEADER_LOCATION, HTTP_200, HTTP_301, HTTP_400, HTTP_404, HTTP_500, HTTP_501,
};
use crate::router::Route;
use crate::utils::Result;


const MODULE: &str = "HANDLERS";

const CATALOG_XML_ROOT: &str = "catalog";
const PERSONS_XML_ROOT: &str = "persons";

pub const CATALOG_ERROR: &str = "catalog error";


pub fn respond<W: Write>(out: &mut W, ctx: &mut Context, resp: &Response, send_body: bool) -> io::Result<()> {
    let result = resp.write_to(out, send_body);

    ctx.fix();
    match &result {
        Ok(sent) => info!(
            "Respond to [{}]: time: {}ms; status: {}; sent: {} bytes",
            ctx.qid, ctx.time_ms(), resp.status, sent
        ),
        Err(e) => error!(
            "[{}] Failed to respond to [{}] with status {}: {}",
            MODULE, ctx.qid, resp.status, e
        ),
    }
    result.map(|_| ())
}

/// Produce the response for an already classified request.
pub fn handle_route(route: Route, ctx: &Context) -> Response {
    let cfg = &ctx.cfg;
    match route {
        Route::StaticFile(file) => handle_static(&file, cfg),
        Route::Redirect(location) => {
            info!("[{}] Redirect [{}] to {}", MODULE, ctx.qid, location);
            Response::new(HTTP_301, &cfg.server.name).with_header(HEADER_LOCATION, &location)
        }
        Route::NotFound => error_document(HTTP_404, &cfg.files.not_found_document, cfg),
        Route::Unsupported => error_document(HTTP_501, &cfg.files.not_supported_document, cfg),
        Route::Conversion => handle_catalog(cfg),
        Route::StoreExport(format) => handle_store_export(format, cfg),
    }
}

pub fn handle_static(file: &Path, cfg: &Config) -> Response {
    match fs::read(file) {
        Ok(body) => {
            let content_type = get_content_type(file);
            debug!("[{}] File {} of type {} returned", MODULE, file.display(), content_type);
            Response::new(HTTP_200, &cfg.server.name).with_body(content_type, body)
        }
        Err(e) => {
            error!("[{}] Failed to read {}: {}", MODULE, file.display(), e);
            plain_error(HTTP_500, cfg)
        }
    }
}

pub fn handle_catalog(cfg: &Config) -> Response {
    match load_catalog(cfg) {
        Ok(body) => Response::new(HTTP_200, &cfg.server.name).with_body(APPLICATION_XML, body),
        Err(_) => plain_error(HTTP_500, cfg),
    }
}

fn load_catalog(cfg: &Config) -> Result<Vec<u8>> {
    let source = cfg.catalog_source();
    let data = fs::read(&source).map_err(|e| {
        error!("[{}] Could not read catalog {}: {}", MODULE, source.display(), e);
        CATALOG_ERROR
    })?;
    let entries: Vec<CatalogEntry> = serde_json::from_slice(&data).map_err(|e| {
        error!("[{}] Could not parse catalog {}: {}", MODULE, source.display(), e);
        CATALOG_ERROR
    })?;

    Format::Xml.encode(CATALOG_XML_ROOT, &entries)
}

pub fn handle_store_export(format: Format, cfg: &Config) -> Response {
    match export_persons(format, cfg) {
        Ok(body) => Response::new(HTTP_200, &cfg.server.name).with_body(format.content_type(), body),
        Err(e) => {
            error!("[{}] Store export failed: {}", MODULE, e);
            plain_error(HTTP_500, cfg)
        }
    }
}

fn export_persons(format: Format, cfg: &Config) -> Result<Vec<u8>> {
    let mut db = DB::connect(&cfg.store)?;
    let persons = db.select_persons();
    if let Ok(rows) = &persons {
        debug!("[{}] {} rows read from `{}` store", MODULE, rows.len(), db.get_kind());
    }
    if let Err(e) = db.close() {
        warn!("[{}] Closing store connection failed: {}", MODULE, e);
    }

    format.encode(PERSONS_XML_ROOT, &persons?)
}

pub fn bad_request(cfg: &Config) -> Response {
    plain_error(HTTP_400, cfg)
}

/// Static error page from the web root, or a plain text one if it can't be read
fn error_document(code: u16, document: &str, cfg: &Config) -> Response {
    let path = cfg.files.web_root.join(document);
    match fs::read(&path) {
        Ok(body) => Response::new(code, &cfg.server.name).with_body(TEXT_HTML, body),
        Err(e) => {
            warn!("[{}] Error document {} is unavailable: {}", MODULE, path.display(), e);
            plain_error(code, cfg)
        }
    }
}

fn plain_error(code: u16, cfg: &Config) -> Response {
    let message = format!("{}: {}", code, reason_phrase(code));
    Response::new(code, &cfg.server.name).with_body(TEXT_PLAIN, message.into_bytes())
}
