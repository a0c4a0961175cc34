//! Fixtures shared by the unit tests.

use std::fs;
use std::sync::Arc;

pub use tempfile::TempDir;

use crate::config::Config;


pub const INDEX_HTML: &str = "<html><body>home</body></html>";
pub const NOT_FOUND_HTML: &str = "<html><body>not found</body></html>";
pub const NOT_SUPPORTED_HTML: &str = "<html><body>not supported</body></html>";
pub const CATALOG_JSON: &str = r#"[
  {"idPuntoVendita": 1, "denominazione": "Alfa", "indirizzo": "Via Uno 1", "cap": 10100,
   "comune": "Torino", "codProvincia": "TO", "urlSito": "http://alfa.example",
   "telefonoPrincipale": "011 1", "telefonoSecondario": null, "email": "alfa@example.com",
   "latitudine": 45.07, "longitudine": 7.68, "flagFisicoOnline": true, "idEsercente": 10,
   "ragioneSociale": "Alfa spa"},
  {"idPuntoVendita": 2, "denominazione": "Beta", "indirizzo": "Via Due 2", "cap": 20100,
   "comune": "Milano", "codProvincia": "MI", "urlSito": null,
   "telefonoPrincipale": "02 2", "telefonoSecondario": "02 3", "email": "beta@example.com",
   "latitudine": 45.46, "longitudine": 9.19, "flagFisicoOnline": false, "idEsercente": 20,
   "ragioneSociale": "Beta srl"}
]"#;


/// Fixture files inside a temp dir
pub trait WriteFixture {
    fn write(&self, relative: &str, content: &[u8]);
}

impl WriteFixture for TempDir {
    fn write(&self, relative: &str, content: &[u8]) {
        let target = self.path().join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(target, content).unwrap();
    }
}


/// Web root with the default, error and catalog documents
pub fn web_root() -> TempDir {
    let dir = tempfile::Builder::new().prefix("tabserve-www").tempdir().unwrap();
    dir.write("index.html", INDEX_HTML.as_bytes());
    dir.write("404.html", NOT_FOUND_HTML.as_bytes());
    dir.write("not_supported.html", NOT_SUPPORTED_HTML.as_bytes());
    dir.write("myfolder/punti-vendita.json", CATALOG_JSON.as_bytes());
    dir
}

pub fn config_for(root: &TempDir) -> Arc<Config> {
    let mut cfg = Config::default();
    cfg.files.web_root = root.path().to_path_buf();
    cfg.server.name = "tabserve-test".to_string();
    Arc::new(cfg)
}

/// Create `persona.db` in `dir` holding `rows`, returns its path
pub fn seed_sqlite_store(dir: &TempDir, rows: &[(i64, &str, &str, &str)]) -> String {
    let path = dir.path().join("persona.db");
    let connection = sqlite::open(&path).unwrap();
    connection
        .execute("CREATE TABLE persona (id INTEGER NOT NULL, nome TEXT, cognome TEXT, telefono TEXT);")
        .unwrap();
    for (id, first_name, last_name, phone) in rows {
        let mut stmt = connection.prepare("INSERT INTO persona VALUES (?, ?, ?, ?)").unwrap();
        stmt.bind((1, *id)).unwrap();
        stmt.bind((2, *first_name)).unwrap();
        stmt.bind((3, *last_name)).unwrap();
        stmt.bind((4, *phone)).unwrap();
        stmt.next().unwrap();
    }
    path.to_string_lossy().into_owned()
}
