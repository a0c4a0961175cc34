use std::fmt::Display;

use mysql::prelude::{FromValue, Queryable};
use postgres::NoTls;
use sqlite::{OpenFlags, State};

use crate::api::Person;
use crate::config::StoreConfig;
use crate::logger::get_reporter;
use crate::utils::{ErrorStr, Result, ResultV};


const MODULE: &str = "DB";

const DB_SQLITE: &str = "sqlite";
const DB_MYSQL: &str = "mysql";
const DB_PGSQL: &str = "postgresql";

pub const KNOWN_KINDS: [&str; 3] = [DB_MYSQL, DB_PGSQL, DB_SQLITE];

/// Columns are read by position: id, first name, last name, phone.
/// NULL text columns are exported as empty strings.
const SELECT_ALL_SQL_QUERY: &str = "SELECT * FROM persona";

pub const SQLITE_ERROR: &str = "sqlite error";
pub const MYSQL_ERROR: &str = "mysql error";
pub const PGSQL_ERROR: &str = "pgsql error";
pub const UNKNOWN_DB_TYPE_ERROR: &str = "unknown db kind";


pub trait DbEngine: Send {
    /// Open a new connection to the store
    fn connect(cfg: &StoreConfig) -> Result<Self> where Self: Sized;

    /// Open a new connection to the store in the heap
    fn connect_boxed(cfg: &StoreConfig) -> Result<Box<Self>> where Self: Sized {
        Self::connect(cfg).map(Box::new)
    }

    /// Every row of the person table, in the order the store returns them
    fn select_all(&mut self) -> Result<Vec<Person>>;

    /// Release the connection. Dropping the engine closes it as well,
    /// engines with a fallible close report it here.
    fn close(self: Box<Self>) -> ResultV {
        Ok(())
    }
}

trait Reportable {
    fn report(e: impl Display) -> ErrorStr;
}


/// One store connection, owned by a single request.
///
/// The connection is closed by [`DB::close`] or, on any other exit path, on drop.
pub struct DB {
    kind: String,
    engine: Option<Box<dyn DbEngine>>,
}

impl DB {
    fn new_engine(cfg: &StoreConfig) -> Result<Box<dyn DbEngine>> {
        match cfg.kind.as_str() {
            DB_SQLITE => Ok(SqliteEngine::connect_boxed(cfg)?),
            DB_MYSQL  => Ok(MysqlEngine::connect_boxed(cfg)?),
            DB_PGSQL  => Ok(PostgresqlEngine::connect_boxed(cfg)?),
            _ => {
                error!("[{}] Unknown database kind: {}", MODULE, cfg.kind);
                Err(UNKNOWN_DB_TYPE_ERROR)
            }
        }
    }
    pub fn connect(cfg: &StoreConfig) -> Result<DB> {
        let engine = Self::new_engine(cfg)?;
        debug!("[{}] Connected to `{}` backend", MODULE, cfg.kind);
        Ok(DB { kind: cfg.kind.clone(), engine: Some(engine) })
    }
    pub fn select_persons(&mut self) -> Result<Vec<Person>> {
        match self.engine.as_mut() {
            Some(engine) => engine.select_all(),
            None => Err(UNKNOWN_DB_TYPE_ERROR),
        }
    }
    pub fn close(mut self) -> ResultV {
        self.release()
    }
    pub fn get_kind(&self) -> &str { &self.kind }

    fn release(&mut self) -> ResultV {
        match self.engine.take() {
            Some(engine) => {
                let closed = engine.close();
                debug!("[{}] Connection to `{}` backend closed", MODULE, self.kind);
                closed
            }
            None => Ok(()),
        }
    }
}

impl Drop for DB {
    fn drop(&mut self) {
        if self.release().is_err() {
            warn!("[{}] Connection to `{}` backend was not closed cleanly", MODULE, self.kind);
        }
    }
}


struct SqliteEngine {
    connection: sqlite::Connection,
}
struct MysqlEngine {
    connection: mysql::Conn,
}
struct PostgresqlEngine {
    client: postgres::Client,
}


impl Reportable for SqliteEngine {
    fn report(e: impl Display) -> ErrorStr {
        get_reporter(MODULE, "SQLite", SQLITE_ERROR)(e)
    }
}
impl Reportable for MysqlEngine {
    fn report(e: impl Display) -> ErrorStr {
        get_reporter(MODULE, "MySQL", MYSQL_ERROR)(e)
    }
}
impl Reportable for PostgresqlEngine {
    fn report(e: impl Display) -> ErrorStr {
        get_reporter(MODULE, "PostgreSQL", PGSQL_ERROR)(e)
    }
}


impl DbEngine for SqliteEngine {
    fn connect(cfg: &StoreConfig) -> Result<Self> {
        let flags = OpenFlags::new().set_read_only();
        Ok(SqliteEngine {
            connection: sqlite::Connection::open_with_flags(&cfg.database, flags).map_err(Self::report)?,
        })
    }
    fn select_all(&mut self) -> Result<Vec<Person>> {
        let mut stmt = self.connection.prepare(SELECT_ALL_SQL_QUERY).map_err(Self::report)?;

        let mut persons = Vec::new();
        while let State::Row = stmt.next().map_err(Self::report)? {
            persons.push(Person {
                id: stmt.read::<i64, _>(0usize).map_err(Self::report)?,
                first_name: Self::read_text(&stmt, 1)?,
                last_name: Self::read_text(&stmt, 2)?,
                phone: Self::read_text(&stmt, 3)?,
            });
        }
        Ok(persons)
    }
}
impl DbEngine for MysqlEngine {
    fn connect(cfg: &StoreConfig) -> Result<Self> {
        let opts = mysql::OptsBuilder::new()
            .ip_or_hostname(Some(cfg.host.as_str()))
            .tcp_port(cfg.port)
            .user(Some(cfg.user.as_str()))
            .pass(Some(cfg.password.as_str()))
            .db_name(Some(cfg.database.as_str()))
            .tcp_connect_timeout(cfg.connect_timeout());
        Ok(MysqlEngine {
            connection: mysql::Conn::new(opts).map_err(Self::report)?,
        })
    }
    fn select_all(&mut self) -> Result<Vec<Person>> {
        let rows = self.connection.query_iter(SELECT_ALL_SQL_QUERY).map_err(Self::report)?;
        rows.map(|row| {
            // Row::unwrap hands over the column values, nothing was taken from the row
            let row = row.map_err(Self::report)?;
            Self::read_person(row.unwrap())
        }).collect()
    }
}
impl DbEngine for PostgresqlEngine {
    fn connect(cfg: &StoreConfig) -> Result<Self> {
        let mut pg = postgres::Config::new();
        pg.host(&cfg.host)
            .port(cfg.port)
            .user(&cfg.user)
            .password(&cfg.password)
            .dbname(&cfg.database);
        if let Some(timeout) = cfg.connect_timeout() {
            pg.connect_timeout(timeout);
        }
        Ok(PostgresqlEngine {
            client: pg.connect(NoTls).map_err(Self::report)?,
        })
    }
    fn select_all(&mut self) -> Result<Vec<Person>> {
        let rows = self.client.query(SELECT_ALL_SQL_QUERY, &[]).map_err(Self::report)?;
        rows.iter().map(|row| {
            Ok(Person {
                id: Self::read_id(row)?,
                first_name: Self::read_text(row, 1)?,
                last_name: Self::read_text(row, 2)?,
                phone: Self::read_text(row, 3)?,
            })
        }).collect()
    }
    fn close(self: Box<Self>) -> ResultV {
        self.client.close().map_err(Self::report)
    }
}

impl SqliteEngine {
    fn read_text(stmt: &sqlite::Statement, idx: usize) -> Result<String> {
        stmt.read::<Option<String>, _>(idx)
            .map(Option::unwrap_or_default)
            .map_err(Self::report)
    }
}

impl MysqlEngine {
    /// Convert the row values positionally, extra columns are ignored.
    /// Values that don't fit (an out of range id, a missing column) fail the row.
    fn read_person(values: Vec<mysql::Value>) -> Result<Person> {
        let mut values = values.into_iter();
        Ok(Person {
            id: Self::read_value(values.next())?,
            first_name: Self::read_text(values.next())?,
            last_name: Self::read_text(values.next())?,
            phone: Self::read_text(values.next())?,
        })
    }

    fn read_value<T: FromValue>(value: Option<mysql::Value>) -> Result<T> {
        let value = value.ok_or_else(|| Self::report("row has too few columns"))?;
        mysql::from_value_opt::<T>(value).map_err(Self::report)
    }

    fn read_text(value: Option<mysql::Value>) -> Result<String> {
        Self::read_value::<Option<String>>(value).map(Option::unwrap_or_default)
    }
}

impl PostgresqlEngine {
    /// `id` may be declared either as `integer` or `bigint`
    fn read_id(row: &postgres::Row) -> Result<i64> {
        row.try_get::<_, i64>(0usize)
            .or_else(|_| row.try_get::<_, i32>(0usize).map(i64::from))
            .map_err(Self::report)
    }

    fn read_text(row: &postgres::Row, idx: usize) -> Result<String> {
        row.try_get::<_, Option<String>>(idx)
            .map(Option::unwrap_or_default)
            .map_err(Self::report)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::seed_sqlite_store;

    fn sqlite_cfg(path: &str) -> StoreConfig {
        StoreConfig { kind: DB_SQLITE.to_string(), database: path.to_string(), ..StoreConfig::default() }
    }

    #[test]
    fn sqlite_rows_keep_store_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = seed_sqlite_store(&dir, &[(2, "Carlo", "Dini", "456"), (1, "Anna", "Bruno", "123")]);

        let mut db = DB::connect(&sqlite_cfg(&path)).unwrap();
        assert_eq!(db.get_kind(), "sqlite");
        let persons = db.select_persons().unwrap();
        db.close().unwrap();

        let ids: Vec<i64> = persons.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(persons[1].first_name, "Anna");
        assert_eq!(persons[1].phone, "123");
    }

    #[test]
    fn empty_table_gives_no_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = seed_sqlite_store(&dir, &[]);
        let mut db = DB::connect(&sqlite_cfg(&path)).unwrap();
        assert!(db.select_persons().unwrap().is_empty());
    }

    #[test]
    fn missing_database_fails_to_connect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");
        let res = DB::connect(&sqlite_cfg(path.to_str().unwrap()));
        assert_eq!(res.err(), Some(SQLITE_ERROR));
    }

    #[test]
    fn missing_table_fails_the_query() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.db");
        sqlite::open(&path).unwrap().execute("CREATE TABLE other (x INTEGER);").unwrap();

        let mut db = DB::connect(&sqlite_cfg(path.to_str().unwrap())).unwrap();
        assert_eq!(db.select_persons(), Err(SQLITE_ERROR));
    }

    #[test]
    fn null_text_columns_are_exported_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("persona.db");
        sqlite::open(&path).unwrap().execute(
            "CREATE TABLE persona (id INTEGER NOT NULL, nome TEXT, cognome TEXT, telefono TEXT);
             INSERT INTO persona VALUES (1, 'Anna', NULL, NULL);
             INSERT INTO persona VALUES (2, 'Carlo', 'Dini', '456');"
        ).unwrap();

        let mut db = DB::connect(&sqlite_cfg(path.to_str().unwrap())).unwrap();
        let persons = db.select_persons().unwrap();
        assert_eq!(persons.len(), 2);
        assert_eq!(persons[0].first_name, "Anna");
        assert_eq!(persons[0].last_name, "");
        assert_eq!(persons[0].phone, "");
        assert_eq!(persons[1].phone, "456");
    }

    #[test]
    fn mysql_row_with_null_and_extra_columns() {
        use mysql::Value;

        let row = vec![
            Value::Bytes(b"1".to_vec()),
            Value::Bytes(b"Anna".to_vec()),
            Value::Bytes(b"Bruno".to_vec()),
            Value::NULL,
            Value::Bytes(b"ignored".to_vec()),
        ];
        let person = MysqlEngine::read_person(row).unwrap();
        assert_eq!(person, Person { id: 1, first_name: "Anna".into(), last_name: "Bruno".into(), phone: "".into() });
    }

    #[test]
    fn mysql_row_that_does_not_convert_is_an_error() {
        use mysql::Value;

        let out_of_range = vec![Value::UInt(u64::MAX), Value::NULL, Value::NULL, Value::NULL];
        assert_eq!(MysqlEngine::read_person(out_of_range), Err(MYSQL_ERROR));

        let too_short = vec![Value::Int(1), Value::Bytes(b"Anna".to_vec())];
        assert_eq!(MysqlEngine::read_person(too_short), Err(MYSQL_ERROR));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let cfg = StoreConfig { kind: "oracle".to_string(), ..StoreConfig::default() };
        assert_eq!(DB::connect(&cfg).err(), Some(UNKNOWN_DB_TYPE_ERROR));
    }
}
