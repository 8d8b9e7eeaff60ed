use super::catalog::{CatalogColumn, CatalogQuery, CatalogSql};
use super::cell_reader::{read_cell, CellKind};
use super::row::Row;
use super::{group_index_rows, Connection, ExecResult, IndexDefinition, LargeObject};
use crate::error::{AdapterError, Result};
use crate::types::Value;
use odbc_api::{Connection as OdbcApiConnection, ConnectionOptions, Cursor, Environment, IntoParameter};
use std::sync::OnceLock;

static GLOBAL_ENV: OnceLock<std::result::Result<Environment, String>> = OnceLock::new();

/// Process-wide ODBC environment, created on first use.
pub fn global_environment() -> Result<&'static Environment> {
    let env = GLOBAL_ENV.get_or_init(|| {
        Environment::new().map_err(|e| format!("Failed to create ODBC environment: {}", e))
    });

    match env {
        Ok(environment) => Ok(environment),
        Err(msg) => {
            log::error!("{}", msg);
            Err(AdapterError::EnvironmentNotInitialized)
        }
    }
}

/// [`Connection`] over a single ODBC session.
pub struct OdbcConnection {
    conn: Option<OdbcApiConnection<'static>>,
    connection_string: String,
    login_timeout_sec: Option<u32>,
    catalog: CatalogSql,
}

impl OdbcConnection {
    pub fn connect(connection_string: &str, catalog: CatalogSql) -> Result<Self> {
        Self::connect_with_timeout(connection_string, catalog, None)
    }

    pub fn connect_with_timeout(
        connection_string: &str,
        catalog: CatalogSql,
        login_timeout_sec: Option<u32>,
    ) -> Result<Self> {
        if connection_string.trim().is_empty() {
            return Err(AdapterError::EmptyConnectionString);
        }
        let mut connection = Self {
            conn: None,
            connection_string: connection_string.to_string(),
            login_timeout_sec,
            catalog,
        };
        connection.open()?;
        Ok(connection)
    }

    fn open(&mut self) -> Result<()> {
        let env = global_environment()?;
        let opts = ConnectionOptions {
            login_timeout_sec: self.login_timeout_sec,
            ..ConnectionOptions::default()
        };
        let conn = env.connect_with_connection_string(&self.connection_string, opts)?;
        self.conn = Some(conn);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    fn live(&self) -> Result<&OdbcApiConnection<'static>> {
        self.conn.as_ref().ok_or(AdapterError::ConnectionClosed)
    }

    /// Runs a catalog query with up to two string parameters.
    fn catalog_rows(&self, sql: &str, params: &[&str]) -> Result<Vec<Row>> {
        let conn = self.live()?;
        let cursor = match params {
            [] => conn.execute(sql, (), None)?,
            [a] => {
                let p0 = (*a).into_parameter();
                conn.execute(sql, (&p0,), None)?
            }
            [a, b] => {
                let p0 = (*a).into_parameter();
                let p1 = (*b).into_parameter();
                conn.execute(sql, (&p0, &p1), None)?
            }
            _ => {
                return Err(AdapterError::InternalError(format!(
                    "catalog query takes at most 2 parameters, got {}",
                    params.len()
                )))
            }
        };
        match cursor {
            Some(mut cursor) => collect_rows(&mut cursor),
            None => Ok(Vec::new()),
        }
    }

    fn scoped_rows(
        &self,
        query: &CatalogQuery,
        table: Option<&str>,
        schema: Option<&str>,
    ) -> Result<Vec<Row>> {
        let schema = schema.map(str::trim).filter(|s| !s.is_empty());
        let sql = query.for_schema(schema);
        let params: Vec<&str> = table.into_iter().chain(schema).collect();
        self.catalog_rows(sql, &params)
    }
}

fn collect_rows(cursor: &mut impl Cursor) -> Result<Vec<Row>> {
    let cols_i16 = cursor.num_result_cols().map_err(AdapterError::from)?;
    let cols_u16: u16 = cols_i16
        .try_into()
        .map_err(|_| AdapterError::InternalError("Invalid column count".to_string()))?;

    let mut names = Vec::with_capacity(usize::from(cols_u16));
    let mut kinds = Vec::with_capacity(usize::from(cols_u16));
    for col_idx in 1..=cols_u16 {
        let col_name = cursor.col_name(col_idx).map_err(AdapterError::from)?;
        let col_type = cursor.col_data_type(col_idx).map_err(AdapterError::from)?;
        names.push(col_name.to_string());
        kinds.push(CellKind::from_data_type(&col_type));
    }

    let mut rows = Vec::new();
    while let Some(mut cursor_row) = cursor.next_row().map_err(AdapterError::from)? {
        let mut row = Row::with_capacity(names.len());
        for (idx, (name, kind)) in names.iter().zip(&kinds).enumerate() {
            let col_number: u16 = (idx + 1)
                .try_into()
                .map_err(|_| AdapterError::InternalError("Invalid column number".to_string()))?;
            row.insert(name.clone(), read_cell(&mut cursor_row, col_number, *kind)?);
        }
        rows.push(row);
    }
    Ok(rows)
}

impl Connection for OdbcConnection {
    fn execute(&mut self, sql: &str) -> Result<ExecResult> {
        let conn = self.live()?;
        let mut stmt = conn.preallocate()?;
        let rows = match stmt.execute(sql, ())? {
            Some(mut cursor) => Some(collect_rows(&mut cursor)?),
            None => None,
        };
        match rows {
            Some(rows) => Ok(ExecResult::Rows(rows)),
            None => Ok(ExecResult::Affected(
                stmt.row_count()?.map(|n| n as u64).unwrap_or(0),
            )),
        }
    }

    fn execute_query(&mut self, sql: &str) -> Result<Vec<Row>> {
        let conn = self.live()?;
        match conn.execute(sql, (), None)? {
            Some(mut cursor) => collect_rows(&mut cursor),
            None => Ok(Vec::new()),
        }
    }

    fn execute_update(&mut self, sql: &str) -> Result<u64> {
        let conn = self.live()?;
        let mut stmt = conn.preallocate()?;
        stmt.execute(sql, ())?;
        Ok(stmt.row_count()?.map(|n| n as u64).unwrap_or(0))
    }

    fn execute_id_insert(&mut self, sql: &str, id: i64) -> Result<u64> {
        let conn = self.live()?;
        let mut stmt = conn.preallocate()?;
        stmt.execute(sql, &id)?;
        Ok(stmt.row_count()?.map(|n| n as u64).unwrap_or(0))
    }

    fn columns(&mut self, table: &str, schema: Option<&str>) -> Result<Vec<CatalogColumn>> {
        let query = self.catalog.columns.clone();
        self.scoped_rows(&query, Some(table), schema)?
            .iter()
            .map(CatalogColumn::from_row)
            .collect()
    }

    fn tables(&mut self, schema: Option<&str>) -> Result<Vec<String>> {
        let query = self.catalog.tables.clone();
        Ok(self
            .scoped_rows(&query, None, schema)?
            .iter()
            .filter_map(|row| row.text_ci("table_name"))
            .collect())
    }

    fn indexes(&mut self, table: &str, schema: Option<&str>) -> Result<Vec<IndexDefinition>> {
        let Some(query) = self.catalog.indexes.clone() else {
            return Ok(Vec::new());
        };
        let rows = self.scoped_rows(&query, Some(table), schema)?;
        Ok(group_index_rows(table, &rows))
    }

    fn primary_keys(&mut self, table: &str, schema: Option<&str>) -> Result<Vec<String>> {
        let query = self.catalog.primary_keys.clone();
        Ok(self
            .scoped_rows(&query, Some(table), schema)?
            .iter()
            .filter_map(|row| row.text_ci("column_name"))
            .collect())
    }

    fn begin(&mut self) -> Result<()> {
        self.live()?.set_autocommit(false)?;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        let conn = self.live()?;
        conn.commit()?;
        conn.set_autocommit(true)?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        let conn = self.live()?;
        conn.rollback()?;
        conn.set_autocommit(true)?;
        Ok(())
    }

    fn reconnect(&mut self) -> Result<()> {
        self.conn = None;
        self.open()
    }

    fn disconnect(&mut self) -> Result<()> {
        // Dropping the handle disconnects.
        self.conn = None;
        Ok(())
    }

    fn write_large_object(&mut self, lob: &LargeObject) -> Result<()> {
        let conn = self.live()?;
        let sql = format!(
            "UPDATE {} SET {} = ? WHERE {} = {}",
            lob.table, lob.column, lob.primary_key, lob.id
        );
        match (&lob.value, lob.binary) {
            (Value::Binary(bytes), _) => {
                let p0 = bytes.as_slice().into_parameter();
                conn.execute(&sql, (&p0,), None)?;
            }
            (other, true) => {
                let bytes = other.to_text().unwrap_or_default().into_bytes();
                let p0 = bytes.as_slice().into_parameter();
                conn.execute(&sql, (&p0,), None)?;
            }
            (other, false) => {
                let text = other.to_text().unwrap_or_default();
                let p0 = text.as_str().into_parameter();
                conn.execute(&sql, (&p0,), None)?;
            }
        }
        Ok(())
    }

    fn database_product_name(&mut self) -> Result<String> {
        Ok(self.live()?.database_management_system_name()?)
    }

    fn database_name(&mut self) -> Result<Option<String>> {
        let name = self.live()?.current_catalog()?;
        Ok(Some(name).filter(|n| !n.is_empty()))
    }
}
