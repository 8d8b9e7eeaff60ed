//! In-memory [`Connection`] for tests.
//!
//! [`RecordingConnection`] records every statement it is given and answers
//! from scripted fixtures. Tests keep a [`RecordingHandle`] to script it and
//! inspect what ran after the connection has been moved into an adapter.

use crate::connection::{
    CatalogColumn, Connection, ExecResult, IndexDefinition, LargeObject, Row,
};
use crate::error::{AdapterError, Result};
use crate::sql::{classify_statement, StatementKind};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Loads `.env` from the working directory, if present.
#[cfg(feature = "test-helpers")]
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

#[derive(Debug)]
struct State {
    statements: Vec<String>,
    id_inserts: Vec<(String, i64)>,
    scripted: Vec<(String, Vec<Row>)>,
    failures: Vec<String>,
    affected: u64,
    columns: HashMap<String, Vec<CatalogColumn>>,
    tables: Vec<String>,
    primary_keys: HashMap<String, Vec<String>>,
    indexes: HashMap<String, Vec<IndexDefinition>>,
    catalog_calls: Vec<String>,
    lob_writes: Vec<LargeObject>,
    events: Vec<String>,
    product_name: String,
    database_name: Option<String>,
    last_insert_id: Option<i64>,
    connected: bool,
}

impl Default for State {
    fn default() -> Self {
        Self {
            statements: Vec::new(),
            id_inserts: Vec::new(),
            scripted: Vec::new(),
            failures: Vec::new(),
            affected: 1,
            columns: HashMap::new(),
            tables: Vec::new(),
            primary_keys: HashMap::new(),
            indexes: HashMap::new(),
            catalog_calls: Vec::new(),
            lob_writes: Vec::new(),
            events: Vec::new(),
            product_name: "Generic".to_string(),
            database_name: None,
            last_insert_id: None,
            connected: true,
        }
    }
}

impl State {
    fn check(&self, text: &str) -> Result<()> {
        if !self.connected {
            return Err(AdapterError::ConnectionClosed);
        }
        let lower = text.to_lowercase();
        match self.failures.iter().find(|f| lower.contains(f.as_str())) {
            Some(pattern) => Err(AdapterError::Structured {
                sqlstate: *b"42000",
                native_code: 942,
                message: format!("scripted failure ({}) for: {}", pattern, text),
            }),
            None => Ok(()),
        }
    }

    fn rows_for(&self, sql: &str) -> Option<Vec<Row>> {
        let lower = sql.to_lowercase();
        self.scripted
            .iter()
            .find(|(pattern, _)| lower.contains(pattern.as_str()))
            .map(|(_, rows)| rows.clone())
    }
}

fn table_key(table: &str) -> String {
    table.to_ascii_uppercase()
}

/// Shared view of a [`RecordingConnection`]'s script and log.
#[derive(Debug, Clone, Default)]
pub struct RecordingHandle {
    state: Arc<Mutex<State>>,
}

impl RecordingHandle {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Statements containing `pattern` (case-insensitive) return `rows`.
    /// The first matching script wins.
    pub fn script_rows(&self, pattern: &str, rows: Vec<Row>) {
        self.lock().scripted.push((pattern.to_lowercase(), rows));
    }

    /// Statements (and transaction events) containing `pattern` fail.
    pub fn fail_on(&self, pattern: &str) {
        self.lock().failures.push(pattern.to_lowercase());
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    pub fn set_affected(&self, affected: u64) {
        self.lock().affected = affected;
    }

    pub fn set_columns(&self, table: &str, columns: Vec<CatalogColumn>) {
        self.lock().columns.insert(table_key(table), columns);
    }

    pub fn set_tables(&self, tables: Vec<&str>) {
        self.lock().tables = tables.into_iter().map(str::to_string).collect();
    }

    pub fn set_primary_keys(&self, table: &str, keys: Vec<&str>) {
        self.lock()
            .primary_keys
            .insert(table_key(table), keys.into_iter().map(str::to_string).collect());
    }

    pub fn set_indexes(&self, table: &str, indexes: Vec<IndexDefinition>) {
        self.lock().indexes.insert(table_key(table), indexes);
    }

    pub fn set_product_name(&self, name: &str) {
        self.lock().product_name = name.to_string();
    }

    pub fn set_database_name(&self, name: &str) {
        self.lock().database_name = Some(name.to_string());
    }

    pub fn set_last_insert_id(&self, id: i64) {
        self.lock().last_insert_id = Some(id);
    }

    pub fn statements(&self) -> Vec<String> {
        self.lock().statements.clone()
    }

    pub fn last_statement(&self) -> Option<String> {
        self.lock().statements.last().cloned()
    }

    pub fn clear_statements(&self) {
        self.lock().statements.clear();
    }

    pub fn id_inserts(&self) -> Vec<(String, i64)> {
        self.lock().id_inserts.clone()
    }

    /// `columns:<table>:<schema>`-style entries for each catalog call.
    pub fn catalog_calls(&self) -> Vec<String> {
        self.lock().catalog_calls.clone()
    }

    pub fn lob_writes(&self) -> Vec<LargeObject> {
        self.lock().lob_writes.clone()
    }

    /// `begin`, `commit`, `rollback`, `reconnect` and `disconnect`, in order.
    pub fn events(&self) -> Vec<String> {
        self.lock().events.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }
}

#[derive(Debug, Default)]
pub struct RecordingConnection {
    handle: RecordingHandle,
}

impl RecordingConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product_name(name: &str) -> Self {
        let conn = Self::new();
        conn.handle.set_product_name(name);
        conn
    }

    pub fn handle(&self) -> RecordingHandle {
        self.handle.clone()
    }

    fn record(&self, sql: &str) -> MutexGuard<'_, State> {
        let mut state = self.handle.lock();
        state.statements.push(sql.to_string());
        state
    }

    fn catalog_call(&self, call: &str, table: Option<&str>, schema: Option<&str>) -> MutexGuard<'_, State> {
        let mut state = self.handle.lock();
        state.catalog_calls.push(format!(
            "{}:{}:{}",
            call,
            table.unwrap_or_default(),
            schema.unwrap_or_default()
        ));
        state
    }

    fn event(&self, name: &str) -> Result<()> {
        let mut state = self.handle.lock();
        state.check(name)?;
        state.events.push(name.to_string());
        Ok(())
    }
}

impl Connection for RecordingConnection {
    fn execute(&mut self, sql: &str) -> Result<ExecResult> {
        let state = self.record(sql);
        state.check(sql)?;
        match state.rows_for(sql) {
            Some(rows) => Ok(ExecResult::Rows(rows)),
            None if classify_statement(sql) == StatementKind::Query => {
                Ok(ExecResult::Rows(Vec::new()))
            }
            None => Ok(ExecResult::Affected(state.affected)),
        }
    }

    fn execute_query(&mut self, sql: &str) -> Result<Vec<Row>> {
        let state = self.record(sql);
        state.check(sql)?;
        Ok(state.rows_for(sql).unwrap_or_default())
    }

    fn execute_update(&mut self, sql: &str) -> Result<u64> {
        let state = self.record(sql);
        state.check(sql)?;
        Ok(state.affected)
    }

    fn execute_id_insert(&mut self, sql: &str, id: i64) -> Result<u64> {
        let mut state = self.record(sql);
        state.check(sql)?;
        state.id_inserts.push((sql.to_string(), id));
        Ok(state.affected)
    }

    fn columns(&mut self, table: &str, schema: Option<&str>) -> Result<Vec<CatalogColumn>> {
        let state = self.catalog_call("columns", Some(table), schema);
        state.check("catalog columns")?;
        Ok(state.columns.get(&table_key(table)).cloned().unwrap_or_default())
    }

    fn tables(&mut self, schema: Option<&str>) -> Result<Vec<String>> {
        let state = self.catalog_call("tables", None, schema);
        state.check("catalog tables")?;
        Ok(state.tables.clone())
    }

    fn indexes(&mut self, table: &str, schema: Option<&str>) -> Result<Vec<IndexDefinition>> {
        let state = self.catalog_call("indexes", Some(table), schema);
        state.check("catalog indexes")?;
        Ok(state.indexes.get(&table_key(table)).cloned().unwrap_or_default())
    }

    fn primary_keys(&mut self, table: &str, schema: Option<&str>) -> Result<Vec<String>> {
        let state = self.catalog_call("primary_keys", Some(table), schema);
        state.check("catalog primary_keys")?;
        Ok(state
            .primary_keys
            .get(&table_key(table))
            .cloned()
            .unwrap_or_default())
    }

    fn begin(&mut self) -> Result<()> {
        self.event("begin")
    }

    fn commit(&mut self) -> Result<()> {
        self.event("commit")
    }

    fn rollback(&mut self) -> Result<()> {
        self.event("rollback")
    }

    fn reconnect(&mut self) -> Result<()> {
        let mut state = self.handle.lock();
        state.connected = true;
        state.events.push("reconnect".to_string());
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        let mut state = self.handle.lock();
        state.connected = false;
        state.events.push("disconnect".to_string());
        Ok(())
    }

    fn write_large_object(&mut self, lob: &LargeObject) -> Result<()> {
        let mut state = self.handle.lock();
        state.check(&format!("write lob {}.{}", lob.table, lob.column))?;
        state.lob_writes.push(lob.clone());
        Ok(())
    }

    fn database_product_name(&mut self) -> Result<String> {
        Ok(self.handle.lock().product_name.clone())
    }

    fn database_name(&mut self) -> Result<Option<String>> {
        Ok(self.handle.lock().database_name.clone())
    }

    fn last_insert_id(&mut self) -> Result<Option<i64>> {
        Ok(self.handle.lock().last_insert_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_connection_records_and_scripts() {
        let mut conn = RecordingConnection::new();
        let handle = conn.handle();
        handle.script_rows("from dual", vec![[("X", 1i64)].into_iter().collect()]);
        handle.set_affected(3);

        let rows = conn.execute_query("SELECT 1 x FROM DUAL").expect("query");
        assert_eq!(rows.len(), 1);
        assert_eq!(conn.execute_update("DELETE FROM t").expect("update"), 3);
        assert!(matches!(
            conn.execute("SELECT * FROM t").expect("execute"),
            ExecResult::Rows(rows) if rows.is_empty()
        ));
        assert_eq!(
            handle.statements(),
            vec!["SELECT 1 x FROM DUAL", "DELETE FROM t", "SELECT * FROM t"]
        );
    }

    #[test]
    fn test_recording_connection_failures() {
        let mut conn = RecordingConnection::new();
        let handle = conn.handle();
        handle.fail_on("DROP SEQUENCE");
        handle.fail_on("commit");
        assert!(conn.execute_update("drop sequence t_seq").is_err());
        assert!(conn.execute_update("DROP TABLE t").is_ok());
        assert!(conn.commit().is_err());
        handle.clear_failures();
        assert!(conn.commit().is_ok());
        assert_eq!(handle.events(), vec!["commit"]);
    }

    #[test]
    fn test_recording_connection_disconnect() {
        let mut conn = RecordingConnection::new();
        conn.disconnect().expect("disconnect");
        assert!(matches!(
            conn.execute("SELECT 1"),
            Err(AdapterError::ConnectionClosed)
        ));
        conn.reconnect().expect("reconnect");
        assert!(conn.execute("SELECT 1").is_ok());
    }
}
