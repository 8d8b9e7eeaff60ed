//! The adapter callers talk to.
//!
//! An [`Adapter`] owns one [`Connection`] and is bound to one [`Dialect`]
//! for its whole life. Every operation goes through the dialect, whose
//! defaults are the vendor-neutral behaviour; a matched dialect overrides
//! what its database does differently.

pub mod hooks;
pub mod schema_cache;

pub use hooks::{PostSaveHook, SavedRecord};
pub use schema_cache::SchemaCache;

use crate::config::AdapterConfig;
use crate::connection::{Connection, ExecResult, IndexDefinition, LargeObject, OdbcConnection, Row};
use crate::dialect::{Dialect, DialectRegistry, GenericDialect, InsertStrategy};
use crate::directory::{DirectoryLookup, OdbcDataSourceLookup};
use crate::error::{AdapterError, Result};
use crate::observability::SqlLogger;
use crate::schema::{
    ColumnDefinition, CreateTableOptions, DdlStatement, DropTableOptions, IndexTarget,
    TableDefinition,
};
use crate::sql::StatementKind;
use crate::types::{ColumnDescriptor, ColumnType, TypeMap, Value};
use log::Level;
use std::sync::Arc;

pub struct Adapter {
    config: AdapterConfig,
    connection: Box<dyn Connection>,
    dialect: Arc<dyn Dialect>,
    dialect_matched: bool,
    types: TypeMap,
    schema_cache: SchemaCache,
    hooks: Vec<Arc<dyn PostSaveHook>>,
    logger: SqlLogger,
}

impl Adapter {
    /// Resolves the dialect (asking the data source when needed) and opens
    /// an ODBC session.
    pub fn connect(config: AdapterConfig, registry: &DialectRegistry) -> Result<Self> {
        let lookup = OdbcDataSourceLookup::from_config(&config);
        Self::connect_with_lookup(config, registry, Some(&lookup as &dyn DirectoryLookup))
    }

    pub fn connect_with_lookup(
        mut config: AdapterConfig,
        registry: &DialectRegistry,
        lookup: Option<&dyn DirectoryLookup>,
    ) -> Result<Self> {
        let dialect = registry.resolve(&mut config, lookup)?;
        let catalog = dialect
            .as_deref()
            .map(|d| d.catalog_sql())
            .unwrap_or_default();
        let connection_string = config.connection_string()?;
        let login_timeout = config
            .option_u64("login_timeout")
            .and_then(|t| u32::try_from(t).ok());

        let logger = SqlLogger::from_config(&config);
        logger.log_connection(Level::Info, &connection_string, "opening");
        let connection =
            OdbcConnection::connect_with_timeout(&connection_string, catalog, login_timeout)?;
        Ok(Self::new(config, Box::new(connection), dialect))
    }

    /// Wraps an already-open connection, resolving the dialect from the
    /// configuration alone.
    pub fn with_connection(
        mut config: AdapterConfig,
        connection: Box<dyn Connection>,
        registry: &DialectRegistry,
    ) -> Result<Self> {
        let dialect = registry.resolve(&mut config, None)?;
        Ok(Self::new(config, connection, dialect))
    }

    /// Binds `dialect`, or generic behaviour when `None`.
    pub fn new(
        config: AdapterConfig,
        connection: Box<dyn Connection>,
        dialect: Option<Arc<dyn Dialect>>,
    ) -> Self {
        let dialect_matched = dialect.is_some();
        let dialect: Arc<dyn Dialect> = dialect.unwrap_or_else(|| Arc::new(GenericDialect::new()));
        let mut types = TypeMap::generic();
        dialect.modify_types(&mut types);
        let hooks = dialect.post_save_hooks();
        Self {
            schema_cache: SchemaCache::from_config(&config),
            logger: SqlLogger::from_config(&config),
            config,
            connection,
            dialect,
            dialect_matched,
            types,
            hooks,
        }
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    pub fn dialect_name(&self) -> &str {
        self.dialect.name()
    }

    /// True when no registered dialect matched.
    pub fn is_generic(&self) -> bool {
        !self.dialect_matched
    }

    pub fn adapter_name(&self) -> &str {
        self.dialect.adapter_name()
    }

    pub fn native_database_types(&self) -> &TypeMap {
        &self.types
    }

    // statements

    /// Runs any statement. Rows are post-processed by the dialect; anything
    /// else invalidates cached column metadata.
    pub fn execute(&mut self, sql: &str, name: Option<&str>) -> Result<ExecResult> {
        let logger = self.logger;
        let kind = self.dialect.classify(sql);
        let conn = self.connection.as_mut();
        let mut result = logger.log(sql, name, || match kind {
            StatementKind::Query => conn.execute_query(sql).map(ExecResult::Rows),
            StatementKind::Update => conn.execute_update(sql).map(ExecResult::Affected),
            StatementKind::Auto => conn.execute(sql),
        })?;
        match &mut result {
            ExecResult::Rows(rows) => {
                for row in rows.iter_mut() {
                    self.dialect.process_row(row);
                }
            }
            ExecResult::Affected(_) => self.schema_cache.clear(),
        }
        Ok(result)
    }

    pub fn select(&mut self, sql: &str, name: Option<&str>) -> Result<Vec<Row>> {
        let logger = self.logger;
        let conn = self.connection.as_mut();
        let mut rows = logger.log(sql, name, || conn.execute_query(sql))?;
        for row in rows.iter_mut() {
            self.dialect.process_row(row);
        }
        Ok(rows)
    }

    /// Rows as plain value lists, in column order.
    pub fn select_rows(&mut self, sql: &str, name: Option<&str>) -> Result<Vec<Vec<Value>>> {
        Ok(self
            .select(sql, name)?
            .into_iter()
            .map(Row::into_values)
            .collect())
    }

    pub fn select_one(&mut self, sql: &str, name: Option<&str>) -> Result<Option<Row>> {
        Ok(self.select(sql, name)?.into_iter().next())
    }

    /// First column of the first row.
    pub fn select_value(&mut self, sql: &str, name: Option<&str>) -> Result<Option<Value>> {
        Ok(self
            .select_one(sql, name)?
            .and_then(|row| row.first().cloned()))
    }

    pub fn update(&mut self, sql: &str, name: Option<&str>) -> Result<u64> {
        let logger = self.logger;
        let conn = self.connection.as_mut();
        let affected = logger.log(sql, name, || conn.execute_update(sql))?;
        self.schema_cache.clear();
        Ok(affected)
    }

    /// Inserts a row and returns its primary key value.
    ///
    /// A caller-supplied `id_value` wins; otherwise the dialect decides
    /// whether the key comes from a sequence or from the driver.
    pub fn insert(
        &mut self,
        sql: &str,
        name: Option<&str>,
        primary_key: Option<&str>,
        id_value: Option<Value>,
        sequence_name: Option<&str>,
    ) -> Result<Value> {
        let strategy = self
            .dialect
            .insert_strategy(sql, primary_key, id_value.as_ref(), sequence_name)?;
        match strategy {
            InsertStrategy::Execute => {
                self.update(sql, name)?;
                if let Some(id) = id_value.filter(|v| !v.is_null()) {
                    return Ok(id);
                }
                Ok(self
                    .connection
                    .last_insert_id()?
                    .map(Value::Integer)
                    .unwrap_or(Value::Null))
            }
            InsertStrategy::Sequence { sequence_name } => {
                let next_sql = self.dialect.next_sequence_value_sql(&sequence_name);
                let id = self
                    .select_one(&next_sql, None)?
                    .and_then(|row| row.get_ci("id").and_then(Value::as_i64))
                    .ok_or_else(|| {
                        AdapterError::StatementInvalid(format!(
                            "sequence {} returned no value",
                            sequence_name
                        ))
                    })?;
                let logger = self.logger;
                let conn = self.connection.as_mut();
                logger.log(sql, name, || conn.execute_id_insert(sql, id))?;
                self.schema_cache.clear();
                Ok(Value::Integer(id))
            }
        }
    }

    // catalog

    pub fn columns(&mut self, table: &str, name: Option<&str>) -> Result<Vec<ColumnDescriptor>> {
        let caches = self.dialect.caches_columns();
        if caches {
            if let Some(columns) = self.schema_cache.get(table) {
                return Ok(columns);
            }
        }

        let schema = self.dialect.catalog_schema(&self.config);
        let logger = self.logger;
        let conn = self.connection.as_mut();
        let catalog = logger.log(&format!("columns({})", table), name, || {
            conn.columns(table, schema.as_deref())
        })?;
        let primary_keys = self.connection.primary_keys(table, schema.as_deref())?;

        let dialect = &self.dialect;
        let columns: Vec<ColumnDescriptor> = catalog
            .into_iter()
            .map(|c| {
                let declaration = c.declaration();
                let primary = primary_keys
                    .iter()
                    .any(|pk| pk.eq_ignore_ascii_case(&c.column_name));
                let column_type = dialect.column_type(&declaration, primary);
                ColumnDescriptor::new(dialect.fold_identifier(&c.column_name), declaration, column_type)
                    .with_default(dialect.default_value(c.data_default.as_deref()))
                    .with_null(c.is_nullable())
                    .with_primary(primary)
            })
            .collect();

        if caches {
            self.schema_cache.put(table, columns.clone());
        }
        Ok(columns)
    }

    pub fn tables(&mut self) -> Result<Vec<String>> {
        let schema = self.dialect.catalog_schema(&self.config);
        let tables = self.connection.tables(schema.as_deref())?;
        Ok(tables
            .iter()
            .map(|t| self.dialect.fold_identifier(t))
            .collect())
    }

    pub fn indexes(&mut self, table: &str) -> Result<Vec<IndexDefinition>> {
        let schema = self.dialect.catalog_schema(&self.config);
        let indexes = self.connection.indexes(table, schema.as_deref())?;
        let dialect = &self.dialect;
        Ok(indexes
            .into_iter()
            .map(|index| IndexDefinition {
                table: index.table,
                name: dialect.fold_identifier(&index.name),
                unique: index.unique,
                columns: index
                    .columns
                    .iter()
                    .map(|c| dialect.fold_identifier(c))
                    .collect(),
            })
            .collect())
    }

    pub fn primary_keys(&mut self, table: &str) -> Result<Vec<String>> {
        let schema = self.dialect.catalog_schema(&self.config);
        let keys = self.connection.primary_keys(table, schema.as_deref())?;
        Ok(keys.iter().map(|k| self.dialect.fold_identifier(k)).collect())
    }

    pub fn primary_key(&mut self, table: &str) -> Result<Option<String>> {
        Ok(self.primary_keys(table)?.into_iter().next())
    }

    /// Primary key of `table` with the sequence that feeds it, if the
    /// dialect uses sequences.
    pub fn pk_and_sequence_for(&mut self, table: &str) -> Result<Option<(String, Option<String>)>> {
        Ok(self.primary_key(table)?.map(|pk| {
            let sequence = self.dialect.default_sequence_name(table, Some(&pk));
            (pk, sequence)
        }))
    }

    // transactions

    pub fn begin_transaction(&mut self) -> Result<()> {
        log::debug!("BEGIN");
        self.connection.begin()
    }

    pub fn commit(&mut self) -> Result<()> {
        log::debug!("COMMIT");
        self.connection.commit()
    }

    pub fn rollback(&mut self) -> Result<()> {
        log::debug!("ROLLBACK");
        self.connection.rollback()
    }

    /// Runs `f` in a transaction: commits on `Ok`, rolls back on `Err`.
    pub fn transaction<T>(&mut self, f: impl FnOnce(&mut Adapter) -> Result<T>) -> Result<T> {
        self.begin_transaction()?;
        match f(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = self.rollback() {
                    log::warn!("Rollback after failed transaction also failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }

    // types and quoting

    pub fn native_sql_to_type(&self, declaration: &str) -> (Option<ColumnType>, Option<u32>) {
        self.types.native_sql_to_type(declaration)
    }

    pub fn type_to_sql(
        &self,
        column_type: ColumnType,
        limit: Option<u32>,
        precision: Option<u32>,
        scale: Option<u32>,
    ) -> Result<String> {
        self.types.type_to_sql(column_type, limit, precision, scale)
    }

    pub fn type_cast(&self, value: &Value, column: &ColumnDescriptor) -> Value {
        self.dialect.type_cast(value, column)
    }

    pub fn quote(&self, value: &Value, column: Option<&ColumnDescriptor>) -> String {
        self.dialect.quote(value, column)
    }

    pub fn quote_string(&self, text: &str) -> String {
        self.dialect.quote_string(text)
    }

    pub fn quote_table_name(&self, name: &str) -> String {
        self.dialect.quote_table_name(name)
    }

    pub fn quote_column_name(&self, name: &str) -> String {
        self.dialect.quote_column_name(name)
    }

    pub fn quoted_true(&self) -> &str {
        self.dialect.quoted_true()
    }

    pub fn quoted_false(&self) -> &str {
        self.dialect.quoted_false()
    }

    pub fn quoted_date(&self, value: &Value) -> String {
        self.dialect.quoted_date(value)
    }

    // query shaping

    pub fn add_limit_offset(&self, sql: &str, limit: Option<u64>, offset: Option<u64>) -> String {
        self.dialect.add_limit_offset(sql, limit, offset)
    }

    pub fn distinct(&self, columns: &str, order_by: &str) -> String {
        self.dialect.distinct(columns, order_by)
    }

    pub fn add_order_by_for_association_limiting(&self, sql: &str, order_by: &str) -> String {
        self.dialect.add_order_by_for_association_limiting(sql, order_by)
    }

    pub fn table_alias_length(&self) -> usize {
        self.dialect.table_alias_length()
    }

    pub fn current_database(&mut self) -> Result<Option<String>> {
        match self.dialect.current_database_sql().map(str::to_string) {
            Some(sql) => Ok(self
                .select_value(&sql, Some("Current Database"))?
                .and_then(|v| v.to_text())),
            None => self.connection.database_name(),
        }
    }

    // DDL

    /// Runs `statements` in order. A failing best-effort statement is logged
    /// and skipped; a failing required one aborts the rest.
    fn run_ddl(&mut self, statements: Vec<DdlStatement>) -> Result<()> {
        for statement in statements {
            match self.execute(&statement.sql, None) {
                Ok(_) => {}
                Err(e) if statement.best_effort => {
                    log::warn!("Ignoring failure of '{}': {}", statement.sql, e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    pub fn create_table(
        &mut self,
        table: &TableDefinition,
        options: &CreateTableOptions,
    ) -> Result<()> {
        let statements =
            self.dialect
                .create_table_statements(table, options, &self.types, &self.config)?;
        if options.force {
            let drop_options = DropTableOptions {
                sequence_name: options.sequence_name.clone(),
            };
            let drops = self
                .dialect
                .drop_table_statements(&table.name, &drop_options)
                .into_iter()
                .map(|s| DdlStatement::best_effort(s.sql))
                .collect();
            self.run_ddl(drops)?;
        }
        self.run_ddl(statements)
    }

    pub fn drop_table(&mut self, name: &str, options: &DropTableOptions) -> Result<()> {
        let statements = self.dialect.drop_table_statements(name, options);
        self.run_ddl(statements)
    }

    pub fn rename_table(&mut self, name: &str, new_name: &str) -> Result<()> {
        let statements = self.dialect.rename_table_statements(name, new_name);
        self.run_ddl(statements)
    }

    pub fn add_column(&mut self, table: &str, column: &ColumnDefinition) -> Result<()> {
        let sql = self.dialect.add_column_sql(table, column, &self.types)?;
        self.execute(&sql, None).map(|_| ())
    }

    pub fn remove_column(&mut self, table: &str, column: &str) -> Result<()> {
        let sql = self.dialect.remove_column_sql(table, column);
        self.execute(&sql, None).map(|_| ())
    }

    pub fn rename_column(&mut self, table: &str, column: &str, new_name: &str) -> Result<()> {
        let sql = self.dialect.rename_column_sql(table, column, new_name);
        self.execute(&sql, None).map(|_| ())
    }

    pub fn change_column(&mut self, table: &str, column: &ColumnDefinition) -> Result<()> {
        let sql = self.dialect.change_column_sql(table, column, &self.types)?;
        self.execute(&sql, None).map(|_| ())
    }

    pub fn change_column_default(&mut self, table: &str, column: &str, default: &Value) -> Result<()> {
        let sql = self.dialect.change_column_default_sql(table, column, default);
        self.execute(&sql, None).map(|_| ())
    }

    pub fn remove_index(&mut self, table: &str, target: &IndexTarget) -> Result<()> {
        let sql = self
            .dialect
            .remove_index_sql(table, &target.index_name(table));
        self.execute(&sql, None).map(|_| ())
    }

    // whole schema

    pub fn structure_dump(&mut self) -> Result<String> {
        let dialect = Arc::clone(&self.dialect);
        dialect.structure_dump(self.connection.as_mut())
    }

    pub fn structure_drop(&mut self) -> Result<String> {
        let dialect = Arc::clone(&self.dialect);
        dialect.structure_drop(self.connection.as_mut())
    }

    pub fn recreate_database(&mut self, name: &str) -> Result<()> {
        self.drop_database(name)
    }

    /// Drops every table of the connected schema, for dialects where a
    /// database cannot be dropped on its own.
    pub fn drop_database(&mut self, name: &str) -> Result<()> {
        if !self.dialect.drops_tables_to_recreate() {
            return Err(AdapterError::UnsupportedFeature(format!(
                "dropping database {} with {}",
                name,
                self.adapter_name()
            )));
        }
        for table in self.tables()? {
            self.drop_table(&table, &DropTableOptions::default())?;
        }
        self.schema_cache.clear();
        Ok(())
    }

    // fixtures and hooks

    /// Inserts one fixture row, casting each value through its column, then
    /// runs the post-save hooks for it.
    pub fn insert_fixture(&mut self, fixture: &Row, table: &str) -> Result<u64> {
        let columns = self.columns(table, None)?;
        let mut names = Vec::with_capacity(fixture.len());
        let mut values = Vec::with_capacity(fixture.len());
        for (name, value) in fixture.iter() {
            let column = columns.iter().find(|c| c.name.eq_ignore_ascii_case(name));
            let value = match column {
                Some(column) => self.dialect.type_cast(value, column),
                None => value.clone(),
            };
            names.push(self.dialect.quote_column_name(name));
            values.push(self.dialect.quote(&value, column));
        }
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.dialect.quote_table_name(table),
            names.join(", "),
            values.join(", ")
        );
        let affected = self.update(&sql, Some("Fixture Insert"))?;

        if !self.hooks.is_empty() {
            let primary_key = columns
                .iter()
                .find(|c| c.primary)
                .map(|c| c.name.clone());
            if let Some(id) = primary_key
                .as_deref()
                .and_then(|pk| fixture.get_ci(pk))
                .filter(|v| !v.is_null())
            {
                let record = SavedRecord::new(table, primary_key.unwrap_or_default(), id.clone())
                    .with_columns(columns)
                    .with_values(fixture.clone());
                self.after_save(&record)?;
            }
        }
        Ok(affected)
    }

    pub fn register_post_save_hook(&mut self, hook: Arc<dyn PostSaveHook>) {
        log::debug!("Registered post-save hook {}", hook.name());
        self.hooks.push(hook);
    }

    pub fn post_save_hooks(&self) -> Vec<&str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    /// Runs every registered hook for `record`, stopping at the first error.
    pub fn after_save(&mut self, record: &SavedRecord) -> Result<()> {
        let hooks = self.hooks.clone();
        for hook in hooks {
            hook.after_save(self, record)?;
        }
        Ok(())
    }

    pub fn write_large_object(&mut self, lob: &LargeObject) -> Result<()> {
        let logger = self.logger;
        let conn = self.connection.as_mut();
        let description = format!("write_large_object({}.{})", lob.table, lob.column);
        logger.log(&description, Some("LOB"), || conn.write_large_object(lob))
    }

    // lifecycle

    pub fn reconnect(&mut self) -> Result<()> {
        self.schema_cache.clear();
        self.connection.reconnect()
    }

    pub fn disconnect(&mut self) -> Result<()> {
        self.connection.disconnect()
    }

    /// Runs the dialect's validation query.
    pub fn validate(&mut self) -> Result<()> {
        let sql = self.dialect.validation_query().to_string();
        self.select(&sql, Some("Validate")).map(|_| ())
    }
}

impl std::fmt::Debug for Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("dialect", &self.dialect.name())
            .field("generic", &self.is_generic())
            .field("hooks", &self.post_save_hooks())
            .finish()
    }
}
