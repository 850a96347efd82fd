//! SQLite task store
//!
//! The database lives in `.planner/planner.db` and holds four tables:
//!
//! | Table | Contents |
//! |-------|----------|
//! | `tasks` | One row per task; the anchor row of a recurring series |
//! | `repetitive_tasks` | Recurrence rule keyed by its task id |
//! | `excluded_repetitive_tasks` | Deleted single occurrences |
//! | `changed_repetitive_tasks` | Per-occurrence edits as a JSON object |
//!
//! Rows are decoded strictly. A row that does not match the expected shape
//! is logged and skipped; SQL failures are returned to the caller.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::types::FromSql;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{
    Category, ExclusionEntry, NewTask, OccurrenceChanges, OverrideEntry, ParseError,
    RecurrenceKind, RecurrenceRule, RuleRow, Task, TaskId, TaskSource, TaskTime, WeekdayMask,
    Window,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Task {0} does not repeat")]
    NotRecurring(TaskId),

    #[error("Invalid interval {0} (must be at least 1)")]
    InvalidInterval(u32),

    #[error("No weekdays selected")]
    EmptyWeekdays,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

const TASK_COLUMNS: &str =
    "t.id, t.date, t.start_time, t.end_time, t.basic_info, t.description, t.category";

const RULE_COLUMNS: &str = "r.id, r.type, r.count, t.date, r.end_date, r.weekdays";

/// SQLite-backed task storage
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Schema version - bump when the schema changes
    const SCHEMA_VERSION: i32 = 1;

    /// Opens or creates the database at `db_path`
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;

        let mut store = Self { conn };
        store.ensure_schema()?;

        Ok(store)
    }

    fn ensure_schema(&mut self) -> Result<()> {
        let current_version = self.schema_version()?;

        if current_version == 0 {
            self.create_schema()?;
        } else if current_version != Self::SCHEMA_VERSION {
            anyhow::bail!(
                "Unsupported database schema version {} (expected {})",
                current_version,
                Self::SCHEMA_VERSION
            );
        }

        Ok(())
    }

    /// Gets the current schema version
    pub fn schema_version(&self) -> Result<i32> {
        let result: Option<i32> = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .optional()?;

        Ok(result.unwrap_or(0))
    }

    fn create_schema(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY,
                date TEXT NOT NULL,
                start_time TEXT,
                end_time TEXT,
                basic_info TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                category INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS repetitive_tasks (
                id INTEGER PRIMARY KEY REFERENCES tasks(id) ON DELETE CASCADE,
                type INTEGER NOT NULL,
                count INTEGER NOT NULL,
                end_date TEXT,
                weekdays INTEGER
            );

            CREATE TABLE IF NOT EXISTS excluded_repetitive_tasks (
                id INTEGER NOT NULL REFERENCES repetitive_tasks(id) ON DELETE CASCADE,
                date TEXT NOT NULL,
                PRIMARY KEY (id, date)
            );

            CREATE TABLE IF NOT EXISTS changed_repetitive_tasks (
                id INTEGER NOT NULL REFERENCES repetitive_tasks(id) ON DELETE CASCADE,
                date TEXT NOT NULL,
                changes TEXT NOT NULL,
                PRIMARY KEY (id, date)
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_date ON tasks(date);
            ",
        )?;
        tx.execute_batch(&format!("PRAGMA user_version = {}", Self::SCHEMA_VERSION))?;
        tx.commit()?;

        Ok(())
    }

    /// Inserts a task and returns it with its assigned id
    pub fn create_task(&self, task: NewTask) -> Result<Task> {
        self.conn.execute(
            "INSERT INTO tasks (date, start_time, end_time, basic_info, description, category)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                task.date,
                task.start_time.map(|t| t.to_db_string()),
                task.end_time.map(|t| t.to_db_string()),
                task.basic_info,
                task.description,
                task.category.code(),
            ],
        )?;

        let id = TaskId::new(self.conn.last_insert_rowid());
        debug!(%id, "created task");
        Ok(task.into_task(id))
    }

    /// Loads a single task row; a row that fails to decode is an error here
    pub fn task(&self, id: TaskId) -> Result<Option<Task>> {
        let sql = format!("SELECT {} FROM tasks t WHERE t.id = ?1", TASK_COLUMNS);
        let decoded = self
            .conn
            .query_row(&sql, params![id.get()], |row| Ok(decode_task(row)))
            .optional()?;

        match decoded {
            Some(task) => Ok(Some(
                task.with_context(|| format!("Task {} is stored in an unreadable format", id))?,
            )),
            None => Ok(None),
        }
    }

    /// Deletes a task together with its rule and per-occurrence edits
    pub fn delete_task(&self, id: TaskId) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id.get()])?;
        if deleted == 0 {
            return Err(StoreError::TaskNotFound(id).into());
        }
        Ok(())
    }

    /// Loads the rule of a task, if it repeats
    pub fn rule(&self, id: TaskId) -> Result<Option<RecurrenceRule>> {
        Ok(self
            .fetch_rules(Some(std::slice::from_ref(&id)))?
            .into_iter()
            .next())
    }

    /// Makes a task repeat, replacing any previous rule.
    ///
    /// For [`RecurrenceKind::DayOfWeek`] the interval is the weekday mask.
    pub fn set_rule(
        &self,
        id: TaskId,
        kind: RecurrenceKind,
        interval: u32,
        end_date: Option<NaiveDate>,
    ) -> Result<RecurrenceRule> {
        let task = self.task(id)?.ok_or(StoreError::TaskNotFound(id))?;

        let (count, weekdays) = match kind {
            RecurrenceKind::DayOfWeek => {
                let mask = u8::try_from(interval)
                    .ok()
                    .and_then(WeekdayMask::from_bits)
                    .ok_or(StoreError::InvalidInterval(interval))?;
                if mask.is_empty() {
                    return Err(StoreError::EmptyWeekdays.into());
                }
                (1, Some(i64::from(mask.bits())))
            }
            _ if interval == 0 => return Err(StoreError::InvalidInterval(interval).into()),
            _ => (i64::from(interval), None),
        };

        self.conn.execute(
            "INSERT INTO repetitive_tasks (id, type, count, end_date, weekdays)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                type = excluded.type,
                count = excluded.count,
                end_date = excluded.end_date,
                weekdays = excluded.weekdays",
            params![id.get(), kind.code(), count, end_date, weekdays],
        )?;

        Ok(RecurrenceRule::new(id, kind, interval, task.date, end_date))
    }

    /// Stops a task from repeating; its exclusions and edits are dropped too
    pub fn clear_rule(&self, id: TaskId) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM repetitive_tasks WHERE id = ?1", params![id.get()])?;
        if deleted == 0 {
            return Err(StoreError::NotRecurring(id).into());
        }
        Ok(())
    }

    fn require_rule(&self, id: TaskId) -> Result<()> {
        let exists: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM repetitive_tasks WHERE id = ?1",
                params![id.get()],
                |row| row.get(0),
            )
            .optional()?;
        match exists {
            Some(_) => Ok(()),
            None => Err(StoreError::NotRecurring(id).into()),
        }
    }

    /// Deletes one occurrence of a series
    pub fn exclude_occurrence(&self, entry: ExclusionEntry) -> Result<()> {
        self.require_rule(entry.rule_id)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO excluded_repetitive_tasks (id, date) VALUES (?1, ?2)",
            params![entry.rule_id.get(), entry.date],
        )?;
        Ok(())
    }

    /// Records an edit to one occurrence, merged over any earlier edit of
    /// the same occurrence. Returns the stored result.
    pub fn upsert_override(&mut self, entry: OverrideEntry) -> Result<OverrideEntry> {
        self.require_rule(entry.rule_id)?;

        let tx = self.conn.transaction()?;
        let existing: Option<String> = tx
            .query_row(
                "SELECT changes FROM changed_repetitive_tasks WHERE id = ?1 AND date = ?2",
                params![entry.rule_id.get(), entry.date],
                |row| row.get(0),
            )
            .optional()?;

        let previous = match existing {
            Some(json) => serde_json::from_str::<OccurrenceChanges>(&json).unwrap_or_else(|e| {
                warn!(id = %entry.rule_id, date = %entry.date, error = %e, "replacing unreadable override");
                OccurrenceChanges::default()
            }),
            None => OccurrenceChanges::default(),
        };
        let changes = previous.merged_with(entry.changes);
        let json = serde_json::to_string(&changes).context("Failed to serialize override")?;

        tx.execute(
            "INSERT INTO changed_repetitive_tasks (id, date, changes) VALUES (?1, ?2, ?3)
             ON CONFLICT(id, date) DO UPDATE SET changes = excluded.changes",
            params![entry.rule_id.get(), entry.date, json],
        )?;
        tx.commit()?;

        Ok(OverrideEntry {
            rule_id: entry.rule_id,
            date: entry.date,
            changes,
        })
    }

    /// Runs a query and decodes every row, skipping the ones that fail
    fn query_decoded<T>(
        &self,
        table: &'static str,
        sql: &str,
        params: impl rusqlite::Params,
        decode: impl Fn(&Row<'_>) -> Result<T, ParseError>,
    ) -> Result<Vec<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| Ok(decode(row)))?;

        let mut decoded = Vec::new();
        let mut skipped = 0usize;
        for row in rows {
            match row? {
                Ok(value) => decoded.push(value),
                Err(e) => {
                    skipped += 1;
                    warn!(table, error = %e, "skipping unreadable row");
                }
            }
        }
        debug!(table, rows = decoded.len(), skipped, "fetched");

        Ok(decoded)
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn ids_param(ids: &[TaskId]) -> impl Iterator<Item = i64> + '_ {
    ids.iter().map(TaskId::get)
}

fn column<T: FromSql>(row: &Row<'_>, idx: usize, column: &'static str) -> Result<T, ParseError> {
    row.get(idx).map_err(|e| ParseError::Column {
        column,
        message: e.to_string(),
    })
}

fn time_column(row: &Row<'_>, idx: usize, name: &'static str) -> Result<Option<TaskTime>, ParseError> {
    let raw: Option<String> = column(row, idx, name)?;
    Ok(raw.map(|s| s.parse::<TaskTime>()).transpose()?)
}

fn decode_task(row: &Row<'_>) -> Result<Task, ParseError> {
    let id: i64 = column(row, 0, "id")?;
    let basic_info: Option<String> = column(row, 4, "basic_info")?;
    let description: Option<String> = column(row, 5, "description")?;
    let category: i64 = column(row, 6, "category")?;

    Ok(Task {
        id: TaskId::new(id),
        date: column(row, 1, "date")?,
        start_time: time_column(row, 2, "start_time")?,
        end_time: time_column(row, 3, "end_time")?,
        basic_info: basic_info.unwrap_or_default(),
        description: description.unwrap_or_default(),
        category: Category::from_code(category)?,
        repetition: None,
    })
}

fn decode_rule(row: &Row<'_>) -> Result<RecurrenceRule, ParseError> {
    RecurrenceRule::try_from(RuleRow {
        id: column(row, 0, "id")?,
        code: column(row, 1, "type")?,
        interval: column(row, 2, "count")?,
        start_date: column(row, 3, "date")?,
        end_date: column(row, 4, "end_date")?,
        weekdays: column(row, 5, "weekdays")?,
    })
}

fn decode_exclusion(row: &Row<'_>) -> Result<ExclusionEntry, ParseError> {
    let id: i64 = column(row, 0, "id")?;
    Ok(ExclusionEntry::new(TaskId::new(id), column(row, 1, "date")?))
}

fn decode_override(row: &Row<'_>) -> Result<OverrideEntry, ParseError> {
    let id: i64 = column(row, 0, "id")?;
    let json: String = column(row, 2, "changes")?;
    let changes: OccurrenceChanges =
        serde_json::from_str(&json).map_err(|e| ParseError::Changes(e.to_string()))?;

    Ok(OverrideEntry {
        rule_id: TaskId::new(id),
        date: column(row, 1, "date")?,
        changes,
    })
}

impl TaskSource for Store {
    fn fetch_rules(&self, ids: Option<&[TaskId]>) -> Result<Vec<RecurrenceRule>> {
        match ids {
            None => {
                let sql = format!(
                    "SELECT {} FROM repetitive_tasks r JOIN tasks t ON t.id = r.id ORDER BY r.id",
                    RULE_COLUMNS
                );
                self.query_decoded("repetitive_tasks", &sql, [], decode_rule)
            }
            Some([]) => Ok(Vec::new()),
            Some(ids) => {
                let sql = format!(
                    "SELECT {} FROM repetitive_tasks r JOIN tasks t ON t.id = r.id
                     WHERE r.id IN ({}) ORDER BY r.id",
                    RULE_COLUMNS,
                    placeholders(ids.len())
                );
                self.query_decoded("repetitive_tasks", &sql, params_from_iter(ids_param(ids)), decode_rule)
            }
        }
    }

    fn fetch_active_rules(&self, window: &Window) -> Result<Vec<RecurrenceRule>> {
        // Anchors inside the window are kept so they are never listed as plain tasks
        let sql = format!(
            "SELECT {} FROM repetitive_tasks r JOIN tasks t ON t.id = r.id
             WHERE t.date < ?2 AND (r.end_date IS NULL OR r.end_date >= ?1 OR t.date >= ?1)
             ORDER BY r.id",
            RULE_COLUMNS
        );
        self.query_decoded(
            "repetitive_tasks",
            &sql,
            params![window.start, window.end],
            decode_rule,
        )
    }

    fn fetch_exclusions(&self, ids: &[TaskId]) -> Result<Vec<ExclusionEntry>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, date FROM excluded_repetitive_tasks WHERE id IN ({}) ORDER BY id, date",
            placeholders(ids.len())
        );
        self.query_decoded(
            "excluded_repetitive_tasks",
            &sql,
            params_from_iter(ids_param(ids)),
            decode_exclusion,
        )
    }

    fn fetch_overrides(&self, ids: &[TaskId]) -> Result<Vec<OverrideEntry>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, date, changes FROM changed_repetitive_tasks WHERE id IN ({}) ORDER BY id, date",
            placeholders(ids.len())
        );
        self.query_decoded(
            "changed_repetitive_tasks",
            &sql,
            params_from_iter(ids_param(ids)),
            decode_override,
        )
    }

    fn fetch_base_tasks(&self, ids: &[TaskId]) -> Result<Vec<Task>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} FROM tasks t WHERE t.id IN ({}) ORDER BY t.id",
            TASK_COLUMNS,
            placeholders(ids.len())
        );
        self.query_decoded("tasks", &sql, params_from_iter(ids_param(ids)), decode_task)
    }

    fn fetch_tasks_in_range(&self, window: &Window) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {} FROM tasks t WHERE t.date >= ?1 AND t.date < ?2 ORDER BY t.date, t.id",
            TASK_COLUMNS
        );
        self.query_decoded("tasks", &sql, params![window.start, window.end], decode_task)
    }
}
