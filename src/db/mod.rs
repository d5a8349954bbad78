use crate::dashboard::blob::validate_config_blob;
use crate::dashboard::merge::resolve_stored_config;
use crate::errors::{AppError, AppResult};
use crate::models::{
    ActivityItem, AppSettings, Client, ClientTask, CreateClientPayload, CreateTaskPayload, DashboardConfig,
    TaskStatus, ViewMode,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const SCHEMA_SQL: &str = include_str!("schema.sql");

const CLIENT_COLUMNS: &str =
    "id, agency_id, name, company_name, email, view_mode, config_revision, created_at, updated_at";
const TASK_COLUMNS: &str = "id, client_id, title, description, status, due_date, created_at";

#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl Database {
    pub fn new(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| AppError::Io(err.to_string()))?;
        }
        let conn = Connection::open(path).map_err(AppError::from)?;
        conn.execute_batch(SCHEMA_SQL).map_err(AppError::from)?;

        let db = Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        };
        db.ensure_default_settings()?;

        tracing::debug!(path = %db.db_path.to_string_lossy(), "opened client store");
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal("database mutex poisoned".to_string()))
    }

    pub fn create_client(&self, payload: CreateClientPayload) -> AppResult<Client> {
        let name = payload.name.trim().to_string();
        let agency_id = payload.agency_id.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Client name is required".to_string()));
        }
        if agency_id.is_empty() {
            return Err(AppError::Validation("Agency id is required".to_string()));
        }

        let view_mode = match payload.view_mode {
            Some(mode) => mode,
            None => self.get_settings()?.default_view_mode,
        };
        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4().to_string(),
            agency_id,
            name,
            company_name: payload.company_name.filter(|value| !value.trim().is_empty()),
            email: payload.email.filter(|value| !value.trim().is_empty()),
            view_mode,
            config_revision: 0,
            created_at: now,
            updated_at: now,
        };

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO clients (id, agency_id, name, company_name, email, view_mode, config_revision, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?7)",
            params![
                client.id,
                client.agency_id,
                client.name,
                client.company_name,
                client.email,
                client.view_mode.as_str(),
                now.to_rfc3339(),
            ],
        )?;

        tracing::info!(client_id = %client.id, agency_id = %client.agency_id, "created client");
        Ok(client)
    }

    pub fn get_client(&self, client_id: &str) -> AppResult<Option<Client>> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {} FROM clients WHERE id = ?1", CLIENT_COLUMNS),
            [client_id],
            parse_client_row,
        )
        .optional()
        .map_err(AppError::from)
    }

    pub fn list_clients(&self, agency_id: &str) -> AppResult<Vec<Client>> {
        let conn = self.lock()?;
        let mut statement = conn.prepare(&format!(
            "SELECT {} FROM clients WHERE agency_id = ?1 ORDER BY name COLLATE NOCASE, created_at",
            CLIENT_COLUMNS
        ))?;
        let rows = statement.query_map([agency_id], parse_client_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// Removes the client together with its tasks, activity and stored config.
    pub fn delete_client(&self, client_id: &str) -> AppResult<bool> {
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM clients WHERE id = ?1", [client_id])?;
        if changed > 0 {
            tracing::info!(client_id = %client_id, "deleted client");
        }
        Ok(changed > 0)
    }

    pub fn set_view_mode(&self, client_id: &str, view_mode: ViewMode) -> AppResult<Client> {
        {
            let conn = self.lock()?;
            conn.execute(
                "UPDATE clients SET view_mode = ?1, updated_at = ?2 WHERE id = ?3",
                params![view_mode.as_str(), Utc::now().to_rfc3339(), client_id],
            )?;
        }
        self.get_client(client_id)?
            .ok_or_else(|| AppError::NotFound(format!("Client '{}' not found", client_id)))
    }

    /// Stored configuration merged over the defaults, plus its revision.
    pub fn load_dashboard_config(&self, client_id: &str) -> AppResult<(DashboardConfig, i64)> {
        let validate = self.get_settings()?.validate_stored_configs;
        let (raw, revision) = {
            let conn = self.lock()?;
            conn.query_row(
                "SELECT dashboard_config_json, config_revision FROM clients WHERE id = ?1",
                [client_id],
                |row| Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?
            .ok_or_else(|| AppError::NotFound(format!("Client '{}' not found", client_id)))?
        };

        let blob = raw.and_then(|raw| match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(client_id = %client_id, error = %error, "stored dashboard config is not valid json; using defaults");
                None
            }
        });

        if validate {
            if let Some(blob) = &blob {
                let errors = validate_config_blob(blob);
                if !errors.is_empty() {
                    tracing::warn!(
                        client_id = %client_id,
                        issues = errors.len(),
                        first = %errors[0],
                        "stored dashboard config has schema issues; merging leniently"
                    );
                }
            }
        }

        Ok((resolve_stored_config(blob), revision))
    }

    /// Persists `config`. With `expected_revision` the write only lands if the
    /// stored revision still matches; otherwise it is last-write-wins.
    pub fn save_dashboard_config(
        &self,
        client_id: &str,
        config: &DashboardConfig,
        expected_revision: Option<i64>,
    ) -> AppResult<i64> {
        if expected_revision.is_none() && self.get_settings()?.require_config_revision {
            return Err(AppError::Validation(
                "Dashboard config saves must carry the revision they were loaded at".to_string(),
            ));
        }
        let blob = serde_json::to_string(config)?;
        self.write_config_blob(client_id, &blob, expected_revision)
    }

    /// Validates an externally supplied blob, merges it over the defaults and
    /// stores the complete result.
    pub fn import_dashboard_config(
        &self,
        client_id: &str,
        raw: serde_json::Value,
        expected_revision: Option<i64>,
    ) -> AppResult<(DashboardConfig, i64)> {
        let errors = validate_config_blob(&raw);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors.join("; ")));
        }
        let config = resolve_stored_config(Some(raw));
        let revision = self.save_dashboard_config(client_id, &config, expected_revision)?;
        Ok((config, revision))
    }

    fn write_config_blob(&self, client_id: &str, blob: &str, expected_revision: Option<i64>) -> AppResult<i64> {
        let now = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        let changed = match expected_revision {
            Some(expected) => conn.execute(
                "UPDATE clients
                 SET dashboard_config_json = ?1, config_revision = config_revision + 1, updated_at = ?2
                 WHERE id = ?3 AND config_revision = ?4",
                params![blob, now, client_id, expected],
            )?,
            None => conn.execute(
                "UPDATE clients
                 SET dashboard_config_json = ?1, config_revision = config_revision + 1, updated_at = ?2
                 WHERE id = ?3",
                params![blob, now, client_id],
            )?,
        };

        let current: Option<i64> = conn
            .query_row(
                "SELECT config_revision FROM clients WHERE id = ?1",
                [client_id],
                |row| row.get(0),
            )
            .optional()?;

        match (changed, current) {
            (_, None) => Err(AppError::NotFound(format!("Client '{}' not found", client_id))),
            (0, Some(current)) => {
                tracing::warn!(
                    client_id = %client_id,
                    expected = ?expected_revision,
                    current,
                    "rejected stale dashboard config save"
                );
                Err(AppError::Conflict(format!(
                    "Dashboard config for client '{}' is at revision {}, save was based on {}",
                    client_id,
                    current,
                    expected_revision.unwrap_or_default()
                )))
            }
            (_, Some(revision)) => {
                tracing::info!(client_id = %client_id, revision, "saved dashboard config");
                Ok(revision)
            }
        }
    }

    pub fn insert_task(&self, payload: CreateTaskPayload) -> AppResult<ClientTask> {
        let title = payload.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("Task title is required".to_string()));
        }
        self.require_client(&payload.client_id)?;

        let task = ClientTask {
            id: Uuid::new_v4().to_string(),
            client_id: payload.client_id,
            title,
            description: payload.description.filter(|value| !value.trim().is_empty()),
            status: TaskStatus::Todo,
            due_date: payload.due_date,
            created_at: Utc::now(),
        };

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO client_tasks (id, client_id, title, description, status, due_date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                task.id,
                task.client_id,
                task.title,
                task.description,
                task.status.as_str(),
                task.due_date.map(|due| due.to_rfc3339()),
                task.created_at.to_rfc3339(),
            ],
        )?;
        Ok(task)
    }

    pub fn list_tasks(&self, client_id: &str) -> AppResult<Vec<ClientTask>> {
        let conn = self.lock()?;
        let mut statement = conn.prepare(&format!(
            "SELECT {} FROM client_tasks WHERE client_id = ?1 ORDER BY created_at, id",
            TASK_COLUMNS
        ))?;
        let rows = statement.query_map([client_id], parse_task_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    pub fn set_task_status(&self, task_id: &str, status: TaskStatus) -> AppResult<ClientTask> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE client_tasks SET status = ?1 WHERE id = ?2",
            params![status.as_str(), task_id],
        )?;
        if changed == 0 {
            return Err(AppError::NotFound(format!("Task '{}' not found", task_id)));
        }
        conn.query_row(
            &format!("SELECT {} FROM client_tasks WHERE id = ?1", TASK_COLUMNS),
            [task_id],
            parse_task_row,
        )
        .map_err(AppError::from)
    }

    pub fn insert_activity(&self, client_id: &str, kind: &str, message: &str) -> AppResult<ActivityItem> {
        self.require_client(client_id)?;
        let item = ActivityItem {
            id: Uuid::new_v4().to_string(),
            client_id: client_id.to_string(),
            kind: kind.to_string(),
            message: message.to_string(),
            created_at: Utc::now(),
        };

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO client_activity (id, client_id, kind, message, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![item.id, item.client_id, item.kind, item.message, item.created_at.to_rfc3339()],
        )?;
        Ok(item)
    }

    /// Most recent activity first.
    pub fn list_activity(&self, client_id: &str, limit: u32) -> AppResult<Vec<ActivityItem>> {
        let conn = self.lock()?;
        let mut statement = conn.prepare(
            "SELECT id, client_id, kind, message, created_at FROM client_activity
             WHERE client_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
        )?;
        let rows = statement.query_map(params![client_id, limit], |row| {
            Ok(ActivityItem {
                id: row.get(0)?,
                client_id: row.get(1)?,
                kind: row.get(2)?,
                message: row.get(3)?,
                created_at: parse_time(&row.get::<_, String>(4)?)?,
            })
        })?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    pub fn get_settings(&self) -> AppResult<AppSettings> {
        let conn = self.lock()?;
        let raw = conn
            .query_row(
                "SELECT value_json FROM settings WHERE key = 'app'",
                [],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        match raw {
            Some(raw) => Ok(serde_json::from_str::<AppSettings>(&raw).unwrap_or_default()),
            None => Ok(AppSettings::default()),
        }
    }

    pub fn update_settings(&self, update: serde_json::Value) -> AppResult<AppSettings> {
        let current = self.get_settings()?;
        let mut merged = serde_json::to_value(current)?;
        merge_json(&mut merged, update);
        let settings: AppSettings =
            serde_json::from_value(merged).map_err(|error| AppError::Validation(error.to_string()))?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO settings (key, value_json, updated_at)
             VALUES ('app', ?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json, updated_at = excluded.updated_at",
            params![serde_json::to_string(&settings)?, Utc::now().to_rfc3339()],
        )?;

        Ok(settings)
    }

    fn ensure_default_settings(&self) -> AppResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO settings (key, value_json, updated_at) VALUES ('app', ?1, ?2)",
            params![
                serde_json::to_string(&AppSettings::default())?,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    fn require_client(&self, client_id: &str) -> AppResult<()> {
        let conn = self.lock()?;
        let exists: Option<i64> = conn
            .query_row("SELECT 1 FROM clients WHERE id = ?1", [client_id], |row| row.get(0))
            .optional()?;
        exists
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Client '{}' not found", client_id)))
    }
}

fn parse_client_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client {
        id: row.get(0)?,
        agency_id: row.get(1)?,
        name: row.get(2)?,
        company_name: row.get(3)?,
        email: row.get(4)?,
        view_mode: parse_view_mode(&row.get::<_, String>(5)?)?,
        config_revision: row.get(6)?,
        created_at: parse_time(&row.get::<_, String>(7)?)?,
        updated_at: parse_time(&row.get::<_, String>(8)?)?,
    })
}

fn parse_task_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ClientTask> {
    let due_date = match row.get::<_, Option<String>>(5)? {
        Some(raw) => Some(parse_time(&raw)?),
        None => None,
    };
    Ok(ClientTask {
        id: row.get(0)?,
        client_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status: parse_task_status(&row.get::<_, String>(4)?)?,
        due_date,
        created_at: parse_time(&row.get::<_, String>(6)?)?,
    })
}

fn parse_view_mode(raw: &str) -> rusqlite::Result<ViewMode> {
    ViewMode::parse(raw).ok_or_else(|| invalid_text(format!("Unknown view mode: {}", raw)))
}

fn parse_task_status(raw: &str) -> rusqlite::Result<TaskStatus> {
    match raw {
        "todo" => Ok(TaskStatus::Todo),
        "in-progress" => Ok(TaskStatus::InProgress),
        "completed" => Ok(TaskStatus::Completed),
        _ => Err(invalid_text(format!("Unknown task status: {}", raw))),
    }
}

fn parse_time(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|error| invalid_text(error.to_string()))
}

fn invalid_text(message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
    )
}

fn merge_json(target: &mut serde_json::Value, update: serde_json::Value) {
    match (target, update) {
        (serde_json::Value::Object(target_map), serde_json::Value::Object(update_map)) => {
            for (key, value) in update_map {
                merge_json(target_map.entry(key).or_insert(serde_json::Value::Null), value);
            }
        }
        (target, update) => {
            *target = update;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Database;
    use crate::dashboard::widgets::{is_widget_visible, set_widget_visibility, Widget};
    use crate::errors::AppError;
    use crate::models::{CreateClientPayload, CreateTaskPayload, TaskStatus, ViewMode};

    fn open() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(&dir.path().join("clients.db")).expect("db");
        (dir, db)
    }

    fn client(db: &Database, name: &str) -> crate::models::Client {
        db.create_client(CreateClientPayload {
            agency_id: "agency-1".to_string(),
            name: name.to_string(),
            ..Default::default()
        })
        .expect("create client")
    }

    #[test]
    fn new_client_loads_defaults_at_revision_zero() {
        let (_dir, db) = open();
        let created = client(&db, "Acme");
        assert_eq!(created.view_mode, ViewMode::Dashboard);

        let (config, revision) = db.load_dashboard_config(&created.id).expect("load");
        assert_eq!(revision, 0);
        assert_eq!(config, crate::dashboard::defaults::default_dashboard_config());
    }

    #[test]
    fn save_round_trips_and_bumps_revision() {
        let (_dir, db) = open();
        let created = client(&db, "Acme");
        let (config, revision) = db.load_dashboard_config(&created.id).expect("load");
        let hidden = set_widget_visibility(&config, Widget::KpiCard(2), false);

        let next = db
            .save_dashboard_config(&created.id, &hidden, Some(revision))
            .expect("save");
        assert_eq!(next, 1);

        let (loaded, loaded_revision) = db.load_dashboard_config(&created.id).expect("reload");
        assert_eq!(loaded, hidden);
        assert_eq!(loaded_revision, 1);
        assert!(!is_widget_visible(&loaded, Widget::KpiCard(2)));
    }

    #[test]
    fn stale_revision_is_a_conflict() {
        let (_dir, db) = open();
        let created = client(&db, "Acme");
        let (config, revision) = db.load_dashboard_config(&created.id).expect("load");

        db.save_dashboard_config(&created.id, &config, Some(revision))
            .expect("first save");
        let error = db
            .save_dashboard_config(&created.id, &config, Some(revision))
            .expect_err("stale save");
        assert!(matches!(error, AppError::Conflict(_)));

        assert_eq!(db.save_dashboard_config(&created.id, &config, None).expect("blind save"), 2);
    }

    #[test]
    fn required_revision_setting_rejects_blind_saves() {
        let (_dir, db) = open();
        let created = client(&db, "Acme");
        db.update_settings(serde_json::json!({ "requireConfigRevision": true }))
            .expect("update settings");
        let (config, _) = db.load_dashboard_config(&created.id).expect("load");
        assert!(matches!(
            db.save_dashboard_config(&created.id, &config, None),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn unknown_client_is_not_found() {
        let (_dir, db) = open();
        let config = crate::dashboard::defaults::default_dashboard_config();
        assert!(matches!(db.load_dashboard_config("missing"), Err(AppError::NotFound(_))));
        assert!(matches!(
            db.save_dashboard_config("missing", &config, Some(0)),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn import_validates_and_fills_defaults() {
        let (_dir, db) = open();
        let created = client(&db, "Acme");

        let rejected = db.import_dashboard_config(
            &created.id,
            serde_json::json!({ "layout": { "enableCharts": "off" } }),
            None,
        );
        assert!(matches!(rejected, Err(AppError::Validation(_))));

        let (config, revision) = db
            .import_dashboard_config(
                &created.id,
                serde_json::json!({ "layout": { "widgetVisibility": { "taskList": false } } }),
                Some(0),
            )
            .expect("import");
        assert_eq!(revision, 1);
        assert!(!is_widget_visible(&config, Widget::TaskList));
        assert!(is_widget_visible(&config, Widget::ProgressOverview));
        assert_eq!(db.load_dashboard_config(&created.id).expect("load").0, config);
    }

    #[test]
    fn corrupt_blob_loads_as_defaults() {
        let (_dir, db) = open();
        let created = client(&db, "Acme");
        {
            let conn = db.lock().expect("lock");
            conn.execute(
                "UPDATE clients SET dashboard_config_json = 'not json' WHERE id = ?1",
                [&created.id],
            )
            .expect("corrupt blob");
        }
        let (config, _) = db.load_dashboard_config(&created.id).expect("load");
        assert_eq!(config, crate::dashboard::defaults::default_dashboard_config());
    }

    #[test]
    fn delete_cascades_tasks_and_activity() {
        let (_dir, db) = open();
        let created = client(&db, "Acme");
        let task = db
            .insert_task(CreateTaskPayload {
                client_id: created.id.clone(),
                title: "Share brand assets".to_string(),
                ..Default::default()
            })
            .expect("insert task");
        db.insert_activity(&created.id, "task", "Task created").expect("activity");

        let updated = db.set_task_status(&task.id, TaskStatus::Completed).expect("status");
        assert_eq!(updated.status, TaskStatus::Completed);

        assert!(db.delete_client(&created.id).expect("delete"));
        assert!(db.get_client(&created.id).expect("get").is_none());
        assert!(db.list_tasks(&created.id).expect("tasks").is_empty());
        assert!(db.list_activity(&created.id, 10).expect("activity").is_empty());
        assert!(!db.delete_client(&created.id).expect("delete again"));
    }

    #[test]
    fn lists_clients_per_agency_and_switches_mode() {
        let (_dir, db) = open();
        let b = client(&db, "beta");
        client(&db, "Alpha");
        db.create_client(CreateClientPayload {
            agency_id: "agency-2".to_string(),
            name: "Other".to_string(),
            view_mode: Some(ViewMode::Task),
            ..Default::default()
        })
        .expect("other agency");

        let names: Vec<String> = db
            .list_clients("agency-1")
            .expect("list")
            .into_iter()
            .map(|client| client.name)
            .collect();
        assert_eq!(names, vec!["Alpha".to_string(), "beta".to_string()]);

        let switched = db.set_view_mode(&b.id, ViewMode::Hybrid).expect("set mode");
        assert_eq!(switched.view_mode, ViewMode::Hybrid);
        assert!(db.create_client(CreateClientPayload::default()).is_err());
    }

    #[test]
    fn activity_is_limited_and_newest_first() {
        let (_dir, db) = open();
        let created = client(&db, "Acme");
        for index in 0..5 {
            db.insert_activity(&created.id, "note", &format!("event {}", index))
                .expect("activity");
        }
        let items = db.list_activity(&created.id, 3).expect("list");
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].message, "event 4");
        assert!(db.insert_activity("missing", "note", "x").is_err());
    }
}
