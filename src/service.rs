use crate::db::Database;
use crate::editor::EditorSession;
use crate::errors::{AppError, AppResult};
use crate::models::{ClientSnapshot, ViewMode};
use crate::render::{render_view, DashboardView, RenderContext};
use crate::settings::ServiceSettings;
use std::sync::Arc;

/// Entry point used by the surrounding application: reads client records,
/// renders client-facing dashboards and hands out editor sessions.
#[derive(Clone)]
pub struct DashboardService {
    db: Arc<Database>,
}

impl DashboardService {
    pub fn open(settings: &ServiceSettings) -> AppResult<Self> {
        let db = Database::new(&settings.database_path())?;
        Ok(Self::from_database(db))
    }

    pub fn from_database(db: Database) -> Self {
        Self { db: Arc::new(db) }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn client_snapshot(&self, client_id: &str) -> AppResult<ClientSnapshot> {
        let client = self
            .db
            .get_client(client_id)?
            .ok_or_else(|| AppError::NotFound(format!("Client '{}' not found", client_id)))?;
        let limit = self.db.get_settings()?.activity_feed_limit;
        Ok(ClientSnapshot {
            tasks: self.db.list_tasks(client_id)?,
            activity: self.db.list_activity(client_id, limit)?,
            client,
        })
    }

    /// Client-facing render. A client without stored configuration gets the
    /// defaults; nothing is written back.
    pub fn render_client_dashboard(&self, client_id: &str, mode: Option<ViewMode>) -> AppResult<DashboardView> {
        let snapshot = self.client_snapshot(client_id)?;
        let (config, revision) = self.db.load_dashboard_config(client_id)?;
        let mode = mode.unwrap_or(snapshot.client.view_mode);
        tracing::debug!(client_id = %client_id, mode = mode.as_str(), revision, "rendering client dashboard");
        Ok(render_view(mode, &snapshot, &config, RenderContext::Client))
    }

    pub fn open_editor(&self, client_id: &str) -> AppResult<EditorSession> {
        EditorSession::load(&self.db, client_id)
    }

    pub fn preview_editor(&self, session: &EditorSession, mode: Option<ViewMode>) -> AppResult<DashboardView> {
        let snapshot = self.client_snapshot(&session.client().id)?;
        Ok(session.preview(mode, &snapshot))
    }

    pub fn save_editor(&self, session: &mut EditorSession) -> AppResult<i64> {
        session.save(&self.db)
    }
}
