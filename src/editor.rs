//! Agency-side editing of one client's dashboard.
//!
//! The session owns the working copy of the configuration. Every edit goes
//! through the pure functions in `dashboard` and replaces the working copy;
//! previews re-render from it in the editor context; `save` writes it back
//! guarded by the revision it was loaded at.

use crate::dashboard::announcements;
use crate::dashboard::kpis;
use crate::dashboard::theme::validate_theme;
use crate::dashboard::visibility::set_visibility;
use crate::dashboard::widgets::{is_widget_visible, set_widget_visibility, visibility_snapshot, Widget};
use crate::db::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{
    Branding, Client, ClientSnapshot, DashboardConfig, KpiPatch, NewAnnouncement, NewKpi, Theme, ViewMode,
};
use crate::render::{render_view, DashboardView, RenderContext, ToggleAction};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayoutSection {
    Kpis,
    Charts,
    Activity,
    QuickActions,
    TaskStats,
    ProgressOverview,
}

#[derive(Debug, Clone)]
pub struct EditorSession {
    client: Client,
    config: DashboardConfig,
    base_revision: i64,
    dirty: bool,
}

impl EditorSession {
    pub fn open(client: Client, config: DashboardConfig, revision: i64) -> Self {
        Self {
            client,
            config,
            base_revision: revision,
            dirty: false,
        }
    }

    pub fn load(db: &Database, client_id: &str) -> AppResult<Self> {
        let client = db
            .get_client(client_id)?
            .ok_or_else(|| AppError::NotFound(format!("Client '{}' not found", client_id)))?;
        let (config, revision) = db.load_dashboard_config(client_id)?;
        Ok(Self::open(client, config, revision))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn base_revision(&self) -> i64 {
        self.base_revision
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn replace(&mut self, next: DashboardConfig) {
        if next != self.config {
            self.config = next;
            self.dirty = true;
        }
    }

    /// Flips one widget and returns its new visibility.
    pub fn toggle(&mut self, widget: Widget) -> bool {
        let visible = !is_widget_visible(&self.config, widget);
        self.replace(set_widget_visibility(&self.config, widget, visible));
        visible
    }

    pub fn apply(&mut self, action: &ToggleAction) {
        self.replace(action.apply(&self.config));
    }

    pub fn set_visibility(&mut self, widget: Widget, visible: bool) {
        self.replace(set_widget_visibility(&self.config, widget, visible));
    }

    /// Writes a flag for a path outside the known widget set.
    pub fn set_path_visibility(&mut self, path: &str, index: Option<usize>, visible: bool) {
        self.replace(set_visibility(&self.config, path, visible, index));
    }

    pub fn visibility(&self) -> Vec<(Widget, bool)> {
        visibility_snapshot(&self.config)
    }

    pub fn set_section_enabled(&mut self, section: LayoutSection, enabled: bool) {
        let mut next = self.config.clone();
        let layout = &mut next.layout;
        match section {
            LayoutSection::Kpis => layout.enable_kpis = enabled,
            LayoutSection::Charts => layout.enable_charts = enabled,
            LayoutSection::Activity => layout.enable_activity = enabled,
            LayoutSection::QuickActions => layout.enable_quick_actions = enabled,
            LayoutSection::TaskStats => layout.enable_task_stats = enabled,
            LayoutSection::ProgressOverview => layout.enable_progress_overview = enabled,
        }
        self.replace(next);
    }

    pub fn add_kpi(&mut self, payload: NewKpi) -> AppResult<String> {
        let next = kpis::add_kpi(&self.config, payload)?;
        let id = next
            .kpis
            .last()
            .map(|kpi| kpi.id.clone())
            .ok_or_else(|| AppError::Internal("KPI list empty after insert".to_string()))?;
        self.replace(next);
        Ok(id)
    }

    pub fn remove_kpi(&mut self, kpi_id: &str) -> AppResult<()> {
        let next = kpis::remove_kpi(&self.config, kpi_id)?;
        self.replace(next);
        Ok(())
    }

    pub fn update_kpi(&mut self, kpi_id: &str, patch: KpiPatch) -> AppResult<()> {
        let next = kpis::update_kpi(&self.config, kpi_id, patch)?;
        self.replace(next);
        Ok(())
    }

    pub fn move_kpi(&mut self, kpi_id: &str, to: usize) -> AppResult<()> {
        let next = kpis::move_kpi(&self.config, kpi_id, to)?;
        self.replace(next);
        Ok(())
    }

    pub fn add_announcement(&mut self, payload: NewAnnouncement) -> AppResult<String> {
        let next = announcements::add_announcement(&self.config, payload)?;
        let id = next
            .announcements
            .last()
            .map(|announcement| announcement.id.clone())
            .ok_or_else(|| AppError::Internal("announcement list empty after insert".to_string()))?;
        self.replace(next);
        Ok(id)
    }

    pub fn set_announcement_active(&mut self, announcement_id: &str, active: bool) -> AppResult<()> {
        let next = announcements::set_announcement_active(&self.config, announcement_id, active)?;
        self.replace(next);
        Ok(())
    }

    pub fn remove_announcement(&mut self, announcement_id: &str) -> AppResult<()> {
        let next = announcements::remove_announcement(&self.config, announcement_id)?;
        self.replace(next);
        Ok(())
    }

    pub fn set_branding(&mut self, branding: Branding) {
        let mut next = self.config.clone();
        next.branding = branding;
        self.replace(next);
    }

    pub fn set_theme(&mut self, theme: Theme) -> AppResult<()> {
        let errors = validate_theme(&theme);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors.join("; ")));
        }
        let mut next = self.config.clone();
        next.theme = theme;
        self.replace(next);
        Ok(())
    }

    /// Renders the working copy with toggles attached. `mode` defaults to the
    /// client's own view mode.
    pub fn preview(&self, mode: Option<ViewMode>, snapshot: &ClientSnapshot) -> DashboardView {
        render_view(
            mode.unwrap_or(self.client.view_mode),
            snapshot,
            &self.config,
            RenderContext::Editor,
        )
    }

    /// Persists the working copy if it changed. Fails with `Conflict` when
    /// another session saved since this one was loaded.
    pub fn save(&mut self, db: &Database) -> AppResult<i64> {
        if !self.dirty {
            return Ok(self.base_revision);
        }
        let revision = db.save_dashboard_config(&self.client.id, &self.config, Some(self.base_revision))?;
        tracing::info!(
            client_id = %self.client.id,
            from = self.base_revision,
            to = revision,
            "editor session saved"
        );
        self.base_revision = revision;
        self.dirty = false;
        Ok(revision)
    }

    /// Drops unsaved edits and picks up the latest stored configuration.
    pub fn reload(&mut self, db: &Database) -> AppResult<()> {
        let (config, revision) = db.load_dashboard_config(&self.client.id)?;
        self.config = config;
        self.base_revision = revision;
        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{EditorSession, LayoutSection};
    use crate::dashboard::widgets::{is_widget_visible, QuickAction, Widget};
    use crate::db::Database;
    use crate::errors::AppError;
    use crate::models::{CreateClientPayload, NewKpi};
    use crate::render::test_support::snapshot;

    fn store_with_client() -> (tempfile::TempDir, Database, String) {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(&dir.path().join("editor.db")).expect("db");
        let client = db
            .create_client(CreateClientPayload {
                agency_id: "agency-1".to_string(),
                name: "Acme".to_string(),
                ..Default::default()
            })
            .expect("client");
        (dir, db, client.id)
    }

    #[test]
    fn toggle_flips_and_marks_dirty() {
        let (_dir, db, client_id) = store_with_client();
        let mut session = EditorSession::load(&db, &client_id).expect("session");
        assert!(!session.is_dirty());

        assert!(!session.toggle(Widget::HelpSection));
        assert!(session.is_dirty());
        assert!(session.toggle(Widget::HelpSection));
    }

    #[test]
    fn preview_toggle_round_trip() {
        let (_dir, db, client_id) = store_with_client();
        let mut session = EditorSession::load(&db, &client_id).expect("session");
        let widget = Widget::QuickAction(QuickAction::ScheduleMeeting);

        let view = session.preview(None, &snapshot());
        let toggle = view
            .find_widget(widget)
            .and_then(|node| node.toggle.clone())
            .expect("toggle");
        session.apply(&toggle);

        let view = session.preview(None, &snapshot());
        let node = view.find_widget(widget).expect("still rendered in editor");
        assert!(node.hidden);
        assert!(!is_widget_visible(session.config(), widget));
    }

    #[test]
    fn save_persists_and_detects_concurrent_editor() {
        let (_dir, db, client_id) = store_with_client();
        let mut first = EditorSession::load(&db, &client_id).expect("first");
        let mut second = EditorSession::load(&db, &client_id).expect("second");

        first.add_kpi(NewKpi {
            title: "Leads".to_string(),
            value: "14".to_string(),
            ..Default::default()
        })
        .expect("add kpi");
        assert_eq!(first.save(&db).expect("save first"), 1);
        assert!(!first.is_dirty());

        second.set_section_enabled(LayoutSection::Charts, false);
        assert!(matches!(second.save(&db), Err(AppError::Conflict(_))));
        assert!(second.is_dirty());

        second.reload(&db).expect("reload");
        assert_eq!(second.config().kpis.len(), 5);
        assert_eq!(second.base_revision(), 1);
    }

    #[test]
    fn clean_save_is_a_no_op() {
        let (_dir, db, client_id) = store_with_client();
        let mut session = EditorSession::load(&db, &client_id).expect("session");
        session.set_visibility(Widget::TaskList, true);
        assert!(!session.is_dirty());
        assert_eq!(session.save(&db).expect("save"), 0);
    }

    #[test]
    fn invalid_theme_is_rejected_without_change() {
        let (_dir, db, client_id) = store_with_client();
        let mut session = EditorSession::load(&db, &client_id).expect("session");
        let mut theme = session.config().theme.clone();
        theme.primary_color = "not-a-color".to_string();
        assert!(matches!(session.set_theme(theme), Err(AppError::Validation(_))));
        assert!(!session.is_dirty());
    }
}
