use crate::errors::{AppError, AppResult};
use crate::models::{Announcement, DashboardConfig, NewAnnouncement};
use chrono::Utc;
use uuid::Uuid;

pub fn add_announcement(config: &DashboardConfig, payload: NewAnnouncement) -> AppResult<DashboardConfig> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Announcement title is required".to_string()));
    }

    let mut next = config.clone();
    next.announcements.push(Announcement {
        id: Uuid::new_v4().to_string(),
        title: title.to_string(),
        content: payload.content,
        r#type: payload.r#type,
        is_active: true,
        created_at: Utc::now(),
    });
    Ok(next)
}

pub fn set_announcement_active(
    config: &DashboardConfig,
    announcement_id: &str,
    active: bool,
) -> AppResult<DashboardConfig> {
    let mut next = config.clone();
    let announcement = next
        .announcements
        .iter_mut()
        .find(|announcement| announcement.id == announcement_id)
        .ok_or_else(|| AppError::NotFound(format!("Announcement '{}' not found", announcement_id)))?;
    announcement.is_active = active;
    Ok(next)
}

pub fn remove_announcement(config: &DashboardConfig, announcement_id: &str) -> AppResult<DashboardConfig> {
    let mut next = config.clone();
    let before = next.announcements.len();
    next.announcements
        .retain(|announcement| announcement.id != announcement_id);
    if next.announcements.len() == before {
        return Err(AppError::NotFound(format!(
            "Announcement '{}' not found",
            announcement_id
        )));
    }
    Ok(next)
}

/// Active announcements, newest first.
pub fn active_announcements(config: &DashboardConfig) -> Vec<&Announcement> {
    let mut active: Vec<&Announcement> = config
        .announcements
        .iter()
        .filter(|announcement| announcement.is_active)
        .collect();
    active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    active
}
