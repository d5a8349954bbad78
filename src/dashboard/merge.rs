//! Overlay of a persisted, possibly partial configuration blob on the defaults.
//!
//! Each top-level branch is merged field by field with the persisted value
//! winning. `layout.widgetVisibility` is overlaid one level deeper, so a blob
//! carrying only `{ "kpiCards": [false, true] }` keeps every other default
//! leaf. Arrays (`kpis`, `announcements`, `kpiCards`) are replaced wholesale.
//!
//! Decoding never fails: a field with the wrong shape is dropped and the
//! default takes its place.

use crate::dashboard::defaults::default_dashboard_config;
use crate::dashboard::visibility::WidgetVisibility;
use crate::dashboard::widgets::KPI_CARDS_PATH;
use crate::models::{Announcement, Branding, DashboardConfig, Kpi, Layout, Theme};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialBranding {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub show_logo: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub show_company_name: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub custom_welcome_message: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub company_description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialTheme {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialLayout {
    #[serde(
        rename = "enableKPIs",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub enable_kpis: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub enable_charts: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub enable_activity: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub enable_quick_actions: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub enable_task_stats: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub enable_progress_overview: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub widget_visibility: Option<WidgetVisibility>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialDashboardConfig {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub branding: Option<PartialBranding>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub theme: Option<PartialTheme>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub layout: Option<PartialLayout>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub kpis: Option<Vec<Kpi>>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub announcements: Option<Vec<Announcement>>,
}

impl PartialDashboardConfig {
    /// Decodes a stored blob. Anything that is not a JSON object decodes as empty.
    ///
    /// `kpiCards` slots are positional over `kpis`, so when a stored `kpis`
    /// list is present but undecodable its `kpiCards` are dropped with it.
    pub fn from_value(mut raw: Value) -> Self {
        if !raw.is_object() {
            if !raw.is_null() {
                tracing::debug!("ignoring non-object dashboard config blob");
            }
            return Self::default();
        }
        if has_undecodable_kpis(&raw) {
            let dropped = raw
                .pointer_mut("/layout/widgetVisibility")
                .and_then(Value::as_object_mut)
                .and_then(|visibility| visibility.remove(KPI_CARDS_PATH));
            tracing::warn!(
                dropped_kpi_cards = dropped.is_some(),
                "stored KPI list is malformed; falling back to default KPIs"
            );
        }
        serde_json::from_value(raw).unwrap_or_default()
    }
}

fn has_undecodable_kpis(raw: &Value) -> bool {
    raw.get("kpis")
        .is_some_and(|kpis| Vec::<Kpi>::deserialize(kpis).is_err())
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

pub fn merge_config(persisted: Option<PartialDashboardConfig>, defaults: DashboardConfig) -> DashboardConfig {
    let Some(persisted) = persisted else {
        return defaults;
    };

    DashboardConfig {
        branding: merge_branding(persisted.branding, defaults.branding),
        theme: merge_theme(persisted.theme, defaults.theme),
        layout: merge_layout(persisted.layout, defaults.layout),
        kpis: persisted.kpis.unwrap_or(defaults.kpis),
        announcements: persisted.announcements.unwrap_or(defaults.announcements),
    }
}

/// Merges a raw stored blob (or nothing) over the built-in defaults.
pub fn resolve_stored_config(raw: Option<Value>) -> DashboardConfig {
    merge_config(raw.map(PartialDashboardConfig::from_value), default_dashboard_config())
}

fn merge_branding(persisted: Option<PartialBranding>, defaults: Branding) -> Branding {
    let Some(persisted) = persisted else {
        return defaults;
    };
    Branding {
        show_logo: persisted.show_logo.unwrap_or(defaults.show_logo),
        logo_url: persisted.logo_url.unwrap_or(defaults.logo_url),
        show_company_name: persisted.show_company_name.unwrap_or(defaults.show_company_name),
        custom_welcome_message: persisted
            .custom_welcome_message
            .unwrap_or(defaults.custom_welcome_message),
        company_description: persisted
            .company_description
            .unwrap_or(defaults.company_description),
    }
}

fn merge_theme(persisted: Option<PartialTheme>, defaults: Theme) -> Theme {
    let Some(persisted) = persisted else {
        return defaults;
    };
    Theme {
        primary_color: persisted.primary_color.unwrap_or(defaults.primary_color),
        background_color: persisted.background_color.unwrap_or(defaults.background_color),
        text_color: persisted.text_color.unwrap_or(defaults.text_color),
    }
}

fn merge_layout(persisted: Option<PartialLayout>, defaults: Layout) -> Layout {
    let Some(persisted) = persisted else {
        return defaults;
    };
    let widget_visibility = match persisted.widget_visibility {
        Some(stored) => defaults.widget_visibility.overlay(&stored),
        None => defaults.widget_visibility,
    };
    Layout {
        enable_kpis: persisted.enable_kpis.unwrap_or(defaults.enable_kpis),
        enable_charts: persisted.enable_charts.unwrap_or(defaults.enable_charts),
        enable_activity: persisted.enable_activity.unwrap_or(defaults.enable_activity),
        enable_quick_actions: persisted
            .enable_quick_actions
            .unwrap_or(defaults.enable_quick_actions),
        enable_task_stats: persisted.enable_task_stats.unwrap_or(defaults.enable_task_stats),
        enable_progress_overview: persisted
            .enable_progress_overview
            .unwrap_or(defaults.enable_progress_overview),
        widget_visibility,
    }
}
