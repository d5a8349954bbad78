use crate::dashboard::visibility::WidgetVisibility;
use crate::models::{Branding, DashboardConfig, Kpi, KpiType, Layout, Theme};
use serde_json::json;

pub const DEFAULT_PRIMARY_COLOR: &str = "#3b82f6";
pub const DEFAULT_BACKGROUND_COLOR: &str = "#ffffff";
pub const DEFAULT_TEXT_COLOR: &str = "#1f2937";

/// Complete configuration used for a client with nothing persisted.
pub fn default_dashboard_config() -> DashboardConfig {
    let kpis = default_kpis();
    DashboardConfig {
        branding: Branding {
            show_logo: true,
            logo_url: String::new(),
            show_company_name: true,
            custom_welcome_message: "Welcome to your dashboard".to_string(),
            company_description: String::new(),
        },
        theme: Theme {
            primary_color: DEFAULT_PRIMARY_COLOR.to_string(),
            background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
            text_color: DEFAULT_TEXT_COLOR.to_string(),
        },
        layout: Layout {
            enable_kpis: true,
            enable_charts: true,
            enable_activity: true,
            enable_quick_actions: true,
            enable_task_stats: true,
            enable_progress_overview: true,
            widget_visibility: default_widget_visibility(kpis.len()),
        },
        kpis,
        announcements: Vec::new(),
    }
}

fn default_kpis() -> Vec<Kpi> {
    [
        ("total-revenue", "Total Revenue", "$0", KpiType::Currency, "Revenue attributed this period"),
        ("active-campaigns", "Active Campaigns", "0", KpiType::Number, "Campaigns currently running"),
        ("conversion-rate", "Conversion Rate", "0%", KpiType::Percentage, "Leads converted to customers"),
        ("account-status", "Account Status", "Onboarding", KpiType::Text, "Where your account stands"),
    ]
    .into_iter()
    .map(|(id, title, value, kind, description)| Kpi {
        id: id.to_string(),
        title: title.to_string(),
        value: value.to_string(),
        r#type: kind,
        description: Some(description.to_string()),
    })
    .collect()
}

fn default_widget_visibility(kpi_count: usize) -> WidgetVisibility {
    let value = json!({
        "kpiCards": vec![true; kpi_count],
        "chartSections": {
            "performanceChart": true,
            "performanceTrends": true
        },
        "quickActions": {
            "viewMessages": true,
            "downloadReports": true,
            "scheduleMeeting": true,
            "addKPI": true,
            "contactSupport": true,
            "downloadResources": true,
            "viewTasks": true
        },
        "activityFeed": true,
        "taskList": true,
        "taskStats": {
            "totalTasks": true,
            "completedTasks": true,
            "inProgressTasks": true
        },
        "progressOverview": true,
        "announcements": true,
        "helpSection": true
    });

    match value {
        serde_json::Value::Object(map) => WidgetVisibility::from_map(map),
        _ => WidgetVisibility::new(),
    }
}
