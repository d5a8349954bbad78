//! Typed identifiers for every widget the renderers know about.
//!
//! Each variant maps to exactly one dotted path (plus a slot index for KPI
//! cards), so callers never spell paths by hand. Paths not covered here are
//! still reachable through the string API in `visibility`.

use crate::dashboard::visibility::{is_visible, set_visibility};
use crate::models::DashboardConfig;
use serde::{Deserialize, Serialize};

pub const KPI_CARDS_PATH: &str = "kpiCards";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartSection {
    PerformanceChart,
    PerformanceTrends,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuickAction {
    ViewMessages,
    DownloadReports,
    ScheduleMeeting,
    #[serde(rename = "addKPI")]
    AddKpi,
    ContactSupport,
    DownloadResources,
    ViewTasks,
}

impl QuickAction {
    pub const ALL: [QuickAction; 7] = [
        Self::ViewMessages,
        Self::DownloadReports,
        Self::ScheduleMeeting,
        Self::AddKpi,
        Self::ContactSupport,
        Self::DownloadResources,
        Self::ViewTasks,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::ViewMessages => "View Messages",
            Self::DownloadReports => "Download Reports",
            Self::ScheduleMeeting => "Schedule Meeting",
            Self::AddKpi => "Add KPI",
            Self::ContactSupport => "Contact Support",
            Self::DownloadResources => "Download Resources",
            Self::ViewTasks => "View Tasks",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStat {
    TotalTasks,
    CompletedTasks,
    InProgressTasks,
}

impl TaskStat {
    pub const ALL: [TaskStat; 3] = [Self::TotalTasks, Self::CompletedTasks, Self::InProgressTasks];

    pub fn label(self) -> &'static str {
        match self {
            Self::TotalTasks => "Total Tasks",
            Self::CompletedTasks => "Completed",
            Self::InProgressTasks => "In Progress",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Widget {
    KpiCard(usize),
    Chart(ChartSection),
    QuickAction(QuickAction),
    ActivityFeed,
    TaskList,
    TaskStat(TaskStat),
    ProgressOverview,
    Announcements,
    HelpSection,
}

impl Widget {
    pub fn path(self) -> &'static str {
        match self {
            Self::KpiCard(_) => KPI_CARDS_PATH,
            Self::Chart(ChartSection::PerformanceChart) => "chartSections.performanceChart",
            Self::Chart(ChartSection::PerformanceTrends) => "chartSections.performanceTrends",
            Self::QuickAction(QuickAction::ViewMessages) => "quickActions.viewMessages",
            Self::QuickAction(QuickAction::DownloadReports) => "quickActions.downloadReports",
            Self::QuickAction(QuickAction::ScheduleMeeting) => "quickActions.scheduleMeeting",
            Self::QuickAction(QuickAction::AddKpi) => "quickActions.addKPI",
            Self::QuickAction(QuickAction::ContactSupport) => "quickActions.contactSupport",
            Self::QuickAction(QuickAction::DownloadResources) => "quickActions.downloadResources",
            Self::QuickAction(QuickAction::ViewTasks) => "quickActions.viewTasks",
            Self::ActivityFeed => "activityFeed",
            Self::TaskList => "taskList",
            Self::TaskStat(TaskStat::TotalTasks) => "taskStats.totalTasks",
            Self::TaskStat(TaskStat::CompletedTasks) => "taskStats.completedTasks",
            Self::TaskStat(TaskStat::InProgressTasks) => "taskStats.inProgressTasks",
            Self::ProgressOverview => "progressOverview",
            Self::Announcements => "announcements",
            Self::HelpSection => "helpSection",
        }
    }

    pub fn index(self) -> Option<usize> {
        match self {
            Self::KpiCard(index) => Some(index),
            _ => None,
        }
    }

    /// Inverse of `path`/`index`. Unknown paths, and `kpiCards` without an
    /// index, return `None`.
    pub fn from_path(path: &str, index: Option<usize>) -> Option<Self> {
        if path == KPI_CARDS_PATH {
            return index.map(Self::KpiCard);
        }
        if index.is_some() {
            return None;
        }
        Self::catalog(0).into_iter().find(|widget| widget.path() == path)
    }

    /// Every known widget, with one KPI card per configured KPI.
    pub fn catalog(kpi_count: usize) -> Vec<Self> {
        let mut widgets: Vec<Self> = (0..kpi_count).map(Self::KpiCard).collect();
        widgets.push(Self::Chart(ChartSection::PerformanceChart));
        widgets.push(Self::Chart(ChartSection::PerformanceTrends));
        widgets.extend(QuickAction::ALL.into_iter().map(Self::QuickAction));
        widgets.push(Self::ActivityFeed);
        widgets.push(Self::TaskList);
        widgets.extend(TaskStat::ALL.into_iter().map(Self::TaskStat));
        widgets.push(Self::ProgressOverview);
        widgets.push(Self::Announcements);
        widgets.push(Self::HelpSection);
        widgets
    }
}

pub fn is_widget_visible(config: &DashboardConfig, widget: Widget) -> bool {
    is_visible(config, widget.path(), widget.index())
}

pub fn set_widget_visibility(config: &DashboardConfig, widget: Widget, visible: bool) -> DashboardConfig {
    set_visibility(config, widget.path(), visible, widget.index())
}

/// Resolved state of every known widget, in catalog order.
pub fn visibility_snapshot(config: &DashboardConfig) -> Vec<(Widget, bool)> {
    Widget::catalog(config.kpis.len())
        .into_iter()
        .map(|widget| (widget, is_widget_visible(config, widget)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{is_widget_visible, set_widget_visibility, visibility_snapshot, QuickAction, TaskStat, Widget};
    use crate::dashboard::defaults::default_dashboard_config;
    use std::collections::HashSet;

    #[test]
    fn paths_are_unique_and_round_trip() {
        let catalog = Widget::catalog(3);
        let mut seen = HashSet::new();
        for widget in &catalog {
            assert!(seen.insert((widget.path(), widget.index())));
            assert_eq!(Widget::from_path(widget.path(), widget.index()), Some(*widget));
        }
        assert_eq!(catalog.len(), 3 + 2 + 7 + 2 + 3 + 3);
    }

    #[test]
    fn from_path_rejects_unknown_shapes() {
        assert_eq!(Widget::from_path("kpiCards", None), None);
        assert_eq!(Widget::from_path("taskList", Some(0)), None);
        assert_eq!(Widget::from_path("quickActions.launchRocket", None), None);
        assert_eq!(
            Widget::from_path("quickActions.addKPI", None),
            Some(Widget::QuickAction(QuickAction::AddKpi))
        );
    }

    #[test]
    fn typed_toggle_matches_path_toggle() {
        let config = default_dashboard_config();
        let hidden = set_widget_visibility(&config, Widget::TaskStat(TaskStat::CompletedTasks), false);
        assert!(!is_widget_visible(&hidden, Widget::TaskStat(TaskStat::CompletedTasks)));
        assert!(!crate::dashboard::visibility::is_visible(&hidden, "taskStats.completedTasks", None));
        assert!(is_widget_visible(&hidden, Widget::TaskStat(TaskStat::TotalTasks)));
    }

    #[test]
    fn kpi_card_toggle_scenario() {
        let config = default_dashboard_config();
        let next = set_widget_visibility(&config, Widget::KpiCard(2), false);
        assert!(!is_widget_visible(&next, Widget::KpiCard(2)));
        assert!(is_widget_visible(&next, Widget::KpiCard(0)));
    }

    #[test]
    fn snapshot_covers_every_kpi() {
        let config = default_dashboard_config();
        let snapshot = visibility_snapshot(&config);
        assert_eq!(snapshot.iter().filter(|(widget, _)| matches!(widget, Widget::KpiCard(_))).count(), 4);
        assert!(snapshot.iter().all(|(_, visible)| *visible));
    }
}
