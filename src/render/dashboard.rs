use super::{DashboardView, RenderContext, ViewBuilder};
use crate::dashboard::widgets::{ChartSection, QuickAction};
use crate::models::{ClientSnapshot, DashboardConfig, ViewMode};

const QUICK_ACTIONS: [QuickAction; 5] = [
    QuickAction::ViewMessages,
    QuickAction::DownloadReports,
    QuickAction::ScheduleMeeting,
    QuickAction::AddKpi,
    QuickAction::ContactSupport,
];

/// Full analytics view: KPIs, charts and the activity feed.
pub fn render_dashboard(snapshot: &ClientSnapshot, config: &DashboardConfig, context: RenderContext) -> DashboardView {
    let builder = ViewBuilder::new(snapshot, config, context);
    let nodes = vec![
        builder.header(),
        builder.announcements(),
        builder.kpis(),
        builder.charts(&[ChartSection::PerformanceChart, ChartSection::PerformanceTrends]),
        builder.activity(),
        builder.quick_actions(&QUICK_ACTIONS),
        builder.help(),
    ];
    builder.finish(ViewMode::Dashboard, nodes)
}
