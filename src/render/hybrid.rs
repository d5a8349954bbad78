use super::{DashboardView, RenderContext, ViewBuilder};
use crate::dashboard::widgets::{ChartSection, QuickAction};
use crate::models::{ClientSnapshot, DashboardConfig, ViewMode};

const QUICK_ACTIONS: [QuickAction; 4] = [
    QuickAction::ViewMessages,
    QuickAction::ViewTasks,
    QuickAction::ScheduleMeeting,
    QuickAction::DownloadReports,
];

pub fn render_hybrid(snapshot: &ClientSnapshot, config: &DashboardConfig, context: RenderContext) -> DashboardView {
    let builder = ViewBuilder::new(snapshot, config, context);
    let nodes = vec![
        builder.header(),
        builder.announcements(),
        builder.kpis(),
        builder.task_stats(),
        builder.progress_overview(),
        builder.charts(&[ChartSection::PerformanceChart]),
        builder.task_list(),
        builder.activity(),
        builder.quick_actions(&QUICK_ACTIONS),
        builder.help(),
    ];
    builder.finish(ViewMode::Hybrid, nodes)
}
