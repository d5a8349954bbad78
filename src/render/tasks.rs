use super::{DashboardView, RenderContext, ViewBuilder};
use crate::dashboard::widgets::QuickAction;
use crate::models::{ClientSnapshot, DashboardConfig, ViewMode};

const QUICK_ACTIONS: [QuickAction; 3] = [
    QuickAction::ViewMessages,
    QuickAction::DownloadResources,
    QuickAction::ContactSupport,
];

/// Checklist view built around the client's onboarding tasks.
pub fn render_tasks(snapshot: &ClientSnapshot, config: &DashboardConfig, context: RenderContext) -> DashboardView {
    let builder = ViewBuilder::new(snapshot, config, context);
    let nodes = vec![
        builder.header(),
        builder.announcements(),
        builder.task_stats(),
        builder.progress_overview(),
        builder.task_list(),
        builder.quick_actions(&QUICK_ACTIONS),
        builder.help(),
    ];
    builder.finish(ViewMode::Task, nodes)
}
