//! View-tree rendering for the three client dashboard modes.
//!
//! Renderers are pure functions of a client snapshot and a merged
//! configuration. Layout `enable*` flags switch whole sections on or off;
//! individual widgets inside a section go through the visibility resolver.
//! In the client context hidden widgets are left out. In the editor context
//! they stay in the tree, marked `hidden`, and every widget carries the
//! `ToggleAction` that flips it.

mod dashboard;
mod hybrid;
mod tasks;

pub use dashboard::render_dashboard;
pub use hybrid::render_hybrid;
pub use tasks::render_tasks;

use crate::dashboard::announcements::active_announcements;
use crate::dashboard::kpis::kpi_cards;
use crate::dashboard::visibility::set_visibility;
use crate::dashboard::widgets::{is_widget_visible, ChartSection, QuickAction, TaskStat, Widget};
use crate::models::{
    ActivityItem, AnnouncementType, ClientSnapshot, ClientTask, DashboardConfig, KpiType, TaskStatus, Theme,
    ViewMode,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderContext {
    #[default]
    Client,
    Editor,
}

/// Flips one widget; produced by the editor-context renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleAction {
    pub path: String,
    pub index: Option<usize>,
    pub visible: bool,
}

impl ToggleAction {
    pub fn for_widget(widget: Widget, currently_visible: bool) -> Self {
        Self {
            path: widget.path().to_string(),
            index: widget.index(),
            visible: !currently_visible,
        }
    }

    pub fn apply(&self, config: &DashboardConfig) -> DashboardConfig {
        set_visibility(config, &self.path, self.visible, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum NodeKind {
    Header {
        welcome_message: String,
        company_name: Option<String>,
        logo_url: Option<String>,
        description: Option<String>,
    },
    Section {
        id: String,
        title: String,
    },
    Announcements,
    Announcement {
        id: String,
        title: String,
        content: String,
        tone: AnnouncementType,
    },
    KpiCard {
        id: String,
        title: String,
        value: String,
        kpi_type: KpiType,
        description: Option<String>,
    },
    Chart {
        section: ChartSection,
    },
    ActivityFeed {
        items: Vec<ActivityItem>,
    },
    QuickAction {
        action: QuickAction,
        label: String,
    },
    TaskStat {
        stat: TaskStat,
        label: String,
        count: usize,
    },
    ProgressOverview {
        completed: usize,
        total: usize,
        percent: u8,
    },
    TaskList {
        tasks: Vec<ClientTask>,
    },
    HelpSection {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewNode {
    pub kind: NodeKind,
    pub widget: Option<Widget>,
    pub hidden: bool,
    pub toggle: Option<ToggleAction>,
    pub children: Vec<ViewNode>,
}

impl ViewNode {
    fn plain(kind: NodeKind, children: Vec<ViewNode>) -> Self {
        Self {
            kind,
            widget: None,
            hidden: false,
            toggle: None,
            children,
        }
    }

    /// Depth-first walk over this node and all descendants.
    pub fn walk(&self) -> Vec<&ViewNode> {
        let mut nodes = vec![self];
        for child in &self.children {
            nodes.extend(child.walk());
        }
        nodes
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub mode: ViewMode,
    pub context: RenderContext,
    pub theme: Theme,
    pub nodes: Vec<ViewNode>,
}

impl DashboardView {
    pub fn all_nodes(&self) -> Vec<&ViewNode> {
        self.nodes.iter().flat_map(ViewNode::walk).collect()
    }

    /// Widgets present in the tree that would be shown to the client.
    pub fn visible_widgets(&self) -> Vec<Widget> {
        self.all_nodes()
            .into_iter()
            .filter(|node| !node.hidden)
            .filter_map(|node| node.widget)
            .collect()
    }

    pub fn find_widget(&self, widget: Widget) -> Option<&ViewNode> {
        self.all_nodes()
            .into_iter()
            .find(|node| node.widget == Some(widget))
    }
}

pub fn render_view(
    mode: ViewMode,
    snapshot: &ClientSnapshot,
    config: &DashboardConfig,
    context: RenderContext,
) -> DashboardView {
    match mode {
        ViewMode::Dashboard => render_dashboard(snapshot, config, context),
        ViewMode::Task => render_tasks(snapshot, config, context),
        ViewMode::Hybrid => render_hybrid(snapshot, config, context),
    }
}

/// Shared section builders used by every mode.
pub(crate) struct ViewBuilder<'a> {
    snapshot: &'a ClientSnapshot,
    config: &'a DashboardConfig,
    context: RenderContext,
}

impl<'a> ViewBuilder<'a> {
    pub(crate) fn new(snapshot: &'a ClientSnapshot, config: &'a DashboardConfig, context: RenderContext) -> Self {
        Self {
            snapshot,
            config,
            context,
        }
    }

    pub(crate) fn finish(self, mode: ViewMode, nodes: Vec<Option<ViewNode>>) -> DashboardView {
        DashboardView {
            mode,
            context: self.context,
            theme: self.config.theme.clone(),
            nodes: nodes.into_iter().flatten().collect(),
        }
    }

    fn widget(&self, widget: Widget, kind: NodeKind, children: Vec<ViewNode>) -> Option<ViewNode> {
        let visible = is_widget_visible(self.config, widget);
        match self.context {
            RenderContext::Client if !visible => None,
            RenderContext::Client => Some(ViewNode {
                kind,
                widget: Some(widget),
                hidden: false,
                toggle: None,
                children,
            }),
            RenderContext::Editor => Some(ViewNode {
                kind,
                widget: Some(widget),
                hidden: !visible,
                toggle: Some(ToggleAction::for_widget(widget, visible)),
                children,
            }),
        }
    }

    fn section(&self, id: &str, title: &str, children: Vec<ViewNode>) -> Option<ViewNode> {
        if children.is_empty() {
            return None;
        }
        Some(ViewNode::plain(
            NodeKind::Section {
                id: id.to_string(),
                title: title.to_string(),
            },
            children,
        ))
    }

    pub(crate) fn header(&self) -> Option<ViewNode> {
        let branding = &self.config.branding;
        let client = &self.snapshot.client;
        let welcome_message = if branding.custom_welcome_message.trim().is_empty() {
            format!("Welcome, {}", client.name)
        } else {
            branding.custom_welcome_message.clone()
        };
        let company_name = branding
            .show_company_name
            .then(|| client.company_name.clone().unwrap_or_else(|| client.name.clone()));
        let logo_url = (branding.show_logo && !branding.logo_url.trim().is_empty())
            .then(|| branding.logo_url.clone());
        let description = Some(branding.company_description.clone()).filter(|value| !value.trim().is_empty());

        Some(ViewNode::plain(
            NodeKind::Header {
                welcome_message,
                company_name,
                logo_url,
                description,
            },
            Vec::new(),
        ))
    }

    pub(crate) fn announcements(&self) -> Option<ViewNode> {
        let items: Vec<ViewNode> = active_announcements(self.config)
            .into_iter()
            .map(|announcement| {
                ViewNode::plain(
                    NodeKind::Announcement {
                        id: announcement.id.clone(),
                        title: announcement.title.clone(),
                        content: announcement.content.clone(),
                        tone: announcement.r#type,
                    },
                    Vec::new(),
                )
            })
            .collect();
        if items.is_empty() && self.context == RenderContext::Client {
            return None;
        }
        self.widget(Widget::Announcements, NodeKind::Announcements, items)
    }

    pub(crate) fn kpis(&self) -> Option<ViewNode> {
        if !self.config.layout.enable_kpis {
            return None;
        }
        let cards = kpi_cards(self.config)
            .into_iter()
            .filter_map(|card| {
                self.widget(
                    Widget::KpiCard(card.index),
                    NodeKind::KpiCard {
                        id: card.kpi.id.clone(),
                        title: card.kpi.title.clone(),
                        value: card.kpi.value.clone(),
                        kpi_type: card.kpi.r#type,
                        description: card.kpi.description.clone(),
                    },
                    Vec::new(),
                )
            })
            .collect();
        self.section("kpis", "Key Metrics", cards)
    }

    pub(crate) fn charts(&self, sections: &[ChartSection]) -> Option<ViewNode> {
        if !self.config.layout.enable_charts {
            return None;
        }
        let charts = sections
            .iter()
            .filter_map(|section| {
                self.widget(Widget::Chart(*section), NodeKind::Chart { section: *section }, Vec::new())
            })
            .collect();
        self.section("charts", "Performance", charts)
    }

    pub(crate) fn activity(&self) -> Option<ViewNode> {
        if !self.config.layout.enable_activity {
            return None;
        }
        let mut items = self.snapshot.activity.clone();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.widget(Widget::ActivityFeed, NodeKind::ActivityFeed { items }, Vec::new())
    }

    pub(crate) fn quick_actions(&self, actions: &[QuickAction]) -> Option<ViewNode> {
        if !self.config.layout.enable_quick_actions {
            return None;
        }
        let buttons = actions
            .iter()
            .filter_map(|action| {
                self.widget(
                    Widget::QuickAction(*action),
                    NodeKind::QuickAction {
                        action: *action,
                        label: action.label().to_string(),
                    },
                    Vec::new(),
                )
            })
            .collect();
        self.section("quick-actions", "Quick Actions", buttons)
    }

    pub(crate) fn task_stats(&self) -> Option<ViewNode> {
        if !self.config.layout.enable_task_stats {
            return None;
        }
        let counts = TaskCounts::from_tasks(&self.snapshot.tasks);
        let tiles = TaskStat::ALL
            .iter()
            .filter_map(|stat| {
                let count = match stat {
                    TaskStat::TotalTasks => counts.total,
                    TaskStat::CompletedTasks => counts.completed,
                    TaskStat::InProgressTasks => counts.in_progress,
                };
                self.widget(
                    Widget::TaskStat(*stat),
                    NodeKind::TaskStat {
                        stat: *stat,
                        label: stat.label().to_string(),
                        count,
                    },
                    Vec::new(),
                )
            })
            .collect();
        self.section("task-stats", "Task Summary", tiles)
    }

    pub(crate) fn progress_overview(&self) -> Option<ViewNode> {
        if !self.config.layout.enable_progress_overview {
            return None;
        }
        let counts = TaskCounts::from_tasks(&self.snapshot.tasks);
        self.widget(
            Widget::ProgressOverview,
            NodeKind::ProgressOverview {
                completed: counts.completed,
                total: counts.total,
                percent: counts.percent_complete(),
            },
            Vec::new(),
        )
    }

    pub(crate) fn task_list(&self) -> Option<ViewNode> {
        self.widget(
            Widget::TaskList,
            NodeKind::TaskList {
                tasks: ordered_tasks(&self.snapshot.tasks),
            },
            Vec::new(),
        )
    }

    pub(crate) fn help(&self) -> Option<ViewNode> {
        self.widget(
            Widget::HelpSection,
            NodeKind::HelpSection {
                message: "Questions about your dashboard? Reach out to your account team.".to_string(),
            },
            Vec::new(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskCounts {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
}

impl TaskCounts {
    pub fn from_tasks(tasks: &[ClientTask]) -> Self {
        tasks.iter().fold(Self::default(), |mut counts, task| {
            counts.total += 1;
            match task.status {
                TaskStatus::Completed => counts.completed += 1,
                TaskStatus::InProgress => counts.in_progress += 1,
                TaskStatus::Todo => {}
            }
            counts
        })
    }

    pub fn percent_complete(self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed * 100 + self.total / 2) / self.total) as u8
    }
}

/// Open tasks first by due date (undated last), then completed tasks.
fn ordered_tasks(tasks: &[ClientTask]) -> Vec<ClientTask> {
    let mut ordered = tasks.to_vec();
    ordered.sort_by(|a, b| {
        let a_done = a.status == TaskStatus::Completed;
        let b_done = b.status == TaskStatus::Completed;
        a_done
            .cmp(&b_done)
            .then_with(|| match (a.due_date, b.due_date) {
                (Some(a_due), Some(b_due)) => a_due.cmp(&b_due),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
    ordered
}
