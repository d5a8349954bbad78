//! KPI list edits. `kpis[i]` and `widgetVisibility.kpiCards[i]` describe the
//! same card, so every edit here moves both arrays together.

use crate::dashboard::visibility::WidgetVisibility;
use crate::dashboard::widgets::KPI_CARDS_PATH;
use crate::errors::{AppError, AppResult};
use crate::models::{DashboardConfig, Kpi, KpiPatch, KpiType, NewKpi};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct KpiCard<'a> {
    pub index: usize,
    pub kpi: &'a Kpi,
    pub visible: bool,
}

pub fn kpi_cards(config: &DashboardConfig) -> Vec<KpiCard<'_>> {
    config
        .kpis
        .iter()
        .enumerate()
        .map(|(index, kpi)| KpiCard {
            index,
            kpi,
            visible: config.layout.widget_visibility.resolve(KPI_CARDS_PATH, Some(index)),
        })
        .collect()
}

/// Pads `kpiCards` with visible slots, or truncates orphaned ones, so it has
/// exactly one slot per KPI.
pub fn align_kpi_cards(config: &DashboardConfig) -> DashboardConfig {
    let mut next = config.clone();
    let len = next.kpis.len();
    aligned_slots(&mut next.layout.widget_visibility, len);
    next
}

pub fn add_kpi(config: &DashboardConfig, payload: NewKpi) -> AppResult<DashboardConfig> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("KPI title is required".to_string()));
    }

    let id = payload
        .id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    if config.kpis.iter().any(|kpi| kpi.id == id) {
        return Err(AppError::Validation(format!("KPI id '{}' already exists", id)));
    }

    let mut next = config.clone();
    let len = next.kpis.len();
    aligned_slots(&mut next.layout.widget_visibility, len).push(Value::Bool(true));
    next.kpis.push(Kpi {
        id,
        title: title.to_string(),
        value: payload.value,
        r#type: payload.r#type.unwrap_or(KpiType::Text),
        description: payload.description.filter(|value| !value.trim().is_empty()),
    });
    Ok(next)
}

pub fn remove_kpi(config: &DashboardConfig, kpi_id: &str) -> AppResult<DashboardConfig> {
    let position = find_kpi(config, kpi_id)?;
    let mut next = config.clone();
    let len = next.kpis.len();
    aligned_slots(&mut next.layout.widget_visibility, len).remove(position);
    next.kpis.remove(position);
    Ok(next)
}

pub fn update_kpi(config: &DashboardConfig, kpi_id: &str, patch: KpiPatch) -> AppResult<DashboardConfig> {
    let position = find_kpi(config, kpi_id)?;
    let mut next = config.clone();
    let kpi = &mut next.kpis[position];

    if let Some(title) = patch.title {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("KPI title is required".to_string()));
        }
        kpi.title = title.to_string();
    }
    if let Some(value) = patch.value {
        kpi.value = value;
    }
    if let Some(kind) = patch.r#type {
        kpi.r#type = kind;
    }
    if let Some(description) = patch.description {
        kpi.description = Some(description).filter(|value| !value.trim().is_empty());
    }
    Ok(next)
}

/// Moves a KPI and its visibility slot to `to` (clamped to the list end).
pub fn move_kpi(config: &DashboardConfig, kpi_id: &str, to: usize) -> AppResult<DashboardConfig> {
    let from = find_kpi(config, kpi_id)?;
    let mut next = config.clone();
    let len = next.kpis.len();
    let to = to.min(len - 1);

    let slots = aligned_slots(&mut next.layout.widget_visibility, len);
    let slot = slots.remove(from);
    slots.insert(to, slot);

    let kpi = next.kpis.remove(from);
    next.kpis.insert(to, kpi);
    Ok(next)
}

fn find_kpi(config: &DashboardConfig, kpi_id: &str) -> AppResult<usize> {
    config
        .kpis
        .iter()
        .position(|kpi| kpi.id == kpi_id)
        .ok_or_else(|| AppError::NotFound(format!("KPI '{}' not found", kpi_id)))
}

fn aligned_slots(visibility: &mut WidgetVisibility, len: usize) -> &mut Vec<Value> {
    // A scalar `kpiCards: false` hides every card; keep that when expanding.
    let fill = match visibility.lookup(KPI_CARDS_PATH) {
        None | Some(Value::Array(_)) => true,
        Some(other) => other != &Value::Bool(false),
    };
    let slots = visibility.slots_mut(KPI_CARDS_PATH);
    slots.truncate(len);
    while slots.len() < len {
        slots.push(Value::Bool(fill));
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::{add_kpi, align_kpi_cards, kpi_cards, move_kpi, remove_kpi, update_kpi};
    use crate::dashboard::defaults::default_dashboard_config;
    use crate::dashboard::visibility::set_visibility;
    use crate::errors::AppError;
    use crate::models::{KpiPatch, KpiType, NewKpi};
    use serde_json::json;

    fn new_kpi(id: &str) -> NewKpi {
        NewKpi {
            id: Some(id.to_string()),
            title: format!("KPI {}", id),
            value: "7".to_string(),
            r#type: Some(KpiType::Number),
            description: None,
        }
    }

    fn visible_ids(config: &crate::models::DashboardConfig) -> Vec<(String, bool)> {
        kpi_cards(config)
            .into_iter()
            .map(|card| (card.kpi.id.clone(), card.visible))
            .collect()
    }

    #[test]
    fn add_appends_visible_slot() {
        let config = default_dashboard_config();
        let next = add_kpi(&config, new_kpi("leads")).expect("add kpi");
        assert_eq!(next.kpis.len(), 5);
        assert_eq!(
            next.layout.widget_visibility.lookup("kpiCards"),
            Some(&json!([true, true, true, true, true]))
        );
    }

    #[test]
    fn add_generates_id_and_rejects_duplicates() {
        let config = default_dashboard_config();
        let next = add_kpi(
            &config,
            NewKpi {
                title: "Spend".to_string(),
                value: "$10".to_string(),
                ..Default::default()
            },
        )
        .expect("add kpi");
        let added = next.kpis.last().expect("added kpi");
        assert!(!added.id.is_empty());
        assert_eq!(added.r#type, KpiType::Text);

        let error = add_kpi(&next, new_kpi(&added.id)).expect_err("duplicate id");
        assert!(matches!(error, AppError::Validation(_)));
        assert!(add_kpi(&config, NewKpi::default()).is_err());
    }

    #[test]
    fn remove_keeps_flags_with_their_kpis() {
        let config = set_visibility(&default_dashboard_config(), "kpiCards", false, Some(2));
        let third = config.kpis[2].id.clone();
        let second = config.kpis[1].id.clone();

        let without_second = remove_kpi(&config, &second).expect("remove kpi");
        let cards = visible_ids(&without_second);
        assert_eq!(cards.len(), 3);
        assert!(cards.contains(&(third, false)));
        assert!(cards.iter().filter(|(_, visible)| !visible).count() == 1);
    }

    #[test]
    fn remove_unknown_is_not_found() {
        let config = default_dashboard_config();
        assert!(matches!(remove_kpi(&config, "missing"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn move_carries_visibility_slot() {
        let config = set_visibility(&default_dashboard_config(), "kpiCards", false, Some(0));
        let first = config.kpis[0].id.clone();
        let moved = move_kpi(&config, &first, 99).expect("move kpi");
        assert_eq!(moved.kpis[3].id, first);
        assert_eq!(visible_ids(&moved)[3], (first, false));
        assert!(visible_ids(&moved)[..3].iter().all(|(_, visible)| *visible));
    }

    #[test]
    fn add_after_wholesale_replacement_drops_orphan_slots() {
        let mut config = default_dashboard_config();
        config.kpis.truncate(1);
        let config = set_visibility(&config, "kpiCards", false, Some(3));

        let next = add_kpi(&config, new_kpi("fresh")).expect("add kpi");
        assert_eq!(next.layout.widget_visibility.lookup("kpiCards"), Some(&json!([true, true])));
        assert!(visible_ids(&next).iter().all(|(_, visible)| *visible));
    }

    #[test]
    fn align_expands_scalar_flag() {
        let config = set_visibility(&default_dashboard_config(), "kpiCards", false, None);
        let aligned = align_kpi_cards(&config);
        assert_eq!(
            aligned.layout.widget_visibility.lookup("kpiCards"),
            Some(&json!([false, false, false, false]))
        );
    }

    #[test]
    fn update_patches_selected_fields() {
        let config = default_dashboard_config();
        let id = config.kpis[0].id.clone();
        let next = update_kpi(
            &config,
            &id,
            KpiPatch {
                value: Some("$12,400".to_string()),
                description: Some("  ".to_string()),
                ..Default::default()
            },
        )
        .expect("update kpi");
        assert_eq!(next.kpis[0].value, "$12,400");
        assert_eq!(next.kpis[0].title, config.kpis[0].title);
        assert!(next.kpis[0].description.is_none());
    }
}
