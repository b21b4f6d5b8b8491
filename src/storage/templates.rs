//! Report Templates
//!
//! Information Hiding:
//! - Built-in system templates are compiled in and never written to storage
//! - User templates share a single blob under `rg_templates`

use super::{decode_or_default, KeyValueStore};
use crate::models::{ReportSection, ReportTemplate, SectionId, TemplateCategory, TemplateTheme};
use anyhow::Result;
use std::sync::Arc;

pub const TEMPLATES_KEY: &str = "rg_templates";
pub const DEFAULT_TEMPLATE_ID: &str = "sys_standard";

pub struct TemplateStore {
    store: Arc<dyn KeyValueStore>,
}

impl TemplateStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn read_user_templates(&self) -> Result<Vec<ReportTemplate>> {
        Ok(decode_or_default(TEMPLATES_KEY, self.store.get(TEMPLATES_KEY).await?))
    }

    /// System templates followed by the templates owned by `user_id`
    pub async fn templates(&self, user_id: Option<&str>) -> Result<Vec<ReportTemplate>> {
        let mut templates = system_templates();
        if let Some(user_id) = user_id {
            templates.extend(
                self.read_user_templates()
                    .await?
                    .into_iter()
                    .filter(|t| t.user_id.as_deref() == Some(user_id)),
            );
        }
        Ok(templates)
    }

    pub async fn find(&self, id: &str, user_id: Option<&str>) -> Result<Option<ReportTemplate>> {
        Ok(self
            .templates(user_id)
            .await?
            .into_iter()
            .find(|t| t.id == id))
    }

    /// Upsert by id
    pub async fn save_template(&self, template: &ReportTemplate) -> Result<()> {
        let mut stored = self.read_user_templates().await?;
        match stored.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template.clone(),
            None => stored.push(template.clone()),
        }
        self.store
            .set(TEMPLATES_KEY, serde_json::to_value(&stored)?)
            .await?;
        tracing::info!("[TemplateStore] Saved template {}", template.id);
        Ok(())
    }

    pub async fn delete_template(&self, id: &str) -> Result<()> {
        let mut stored = self.read_user_templates().await?;
        stored.retain(|t| t.id != id);
        self.store
            .set(TEMPLATES_KEY, serde_json::to_value(&stored)?)
            .await?;
        tracing::info!("[TemplateStore] Deleted template {}", id);
        Ok(())
    }
}

fn sections(entries: &[(SectionId, &str, bool)]) -> Vec<ReportSection> {
    entries
        .iter()
        .map(|(id, label, visible)| ReportSection::new(*id, *label, *visible))
        .collect()
}

fn theme(primary: &str, secondary: &str, background: &str, font: &str) -> TemplateTheme {
    TemplateTheme {
        primary: primary.to_string(),
        secondary: secondary.to_string(),
        background: background.to_string(),
        font: font.to_string(),
        logo_url: None,
    }
}

fn default_sections() -> Vec<ReportSection> {
    use SectionId::*;
    sections(&[
        (Header, "Report Header", true),
        (Metrics, "Key Metrics Dashboard", true),
        (Summary, "Executive Summary", true),
        (Charts, "Performance Visualization", true),
        (Outlook, "Future Outlook", true),
        (Table, "Detailed Data Table", true),
        (Insights, "Key Insights", true),
        (Risks, "Strategic Risks", true),
        (Recommendations, "Recommendations", true),
        (Footer, "Footer", true),
    ])
}

pub fn standard_template() -> ReportTemplate {
    ReportTemplate {
        id: DEFAULT_TEMPLATE_ID.to_string(),
        name: "Standard Business Report".to_string(),
        user_id: None,
        category: Some(TemplateCategory::General),
        sections: default_sections(),
        theme: theme("#00BCD4", "#1a1a1a", "#FFFFFF", "Inter"),
    }
}

pub fn system_templates() -> Vec<ReportTemplate> {
    use SectionId::*;

    let sales = ReportTemplate {
        id: "sys_sales".to_string(),
        name: "Quarterly Sales Review".to_string(),
        user_id: None,
        category: Some(TemplateCategory::Sales),
        sections: sections(&[
            (Header, "Header", true),
            (Metrics, "KPIs", true),
            (Charts, "Revenue Trends", true),
            (Table, "Regional Breakdown", true),
            (Recommendations, "Sales Strategy", true),
            (Summary, "Summary", false),
            (Outlook, "Forecast", true),
            (Insights, "Insights", false),
            (Risks, "Risks", false),
            (Footer, "Footer", true),
        ]),
        theme: theme("#10B981", "#064E3B", "#F0FDF4", "Roboto"),
    };

    let exec = ReportTemplate {
        id: "sys_exec".to_string(),
        name: "Executive Briefing".to_string(),
        user_id: None,
        category: Some(TemplateCategory::General),
        sections: sections(&[
            (Header, "Header", true),
            (Summary, "Executive Summary", true),
            (Risks, "Critical Risks", true),
            (Recommendations, "Action Items", true),
            (Metrics, "Key Metrics", false),
            (Charts, "Charts", false),
            (Outlook, "Outlook", false),
            (Table, "Table", false),
            (Insights, "Insights", false),
            (Footer, "Footer", true),
        ]),
        theme: theme("#1a1a1a", "#333333", "#fafafa", "Playfair Display"),
    };

    let hr = ReportTemplate {
        id: "sys_hr".to_string(),
        name: "Workforce Analytics".to_string(),
        user_id: None,
        category: Some(TemplateCategory::HR),
        sections: default_sections()
            .into_iter()
            .map(|mut s| {
                s.is_visible = matches!(s.id, Header | Metrics | Charts | Insights | Footer);
                s
            })
            .collect(),
        theme: theme("#EC4899", "#831843", "#FFFFFF", "Inter"),
    };

    vec![standard_template(), sales, exec, hr]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;

    fn user_template(id: &str, user: &str) -> ReportTemplate {
        ReportTemplate {
            id: id.to_string(),
            name: format!("Custom {}", id),
            user_id: Some(user.to_string()),
            category: Some(TemplateCategory::Marketing),
            sections: default_sections(),
            theme: theme("#000000", "#111111", "#FFFFFF", "Inter"),
        }
    }

    #[test]
    fn test_system_templates() {
        let ids: Vec<String> = system_templates().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["sys_standard", "sys_sales", "sys_exec", "sys_hr"]);

        let hr = system_templates().pop().unwrap();
        let visible: Vec<SectionId> = hr.visible_sections().map(|s| s.id).collect();
        assert_eq!(
            visible,
            vec![
                SectionId::Header,
                SectionId::Metrics,
                SectionId::Charts,
                SectionId::Insights,
                SectionId::Footer
            ]
        );
    }

    #[tokio::test]
    async fn test_user_templates_are_filtered_by_owner() {
        let store = TemplateStore::new(Arc::new(InMemoryStore::new()));
        store.save_template(&user_template("mine", "u1")).await.unwrap();
        store.save_template(&user_template("theirs", "u2")).await.unwrap();

        assert_eq!(store.templates(None).await.unwrap().len(), 4);

        let mine = store.templates(Some("u1")).await.unwrap();
        assert_eq!(mine.len(), 5);
        assert_eq!(mine[4].id, "mine");
    }

    #[tokio::test]
    async fn test_save_template_upserts_and_delete_removes() {
        let store = TemplateStore::new(Arc::new(InMemoryStore::new()));
        store.save_template(&user_template("t", "u1")).await.unwrap();

        let mut renamed = user_template("t", "u1");
        renamed.name = "Renamed".to_string();
        store.save_template(&renamed).await.unwrap();

        let found = store.find("t", Some("u1")).await.unwrap().unwrap();
        assert_eq!(found.name, "Renamed");
        assert_eq!(store.templates(Some("u1")).await.unwrap().len(), 5);

        store.delete_template("t").await.unwrap();
        assert!(store.find("t", Some("u1")).await.unwrap().is_none());
    }
}
