use super::Store;
use crate::{
    error::{DistError, DistResult},
    template::{merge_templates, NewTemplate, Template, TemplateUpdate},
};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

impl Store {
    // ── Template ──────────────────────────────────────────────────

    /// Persist a new template, assigning its id and timestamps.
    pub fn insert_template(&self, new: NewTemplate) -> DistResult<Template> {
        let now = Utc::now();
        let template = Template {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            date: new.date,
            payment_policy: new.payment_policy,
            total_amount: new.total_amount,
            entries: new.entries,
            created_at: now,
            updated_at: now,
        };
        self.conn.execute(
            "INSERT INTO template (template_id, name, date, payload, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                template.id,
                template.name,
                template.date.to_string(),
                serde_json::to_string(&template)?,
                template.created_at.to_rfc3339(),
                template.updated_at.to_rfc3339(),
            ],
        )?;
        log::info!("template '{}' created ({})", template.name, template.id);
        Ok(template)
    }

    pub fn template_by_id(&self, template_id: &str) -> DistResult<Option<Template>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM template WHERE template_id = ?1",
                params![template_id],
                |row| row.get(0),
            )
            .optional()?;
        payload
            .map(|p| serde_json::from_str::<Template>(&p).map_err(DistError::from))
            .transpose()
    }

    /// All templates in creation order.
    pub fn all_templates(&self) -> DistResult<Vec<Template>> {
        let mut stmt = self
            .conn
            .prepare("SELECT payload FROM template ORDER BY rowid ASC")?;
        let payloads = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        payloads
            .iter()
            .map(|p| serde_json::from_str::<Template>(p).map_err(DistError::from))
            .collect()
    }

    /// Apply a partial update. Returns `None` when the id is unknown.
    pub fn update_template(
        &self,
        template_id: &str,
        update: TemplateUpdate,
    ) -> DistResult<Option<Template>> {
        let Some(mut template) = self.template_by_id(template_id)? else {
            return Ok(None);
        };
        template.apply(update, Utc::now());
        self.conn.execute(
            "UPDATE template SET name = ?1, date = ?2, payload = ?3, updated_at = ?4
             WHERE template_id = ?5",
            params![
                template.name,
                template.date.to_string(),
                serde_json::to_string(&template)?,
                template.updated_at.to_rfc3339(),
                template_id,
            ],
        )?;
        Ok(Some(template))
    }

    /// Returns false when nothing was deleted.
    pub fn delete_template(&self, template_id: &str) -> DistResult<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM template WHERE template_id = ?1",
            params![template_id],
        )?;
        if deleted > 0 {
            log::info!("template {template_id} deleted");
        }
        Ok(deleted > 0)
    }

    /// Merge the stored templates among `template_ids`. Unknown ids are
    /// ignored; `None` when none of them exist.
    pub fn merged_template(&self, template_ids: &[String]) -> DistResult<Option<Template>> {
        let templates: Vec<Template> = self
            .all_templates()?
            .into_iter()
            .filter(|t| template_ids.contains(&t.id))
            .collect();
        merge_templates(&templates, Utc::now())
    }
}
