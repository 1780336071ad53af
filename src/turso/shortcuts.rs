// Template and macro persistence using Turso/libsql
//
// Implements ShortcutStore on TursoClient. Every query is filtered by
// (user_id, department); records of other scopes are invisible.

use async_trait::async_trait;
use libsql::{params, Row, Transaction};

use super::{TursoClient, TursoError};
use crate::shortcuts::{Action, Macro, RegistryError, Scope, ShortcutStore, TextExpansion, TriggerSpec};

const KIND_ALT_KEY: &str = "alt_key";
const KIND_TEXT_WORD: &str = "text_word";

impl From<TursoError> for RegistryError {
    fn from(e: TursoError) -> Self {
        match e {
            TursoError::Connection(msg) => RegistryError::Unavailable(msg),
            other => RegistryError::Persistence(other.to_string()),
        }
    }
}

fn load_err(e: libsql::Error) -> RegistryError {
    RegistryError::Unavailable(e.to_string())
}

fn trigger_columns(trigger: &TriggerSpec) -> (&'static str, String) {
    match trigger {
        TriggerSpec::AltKey(key) => (KIND_ALT_KEY, key.to_string()),
        TriggerSpec::TextWord(word) => (KIND_TEXT_WORD, word.clone()),
    }
}

fn trigger_from_columns(kind: &str, value: String) -> Result<TriggerSpec, RegistryError> {
    match kind {
        KIND_ALT_KEY => value
            .chars()
            .next()
            .map(TriggerSpec::AltKey)
            .ok_or_else(|| RegistryError::Persistence("Alt trigger without key".to_string())),
        KIND_TEXT_WORD => Ok(TriggerSpec::TextWord(value)),
        other => Err(RegistryError::Persistence(format!("Unknown trigger kind: {}", other))),
    }
}

fn expansion_from_row(row: &Row) -> Result<TextExpansion, RegistryError> {
    Ok(TextExpansion {
        id: row.get(0).map_err(load_err)?,
        name: row.get(1).map_err(load_err)?,
        trigger: row.get(2).map_err(load_err)?,
        replacement: row.get(3).map_err(load_err)?,
    })
}

fn macro_from_row(row: &Row) -> Result<Macro, RegistryError> {
    let id: String = row.get(0).map_err(load_err)?;
    let title: String = row.get(1).map_err(load_err)?;
    let kind: String = row.get(2).map_err(load_err)?;
    let value: String = row.get(3).map_err(load_err)?;
    let active: i32 = row.get(4).map_err(load_err)?;
    let actions_json: String = row.get(5).map_err(load_err)?;

    let actions: Vec<Action> = serde_json::from_str(&actions_json)
        .map_err(|e| RegistryError::Persistence(format!("Corrupt actions for macro {}: {}", id, e)))?;

    Ok(Macro {
        trigger: trigger_from_columns(&kind, value)?,
        id,
        title,
        active: active != 0,
        actions,
    })
}

impl TursoClient {
    async fn collect_expansions(&self, mut rows: libsql::Rows) -> Result<Vec<TextExpansion>, RegistryError> {
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await.map_err(load_err)? {
            entries.push(expansion_from_row(&row)?);
        }
        Ok(entries)
    }
}

/// Deactivate every other active macro of `scope` bound to Alt+`key`.
/// Runs inside the caller's transaction; the caller rolls back on error.
async fn deactivate_alt_collisions(
    tx: &Transaction,
    scope: &Scope,
    id: &str,
    key: char,
) -> Result<Vec<String>, RegistryError> {
    let mut rows = tx
        .query(
            "SELECT id FROM shortcut_macro
             WHERE user_id = ?1 AND department = ?2 AND id != ?3 AND active = 1
               AND trigger_kind = ?4 AND lower(trigger_value) = lower(?5)",
            params![
                scope.user_id.clone(),
                scope.department.clone(),
                id.to_string(),
                KIND_ALT_KEY.to_string(),
                key.to_string()
            ],
        )
        .await
        .map_err(|e| RegistryError::Persistence(e.to_string()))?;

    let mut deactivated = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| RegistryError::Persistence(e.to_string()))?
    {
        deactivated.push(row.get::<String>(0).map_err(|e| RegistryError::Persistence(e.to_string()))?);
    }
    drop(rows);

    tx.execute(
        "UPDATE shortcut_macro SET active = 0
         WHERE user_id = ?1 AND department = ?2 AND id != ?3
           AND trigger_kind = ?4 AND lower(trigger_value) = lower(?5)",
        params![
            scope.user_id.clone(),
            scope.department.clone(),
            id.to_string(),
            KIND_ALT_KEY.to_string(),
            key.to_string()
        ],
    )
    .await
    .map_err(|e| RegistryError::Persistence(e.to_string()))?;

    Ok(deactivated)
}

#[async_trait]
impl ShortcutStore for TursoClient {
    async fn list_text_expansions(&self, scope: &Scope) -> Result<Vec<TextExpansion>, RegistryError> {
        let rows = self
            .query(
                "SELECT id, name, trigger, replacement FROM text_expansion
                 WHERE user_id = ?1 AND department = ?2 ORDER BY created_at, rowid",
                params![scope.user_id.clone(), scope.department.clone()],
            )
            .await
            .map_err(|e| RegistryError::Unavailable(e.to_string()))?;
        self.collect_expansions(rows).await
    }

    async fn insert_text_expansion(&self, scope: &Scope, entry: &TextExpansion) -> Result<(), RegistryError> {
        self.execute(
            "INSERT INTO text_expansion (id, user_id, department, name, trigger, replacement, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.id.clone(),
                scope.user_id.clone(),
                scope.department.clone(),
                entry.name.clone(),
                entry.trigger.clone(),
                entry.replacement.clone(),
                chrono::Utc::now().to_rfc3339()
            ],
        )
        .await?;
        Ok(())
    }

    async fn update_text_expansion(&self, scope: &Scope, entry: &TextExpansion) -> Result<(), RegistryError> {
        let changed = self
            .execute(
                "UPDATE text_expansion SET name = ?1, trigger = ?2, replacement = ?3
                 WHERE id = ?4 AND user_id = ?5 AND department = ?6",
                params![
                    entry.name.clone(),
                    entry.trigger.clone(),
                    entry.replacement.clone(),
                    entry.id.clone(),
                    scope.user_id.clone(),
                    scope.department.clone()
                ],
            )
            .await?;
        if changed == 0 {
            return Err(RegistryError::NotFound(entry.id.clone()));
        }
        Ok(())
    }

    async fn delete_text_expansion(&self, scope: &Scope, id: &str) -> Result<(), RegistryError> {
        let changed = self
            .execute(
                "DELETE FROM text_expansion WHERE id = ?1 AND user_id = ?2 AND department = ?3",
                params![id.to_string(), scope.user_id.clone(), scope.department.clone()],
            )
            .await?;
        if changed == 0 {
            return Err(RegistryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn list_macros(&self, scope: &Scope) -> Result<Vec<Macro>, RegistryError> {
        let mut rows = self
            .query(
                "SELECT id, title, trigger_kind, trigger_value, active, actions_json FROM shortcut_macro
                 WHERE user_id = ?1 AND department = ?2 ORDER BY created_at, rowid",
                params![scope.user_id.clone(), scope.department.clone()],
            )
            .await
            .map_err(|e| RegistryError::Unavailable(e.to_string()))?;

        let mut macros = Vec::new();
        while let Some(row) = rows.next().await.map_err(load_err)? {
            macros.push(macro_from_row(&row)?);
        }
        Ok(macros)
    }

    async fn get_macro(&self, scope: &Scope, id: &str) -> Result<Option<Macro>, RegistryError> {
        let mut rows = self
            .query(
                "SELECT id, title, trigger_kind, trigger_value, active, actions_json FROM shortcut_macro
                 WHERE id = ?1 AND user_id = ?2 AND department = ?3",
                params![id.to_string(), scope.user_id.clone(), scope.department.clone()],
            )
            .await
            .map_err(|e| RegistryError::Unavailable(e.to_string()))?;

        match rows.next().await.map_err(load_err)? {
            Some(row) => Ok(Some(macro_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn insert_macro(&self, scope: &Scope, item: &Macro) -> Result<(), RegistryError> {
        let (kind, value) = trigger_columns(&item.trigger);
        let actions_json =
            serde_json::to_string(&item.actions).map_err(|e| RegistryError::Persistence(e.to_string()))?;
        self.execute(
            "INSERT INTO shortcut_macro
             (id, user_id, department, title, trigger_kind, trigger_value, active, actions_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                item.id.clone(),
                scope.user_id.clone(),
                scope.department.clone(),
                item.title.clone(),
                kind.to_string(),
                value,
                item.active as i32,
                actions_json,
                chrono::Utc::now().to_rfc3339()
            ],
        )
        .await?;
        Ok(())
    }

    async fn update_macro(&self, scope: &Scope, item: &Macro) -> Result<Vec<String>, RegistryError> {
        let (kind, value) = trigger_columns(&item.trigger);
        let actions_json =
            serde_json::to_string(&item.actions).map_err(|e| RegistryError::Persistence(e.to_string()))?;

        let tx = self.transaction().await?;

        let changed = match tx
            .execute(
                "UPDATE shortcut_macro
                 SET title = ?1, trigger_kind = ?2, trigger_value = ?3, active = ?4, actions_json = ?5
                 WHERE id = ?6 AND user_id = ?7 AND department = ?8",
                params![
                    item.title.clone(),
                    kind.to_string(),
                    value,
                    item.active as i32,
                    actions_json,
                    item.id.clone(),
                    scope.user_id.clone(),
                    scope.department.clone()
                ],
            )
            .await
        {
            Ok(changed) => changed,
            Err(e) => {
                let _ = tx.rollback().await;
                return Err(RegistryError::Persistence(e.to_string()));
            }
        };
        if changed == 0 {
            let _ = tx.rollback().await;
            return Err(RegistryError::NotFound(item.id.clone()));
        }

        let deactivated = match item.trigger {
            TriggerSpec::AltKey(key) if item.active => {
                match deactivate_alt_collisions(&tx, scope, &item.id, key).await {
                    Ok(ids) => ids,
                    Err(e) => {
                        let _ = tx.rollback().await;
                        return Err(e);
                    }
                }
            }
            _ => Vec::new(),
        };

        tx.commit()
            .await
            .map_err(|e| RegistryError::Persistence(format!("Commit failed: {}", e)))?;

        Ok(deactivated)
    }

    async fn delete_macro(&self, scope: &Scope, id: &str) -> Result<(), RegistryError> {
        let changed = self
            .execute(
                "DELETE FROM shortcut_macro WHERE id = ?1 AND user_id = ?2 AND department = ?3",
                params![id.to_string(), scope.user_id.clone(), scope.department.clone()],
            )
            .await?;
        if changed == 0 {
            return Err(RegistryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn activate_macro(&self, scope: &Scope, id: &str) -> Result<Vec<String>, RegistryError> {
        let target = self
            .get_macro(scope, id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        let tx = self.transaction().await?;

        let deactivated = match target.trigger {
            TriggerSpec::AltKey(key) => match deactivate_alt_collisions(&tx, scope, id, key).await {
                Ok(ids) => ids,
                Err(e) => {
                    let _ = tx.rollback().await;
                    return Err(e);
                }
            },
            TriggerSpec::TextWord(_) => Vec::new(),
        };

        if let Err(e) = tx
            .execute(
                "UPDATE shortcut_macro SET active = 1 WHERE id = ?1 AND user_id = ?2 AND department = ?3",
                params![id.to_string(), scope.user_id.clone(), scope.department.clone()],
            )
            .await
        {
            let _ = tx.rollback().await;
            return Err(RegistryError::Persistence(e.to_string()));
        }

        tx.commit()
            .await
            .map_err(|e| RegistryError::Persistence(format!("Commit failed: {}", e)))?;

        Ok(deactivated)
    }

    async fn deactivate_macro(&self, scope: &Scope, id: &str) -> Result<(), RegistryError> {
        let changed = self
            .execute(
                "UPDATE shortcut_macro SET active = 0 WHERE id = ?1 AND user_id = ?2 AND department = ?3",
                params![id.to_string(), scope.user_id.clone(), scope.department.clone()],
            )
            .await?;
        if changed == 0 {
            return Err(RegistryError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "shortcuts_test.rs"]
mod tests;
