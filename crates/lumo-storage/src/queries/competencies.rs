// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Competency reference data, seeded by migration.

use lumo_core::LumoError;

use crate::database::{Database, map_tr_err};
use crate::models::CompetencyDefinition;

/// All competency definitions in display order.
pub async fn list_definitions(db: &Database) -> Result<Vec<CompetencyDefinition>, LumoError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT name, description, evaluation_criteria, display_order
                 FROM competency_definitions ORDER BY display_order ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(CompetencyDefinition {
                    name: row.get(0)?,
                    description: row.get(1)?,
                    evaluation_criteria: row.get(2)?,
                    display_order: row.get(3)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
