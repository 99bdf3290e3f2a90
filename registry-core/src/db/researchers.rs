use rusqlite::{params, OptionalExtension};

use super::Database;
use crate::error::{present, required, RegistryError, Result};
use crate::models::Researcher;

impl Database {
    /// Adds a researcher or renames an existing id.
    pub fn register_researcher(&self, id: &str, name: &str) -> Result<()> {
        let id = required(Some(id), "id")?;
        let name = required(Some(name), "name")?;

        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO researcher_numbers (RN, Name) VALUES (?1, ?2)
                 ON CONFLICT(RN) DO UPDATE SET Name = excluded.Name",
                params![id, name],
            )?;
            Ok(())
        })?;

        tracing::info!(researcher_id = id, "Registered researcher {}", name);
        Ok(())
    }

    /// Exact-name lookup. Names are not unique; the lowest id wins.
    pub fn find_researcher_id_by_name(&self, name: &str) -> Result<String> {
        let name = required(Some(name), "name")?;

        let id = self.with_connection(|conn| {
            Ok(conn
                .query_row(
                    "SELECT RN FROM researcher_numbers WHERE Name = ?1 ORDER BY RN LIMIT 1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()?)
        })?;

        id.ok_or_else(|| {
            tracing::warn!("No researcher named {}", name);
            RegistryError::not_found("researcher", name)
        })
    }

    pub fn get_researcher_name(&self, researcher_id: &str) -> Result<String> {
        let researcher_id = required(Some(researcher_id), "researcherId")?;
        tracing::debug!(researcher_id, "Looking up researcher name");

        let name = self.with_connection(|conn| {
            Ok(conn
                .query_row(
                    "SELECT Name FROM researcher_numbers WHERE RN = ?1",
                    params![researcher_id],
                    |row| row.get(0),
                )
                .optional()?)
        })?;

        name.ok_or_else(|| {
            tracing::warn!(researcher_id, "Researcher not found");
            RegistryError::not_found("researcher", researcher_id)
        })
    }

    /// Case-sensitive substring search on names, ordered by id.
    ///
    /// Zero matches is an empty list, not an error. `limit` caps the number
    /// of rows returned; `None` returns every match.
    pub fn search_researchers(
        &self,
        name_part: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Researcher>> {
        let name_part = present(Some(name_part), "name")?;
        // SQLite treats a negative LIMIT as unbounded.
        let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));

        let researchers = self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT RN, Name FROM researcher_numbers
                 WHERE instr(Name, ?1) > 0
                 ORDER BY RN
                 LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![name_part, limit], |row| {
                Ok(Researcher {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })?;

        tracing::debug!(count = researchers.len(), "Researcher search for {:?}", name_part);
        Ok(researchers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        db.register_researcher("R1", "田中 太郎").unwrap();
        db.register_researcher("R2", "山田 花子").unwrap();
        db.register_researcher("R3", "Alice Smith").unwrap();
        db
    }

    #[test]
    fn resolves_name_and_id_both_ways() {
        let db = setup_db();

        assert_eq!(db.find_researcher_id_by_name("山田 花子").unwrap(), "R2");
        assert_eq!(db.get_researcher_name("R2").unwrap(), "山田 花子");
    }

    #[test]
    fn exact_lookups_do_not_match_partial_names() {
        let db = setup_db();

        assert!(matches!(
            db.find_researcher_id_by_name("山田"),
            Err(RegistryError::NotFound { .. })
        ));
        assert!(matches!(
            db.get_researcher_name("R404"),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn duplicate_names_resolve_to_lowest_id() {
        let db = setup_db();
        db.register_researcher("R0", "Alice Smith").unwrap();

        assert_eq!(db.find_researcher_id_by_name("Alice Smith").unwrap(), "R0");
    }

    #[test]
    fn register_renames_existing_id() {
        let db = setup_db();
        db.register_researcher("R3", "Alice Jones").unwrap();

        assert_eq!(db.get_researcher_name("R3").unwrap(), "Alice Jones");
    }

    #[test]
    fn search_matches_substring_case_sensitively() {
        let db = setup_db();
        db.register_researcher("R4", "田村 一郎").unwrap();

        let found = db.search_researchers("田", None).unwrap();
        let ids: Vec<&str> = found.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["R1", "R2", "R4"]);

        assert!(db.search_researchers("smith", None).unwrap().is_empty());
        assert_eq!(db.search_researchers("Smith", None).unwrap().len(), 1);
    }

    #[test]
    fn search_for_a_space_matches_full_names() {
        let db = setup_db();

        let found = db.search_researchers(" ", None).unwrap();
        let ids: Vec<&str> = found.iter().map(|r| r.id.as_str()).collect();

        assert_eq!(ids, vec!["R1", "R2", "R3"]);
    }

    #[test]
    fn search_with_no_match_is_empty() {
        let db = setup_db();
        assert!(db.search_researchers("鈴木", None).unwrap().is_empty());
    }

    #[test]
    fn search_respects_limit() {
        let db = setup_db();
        let found = db.search_researchers("田", Some(1)).unwrap();
        assert_eq!(
            found,
            vec![Researcher {
                id: "R1".into(),
                name: "田中 太郎".into(),
            }]
        );
    }

    #[test]
    fn blank_inputs_are_validation_errors() {
        let db = setup_db();
        assert!(matches!(
            db.search_researchers("", None),
            Err(RegistryError::Validation { field: "name" })
        ));
        assert!(matches!(
            db.find_researcher_id_by_name("  "),
            Err(RegistryError::Validation { .. })
        ));
        assert!(matches!(
            db.get_researcher_name(""),
            Err(RegistryError::Validation { .. })
        ));
        assert!(db.register_researcher("R9", "").is_err());
    }
}
