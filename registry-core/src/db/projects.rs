use rusqlite::{params, OptionalExtension, Row, TransactionBehavior};

use super::Database;
use crate::error::{required, RegistryError, Result};
use crate::models::{Project, ReconcileOutcome, ReconcileProjectInput};

const PROJECT_COLUMNS: &str = "AN, AT, AName, PI, CI, Distributed_Campus, Distributed_Location, \
     Installed_Campus, Installed_Location";

impl Database {
    /// Creates or updates the project identified by `projectNumber`.
    ///
    /// An existing row is updated only when its project number matches AND
    /// either its PI equals the submitted PI or its CI equals the submitted
    /// CI. Otherwise an insert is attempted, which the unique key on the
    /// project number rejects if a row held by other investigators exists.
    pub fn reconcile_project(&self, input: ReconcileProjectInput) -> Result<ReconcileOutcome> {
        let project_number = required(input.project_number.as_deref(), "projectNumber")?;
        let pi = required(
            input.principal_investigator_id.as_deref(),
            "principalInvestigatorId",
        )?;
        let ci = input
            .co_investigator_id
            .as_deref()
            .filter(|ci| !ci.trim().is_empty());

        let fields = params![
            input.project_type,
            input.project_name,
            pi,
            ci,
            input.delivery_campus,
            input.delivery_location,
            input.install_campus,
            input.install_location,
            project_number,
        ];

        let result = self.with_connection(|conn| {
            // IMMEDIATE takes the write lock up front, so the match check and
            // the write below see the same state even across connections.
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let matched: Option<String> = tx
                .query_row(
                    "SELECT AN FROM research_projects
                     WHERE AN = ?1 AND (PI = ?2 OR CI = ?3)
                     LIMIT 1",
                    params![project_number, pi, ci],
                    |row| row.get(0),
                )
                .optional()?;

            let outcome = if matched.is_some() {
                tx.execute(
                    "UPDATE research_projects
                     SET AT = ?1, AName = ?2, PI = ?3, CI = ?4,
                         Distributed_Campus = ?5, Distributed_Location = ?6,
                         Installed_Campus = ?7, Installed_Location = ?8
                     WHERE AN = ?9",
                    fields,
                )?;
                ReconcileOutcome::Updated
            } else {
                tx.execute(
                    "INSERT INTO research_projects (AT, AName, PI, CI,
                         Distributed_Campus, Distributed_Location,
                         Installed_Campus, Installed_Location, AN)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    fields,
                )?;
                ReconcileOutcome::Created
            };

            tx.commit()?;
            Ok(outcome)
        });

        match &result {
            Ok(outcome) => tracing::info!(
                project_number,
                principal_investigator = pi,
                "Project {}",
                outcome.as_str()
            ),
            Err(err) if err.is_constraint_violation() => tracing::warn!(
                project_number,
                principal_investigator = pi,
                "Project write rejected by store constraint: {}",
                err
            ),
            Err(err) => tracing::error!(project_number, "Project reconciliation failed: {}", err),
        }

        result
    }

    /// Distinct project numbers where `researcher_id` is the PI or the CI.
    pub fn find_project_numbers_by_researcher(&self, researcher_id: &str) -> Result<Vec<String>> {
        let researcher_id = required(Some(researcher_id), "researcherId")?;

        let numbers = self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT AN FROM research_projects
                 WHERE PI = ?1 OR (CI IS NOT NULL AND CI = ?1)
                 ORDER BY AN",
            )?;
            let rows = stmt.query_map(params![researcher_id], |row| row.get(0))?;
            Ok(rows.collect::<rusqlite::Result<Vec<String>>>()?)
        })?;

        if numbers.is_empty() {
            tracing::warn!(researcher_id, "No projects found for researcher");
            return Err(RegistryError::not_found("projects for researcher", researcher_id));
        }

        tracing::debug!(researcher_id, count = numbers.len(), "Found projects for researcher");
        Ok(numbers)
    }

    pub fn get_project(&self, project_number: &str) -> Result<Project> {
        let project_number = required(Some(project_number), "projectNumber")?;

        let project = self.with_connection(|conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {} FROM research_projects WHERE AN = ?1", PROJECT_COLUMNS),
                    params![project_number],
                    Self::row_to_project,
                )
                .optional()?)
        })?;

        project.ok_or_else(|| {
            tracing::warn!(project_number, "Project not found");
            RegistryError::not_found("project", project_number)
        })
    }

    fn row_to_project(row: &Row) -> rusqlite::Result<Project> {
        Ok(Project {
            project_number: row.get(0)?,
            project_type: row.get(1)?,
            project_name: row.get(2)?,
            principal_investigator_id: row.get(3)?,
            co_investigator_id: row.get(4)?,
            delivery_campus: row.get(5)?,
            delivery_location: row.get(6)?,
            install_campus: row.get(7)?,
            install_location: row.get(8)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::thread;

    use tempfile::TempDir;

    use super::*;

    fn setup_db() -> Database {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn input(number: &str, pi: &str, ci: Option<&str>, name: &str) -> ReconcileProjectInput {
        ReconcileProjectInput {
            project_number: Some(number.into()),
            project_type: Some("Grant-in-Aid".into()),
            project_name: Some(name.into()),
            principal_investigator_id: Some(pi.into()),
            co_investigator_id: ci.map(Into::into),
            delivery_campus: Some("North".into()),
            delivery_location: Some("Bldg 3, Room 210".into()),
            install_campus: Some("South".into()),
            install_location: Some("Lab 7".into()),
        }
    }

    fn row_count(db: &Database, number: &str) -> i64 {
        db.with_connection(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM research_projects WHERE AN = ?1",
                params![number],
                |row| row.get(0),
            )?)
        })
        .unwrap()
    }

    #[test]
    fn creates_then_updates_same_project() {
        let db = setup_db();

        let first = db.reconcile_project(input("P100", "R1", None, "Study A")).unwrap();
        assert_eq!(first, ReconcileOutcome::Created);

        let second = db
            .reconcile_project(input("P100", "R1", None, "Study A revised"))
            .unwrap();
        assert_eq!(second, ReconcileOutcome::Updated);

        assert_eq!(row_count(&db, "P100"), 1);
        assert_eq!(db.get_project("P100").unwrap().project_name, "Study A revised");
    }

    #[test]
    fn matches_on_co_investigator_and_replaces_pi() {
        let db = setup_db();
        db.reconcile_project(input("P200", "R1", Some("R2"), "Study B")).unwrap();

        let outcome = db
            .reconcile_project(input("P200", "R9", Some("R2"), "Study B"))
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Updated);
        let project = db.get_project("P200").unwrap();
        assert_eq!(project.principal_investigator_id, "R9");
        assert_eq!(project.co_investigator_id.as_deref(), Some("R2"));
    }

    #[test]
    fn update_clears_co_investigator_when_omitted() {
        let db = setup_db();
        db.reconcile_project(input("P300", "R1", Some("R2"), "Study C")).unwrap();

        db.reconcile_project(input("P300", "R1", None, "Study C")).unwrap();

        assert_eq!(db.get_project("P300").unwrap().co_investigator_id, None);
    }

    #[test]
    fn unmatched_investigators_on_existing_number_are_rejected() {
        let db = setup_db();
        db.reconcile_project(input("P400", "R1", Some("R2"), "Original")).unwrap();

        let err = db
            .reconcile_project(input("P400", "R8", Some("R9"), "Intruder"))
            .unwrap_err();

        assert!(err.is_constraint_violation());
        assert!(err.is_duplicate_key());
        assert!(err.is_retryable());
        let stored = db.get_project("P400").unwrap();
        assert_eq!(stored.project_name, "Original");
        assert_eq!(stored.principal_investigator_id, "R1");
        assert_eq!(row_count(&db, "P400"), 1);
    }

    #[test]
    fn blank_co_investigator_does_not_match_stored_null() {
        let db = setup_db();
        db.reconcile_project(input("P500", "R1", None, "Study E")).unwrap();

        let err = db
            .reconcile_project(input("P500", "R7", Some(""), "Study E"))
            .unwrap_err();

        assert!(err.is_constraint_violation());
    }

    #[test]
    fn missing_descriptive_field_is_a_store_error() {
        let db = setup_db();
        let mut partial = input("P600", "R1", None, "Study F");
        partial.install_location = None;

        let err = db.reconcile_project(partial).unwrap_err();

        assert!(matches!(err, RegistryError::Store(_)));
        assert!(err.is_constraint_violation());
        assert!(!err.is_duplicate_key());
        assert!(!err.is_retryable());
        assert!(matches!(
            db.get_project("P600"),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn requires_project_number_and_pi() {
        let db = setup_db();

        let mut no_number = input("P700", "R1", None, "x");
        no_number.project_number = Some(" ".into());
        assert!(matches!(
            db.reconcile_project(no_number),
            Err(RegistryError::Validation { field: "projectNumber" })
        ));

        let mut no_pi = input("P700", "R1", None, "x");
        no_pi.principal_investigator_id = None;
        assert!(matches!(
            db.reconcile_project(no_pi),
            Err(RegistryError::Validation { field: "principalInvestigatorId" })
        ));
    }

    #[test]
    fn get_project_round_trips_created_record() {
        let db = setup_db();
        let submitted = input("A1", "R1", Some("R2"), "Round trip");
        db.reconcile_project(submitted).unwrap();

        let project = db.get_project("A1").unwrap();

        assert_eq!(
            project,
            Project {
                project_number: "A1".into(),
                project_type: "Grant-in-Aid".into(),
                project_name: "Round trip".into(),
                principal_investigator_id: "R1".into(),
                co_investigator_id: Some("R2".into()),
                delivery_campus: "North".into(),
                delivery_location: "Bldg 3, Room 210".into(),
                install_campus: "South".into(),
                install_location: "Lab 7".into(),
            }
        );
    }

    #[test]
    fn get_project_unknown_number_is_not_found() {
        let db = setup_db();
        assert!(matches!(
            db.get_project("missing"),
            Err(RegistryError::NotFound { what: "project", .. })
        ));
        assert!(matches!(
            db.get_project(""),
            Err(RegistryError::Validation { .. })
        ));
    }

    #[test]
    fn finds_projects_as_pi_and_ci() {
        let db = setup_db();
        db.reconcile_project(input("A1", "R1", None, "a")).unwrap();
        db.reconcile_project(input("B2", "R5", Some("R1"), "b")).unwrap();
        db.reconcile_project(input("C3", "R5", None, "c")).unwrap();

        let found: HashSet<String> = db
            .find_project_numbers_by_researcher("R1")
            .unwrap()
            .into_iter()
            .collect();

        assert_eq!(found, HashSet::from(["A1".to_string(), "B2".to_string()]));
    }

    #[test]
    fn researcher_on_both_sides_is_listed_once() {
        let db = setup_db();
        db.reconcile_project(input("A1", "R1", Some("R1"), "self")).unwrap();

        let found = db.find_project_numbers_by_researcher("R1").unwrap();

        assert_eq!(found, vec!["A1".to_string()]);
    }

    #[test]
    fn researcher_without_projects_is_not_found() {
        let db = setup_db();
        db.reconcile_project(input("A1", "R1", None, "a")).unwrap();

        assert!(matches!(
            db.find_project_numbers_by_researcher("R404"),
            Err(RegistryError::NotFound { .. })
        ));
        assert!(matches!(
            db.find_project_numbers_by_researcher(""),
            Err(RegistryError::Validation { field: "researcherId" })
        ));
    }

    #[test]
    fn concurrent_creation_leaves_one_row() {
        let db = setup_db();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let db = db.clone();
                thread::spawn(move || {
                    db.reconcile_project(input("P900", "R1", None, &format!("writer {}", i)))
                })
            })
            .collect();

        let outcomes: Vec<ReconcileOutcome> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();

        let created = outcomes
            .iter()
            .filter(|o| **o == ReconcileOutcome::Created)
            .count();
        assert_eq!(created, 1);
        assert_eq!(row_count(&db, "P900"), 1);
    }

    #[test]
    fn separate_connections_serialize_reconciliation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("research.db");
        let first = Database::open(&path).unwrap();
        first.migrate().unwrap();
        let second = Database::open(&path).unwrap();

        let a = {
            let db = first.clone();
            thread::spawn(move || db.reconcile_project(input("P950", "R1", None, "a")))
        };
        let b = {
            let db = second.clone();
            thread::spawn(move || db.reconcile_project(input("P950", "R1", None, "b")))
        };

        let mut outcomes = vec![a.join().unwrap().unwrap(), b.join().unwrap().unwrap()];
        outcomes.sort_by_key(|o| o.as_str());

        assert_eq!(outcomes, vec![ReconcileOutcome::Created, ReconcileOutcome::Updated]);
        assert_eq!(row_count(&first, "P950"), 1);
    }
}
