/// Bumped whenever `SCHEMA` changes shape.
pub const SCHEMA_VERSION: i32 = 1;

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS researcher_numbers (
    RN TEXT PRIMARY KEY,
    Name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS research_projects (
    AN TEXT NOT NULL,
    AT TEXT NOT NULL,
    AName TEXT NOT NULL,
    PI TEXT NOT NULL,
    CI TEXT,
    Distributed_Campus TEXT NOT NULL,
    Distributed_Location TEXT NOT NULL,
    Installed_Campus TEXT NOT NULL,
    Installed_Location TEXT NOT NULL
);

-- AN uniqueness is an index rather than a column constraint so that tables
-- created before the key existed pick it up on migration.
CREATE UNIQUE INDEX IF NOT EXISTS idx_research_projects_an ON research_projects(AN);
CREATE INDEX IF NOT EXISTS idx_research_projects_pi ON research_projects(PI);
CREATE INDEX IF NOT EXISTS idx_research_projects_ci ON research_projects(CI);
CREATE INDEX IF NOT EXISTS idx_researcher_numbers_name ON researcher_numbers(Name);
"#;
