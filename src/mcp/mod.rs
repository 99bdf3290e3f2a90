use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerInfo},
    tool, tool_handler, tool_router,
    schemars::JsonSchema,
    ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::models::*;
use crate::RegistryError;

#[derive(Clone)]
pub struct McpServer {
    db: Database,
    search_limit: Option<usize>,
    tool_router: ToolRouter<Self>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReconcileProjectRequest {
    #[schemars(description = "The project number (unique key)")]
    pub project_number: String,
    #[schemars(description = "Researcher id of the principal investigator")]
    pub principal_investigator_id: String,
    #[schemars(description = "Researcher id of the co-investigator, if any")]
    pub co_investigator_id: Option<String>,
    #[schemars(description = "The project type")]
    pub project_type: String,
    #[schemars(description = "The project name")]
    pub project_name: String,
    #[schemars(description = "Campus the equipment is delivered to")]
    pub delivery_campus: String,
    #[schemars(description = "Delivery location on that campus")]
    pub delivery_location: String,
    #[schemars(description = "Campus the equipment is installed on")]
    pub install_campus: String,
    #[schemars(description = "Install location on that campus")]
    pub install_location: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProjectNumberRequest {
    #[schemars(description = "The project number to fetch")]
    pub project_number: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ResearcherIdRequest {
    #[schemars(description = "The researcher id")]
    pub researcher_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ResearcherNameRequest {
    #[schemars(description = "Researcher name; exact for lookups, a substring for searches")]
    pub name: String,
}

#[derive(Debug, Serialize)]
struct ResearcherProjects<'a> {
    researcher_id: &'a str,
    researcher_name: Option<String>,
    projects: Vec<String>,
}

impl From<ReconcileProjectRequest> for ReconcileProjectInput {
    fn from(req: ReconcileProjectRequest) -> Self {
        Self {
            project_number: Some(req.project_number),
            project_type: Some(req.project_type),
            project_name: Some(req.project_name),
            principal_investigator_id: Some(req.principal_investigator_id),
            co_investigator_id: req.co_investigator_id,
            delivery_campus: Some(req.delivery_campus),
            delivery_location: Some(req.delivery_location),
            install_campus: Some(req.install_campus),
            install_location: Some(req.install_location),
        }
    }
}

impl McpServer {
    pub fn new(db: Database, search_limit: Option<usize>) -> Self {
        Self {
            db,
            search_limit,
            tool_router: Self::tool_router(),
        }
    }

    fn map_err(err: RegistryError) -> McpError {
        match err {
            RegistryError::Validation { .. } | RegistryError::NotFound { .. } => {
                McpError::invalid_params(err.to_string(), None)
            }
            RegistryError::Store(_) | RegistryError::Unavailable(_) => {
                McpError::internal_error(err.to_string(), None)
            }
        }
    }

    fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

#[tool_router]
impl McpServer {
    #[tool(description = "Create or update a research project. Updates only when the project number matches and the PI or CI matches the stored record")]
    async fn reconcile_project(
        &self,
        params: Parameters<ReconcileProjectRequest>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self
            .db
            .reconcile_project(params.0.into())
            .map_err(Self::map_err)?;

        Ok(CallToolResult::success(vec![Content::text(format!(
            "Project {}",
            outcome.as_str()
        ))]))
    }

    #[tool(description = "Get the full record of a research project by project number")]
    async fn get_project(
        &self,
        params: Parameters<ProjectNumberRequest>,
    ) -> Result<CallToolResult, McpError> {
        let project = self
            .db
            .get_project(&params.0.project_number)
            .map_err(Self::map_err)?;

        Self::json_result(&project)
    }

    #[tool(description = "List the project numbers a researcher is principal or co-investigator on")]
    async fn find_projects_by_researcher(
        &self,
        params: Parameters<ResearcherIdRequest>,
    ) -> Result<CallToolResult, McpError> {
        let researcher_id = params.0.researcher_id;
        let projects = self
            .db
            .find_project_numbers_by_researcher(&researcher_id)
            .map_err(Self::map_err)?;

        // A dangling investigator id still has projects; report it without a name.
        let researcher_name = match self.db.get_researcher_name(&researcher_id) {
            Ok(name) => Some(name),
            Err(RegistryError::NotFound { .. }) => None,
            Err(err) => return Err(Self::map_err(err)),
        };

        Self::json_result(&ResearcherProjects {
            researcher_id: &researcher_id,
            researcher_name,
            projects,
        })
    }

    #[tool(description = "Resolve a researcher's exact display name to their researcher id")]
    async fn find_researcher_id(
        &self,
        params: Parameters<ResearcherNameRequest>,
    ) -> Result<CallToolResult, McpError> {
        let id = self
            .db
            .find_researcher_id_by_name(&params.0.name)
            .map_err(Self::map_err)?;

        Ok(CallToolResult::success(vec![Content::text(id)]))
    }

    #[tool(description = "Get a researcher's display name by researcher id")]
    async fn get_researcher_name(
        &self,
        params: Parameters<ResearcherIdRequest>,
    ) -> Result<CallToolResult, McpError> {
        let name = self
            .db
            .get_researcher_name(&params.0.researcher_id)
            .map_err(Self::map_err)?;

        Ok(CallToolResult::success(vec![Content::text(name)]))
    }

    #[tool(description = "Search researchers whose name contains the given text (case-sensitive)")]
    async fn search_researchers(
        &self,
        params: Parameters<ResearcherNameRequest>,
    ) -> Result<CallToolResult, McpError> {
        let researchers = self
            .db
            .search_researchers(&params.0.name, self.search_limit)
            .map_err(Self::map_err)?;

        Self::json_result(&researchers)
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("Research registry MCP server for project and researcher lookups".into()),
            ..Default::default()
        }
    }
}

pub async fn run_stdio_server(db: Database, search_limit: Option<usize>) -> anyhow::Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!("Starting MCP server via stdio");

    let service = McpServer::new(db, search_limit);
    let server = service.serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", quit_reason);

    Ok(())
}
