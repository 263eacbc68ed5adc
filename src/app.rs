use crate::errors::ToolError;
use crate::managers::business::EndpointHandler;
use crate::managers::endpoints::ENDPOINTS;
use crate::managers::session::{SessionAction, SessionManager};
use crate::mcp::catalog::tool_catalog;
use crate::services::credential_store::CredentialStore;
use crate::services::logger::Logger;
use crate::services::settings::Settings;
use crate::services::sim_client::SimClient;
use crate::services::tool_executor::{ToolExecutor, ToolHandler};
use std::collections::HashMap;
use std::sync::Arc;

pub struct App {
    pub logger: Logger,
    pub settings: Settings,
    pub store: Arc<CredentialStore>,
    pub client: Arc<SimClient>,
    pub tool_executor: Arc<ToolExecutor>,
}

impl App {
    fn validate_tool_wiring(handlers: &HashMap<String, Arc<dyn ToolHandler>>) -> Result<(), ToolError> {
        let mut missing: Vec<String> = tool_catalog()
            .iter()
            .filter(|tool| !handlers.contains_key(&tool.name))
            .map(|tool| tool.name.clone())
            .collect();
        let mut unlisted: Vec<String> = handlers
            .keys()
            .filter(|name| !tool_catalog().iter().any(|tool| &tool.name == *name))
            .cloned()
            .collect();
        if missing.is_empty() && unlisted.is_empty() {
            return Ok(());
        }
        missing.sort();
        unlisted.sort();
        Err(ToolError::internal("Tool wiring is incomplete")
            .with_hint("Every tool in tool_catalog.json needs exactly one handler.")
            .with_details(serde_json::json!({
                "missing_handlers": missing,
                "missing_catalog_entries": unlisted,
            })))
    }

    pub fn initialize(settings: Settings) -> Result<Self, ToolError> {
        let logger = Logger::new("sim-mcp", settings.log_level);
        let store = Arc::new(CredentialStore::new());
        let client = Arc::new(SimClient::new(logger.clone(), &settings, store.clone())?);

        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        for action in SessionAction::ALL {
            handlers.insert(
                action.tool_name().to_string(),
                Arc::new(SessionManager::new(logger.clone(), client.clone(), action)),
            );
        }
        for endpoint in ENDPOINTS.iter() {
            handlers.insert(
                endpoint.tool.to_string(),
                Arc::new(EndpointHandler::new(logger.clone(), client.clone(), endpoint)),
            );
        }

        Self::validate_tool_wiring(&handlers)?;

        logger.info(
            "initialized",
            Some(&serde_json::json!({
                "base_url": settings.base_url,
                "tools": handlers.len(),
            })),
        );

        let tool_executor = Arc::new(ToolExecutor::new(logger.clone(), handlers));
        Ok(Self {
            logger,
            settings,
            store,
            client,
            tool_executor,
        })
    }
}
