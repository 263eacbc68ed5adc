use crate::errors::ToolError;
use crate::managers::endpoints::EndpointDescriptor;
use crate::services::logger::Logger;
use crate::services::sim_client::SimClient;
use serde_json::Value;
use std::sync::Arc;

/// Generic handler for one platform endpoint: arguments in, descriptor
/// built, executed through the shared session.
#[derive(Clone)]
pub struct EndpointHandler {
    logger: Logger,
    client: Arc<SimClient>,
    endpoint: &'static EndpointDescriptor,
}

impl EndpointHandler {
    pub fn new(logger: Logger, client: Arc<SimClient>, endpoint: &'static EndpointDescriptor) -> Self {
        Self {
            logger: logger.child(endpoint.tool),
            client,
            endpoint,
        }
    }
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for EndpointHandler {
    async fn handle(&self, args: Value) -> Result<Value, ToolError> {
        let operation = self.endpoint.build_operation(&args)?;
        self.logger.debug(
            "dispatch",
            Some(&serde_json::json!({
                "method": operation.method.as_str(),
                "path": operation.path,
            })),
        );
        self.client
            .execute(&operation, self.endpoint.requires_auth)
            .await
            .into_tool_result()
    }
}
