//! Tool dispatch - validate arguments, call the vacation API, render text

use rmcp::model::JsonObject;
use std::sync::Arc;
use tracing::{debug, warn};
use vacation_core::render::{
    render_flow_created, render_my_vacations, render_requirements, render_workflow_advance,
};
use vacation_core::{advance_workflow_body, CallerContext, CreateVacationFlowInput, VacationTool};

use crate::api::{ApiOverrides, VacationApiClient};
use crate::error::GatewayError;

/// Routes `tools/call` requests to the downstream API
///
/// Stateless apart from the operator overrides; every call builds its own
/// client from the caller it was handed.
#[derive(Clone, Default)]
pub struct Dispatcher {
    overrides: Arc<ApiOverrides>,
}

impl Dispatcher {
    pub fn new(overrides: ApiOverrides) -> Self {
        Self {
            overrides: Arc::new(overrides),
        }
    }

    /// Execute one tool call and return its rendered text
    ///
    /// Arguments are validated before any downstream request is made.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<&JsonObject>,
        caller: Option<&CallerContext>,
    ) -> Result<String, GatewayError> {
        let tool: VacationTool = name.parse()?;
        debug!(tool = %tool, has_arguments = arguments.is_some(), "[Dispatch] Tool call");

        let text = match tool {
            VacationTool::GetMyVacations => {
                let api = self.client(caller)?;
                render_my_vacations(&api.my_vacations().await?)
            }
            VacationTool::CreateVacationFlow => {
                let input = CreateVacationFlowInput::parse(arguments).map_err(|source| {
                    warn!(tool = %tool, error = %source, "[Dispatch] Invalid tool arguments");
                    GatewayError::ToolInputInvalid { tool, source }
                })?;
                let api = self.client(caller)?;
                render_flow_created(&api.create_flow(&input).await?)
            }
            VacationTool::GetVacationRequirements => {
                let api = self.client(caller)?;
                render_requirements(&api.requirements().await?)
            }
            VacationTool::AdvanceVacationWorkflow => {
                let body = advance_workflow_body(arguments);
                let api = self.client(caller)?;
                render_workflow_advance(&api.advance(&body).await?)
            }
        };

        Ok(text)
    }

    fn client(&self, caller: Option<&CallerContext>) -> Result<VacationApiClient, GatewayError> {
        VacationApiClient::for_caller(caller, &self.overrides)
    }
}
