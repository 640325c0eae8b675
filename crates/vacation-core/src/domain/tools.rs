//! Vacation tool catalog and tool input parsing

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::is_truthy;

lazy_static! {
    /// `DD-MM-YYYY`, ASCII digits only
    static ref VACATION_DATE: Regex = Regex::new(r"^[0-9]{2}-[0-9]{2}-[0-9]{4}$").unwrap();
}

/// The four tools exposed to MCP clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VacationTool {
    GetMyVacations,
    CreateVacationFlow,
    GetVacationRequirements,
    AdvanceVacationWorkflow,
}

impl VacationTool {
    pub const ALL: [VacationTool; 4] = [
        VacationTool::GetMyVacations,
        VacationTool::CreateVacationFlow,
        VacationTool::GetVacationRequirements,
        VacationTool::AdvanceVacationWorkflow,
    ];

    /// Wire name used in `tools/call`
    pub fn name(&self) -> &'static str {
        match self {
            VacationTool::GetMyVacations => "get_my_vacations",
            VacationTool::CreateVacationFlow => "create_vacation_flow",
            VacationTool::GetVacationRequirements => "get_vacation_requirements",
            VacationTool::AdvanceVacationWorkflow => "advance_vacation_wflow",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            VacationTool::GetMyVacations => {
                "Busca dados das férias do usuário, incluindo férias planejadas e períodos disponíveis"
            }
            VacationTool::CreateVacationFlow => {
                "Inicia um novo fluxo de férias com dias para gozo e data de início"
            }
            VacationTool::GetVacationRequirements => {
                "Verifica campos necessários para próxima etapa do fluxo de férias"
            }
            VacationTool::AdvanceVacationWorkflow => {
                "Avança o fluxo de férias para a próxima etapa com os dados fornecidos"
            }
        }
    }

    /// JSON Schema for the tool's arguments
    pub fn input_schema(&self) -> Map<String, Value> {
        let schema = match self {
            VacationTool::GetMyVacations | VacationTool::GetVacationRequirements => {
                serde_json::json!({ "type": "object", "properties": {}, "required": [] })
            }
            VacationTool::CreateVacationFlow => serde_json::json!({
                "type": "object",
                "properties": {
                    "diasParaGozo": {
                        "type": "number",
                        "description": "Número de dias de férias para gozo"
                    },
                    "inicioFerias": {
                        "type": "string",
                        "description": "Data de início das férias no formato dd-mm-yyyy"
                    }
                },
                "required": ["diasParaGozo", "inicioFerias"]
            }),
            VacationTool::AdvanceVacationWorkflow => serde_json::json!({
                "type": "object",
                "properties": {
                    "data": {
                        "type": "object",
                        "description": "Dados necessários para avançar"
                    }
                },
                "required": []
            }),
        };
        match schema {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name(),
            description: self.description(),
            input_schema: self.input_schema(),
        }
    }
}

impl fmt::Display for VacationTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown tool name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("tool not found: {0}")]
pub struct UnknownTool(pub String);

impl FromStr for VacationTool {
    type Err = UnknownTool;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VacationTool::ALL
            .into_iter()
            .find(|tool| tool.name() == s)
            .ok_or_else(|| UnknownTool(s.to_string()))
    }
}

/// Name, description and input schema of one tool
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Map<String, Value>,
}

/// Descriptors for every tool, in a stable order
pub fn tool_catalog() -> Vec<ToolDescriptor> {
    VacationTool::ALL.iter().map(VacationTool::descriptor).collect()
}

/// Tool argument validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` must be a {expected}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("field `inicioFerias` must match DD-MM-YYYY, got `{0}`")]
    InvalidDate(String),
}

/// Arguments of `create_vacation_flow`, also the downstream request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVacationFlowInput {
    pub dias_para_gozo: Number,
    pub inicio_ferias: String,
}

impl CreateVacationFlowInput {
    /// Strictly validate raw tool arguments; unknown fields are dropped
    pub fn parse(arguments: Option<&Map<String, Value>>) -> Result<Self, InputError> {
        let empty = Map::new();
        let args = arguments.unwrap_or(&empty);

        let dias_para_gozo = match args.get("diasParaGozo") {
            None | Some(Value::Null) => return Err(InputError::MissingField("diasParaGozo")),
            Some(Value::Number(n)) => n.clone(),
            Some(_) => {
                return Err(InputError::InvalidType {
                    field: "diasParaGozo",
                    expected: "number",
                })
            }
        };

        let inicio_ferias = match args.get("inicioFerias") {
            None | Some(Value::Null) => return Err(InputError::MissingField("inicioFerias")),
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                return Err(InputError::InvalidType {
                    field: "inicioFerias",
                    expected: "string",
                })
            }
        };

        if !VACATION_DATE.is_match(&inicio_ferias) {
            return Err(InputError::InvalidDate(inicio_ferias));
        }

        Ok(Self {
            dias_para_gozo,
            inicio_ferias,
        })
    }
}

/// Body for `advance_vacation_wflow`: the `data` argument, or `{}`
///
/// Falsy values (`null`, `false`, `0`, `""`) become `{}`; other values are
/// forwarded as given.
pub fn advance_workflow_body(arguments: Option<&Map<String, Value>>) -> Value {
    match arguments.and_then(|args| args.get("data")) {
        Some(data) if is_truthy(data) => data.clone(),
        _ => Value::Object(Map::new()),
    }
}
