//! Downstream vacation API response bodies
//!
//! The backend is loosely typed (day counts arrive as numbers or strings,
//! dates as free-form strings), so display fields are kept as raw JSON values
//! and rendered verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `GET /rest/vacation/me`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyVacations {
    #[serde(default)]
    pub planned_vacations: Vec<PlannedVacation>,
    #[serde(default)]
    pub available_periods: Vec<AvailablePeriod>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedVacation {
    #[serde(default)]
    pub days: Value,
    #[serde(default)]
    pub start_date: Value,
    #[serde(default)]
    pub end_date: Value,
    #[serde(default)]
    pub status: Value,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailablePeriod {
    #[serde(default)]
    pub available_days: Value,
    #[serde(default)]
    pub acquisitive_period_start: Value,
    #[serde(default)]
    pub acquisitive_period_end: Value,
    #[serde(default)]
    pub expiration_date: Value,
}

/// `POST /rest/vacation`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VacationFlowCreated {
    #[serde(default)]
    pub message: Value,
    #[serde(default)]
    pub fluxo_id: Value,
    #[serde(default)]
    pub step: Value,
    #[serde(default)]
    pub data: CreatedFlowData,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedFlowData {
    #[serde(default)]
    pub dias_para_gozo: Value,
    #[serde(default)]
    pub inicio_ferias: Value,
}

/// `POST /rest/vacation/requirements`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRequirements {
    #[serde(default)]
    pub step: Value,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
}

/// A field the next workflow step needs
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Requirement {
    #[serde(default)]
    pub nome: Value,
    #[serde(default)]
    pub tipo: Value,
    #[serde(default)]
    pub formato: Value,
}

/// `POST /rest/vacation/next`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowAdvance {
    #[serde(default)]
    pub has_next: Value,
    #[serde(default)]
    pub current_step: Value,
    #[serde(default)]
    pub message: Value,
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
}

impl WorkflowAdvance {
    pub fn has_next_step(&self) -> bool {
        is_truthy(&self.has_next)
    }
}

/// Loose truthiness for flags the backend may send as bool, number or string
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
