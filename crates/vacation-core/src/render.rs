//! Human-readable rendering of downstream responses
//!
//! Output is Markdown-ish text in Portuguese, the language of the vacation
//! product. Raw JSON values are interpolated verbatim (strings unquoted).

use serde_json::Value;
use std::fmt::Write as _;

use crate::domain::{MyVacations, StepRequirements, VacationFlowCreated, WorkflowAdvance};

/// Fields never shown when echoing workflow data
const HIDDEN_FLOW_FIELDS: &[&str] = &["createdAt", "updatedAt"];

/// Interpolate a JSON value the way a template string would
pub fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

pub fn render_my_vacations(vacations: &MyVacations) -> String {
    let mut out = String::from("📅 **SUAS FÉRIAS**\n\n");

    if vacations.planned_vacations.is_empty() {
        out.push_str("🏖️ **Férias Planejadas:** Nenhuma planejada\n\n");
    } else {
        out.push_str("🏖️ **Férias Planejadas:**\n");
        for (i, v) in vacations.planned_vacations.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. **{} dias** - {} a {} (Status: {})",
                i + 1,
                display(&v.days),
                display(&v.start_date),
                display(&v.end_date),
                display(&v.status)
            );
        }
        out.push('\n');
    }

    if vacations.available_periods.is_empty() {
        out.push_str("💰 **Períodos Disponíveis:** Nenhum\n");
    } else {
        out.push_str("💰 **Períodos Disponíveis:**\n");
        for (i, p) in vacations.available_periods.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. **{} dias disponíveis**",
                i + 1,
                display(&p.available_days)
            );
            let _ = writeln!(
                out,
                "   • Período aquisitivo: {} a {}",
                display(&p.acquisitive_period_start),
                display(&p.acquisitive_period_end)
            );
            let _ = writeln!(out, "   • Vencimento: {}\n", display(&p.expiration_date));
        }
    }

    out
}

pub fn render_flow_created(created: &VacationFlowCreated) -> String {
    format!(
        "✅ **FLUXO DE FÉRIAS INICIADO**\n\n\
         📋 **Detalhes:**\n\
         • {}\n\
         • ID do Fluxo: {}\n\
         • Etapa Atual: {}\n\
         • Dias para Gozo: {}\n\
         • Início das Férias: {}\n\n\
         🚀 Use 'get_vacation_requirements' para ver o que falta.",
        display(&created.message),
        display(&created.fluxo_id),
        display(&created.step),
        display(&created.data.dias_para_gozo),
        display(&created.data.inicio_ferias),
    )
}

pub fn render_requirements(requirements: &StepRequirements) -> String {
    let mut out = format!(
        "📋 **REQUISITOS PARA PRÓXIMA ETAPA**\n\n🎯 Etapa: {}\n\n📝 Campos:\n",
        display(&requirements.step)
    );
    for (i, r) in requirements.requirements.iter().enumerate() {
        let _ = writeln!(out, "{}. **{}**", i + 1, display(&r.nome));
        let _ = writeln!(out, "   • Tipo: {}", display(&r.tipo));
        let _ = writeln!(out, "   • Formato: {}\n", display(&r.formato));
    }
    out.push_str("🚀 Use 'advance_vacation_wflow' com os dados para continuar.");
    out
}

pub fn render_workflow_advance(advance: &WorkflowAdvance) -> String {
    let has_next = advance.has_next_step();
    let mut out = format!(
        "✅ **FLUXO AVANÇADO**\n\n📋 {}\n• Etapa Atual: {}\n• Tem Próxima Etapa: {}\n\n",
        display(&advance.message),
        display(&advance.current_step),
        if has_next { "Sim" } else { "Não" }
    );

    if let Some(data) = &advance.data {
        out.push_str("📊 **Dados:**\n");
        for (key, value) in data {
            if HIDDEN_FLOW_FIELDS.contains(&key.as_str()) {
                continue;
            }
            let _ = writeln!(out, "• {}: {}", key, display(value));
        }
    }

    out.push_str(if has_next {
        "\n🚀 Use 'get_vacation_requirements' para a próxima etapa."
    } else {
        "\n🏁 Fluxo finalizado com sucesso!"
    });
    out
}
