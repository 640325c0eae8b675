//! Tool registry - the advertised tool list, rebuilt on every heartbeat

use parking_lot::RwLock;
use rmcp::model::Tool;
use std::sync::Arc;
use vacation_core::{tool_catalog, ToolDescriptor};

struct ToolSnapshot {
    tools: Arc<Vec<Tool>>,
    generation: u64,
}

/// Shared, periodically refreshed tool list
///
/// The catalog is fixed, so a refresh yields an identical list; the
/// generation counter only records that a rebuild happened.
#[derive(Clone)]
pub struct ToolRegistry {
    snapshot: Arc<RwLock<ToolSnapshot>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(ToolSnapshot {
                tools: Arc::new(build_tools()),
                generation: 0,
            })),
        }
    }

    pub fn list(&self) -> Vec<Tool> {
        self.snapshot.read().tools.as_ref().clone()
    }

    pub fn get(&self, name: &str) -> Option<Tool> {
        self.snapshot
            .read()
            .tools
            .iter()
            .find(|tool| tool.name == name)
            .cloned()
    }

    /// Rebuild the tool list; returns the new generation
    pub fn refresh(&self) -> u64 {
        let tools = Arc::new(build_tools());
        let mut snapshot = self.snapshot.write();
        snapshot.tools = tools;
        snapshot.generation += 1;
        snapshot.generation
    }

    pub fn generation(&self) -> u64 {
        self.snapshot.read().generation
    }
}

fn build_tools() -> Vec<Tool> {
    tool_catalog().into_iter().map(to_mcp_tool).collect()
}

fn to_mcp_tool(descriptor: ToolDescriptor) -> Tool {
    Tool::new(
        descriptor.name,
        descriptor.description,
        Arc::new(descriptor.input_schema),
    )
}
