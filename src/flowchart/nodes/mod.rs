//! Built-in node kinds, registered in the `Core` register.

pub mod clamp;
pub mod collect;
pub mod file_path;
pub mod nested;
pub mod scale;
pub mod triangle;

pub use clamp::ClampNode;
pub use collect::CollectNode;
pub use file_path::FilePathNode;
pub use nested::NestedFlowchartNode;
pub use scale::ScaleNode;
pub use triangle::TriangleNode;

use crate::flowchart::error::GraphResult;
use crate::flowchart::register::NodeRegister;

/// Name of the always-present built-in register.
pub const CORE_REGISTER: &str = "Core";

/// Build the `Core` register.
pub fn core_register() -> NodeRegister {
    let mut register = NodeRegister::create(CORE_REGISTER);
    if let Err(err) = register_core_nodes(&mut register) {
        tracing::error!("Failed to populate core register: {}", err);
    }
    register
}

fn register_core_nodes(register: &mut NodeRegister) -> GraphResult<()> {
    register
        .register_node::<ScaleNode>("Scale")?
        .register_node::<ClampNode>("Clamp")?
        .register_node::<CollectNode>("Collect")?
        .register_node::<FilePathNode>("FilePath")?
        .register_node::<TriangleNode>("Triangle")?
        .register_node::<NestedFlowchartNode>("NestedFlowchart")?;
    Ok(())
}
