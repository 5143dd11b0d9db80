//! Plugin contributing the `Gain` register, loaded by the plugin tests.

#![cfg_attr(feature = "no-registers", allow(dead_code))]

use flowgraph_rs::flowchart::OpaqueValue;
use flowgraph_rs::{
    Node, NodeRegister, Parameter, ParameterSet, ProcessContext, ProcessingError, TerminalSpec,
    TerminalType, Value,
};

/// Multiplies a scalar sequence by `factor`.
#[derive(Default)]
pub struct AmplifyNode;

impl Node for AmplifyNode {
    fn declare_terminals(&self, spec: &mut TerminalSpec) {
        spec.input("in", TerminalType::ScalarSeq)
            .output("out", TerminalType::ScalarSeq);
    }

    fn declare_parameters(&self, params: &mut ParameterSet) {
        params.add("factor", Parameter::float(10.0, "Factor"));
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), ProcessingError> {
        let factor = ctx.params().float("factor").unwrap_or(1.0);
        let out: Vec<f32> = ctx.input_scalars("in")?.iter().map(|v| v * factor).collect();
        ctx.set_output("out", out)
    }
}

/// Emits a unit quad as an opaque `mesh` payload.
#[derive(Default)]
pub struct QuadNode;

impl Node for QuadNode {
    fn declare_terminals(&self, spec: &mut TerminalSpec) {
        spec.output("mesh", TerminalType::opaque("mesh"));
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), ProcessingError> {
        let quad: Vec<[f32; 3]> = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        ctx.set_output("mesh", Value::Opaque(OpaqueValue::new("mesh", quad)))
    }
}

fn registers() -> Vec<NodeRegister> {
    let mut gain = NodeRegister::create("Gain");
    gain.register_node::<AmplifyNode>("Amplify")
        .and_then(|r| r.register_node::<QuadNode>("Quad"))
        // Same name as a Core type, only reachable as `Gain::Scale`
        .and_then(|r| r.register_node::<AmplifyNode>("Scale"))
        .expect("gain node types are unique");
    vec![gain]
}

#[cfg(not(any(feature = "stale-api", feature = "no-registers")))]
flowgraph_rs::declare_plugin!(registers);

#[cfg(feature = "stale-api")]
#[no_mangle]
pub extern "C" fn flowgraph_plugin_api_version() -> u32 {
    flowgraph_rs::plugins::PLUGIN_API_VERSION + 1
}

#[cfg(feature = "stale-api")]
#[no_mangle]
pub fn flowgraph_plugin_registers() -> Vec<NodeRegister> {
    registers()
}

#[cfg(feature = "no-registers")]
#[no_mangle]
pub extern "C" fn flowgraph_plugin_api_version() -> u32 {
    flowgraph_rs::plugins::PLUGIN_API_VERSION
}
