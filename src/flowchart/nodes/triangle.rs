//! TriangleNode: a fixed triangle with per-vertex colors and attribute.

use crate::flowchart::error::ProcessingError;
use crate::flowchart::node::{Node, ProcessContext};
use crate::flowchart::terminal::TerminalSpec;
use crate::flowchart::value::TerminalType;

#[derive(Debug, Clone)]
pub struct TriangleNode {
    pub vertices: [[f32; 3]; 3],
    pub colors: [[f32; 3]; 3],
    pub attr: [f32; 3],
}

impl Default for TriangleNode {
    fn default() -> Self {
        Self {
            vertices: [[10.5, 9.5, 0.0], [9.5, 9.5, 0.0], [10.0, 10.5, 0.0]],
            colors: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            attr: [1.0, 5.5, 10.0],
        }
    }
}

impl Node for TriangleNode {
    fn declare_terminals(&self, spec: &mut TerminalSpec) {
        spec.output("vertices", TerminalType::Vec3Seq)
            .output("colors", TerminalType::Vec3Seq)
            .output("attr", TerminalType::ScalarSeq);
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), ProcessingError> {
        ctx.set_output("vertices", self.vertices.to_vec())?;
        ctx.set_output("colors", self.colors.to_vec())?;
        ctx.set_output("attr", self.attr.to_vec())
    }

    #[cfg(feature = "gui")]
    fn gui(&mut self, ui: &mut egui::Ui) {
        for (i, color) in self.colors.iter_mut().enumerate() {
            ui.horizontal(|ui| {
                ui.label(format!("col{}", i + 1));
                ui.color_edit_button_rgb(color);
            });
        }
    }
}
