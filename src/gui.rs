//! egui widgets for node parameters and node hooks.
//!
//! Hosts embed [`draw_node`] in whatever panel shows the selected node.
//! Parameter writes made here bypass string parsing, so every widget keeps
//! its value inside the kind's bounds.

use crate::flowchart::error::GraphResult;
use crate::flowchart::id::NodeId;
use crate::flowchart::manager::NodeManager;
use crate::flowchart::parameter::{ParamValue, ParameterSet};
use egui::Ui;

/// Draw every visible parameter. Returns the names of changed parameters.
pub fn draw_parameters(ui: &mut Ui, params: &mut ParameterSet) -> Vec<String> {
    let names: Vec<String> = params.names().map(String::from).collect();
    let mut changed = Vec::new();

    for name in names {
        if !params.is_visible(&name) {
            continue;
        }
        let Some(param) = params.get_mut(&name) else {
            continue;
        };
        let label = param.label().to_string();

        let edited = ui
            .horizontal(|ui| {
                if !matches!(param.value(), ParamValue::Bool(_)) {
                    ui.label(&label);
                }
                draw_value(ui, &label, param.value_mut())
            })
            .inner;

        if edited {
            tracing::trace!("Parameter {} edited in GUI", name);
            changed.push(name);
        }
    }

    changed
}

fn draw_value(ui: &mut Ui, label: &str, value: &mut ParamValue) -> bool {
    match value {
        ParamValue::Int(v) => ui.add(egui::DragValue::new(v)).changed(),
        ParamValue::Float(v) => ui.add(egui::DragValue::new(v).speed(0.01)).changed(),
        ParamValue::BoundedFloat { value, min, max } => ui
            .add(egui::Slider::new(value, *min..=*max))
            .changed(),
        ParamValue::BoundedInt { value, min, max } => ui
            .add(egui::Slider::new(value, *min..=*max))
            .changed(),
        ParamValue::FloatRange(lo, hi) => {
            let lo_changed = ui
                .add(egui::DragValue::new(lo).speed(0.01).range(f32::MIN..=*hi))
                .changed();
            let hi_changed = ui
                .add(egui::DragValue::new(hi).speed(0.01).range(*lo..=f32::MAX))
                .changed();
            lo_changed || hi_changed
        }
        ParamValue::IntRange(lo, hi) => {
            let lo_changed = ui
                .add(egui::DragValue::new(lo).range(i32::MIN..=*hi))
                .changed();
            let hi_changed = ui
                .add(egui::DragValue::new(hi).range(*lo..=i32::MAX))
                .changed();
            lo_changed || hi_changed
        }
        ParamValue::Bool(v) => ui.checkbox(v, label).changed(),
        ParamValue::Path(path) => {
            ui.label(path.display().to_string());
            if ui.button("Browse...").clicked() {
                if let Some(picked) = rfd::FileDialog::new().set_title(label).pick_file() {
                    *path = picked;
                    return true;
                }
            }
            false
        }
    }
}

/// Run a node's GUI hooks and parameter widgets, then notify the node of
/// every changed parameter. Returns the changed names.
pub fn draw_node(manager: &mut NodeManager, id: &NodeId, ui: &mut Ui) -> GraphResult<Vec<String>> {
    let changed = {
        let slot = manager.slot_mut(id)?;
        slot.node.before_gui();
        slot.node.gui(ui);
        draw_parameters(ui, &mut slot.params)
    };

    for name in &changed {
        manager.parameter_changed(id, name)?;
    }
    Ok(changed)
}
