use std::path::Path;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::aggregate::Nutrient;
use crate::data::resolver::SemanticField;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – selection and results
// ---------------------------------------------------------------------------

/// Render the left query panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Query");
    ui.separator();

    if state.dataset().is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            selection_widgets(ui, state);
            ui.separator();
            limit_widgets(ui, state);
            ui.separator();
            results_summary(ui, state);
        });
}

/// One combo box per selection level. Choices are cloned so `state` can be
/// mutated from inside the closures.
fn selection_widgets(ui: &mut Ui, state: &mut AppState) {
    let regions = state.regions.clone();
    let subregions = state.subregions.clone();
    let categories = state.categories.clone();

    ui.strong("Region");
    if let Some(choice) = choice_combo(ui, "region", state.selection.region.as_deref(), &regions) {
        state.select_region(choice);
    }

    ui.strong("Subregion");
    ui.add_enabled_ui(state.selection.region.is_some(), |ui: &mut Ui| {
        if let Some(choice) =
            choice_combo(ui, "subregion", state.selection.subregion.as_deref(), &subregions)
        {
            state.select_subregion(choice);
        }
    });

    ui.strong("Category");
    ui.add_enabled_ui(state.selection.subregion.is_some(), |ui: &mut Ui| {
        if let Some(choice) =
            choice_combo(ui, "category", state.selection.category.as_deref(), &categories)
        {
            state.select_category(choice);
        }
    });
}

/// Returns the newly clicked choice, if any.
fn choice_combo(ui: &mut Ui, id: &str, current: Option<&str>, choices: &[String]) -> Option<String> {
    let mut picked = None;
    egui::ComboBox::from_id_salt(id)
        .selected_text(current.unwrap_or("Select…"))
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            for choice in choices {
                if ui
                    .selectable_label(current == Some(choice.as_str()), choice)
                    .clicked()
                {
                    picked = Some(choice.clone());
                }
            }
        });
    picked
}

fn limit_widgets(ui: &mut Ui, state: &mut AppState) {
    if state.available == 0 {
        return;
    }
    ui.label(format!("{} matching records", state.available));

    let mut use_all = state.limit.is_none();
    if ui.checkbox(&mut use_all, "Use all records").changed() {
        state.limit = if use_all { None } else { Some(state.available) };
    }
    if let Some(limit) = state.limit.as_mut() {
        ui.add(egui::Slider::new(limit, 1..=state.available).text("records"));
    }

    if ui.button("Run query").clicked() {
        state.run_query();
    }
}

fn results_summary(ui: &mut Ui, state: &mut AppState) {
    let Some(outcome) = &state.outcome else {
        return;
    };
    let report = &outcome.report;

    ui.strong("Results");
    egui::Grid::new("results_grid")
        .num_columns(2)
        .striped(true)
        .show(ui, |ui: &mut Ui| {
            ui.label("Topology");
            ui.label(&report.topology);
            ui.end_row();

            for nutrient in Nutrient::ALL {
                ui.label(nutrient.label());
                match report.medians.get(&nutrient) {
                    Some(m) => ui.monospace(format!("{m:.3}")),
                    None => ui.monospace("N/A"),
                };
                ui.end_row();
            }

            ui.label("Records used");
            ui.label(report.rows_used.to_string());
            ui.end_row();
        });

    if ui.small_button("Copy as JSON").clicked() {
        match serde_json::to_string_pretty(report) {
            Ok(json) => ui.ctx().copy_text(json),
            Err(e) => log::error!("Failed to serialize report: {e}"),
        }
    }

    ui.separator();
    ui.strong("Plot");
    ui.horizontal(|ui: &mut Ui| {
        for nutrient in Nutrient::ALL {
            ui.selectable_value(&mut state.plot_nutrient, nutrient, nutrient.label());
        }
    });

    if let Some(colors) = &state.terrain_colors {
        for (label, color) in colors.legend_entries() {
            ui.label(RichText::new(format!("● {label}")).color(color));
        }
    }
}

// ---------------------------------------------------------------------------
// Bottom panel – records table
// ---------------------------------------------------------------------------

/// Render the records the current result was computed over.
pub fn records_table(ui: &mut Ui, state: &AppState) {
    let (Some(dataset), Some(outcome)) = (state.dataset(), &state.outcome) else {
        ui.label("Run a query to see the records used.");
        return;
    };
    let columns = dataset.columns();
    let rows = &outcome.rows;

    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .column(Column::auto())
            .columns(Column::auto().at_least(60.0), columns.len())
            .header(20.0, |mut header| {
                header.col(|ui: &mut Ui| {
                    ui.strong("#");
                });
                for name in columns {
                    header.col(|ui: &mut Ui| {
                        ui.strong(name.as_str());
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, rows.len(), |mut row| {
                    let idx = rows[row.index()];
                    row.col(|ui: &mut Ui| {
                        ui.label((idx + 1).to_string());
                    });
                    for cell in &dataset.rows()[idx].cells {
                        row.col(|ui: &mut Ui| {
                            if !cell.is_null() {
                                ui.label(cell.to_string());
                            }
                        });
                    }
                });
            });
    });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.menu_button("Columns", |ui: &mut Ui| {
            let resolved = state.engine.resolved();
            for field in SemanticField::ALL {
                let column = resolved.get(field).unwrap_or("—");
                ui.label(format!("{field}: {column}"));
            }
        });

        ui.separator();

        if let Some(ds) = state.dataset() {
            ui.label(format!(
                "{} records, {} columns",
                ds.len(),
                ds.columns().len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File loading
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open soil data")
        .add_filter("Supported files", &["csv", "txt", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv", "txt"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        load_into(state, &path);
    }
}

/// Load `path` and hand the dataset to `state`, or record the error.
pub fn load_into(state: &mut AppState, path: &Path) {
    match crate::data::loader::load_file(path) {
        Ok(dataset) => state.set_dataset(dataset),
        Err(e) => {
            log::error!("Failed to load file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_into_hands_the_dataset_to_state() {
        let path = std::env::temp_dir().join(format!("soil-lens-panels-{}.csv", std::process::id()));
        std::fs::write(&path, "departamento;municipio;cultivo\nMeta;Granada;Maíz\n").unwrap();
        let mut state = AppState::default();
        load_into(&mut state, &path);
        std::fs::remove_file(&path).ok();

        assert_eq!(state.regions, ["Meta"]);
        assert_eq!(state.status_message, None);
    }

    #[test]
    fn failed_load_reports_in_the_status_line() {
        let mut state = AppState::default();
        load_into(&mut state, Path::new("no-such-soil-file.csv"));

        assert!(state.dataset().is_none());
        let status = state.status_message.unwrap_or_default();
        assert!(status.starts_with("Error: loading no-such-soil-file.csv"), "{status}");
    }
}
