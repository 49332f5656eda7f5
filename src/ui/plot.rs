use std::collections::BTreeMap;

use eframe::egui::{Color32, Ui};
use egui_plot::{HLine, Legend, Plot, PlotPoints, Points};

use crate::data::aggregate::TOPOLOGY_UNAVAILABLE;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Nutrient plot (central panel)
// ---------------------------------------------------------------------------

/// Scatter of the chosen nutrient across the records of the current result,
/// coloured by terrain label, with the median drawn as a horizontal line.
pub fn nutrient_plot(ui: &mut Ui, state: &AppState) {
    if state.dataset().is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to query soil samples  (File → Open…)");
        });
        return;
    }
    let Some(outcome) = &state.outcome else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Choose a region, subregion and category, then run the query");
        });
        return;
    };

    let nutrient = state.plot_nutrient;
    let samples = state.plot_samples(nutrient);

    // One series per terrain label so the legend doubles as a key.
    let mut series: BTreeMap<String, Vec<[f64; 2]>> = BTreeMap::new();
    for s in &samples {
        let label = if s.terrain.is_empty() {
            TOPOLOGY_UNAVAILABLE.to_string()
        } else {
            s.terrain.clone()
        };
        series
            .entry(label)
            .or_default()
            .push([(s.position + 1) as f64, s.value]);
    }

    let median = outcome.report.medians.get(&nutrient).copied();

    Plot::new("nutrient_plot")
        .legend(Legend::default())
        .x_axis_label("Record")
        .y_axis_label(nutrient.label())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (label, points) in series {
                let color = state
                    .terrain_colors
                    .as_ref()
                    .map(|c| c.color_for(&label))
                    .unwrap_or(Color32::LIGHT_BLUE);

                let points = Points::new(PlotPoints::from(points))
                    .name(&label)
                    .color(color)
                    .radius(4.0);

                plot_ui.points(points);
            }

            if let Some(m) = median {
                plot_ui.hline(
                    HLine::new(m)
                        .name(format!("median {m:.3}"))
                        .color(Color32::WHITE)
                        .width(1.5),
                );
            }
        });
}
