use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::filter::normalize_key;

// ---------------------------------------------------------------------------
// Terrain colours: terrain label → Color32
// ---------------------------------------------------------------------------

/// Maps the distinct terrain labels of a result to distinct colours.
///
/// Labels are matched case- and whitespace-insensitively, like the filters.
#[derive(Debug, Clone)]
pub struct TerrainColors {
    mapping: BTreeMap<String, (String, Color32)>,
    default_color: Color32,
}

impl TerrainColors {
    pub fn new<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let mut distinct: BTreeMap<String, String> = BTreeMap::new();
        for label in labels {
            let label = label.trim();
            if !label.is_empty() {
                distinct
                    .entry(normalize_key(label))
                    .or_insert_with(|| label.to_string());
            }
        }

        // Hues spread evenly around the wheel, one per distinct label.
        let n = distinct.len();
        let mapping = distinct
            .into_iter()
            .enumerate()
            .map(|(i, (key, label))| {
                let hue = i as f32 / n as f32 * 360.0;
                let rgb: Srgb = Hsl::new(hue, 0.65, 0.5).into_color();
                let color = Color32::from_rgb(
                    (rgb.red * 255.0) as u8,
                    (rgb.green * 255.0) as u8,
                    (rgb.blue * 255.0) as u8,
                );
                (key, (label, color))
            })
            .collect();

        TerrainColors {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    pub fn color_for(&self, label: &str) -> Color32 {
        self.mapping
            .get(&normalize_key(label))
            .map(|(_, c)| *c)
            .unwrap_or(self.default_color)
    }

    /// Legend entries (label → colour) for the UI.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        self.mapping.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_terrain_gets_its_own_colour() {
        assert!(TerrainColors::new(std::iter::empty::<&str>()).legend_entries().is_empty());

        let colors = TerrainColors::new(["Plano", "Ondulado", "Quebrado", "Escarpado"]);
        let seen: Vec<Color32> = colors.legend_entries().into_iter().map(|(_, c)| c).collect();
        assert_eq!(seen.len(), 4);
        for (i, a) in seen.iter().enumerate() {
            assert!(seen[i + 1..].iter().all(|b| b != a));
        }
    }

    #[test]
    fn labels_differing_in_case_share_a_colour() {
        let colors = TerrainColors::new(["Plano", " plano", "Ondulado"]);
        assert_eq!(colors.legend_entries().len(), 2);
        assert_eq!(colors.color_for("PLANO"), colors.color_for("Plano"));
        assert_ne!(colors.color_for("Plano"), colors.color_for("Ondulado"));
        assert_eq!(colors.color_for("Escarpado"), Color32::GRAY);
    }
}
