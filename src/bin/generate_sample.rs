use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

/// Spell a categorical value the way hand-typed survey sheets do.
fn messy(value: &str, rng: &mut SimpleRng) -> String {
    match rng.next_u64() % 6 {
        0 => value.to_uppercase(),
        1 => format!("{value} "),
        2 => format!("  {}", value.to_lowercase()),
        _ => value.to_string(),
    }
}

/// A numeric cell as text; a few come out as lab placeholders.
fn lab_value(value: f64, decimals: usize, rng: &mut SimpleRng) -> (String, Option<f64>) {
    if rng.chance(0.04) {
        let placeholder = rng.pick(&["ND", "<0.5", "sin dato", ""]);
        return (placeholder.to_string(), None);
    }
    let rounded = format!("{value:.decimals$}");
    let parsed = rounded.parse().ok();
    (rounded, parsed)
}

struct SoilRow {
    region: String,
    subregion: String,
    crop: String,
    ph: (String, Option<f64>),
    phosphorus: (String, Option<f64>),
    potassium: (String, Option<f64>),
    terrain: String,
    year: i64,
}

fn main() {
    let mut rng = SimpleRng::new(42);

    // (region, subregions, base pH)
    let regions: [(&str, &[&str], f64); 4] = [
        ("Tolima", &["Ibagué", "Espinal", "Líbano"], 5.6),
        ("Huila", &["Neiva", "Garzón", "Pitalito"], 5.9),
        ("Antioquia", &["Medellín", "Rionegro", "Urrao"], 5.2),
        ("Meta", &["Villavicencio", "Granada"], 4.8),
    ];
    let crops = ["Café", "Arroz", "Cacao", "Maíz", "Plátano"];
    let terrains = ["Plano", "Ondulado", "Quebrado", "Escarpado"];

    let mut rows = Vec::new();
    for (region, subregions, base_ph) in &regions {
        for subregion in subregions.iter() {
            for crop in &crops {
                let samples = 2 + rng.next_u64() % 6;
                for _ in 0..samples {
                    let ph = rng.gauss(*base_ph, 0.35).clamp(3.5, 8.5);
                    let phosphorus = rng.gauss(18.0, 9.0).max(0.5);
                    let potassium = rng.gauss(0.35, 0.12).max(0.02);
                    rows.push(SoilRow {
                        region: messy(region, &mut rng),
                        subregion: messy(subregion, &mut rng),
                        crop: messy(crop, &mut rng),
                        ph: lab_value(ph, 2, &mut rng),
                        phosphorus: lab_value(phosphorus, 1, &mut rng),
                        potassium: lab_value(potassium, 3, &mut rng),
                        terrain: rng.pick(&terrains).to_string(),
                        year: 2015 + (rng.next_u64() % 9) as i64,
                    });
                }
            }
        }
    }

    let headers = [
        " Departamento ",
        "Municipio",
        "Cultivo",
        "pH agua:suelo 2,5:1,0",
        "Fósforo (P) Bray II mg/kg",
        "Potasio (K) intercambiable cmol(+)/kg",
        "Topografia",
        "Año",
    ];

    // Write CSV (semicolon-separated, like the survey exports)
    let csv_path = "sample_soils.csv";
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(csv_path)
        .expect("Failed to create CSV file");
    writer.write_record(headers).expect("Failed to write CSV header");
    for row in &rows {
        let year = row.year.to_string();
        writer
            .write_record([
                row.region.as_str(),
                row.subregion.as_str(),
                row.crop.as_str(),
                row.ph.0.as_str(),
                row.phosphorus.0.as_str(),
                row.potassium.0.as_str(),
                row.terrain.as_str(),
                year.as_str(),
            ])
            .expect("Failed to write CSV row");
    }
    writer.flush().expect("Failed to flush CSV file");

    // Build Arrow arrays; placeholders become nulls in the numeric columns
    let text = |f: fn(&SoilRow) -> &str| {
        StringArray::from(rows.iter().map(f).collect::<Vec<_>>())
    };
    let number = |f: fn(&SoilRow) -> Option<f64>| {
        Float64Array::from(rows.iter().map(f).collect::<Vec<_>>())
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new(headers[0], DataType::Utf8, false),
        Field::new(headers[1], DataType::Utf8, false),
        Field::new(headers[2], DataType::Utf8, false),
        Field::new(headers[3], DataType::Float64, true),
        Field::new(headers[4], DataType::Float64, true),
        Field::new(headers[5], DataType::Float64, true),
        Field::new(headers[6], DataType::Utf8, false),
        Field::new(headers[7], DataType::Int64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(text(|r| r.region.as_str())),
            Arc::new(text(|r| r.subregion.as_str())),
            Arc::new(text(|r| r.crop.as_str())),
            Arc::new(number(|r| r.ph.1)),
            Arc::new(number(|r| r.phosphorus.1)),
            Arc::new(number(|r| r.potassium.1)),
            Arc::new(text(|r| r.terrain.as_str())),
            Arc::new(Int64Array::from(rows.iter().map(|r| r.year).collect::<Vec<_>>())),
        ],
    )
    .expect("Failed to create RecordBatch");

    // Write Parquet
    let parquet_path = "sample_soils.parquet";
    let file = std::fs::File::create(parquet_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    println!(
        "Wrote {} soil samples to {csv_path} and {parquet_path}",
        rows.len()
    );
}
