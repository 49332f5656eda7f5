use std::fmt;

// ---------------------------------------------------------------------------
// Semantic fields and their name-matching rules
// ---------------------------------------------------------------------------

/// A logical attribute whose physical column name varies between datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SemanticField {
    Region,
    Subregion,
    Category,
    Ph,
    Phosphorus,
    Potassium,
    Topology,
}

/// Name-matching rules for one semantic field, tried in order:
/// `contains`, then `exact`, then `fallback`.
struct Candidates {
    contains: Names,
    exact: Names,
    fallback: Names,
}

type Names = &'static [&'static str];

impl SemanticField {
    pub const ALL: [SemanticField; 7] = [
        SemanticField::Region,
        SemanticField::Subregion,
        SemanticField::Category,
        SemanticField::Ph,
        SemanticField::Phosphorus,
        SemanticField::Potassium,
        SemanticField::Topology,
    ];

    fn candidates(self) -> Candidates {
        // A bare "p" / "k" substring would hit half the headers in a table,
        // so those letters only ever match a whole column name.
        let (contains, exact, fallback): (Names, Names, Names) = match self {
            SemanticField::Region => (&["departamento", "depto", "dept"], &[], &[]),
            SemanticField::Subregion => (&["municipio", "mpio", "municipality"], &[], &[]),
            SemanticField::Category => (&["cultivo", "crop", "cultura"], &[], &[]),
            SemanticField::Ph => (&["ph"], &[], &[]),
            SemanticField::Phosphorus => (&["fosforo", "fósforo"], &["p"], &[]),
            SemanticField::Potassium => (&["potasio"], &["k"], &[]),
            SemanticField::Topology => (&["topologia"], &[], &["topografia"]),
        };
        Candidates {
            contains,
            exact,
            fallback,
        }
    }
}

impl fmt::Display for SemanticField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SemanticField::Region => "region",
            SemanticField::Subregion => "subregion",
            SemanticField::Category => "category",
            SemanticField::Ph => "pH",
            SemanticField::Phosphorus => "phosphorus",
            SemanticField::Potassium => "potassium",
            SemanticField::Topology => "topology",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Find the physical column backing `field`.
///
/// `columns` must already be normalized (trimmed, lowercased) and in table
/// order. The first column containing a primary candidate wins; failing that
/// the first column equal to an exact-match name; failing that the first
/// column containing a fallback candidate.
pub fn resolve<S: AsRef<str>>(columns: &[S], field: SemanticField) -> Option<String> {
    let rules = field.candidates();
    let names: Vec<&str> = columns.iter().map(|c| c.as_ref()).collect();
    let by_substring = |needles: &[&str]| {
        names
            .iter()
            .copied()
            .find(|col| needles.iter().any(|n| col.contains(*n)))
    };

    by_substring(rules.contains)
        .or_else(|| names.iter().copied().find(|col| rules.exact.contains(col)))
        .or_else(|| by_substring(rules.fallback))
        .map(str::to_string)
}

/// Column names resolved once per dataset for every semantic field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub region: Option<String>,
    pub subregion: Option<String>,
    pub category: Option<String>,
    pub ph: Option<String>,
    pub phosphorus: Option<String>,
    pub potassium: Option<String>,
    pub topology: Option<String>,
}

impl ResolvedColumns {
    pub fn resolve<S: AsRef<str>>(columns: &[S]) -> Self {
        let mut resolved = Self::default();
        for field in SemanticField::ALL {
            let column = resolve(columns, field);
            match &column {
                Some(col) => log::debug!("Resolved {field} → '{col}'"),
                None => log::debug!("No column found for {field}"),
            }
            *resolved.slot_mut(field) = column;
        }
        resolved
    }

    pub fn get(&self, field: SemanticField) -> Option<&str> {
        match field {
            SemanticField::Region => self.region.as_deref(),
            SemanticField::Subregion => self.subregion.as_deref(),
            SemanticField::Category => self.category.as_deref(),
            SemanticField::Ph => self.ph.as_deref(),
            SemanticField::Phosphorus => self.phosphorus.as_deref(),
            SemanticField::Potassium => self.potassium.as_deref(),
            SemanticField::Topology => self.topology.as_deref(),
        }
    }

    fn slot_mut(&mut self, field: SemanticField) -> &mut Option<String> {
        match field {
            SemanticField::Region => &mut self.region,
            SemanticField::Subregion => &mut self.subregion,
            SemanticField::Category => &mut self.category,
            SemanticField::Ph => &mut self.ph,
            SemanticField::Phosphorus => &mut self.phosphorus,
            SemanticField::Potassium => &mut self.potassium,
            SemanticField::Topology => &mut self.topology,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_standard_spanish_headers() {
        let cols = [
            "departamento",
            "municipio",
            "cultivo",
            "ph",
            "fosforo",
            "potasio",
            "topologia",
        ];
        let r = ResolvedColumns::resolve(&cols);
        assert_eq!(r.region.as_deref(), Some("departamento"));
        assert_eq!(r.subregion.as_deref(), Some("municipio"));
        assert_eq!(r.category.as_deref(), Some("cultivo"));
        assert_eq!(r.ph.as_deref(), Some("ph"));
        assert_eq!(r.phosphorus.as_deref(), Some("fosforo"));
        assert_eq!(r.potassium.as_deref(), Some("potasio"));
        assert_eq!(r.topology.as_deref(), Some("topologia"));
    }

    #[test]
    fn substring_candidates_match_variants() {
        let cols = ["cod_depto", "nombre mpio", "crop_type", "ph agua:suelo 2,5:1,0"];
        assert_eq!(resolve(&cols, SemanticField::Region).as_deref(), Some("cod_depto"));
        assert_eq!(resolve(&cols, SemanticField::Subregion).as_deref(), Some("nombre mpio"));
        assert_eq!(resolve(&cols, SemanticField::Category).as_deref(), Some("crop_type"));
        assert_eq!(
            resolve(&cols, SemanticField::Ph).as_deref(),
            Some("ph agua:suelo 2,5:1,0")
        );
    }

    #[test]
    fn accented_phosphorus_header_matches() {
        let cols = ["fósforo(p) bray ii mg/kg"];
        assert_eq!(
            resolve(&cols, SemanticField::Phosphorus).as_deref(),
            Some("fósforo(p) bray ii mg/kg")
        );
    }

    #[test]
    fn substring_match_beats_exact_letter_in_either_order() {
        let before = ["p", "fosforo_ppm"];
        let after = ["fosforo_ppm", "p"];
        assert_eq!(resolve(&before, SemanticField::Phosphorus).as_deref(), Some("fosforo_ppm"));
        assert_eq!(resolve(&after, SemanticField::Phosphorus).as_deref(), Some("fosforo_ppm"));
    }

    #[test]
    fn exact_letters_are_the_fallback() {
        let cols = ["departamento", "p", "k"];
        assert_eq!(resolve(&cols, SemanticField::Phosphorus).as_deref(), Some("p"));
        assert_eq!(resolve(&cols, SemanticField::Potassium).as_deref(), Some("k"));
    }

    #[test]
    fn lone_letters_inside_names_do_not_match() {
        // "departamento" contains a "p" and "k" appears in "mg/kg"
        let cols = ["departamento", "zinc mg/kg"];
        assert_eq!(resolve(&cols, SemanticField::Phosphorus), None);
        assert_eq!(resolve(&cols, SemanticField::Potassium), None);
    }

    #[test]
    fn first_column_wins_on_ambiguity() {
        let cols = ["potasio intercambiable", "potasio (k) cmol"];
        assert_eq!(
            resolve(&cols, SemanticField::Potassium).as_deref(),
            Some("potasio intercambiable")
        );
    }

    #[test]
    fn topography_is_used_when_topology_is_absent() {
        let only_topografia = ["topografia"];
        assert_eq!(
            resolve(&only_topografia, SemanticField::Topology).as_deref(),
            Some("topografia")
        );
        let both = ["topografia", "topologia"];
        assert_eq!(resolve(&both, SemanticField::Topology).as_deref(), Some("topologia"));
    }

    #[test]
    fn unresolved_fields_are_none() {
        let r = ResolvedColumns::resolve(&["fecha", "vereda"]);
        assert_eq!(r, ResolvedColumns::default());
        assert_eq!(r.get(SemanticField::Ph), None);
    }
}
