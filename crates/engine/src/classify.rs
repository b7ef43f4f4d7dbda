//! Material classification.
//!
//! Stage 3 maps each component's free-text `material_type` to a
//! jurisdiction category by keyword matching. The match order matters:
//! "cardboard" is checked before "paper" so corrugated stock does not
//! fall into the paper bucket.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Jurisdiction material category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialCategory {
    Plastic,
    Glass,
    Metal,
    Paper,
    Cardboard,
    Composite,
}

impl MaterialCategory {
    pub fn code(self) -> &'static str {
        match self {
            MaterialCategory::Plastic => "PL",
            MaterialCategory::Glass => "GL",
            MaterialCategory::Metal => "MT",
            MaterialCategory::Paper => "PA",
            MaterialCategory::Cardboard => "CB",
            MaterialCategory::Composite => "CP",
        }
    }

    /// Whether the category is recyclable in a typical curbside program.
    pub fn recyclable(self) -> bool {
        !matches!(self, MaterialCategory::Composite)
    }

    /// All supported categories carry a fee.
    pub fn fee_applicable(self) -> bool {
        true
    }

    pub fn name(self) -> &'static str {
        match self {
            MaterialCategory::Plastic => "plastic",
            MaterialCategory::Glass => "glass",
            MaterialCategory::Metal => "metal",
            MaterialCategory::Paper => "paper",
            MaterialCategory::Cardboard => "cardboard",
            MaterialCategory::Composite => "composite",
        }
    }
}

impl fmt::Display for MaterialCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify a material type string by keyword matching. Unmatched
/// materials land in the composite (non-recyclable) category.
pub fn classify_material(material_type: &str) -> MaterialCategory {
    let m = material_type.to_ascii_lowercase();
    if m.contains("plastic") || m.contains("pet") {
        MaterialCategory::Plastic
    } else if m.contains("glass") {
        MaterialCategory::Glass
    } else if m.contains("metal") || m.contains("aluminum") {
        MaterialCategory::Metal
    } else if m.contains("cardboard") {
        MaterialCategory::Cardboard
    } else if m.contains("paper") {
        MaterialCategory::Paper
    } else {
        MaterialCategory::Composite
    }
}

/// Expanded-polystyrene / foam detection, used by the foam penalties in
/// Colorado and the shared-responsibility states.
pub fn is_foam(material_type: &str) -> bool {
    let m = material_type.to_ascii_lowercase();
    m.contains("foam") || m.contains("polystyrene") || m.contains("eps") || m.contains("styrofoam")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_matching_covers_common_materials() {
        assert_eq!(classify_material("PET plastic"), MaterialCategory::Plastic);
        assert_eq!(classify_material("pet"), MaterialCategory::Plastic);
        assert_eq!(classify_material("Glass jar"), MaterialCategory::Glass);
        assert_eq!(classify_material("aluminum can"), MaterialCategory::Metal);
        assert_eq!(classify_material("sheet metal"), MaterialCategory::Metal);
        assert_eq!(classify_material("kraft paper"), MaterialCategory::Paper);
        assert_eq!(
            classify_material("corrugated cardboard"),
            MaterialCategory::Cardboard
        );
        assert_eq!(
            classify_material("multi-layer laminate"),
            MaterialCategory::Composite
        );
    }

    #[test]
    fn cardboard_wins_over_paper() {
        assert_eq!(
            classify_material("paper cardboard hybrid"),
            MaterialCategory::Cardboard
        );
    }

    #[test]
    fn composite_is_the_only_non_recyclable_category() {
        for c in [
            MaterialCategory::Plastic,
            MaterialCategory::Glass,
            MaterialCategory::Metal,
            MaterialCategory::Paper,
            MaterialCategory::Cardboard,
        ] {
            assert!(c.recyclable());
            assert!(c.fee_applicable());
        }
        assert!(!MaterialCategory::Composite.recyclable());
        assert!(MaterialCategory::Composite.fee_applicable());
    }

    #[test]
    fn foam_detection() {
        assert!(is_foam("EPS foam tray"));
        assert!(is_foam("expanded polystyrene"));
        assert!(!is_foam("PET plastic"));
    }
}
