//! NPK dosage formulas.
//!
//! `recommend` is the canonical dosage behind the recommendation endpoint:
//! linear in pH and the relevant nutrient, rounded to whole grams.
//! `fallback_dosage` is the floor-clamped variant the advisory path uses
//! when the model reply is unusable.

use serde::{Deserialize, Serialize};

/// Inputs to the canonical formula as accepted over HTTP.
/// Phosphorus is optional; stations without a P probe omit it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoseRequest {
    #[serde(rename = "pH")]
    pub ph: f64,
    #[serde(rename = "N")]
    pub nitrogen: f64,
    #[serde(rename = "K")]
    pub potassium: f64,
    #[serde(rename = "P", default)]
    pub phosphorus: f64,
}

impl DoseRequest {
    pub fn dosage(&self) -> Dosage {
        recommend(self.ph, self.nitrogen, self.phosphorus, self.potassium)
    }
}

/// Whole-gram doses in g/m² (canonical formula output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dosage {
    pub urea: i64,
    pub sp36: i64,
    pub kcl: i64,
}

/// Fractional doses in g/m² (advisory path output).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryDosage {
    pub urea: f64,
    pub sp36: f64,
    pub kcl: f64,
}

/// Canonical dosage. Rounding is half away from zero; the output is
/// deliberately unclamped, so extreme inputs produce extreme doses.
pub fn recommend(ph: f64, nitrogen: f64, phosphorus: f64, potassium: f64) -> Dosage {
    Dosage {
        urea: (100.0 - ph * 5.0 + nitrogen / 2.0).round() as i64,
        sp36: (ph * 10.0 + phosphorus * 2.0).round() as i64,
        kcl: (ph * 8.0 + potassium * 1.5).round() as i64,
    }
}

/// Advisory fallback dosage with per-fertilizer floors.
pub fn fallback_dosage(ph: f64, nitrogen: f64, potassium: f64) -> AdvisoryDosage {
    AdvisoryDosage {
        urea: (150.0 - ph * 10.0 + nitrogen * 2.0).max(50.0),
        sp36: (100.0 - ph * 5.0 + potassium * 1.5).max(30.0),
        kcl: (80.0 - ph * 3.0 + nitrogen * 1.2).max(20.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_formula() {
        // urea = 100 - 6.5*5 + 40/2 = 87.5 → 88
        // sp36 = 6.5*10 + 0*2     = 65
        // kcl  = 6.5*8 + 30*1.5   = 97
        let dosage = recommend(6.5, 40.0, 0.0, 30.0);
        assert_eq!(dosage, Dosage { urea: 88, sp36: 65, kcl: 97 });
    }

    #[test]
    fn test_phosphorus_feeds_sp36_only() {
        let without = recommend(6.5, 40.0, 0.0, 30.0);
        let with = recommend(6.5, 40.0, 10.0, 30.0);
        assert_eq!(with.sp36, without.sp36 + 20);
        assert_eq!(with.urea, without.urea);
        assert_eq!(with.kcl, without.kcl);
    }

    #[test]
    fn test_half_rounds_away_from_zero() {
        // 100 - 0.5*5 + 0 = 97.5 → 98 (exact in binary: 0.5*5 = 2.5)
        assert_eq!(recommend(0.5, 0.0, 0.0, 0.0).urea, 98);
        // 100 - 20.5*5 + 0 = -2.5 → -3
        assert_eq!(recommend(20.5, 0.0, 0.0, 0.0).urea, -3);
        // sp36 = 0.25*10 = 2.5 → 3
        assert_eq!(recommend(0.25, 0.0, 0.0, 0.0).sp36, 3);
    }

    #[test]
    fn test_canonical_is_unclamped() {
        // Strongly alkaline soil with no nitrogen drives urea negative.
        let dosage = recommend(25.0, 0.0, 0.0, 0.0);
        assert!(dosage.urea < 0);
    }

    #[test]
    fn test_fallback_formula() {
        // urea = max(50, 150 - 60 + 80) = 170
        // sp36 = max(30, 100 - 30 + 45) = 115
        // kcl  = max(20,  80 - 18 + 48) = 110
        let dosage = fallback_dosage(6.0, 40.0, 30.0);
        assert_eq!(dosage.urea, 170.0);
        assert_eq!(dosage.sp36, 115.0);
        assert_eq!(dosage.kcl, 110.0);
    }

    #[test]
    fn test_fallback_floors_engage() {
        // Alkaline soil with nothing measured: every term hits its floor.
        let dosage = fallback_dosage(14.0, 0.0, 0.0);
        assert_eq!(dosage.urea, 50.0);
        assert_eq!(dosage.sp36, 30.0);
        assert_eq!(dosage.kcl, 38.0); // 80 - 42 = 38, above the floor of 20
    }

    #[test]
    fn test_dose_request_defaults_phosphorus() {
        let request: DoseRequest =
            serde_json::from_str(r#"{"pH":6.5,"N":40,"K":30}"#).unwrap();
        assert_eq!(request.phosphorus, 0.0);
        assert_eq!(request.dosage().sp36, 65);
    }
}
