use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::table::ProbTable;
use crate::types::*;

/// `translation[t][s]`: P(target word t | source word s or NULL).
pub type TranslationTable = ProbTable<Token, Token>;
/// `alignment[i][(j, l, m)]`: P(i | j, l, m), learned by Model 2.
pub type AlignmentTable = ProbTable<usize, (usize, usize, usize)>;
/// `fertility[phi][s]`: P(phi | s).
pub type FertilityTable = ProbTable<usize, Token>;
/// `head_distortion[dj][(class of previous cept, class of head word)]`.
/// The source class is `None` when there is no previous cept.
pub type HeadDistortionTable = ProbTable<Displacement, (Option<Class>, Class)>;
/// `non_head_distortion[dj][class of word]`.
pub type NonHeadDistortionTable = ProbTable<Displacement, Class>;

/// The learned state of Model 4.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityTables {
    pub translation: TranslationTable,
    pub alignment: AlignmentTable,
    pub fertility: FertilityTable,
    pub p1: Prob,
    pub head_distortion: HeadDistortionTable,
    pub non_head_distortion: NonHeadDistortionTable,
}

impl Default for ProbabilityTables {
    fn default() -> Self {
        ProbabilityTables {
            translation: ProbTable::new(),
            alignment: ProbTable::new(),
            fertility: ProbTable::new(),
            p1: 0.5,
            head_distortion: ProbTable::new(),
            non_head_distortion: ProbTable::new(),
        }
    }
}

impl ProbabilityTables {
    pub fn new() -> Self { Self::default() }

    #[inline]
    pub fn p0(&self) -> Prob { 1.0 - self.p1 }

    /// Empty tables that keep only the frozen alignment table.
    pub fn reset_keeping_alignment(&self) -> Self {
        ProbabilityTables { alignment: self.alignment.clone(), ..Self::default() }
    }
}

/// User supplied tables, any of which may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedTables {
    pub translation: Option<TranslationTable>,
    pub alignment: Option<AlignmentTable>,
    pub fertility: Option<FertilityTable>,
    pub p1: Option<Prob>,
    pub head_distortion: Option<HeadDistortionTable>,
    pub non_head_distortion: Option<NonHeadDistortionTable>,
}

impl From<ProbabilityTables> for SeedTables {
    fn from(t: ProbabilityTables) -> Self {
        SeedTables {
            translation: Some(t.translation),
            alignment: Some(t.alignment),
            fertility: Some(t.fertility),
            p1: Some(t.p1),
            head_distortion: Some(t.head_distortion),
            non_head_distortion: Some(t.non_head_distortion),
        }
    }
}

impl TryFrom<SeedTables> for ProbabilityTables {
    type Error = Error;

    fn try_from(s: SeedTables) -> Result<Self, Error> {
        fn need<T>(v: Option<T>, table: &'static str) -> Result<T, Error> {
            v.ok_or(Error::IncompleteSeedTables { table })
        }
        Ok(ProbabilityTables {
            translation: need(s.translation, "translation")?,
            alignment: need(s.alignment, "alignment")?,
            fertility: need(s.fertility, "fertility")?,
            p1: need(s.p1, "p1")?,
            head_distortion: need(s.head_distortion, "head_distortion")?,
            non_head_distortion: need(s.non_head_distortion, "non_head_distortion")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p0_complements_p1() {
        let mut t = ProbabilityTables::new();
        assert_eq!(t.p1 + t.p0(), 1.0);
        t.p1 = 0.25;
        assert_eq!(t.p1 + t.p0(), 1.0);
    }

    #[test]
    fn reset_keeps_only_alignment() {
        let mut t = ProbabilityTables::new();
        t.alignment.insert(1, (1, 2, 2), 0.75);
        t.translation.insert(3, 4, 0.5);
        t.p1 = 0.1;
        let r = t.reset_keeping_alignment();
        assert_eq!(r.alignment, t.alignment);
        assert!(r.translation.is_empty());
        assert_eq!(r.p1, 0.5);
    }

    #[test]
    fn complete_seed_converts() {
        let mut t = ProbabilityTables::new();
        t.translation.insert(1, 1, 0.9);
        t.head_distortion.insert(1, (None, 0), 0.4);
        let seed = SeedTables::from(t.clone());
        assert_eq!(ProbabilityTables::try_from(seed).unwrap(), t);
    }

    #[test]
    fn json_seed_missing_table_is_rejected() {
        let json = r#"{
            "translation": [],
            "alignment": [],
            "fertility": [],
            "p1": 0.2,
            "non_head_distortion": []
        }"#;
        let seed: SeedTables = serde_json::from_str(json).unwrap();
        let err = ProbabilityTables::try_from(seed).unwrap_err();
        assert_eq!(err, Error::IncompleteSeedTables { table: "head_distortion" });
    }
}
