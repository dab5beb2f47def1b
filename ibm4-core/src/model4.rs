//! Model 4 probability of a target sentence and one alignment.
//!
//! P(t, a | s) is the product of four terms evaluated in a fixed order:
//! null generation, fertility, then lexical and distortion factors for each
//! target position in turn. As soon as the running product drops below
//! [`MIN_PROB`] the remaining factors are skipped and `MIN_PROB` is returned,
//! since anything that small is treated as zero. The returned value is then
//! an upper bound rather than the full product.

use crate::alignment::AlignmentInfo;
use crate::classes::WordClasses;
use crate::tables::ProbabilityTables;
use crate::types::*;

/// How the position of a target word is modelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Generated by NULL, placed uniformly.
    Null,
    /// First word of its tablet, placed relative to the previous cept's center.
    Head { dj: Displacement, src_class: Option<Class>, trg_class: Class },
    /// Later word of a tablet, placed relative to the previous word in it.
    NonHead { dj: Displacement, trg_class: Class },
}

pub fn placement(info: &AlignmentInfo, classes: &WordClasses, j: usize) -> Placement {
    let i = info.alignment[j];
    if i == 0 {
        return Placement::Null;
    }
    let trg_class = classes.target.class_of(info.trg_sentence[j]);
    if info.is_head_word(j) {
        let previous_cept = info.previous_cept(j);
        let src_class = previous_cept.map(|p| classes.source.class_of(info.src_sentence[p]));
        let dj = j as Displacement - info.center_of_cept(previous_cept) as Displacement;
        return Placement::Head { dj, src_class, trg_class };
    }
    // a non-head word always has a predecessor in its tablet
    let previous = info.previous_in_tablet(j).unwrap_or(0);
    Placement::NonHead { dj: (j - previous) as Displacement, trg_class }
}

/// Binomial model of NULL insertion:
/// C(m - phi0, phi0) * p1^phi0 * p0^(m - 2 phi0).
pub fn null_generation_term(info: &AlignmentInfo, tables: &ProbabilityTables) -> Prob {
    let p1 = tables.p1;
    let p0 = tables.p0();
    let null_fertility = info.fertility_of_i(0);
    let m = info.m();
    let mut value = p1.powi(null_fertility as i32) * p0.powi(m as i32 - 2 * null_fertility as i32);
    if value < MIN_PROB {
        return MIN_PROB;
    }
    for k in 1..=null_fertility {
        value *= (m as Prob - null_fertility as Prob - k as Prob + 1.0) / k as Prob;
    }
    value
}

pub fn fertility_term(info: &AlignmentInfo, tables: &ProbabilityTables) -> Prob {
    let mut value = 1.0;
    for i in 1..=info.l() {
        let phi = info.fertility_of_i(i);
        value *= factorial(phi) * tables.fertility.get_or_floor(&phi, &info.src_sentence[i]);
        if value < MIN_PROB {
            return MIN_PROB;
        }
    }
    value
}

#[inline]
pub fn lexical_translation_term(info: &AlignmentInfo, tables: &ProbabilityTables, j: usize) -> Prob {
    let t = info.trg_sentence[j];
    let s = info.src_sentence[info.alignment[j]];
    tables.translation.get_or_floor(&t, &s)
}

pub fn distortion_term(
    info: &AlignmentInfo,
    tables: &ProbabilityTables,
    classes: &WordClasses,
    j: usize,
) -> Prob {
    match placement(info, classes, j) {
        Placement::Null => 1.0,
        Placement::Head { dj, src_class, trg_class } => {
            tables.head_distortion.get_or_floor(&dj, &(src_class, trg_class))
        }
        Placement::NonHead { dj, trg_class } => tables.non_head_distortion.get_or_floor(&dj, &trg_class),
    }
}

pub fn prob_t_a_given_s(info: &AlignmentInfo, tables: &ProbabilityTables, classes: &WordClasses) -> Prob {
    let mut probability = null_generation_term(info, tables);
    if probability < MIN_PROB {
        return MIN_PROB;
    }

    probability *= fertility_term(info, tables);
    if probability < MIN_PROB {
        return MIN_PROB;
    }

    for j in 1..=info.m() {
        probability *= lexical_translation_term(info, tables, j);
        if probability < MIN_PROB {
            return MIN_PROB;
        }

        probability *= distortion_term(info, tables, classes, j);
        if probability < MIN_PROB {
            return MIN_PROB;
        }
    }

    probability
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::WordClassMap;
    use crate::text::Corpus;

    const EPS: Prob = 1e-12;

    struct Fixture {
        corpus: Corpus,
        classes: WordClasses,
    }

    // source: the(1) small(2) house(3); target: das(1) kleine(2) haus(3) ja(4)
    fn fixture() -> Fixture {
        let mut corpus = Corpus::new();
        corpus.push(&["the", "small", "house"], &["das", "kleine", "haus", "ja"]);
        let src: WordClassMap = [("the", 0), ("small", 1), ("house", 2)].into_iter().collect();
        let trg: WordClassMap = [("das", 0), ("kleine", 2), ("haus", 1), ("ja", 4)].into_iter().collect();
        let classes = WordClasses::resolve(&corpus, &src, &trg).unwrap();
        Fixture { corpus, classes }
    }

    fn info(f: &Fixture, links: &[usize]) -> AlignmentInfo {
        let (src, trg) = AlignmentInfo::sentences(&f.corpus.pairs[0]);
        let mut alignment = vec![0];
        alignment.extend_from_slice(links);
        AlignmentInfo::new(alignment, src, trg)
    }

    #[test]
    fn placements_follow_tablets() {
        let f = fixture();
        // das->the, kleine->house, haus->house, ja->NULL
        let a = info(&f, &[1, 3, 3, 0]);
        assert_eq!(
            placement(&a, &f.classes, 1),
            Placement::Head { dj: 1, src_class: None, trg_class: 0 }
        );
        // previous cept is "the" (small has no words), centered at 1
        assert_eq!(
            placement(&a, &f.classes, 2),
            Placement::Head { dj: 1, src_class: Some(0), trg_class: 2 }
        );
        assert_eq!(placement(&a, &f.classes, 3), Placement::NonHead { dj: 1, trg_class: 1 });
        assert_eq!(placement(&a, &f.classes, 4), Placement::Null);
    }

    #[test]
    fn null_term_is_binomial() {
        let f = fixture();
        let mut tables = ProbabilityTables::new();
        tables.p1 = 0.2;
        let a = info(&f, &[1, 3, 3, 0]);
        // m = 4, phi0 = 1: C(3, 1) * 0.2 * 0.8^2
        let expected = 3.0 * 0.2 * 0.8 * 0.8;
        assert!((null_generation_term(&a, &tables) - expected).abs() < EPS);
    }

    #[test]
    fn full_product_matches_hand_computation() {
        let f = fixture();
        let v = |w: &str| f.corpus.source_vocab.token(w).unwrap();
        let t = |w: &str| f.corpus.target_vocab.token(w).unwrap();
        let mut tables = ProbabilityTables::new();
        tables.p1 = 0.2;
        tables.translation.insert(t("das"), v("the"), 0.9);
        tables.translation.insert(t("kleine"), v("small"), 0.8);
        tables.translation.insert(t("haus"), v("house"), 0.7);
        tables.translation.insert(t("ja"), NULL, 0.5);
        tables.fertility.insert(1, v("the"), 0.6);
        tables.fertility.insert(1, v("small"), 0.5);
        tables.fertility.insert(1, v("house"), 0.4);
        tables.head_distortion.insert(1, (None, 0), 0.3);
        tables.head_distortion.insert(1, (Some(0), 2), 0.25);
        tables.head_distortion.insert(1, (Some(1), 1), 0.2);

        let a = info(&f, &[1, 2, 3, 0]);
        let null = 3.0 * 0.2 * 0.8 * 0.8;
        let fert = 0.6 * 0.5 * 0.4;
        let lex = 0.9 * 0.8 * 0.7 * 0.5;
        let dist = 0.3 * 0.25 * 0.2;
        let p = prob_t_a_given_s(&a, &tables, &f.classes);
        assert!((p - null * fert * lex * dist).abs() < EPS);
    }

    #[test]
    fn underflow_short_circuits_to_floor() {
        let f = fixture();
        // every table is empty, so the first fertility factor is already MIN_PROB
        let tables = ProbabilityTables::new();
        let a = info(&f, &[1, 2, 3, 0]);
        assert_eq!(prob_t_a_given_s(&a, &tables, &f.classes), MIN_PROB);
        assert_eq!(fertility_term(&a, &tables), MIN_PROB);
    }

    #[test]
    fn null_term_floors_before_combination() {
        let f = fixture();
        let mut tables = ProbabilityTables::new();
        tables.p1 = 1e-7;
        // m = 4, phi0 = 2: p1^2 * p0^0 = 1e-14, C(2, 2) = 1
        let a = info(&f, &[0, 0, 1, 1]);
        assert_eq!(null_generation_term(&a, &tables), MIN_PROB);
        assert_eq!(prob_t_a_given_s(&a, &tables, &f.classes), MIN_PROB);
    }

    #[test]
    fn fertility_floors_before_later_factorial() {
        let f = fixture();
        let v = |w: &str| f.corpus.source_vocab.token(w).unwrap();
        let mut tables = ProbabilityTables::new();
        tables.fertility.insert(1, v("the"), 6e-13);
        tables.fertility.insert(0, v("small"), 1.0);
        tables.fertility.insert(2, v("house"), 1.0);
        let a = info(&f, &[1, 3, 3, 0]);
        // the full product 6e-13 * 2! = 1.2e-12 is never reached
        assert_eq!(fertility_term(&a, &tables), MIN_PROB);
    }

    #[test]
    fn fertility_term_applies_factorial() {
        let f = fixture();
        let v = |w: &str| f.corpus.source_vocab.token(w).unwrap();
        let mut tables = ProbabilityTables::new();
        tables.fertility.insert(1, v("the"), 0.5);
        tables.fertility.insert(0, v("small"), 0.5);
        tables.fertility.insert(2, v("house"), 0.5);
        let a = info(&f, &[1, 3, 3, 0]);
        assert!((fertility_term(&a, &tables) - 0.5 * 0.5 * 2.0 * 0.5).abs() < EPS);
    }
}
