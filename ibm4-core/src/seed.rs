use crate::ibm3::Model3;
use crate::sampler::{HillClimbSampler, Sampler};
use crate::tables::ProbabilityTables;
use crate::text::Corpus;

/// A training stage that produces the initial tables for Model 4.
///
/// It must provide translation, alignment and fertility tables and `p1`.
/// The distortion tables are initialized by Model 4 itself.
pub trait SeedModel {
    fn seed(&self, corpus: &mut Corpus, iterations: usize) -> ProbabilityTables;
}

/// Seeds from IBM Model 3, which itself runs Models 1 and 2.
#[derive(Clone, Copy, Debug, Default)]
pub struct Model3Seed<S = HillClimbSampler> {
    pub sampler: S,
}

impl<S: Sampler> SeedModel for Model3Seed<S> {
    fn seed(&self, corpus: &mut Corpus, iterations: usize) -> ProbabilityTables {
        Model3::fit(corpus, iterations, &self.sampler).into_tables()
    }
}
