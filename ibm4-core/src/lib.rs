pub mod types;
pub mod error;
pub mod text;
pub mod classes;
pub mod table;
pub mod tables;
pub mod alignment;
pub mod model4;
pub mod counts;
pub mod sampler;
pub mod ibm1;
pub mod ibm2;
pub mod ibm3;
pub mod seed;
pub mod trainer;

pub use error::{Error, Side};
pub use text::{Corpus, SentencePair, Vocabulary, parse_plaintext, parse_word_classes, write_moses};
pub use classes::{WordClassMap, WordClasses};
pub use tables::{ProbabilityTables, SeedTables};
pub use alignment::AlignmentInfo;
pub use sampler::{AlignmentScorer, HillClimbSampler, Sampler};
pub use seed::{Model3Seed, SeedModel};
pub use trainer::{Diagnostic, Model4, TrainOptions};
