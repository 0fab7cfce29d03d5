//! Unsupervised word alignment with IBM Models 1 and 2.
//!
//! Both models are trained with Expectation-Maximization on a parallel
//! corpus and then decode the most likely alignment of new sentence pairs.
//! Model 2 adds a positional distortion table on top of Model 1's lexical
//! translation table and can warm-start from a trained Model 1.

pub mod types;
pub mod error;
pub mod table;
pub mod text;
pub mod params;
pub mod train;
pub mod alignment;
pub mod model1;
pub mod model2;
pub mod persist;

pub use alignment::{Aligner, Alignment};
pub use error::{AlignError, Result};
pub use model1::{Model1, Model1Trainer};
pub use model2::{Model2, Model2Trainer};
pub use params::{Context, DistortionTable, LexicalTable};
pub use persist::{load_lexical, read_lexical, save_lexical, write_lexical};
pub use table::SparseJointTable;
pub use text::{parse_plaintext, write_moses, SentencePair, Vocabulary};
pub use train::{IterationReport, TrainOptions, TrainingSummary};
