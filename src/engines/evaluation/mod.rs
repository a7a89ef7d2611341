pub mod phenotype;

pub use phenotype::{EncodedPhenotype, Event, Parameter, Score, Voice};
