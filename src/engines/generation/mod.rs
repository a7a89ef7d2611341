pub mod arena;
pub mod gene_consumer;
pub mod genome;
pub mod retrotranscription;

pub use arena::{Arena, DecodedGenotype, Leaf, NodeIndex, TreeNode};
pub use gene_consumer::GeneConsumer;
pub use genome::{new_germinal_vector, GerminalVector};
pub use retrotranscription::Retrotranscriptor;
