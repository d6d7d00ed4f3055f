pub mod rectifier;

pub use rectifier::Rectifier;
