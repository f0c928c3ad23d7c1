pub mod formula;
pub mod model;
pub mod rules;
pub mod semantics;
pub mod signs;
pub mod term;

pub use formula::*;
pub use model::*;
pub use semantics::*;
pub use signs::*;
pub use term::*;
