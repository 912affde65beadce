//! Rolling k-mer hashing: the Lemire cyclic polynomial hash, the shift
//! policies built on it, and the streaming iterator (spec.md §4.2, §4.4–§4.6).

pub mod cyclic;
pub mod extender;
pub mod iterator;
pub mod shifter;
pub mod span;
pub mod ukhs;
pub mod value;

pub use cyclic::CyclicHash64;
pub use extender::HashExtender;
pub use iterator::KmerIterator;
pub use shifter::{CanLemire, CanUnikmer, FwdLemire, FwdUnikmer, HashShifter, ShiftPolicy, UnikmerPolicy};
pub use span::KmerSpan;
pub use ukhs::UkhsMap;
pub use value::{Can, Fwd, HashValue, Minimizer, Unikmer};
