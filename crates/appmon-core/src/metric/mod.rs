//! Metric value holders.
//!
//! Leaf types with no dependencies on each other or on the registry. Push
//! metrics (`Counter`, `Timer`, `HistorizableList`) mutate atomically or under
//! a short private lock; pull metrics (`StateValue`, `MultiValue`) call back
//! into the application at report time.

mod counter;
mod historizable;
mod state;
mod timer;
mod version;

pub use counter::Counter;
pub use historizable::{Historizable, HistorizableList, DEFAULT_MAX_ENTRIES};
pub use state::{MultiValue, MultiValueProvider, State, StateValue, StateValueProvider};
pub use timer::Timer;
pub use version::Version;
