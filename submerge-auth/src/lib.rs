// Enrollment and identity: the host identifier and node key persisted in
// the Store, and the single-flight enrollment gate that keeps concurrent
// callers from firing duplicate `enroll` RPCs (SPEC_FULL.md §4.4, §8
// properties 5-7).

mod enroller;
mod identity;

pub use enroller::Enroller;
pub use identity::Identity;
