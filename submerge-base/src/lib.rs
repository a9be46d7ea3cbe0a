mod cancel;
mod deadline;
mod error;
mod ids;

pub use cancel::Cancel;
pub use deadline::Deadline;
pub use error::{err, kind_err, Error, ErrorKind, Result};
pub use ids::CorrelationId;
