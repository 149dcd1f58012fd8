//! Database module for PostgreSQL persistence.

mod gate;
mod pool;
mod reconcile;

pub use gate::*;
pub use pool::*;
pub use reconcile::*;
