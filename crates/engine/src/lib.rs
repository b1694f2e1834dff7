//! Core engine of a fuel log: keeps every fillup's derived fields
//! (`distance_traveled`, `fuel_consumption`) consistent across the whole
//! date-ordered chain of a vehicle's records, whatever order the edits
//! arrive in.
//!
//! Transport layers (HTTP handlers, bots, UIs) call the [`Engine`] operations
//! with already-validated primitive values and render what comes back;
//! everything chain-related lives here.

pub use chain::{CONSUMPTION_TOLERANCE, ChainOutcome, ChainWarning, DISTANCE_TOLERANCE, FillupPatch, chain_order, recalculate};
pub use commands::{AddFillupCmd, ImportFillupRow, ImportFillupsCmd, UpdateFillupCmd};
pub use error::EngineError;
pub use fillups::Fillup;
pub use ops::{Engine, EngineBuilder, FillupSaved, ImportOutcome, RecalcSummary};
pub use vehicles::{MileageMode, Vehicle};

mod chain;
mod commands;
mod error;
mod fillups;
mod ops;
pub mod stats;
mod store;
mod vehicles;

type ResultEngine<T> = Result<T, EngineError>;
