//! DBank Transfer - validates transfer requests and applies them atomically
//!
//! All balance changes go through [`TransferExecutor`]. Validation failures
//! are reported as `InvalidArgument`, missing accounts as `NotFound`, and any
//! failure of the atomic unit as `Internal`.

pub mod error;
pub mod executor;
pub mod request;

pub use error::{ErrorCode, TransferError};
pub use executor::TransferExecutor;
pub use request::{TransferRequest, ValidTransfer};
