//! Monthly payroll: the pure calculator and the layers around it.

pub mod breakdown;
pub mod calculator;
pub mod export;
pub mod input;
pub mod month;
pub mod service;

pub use breakdown::{PayrollBreakdown, PayrollFigures};
pub use calculator::{calculate, compute};
pub use input::{PayrollInput, PayrollInputError, RawPayrollInput};
pub use month::{InvalidMonth, PayrollMonth};
