//! Broker simulation.
//!
//! Executes market orders against bar prices, charges proportional
//! commission and keeps the single-asset portfolio.

mod simulated;

pub use simulated::SimulatedBroker;
