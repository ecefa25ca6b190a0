pub mod greeks;
pub mod payoffs;
pub mod pricer;
pub mod simulator;
