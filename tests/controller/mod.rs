//! Behaviour tests for the controller service.

mod bdd_steps;
mod scenarios;
mod test_helpers;
