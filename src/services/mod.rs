pub mod lcd_client;
pub mod metrics;
pub mod portfolio;
pub mod proposal;
pub mod query;
pub mod session;
pub mod validators;

#[cfg(test)]
pub(crate) mod fake_chain;
