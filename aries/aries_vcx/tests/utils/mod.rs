pub mod scenarios;
pub mod test_agent;
