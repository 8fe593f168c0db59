pub mod common;
pub mod cred_issuance;
pub mod did_exchange;
pub mod did_rotate;
pub mod discover_features;
pub mod notification;
pub mod out_of_band;
pub mod present_proof;
pub mod report_problem;
