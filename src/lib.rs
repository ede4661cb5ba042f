pub mod aggregate;
pub mod cli;
pub mod error;
pub mod ignore;
pub mod model;
pub mod profile;
pub mod report;
pub mod resolve;
pub mod source;
