pub mod districts;
pub mod features;
pub mod fetch;
pub mod model;
pub mod output;
pub mod parser;
pub mod predictor;
pub mod sources;
pub mod stats;
pub mod survey;
