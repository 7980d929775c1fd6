pub mod migrate;
pub mod ping;
pub mod seed;
pub mod token;
