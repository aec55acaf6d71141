pub mod fakes;
pub mod mocks;
pub mod prepare_env;
