mod gateway_world;
mod setups;
mod steps;

pub use gateway_world::GatewayWorld;
