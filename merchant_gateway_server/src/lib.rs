//! # Merchant gateway server
//! This crate hosts the HTTP front end for the merchant payment gateway. It is responsible for:
//! Accepting order creation requests from merchant shop fronts, and checking their signatures.
//! Serving orders back to the shop front.
//! Receiving status transitions from the blockchain monitor and queueing the merchant callbacks.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `POST /gateways/{gateway_id}/orders`: Create an order.
//! * `GET /gateways/{gateway_id}/orders/{order_id}`: Fetch an order.
//! * `POST /gateways/{gateway_id}/orders/{order_id}/status`: Report a status transition for an order.

pub mod callbacks;
pub mod cli;
pub mod config;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
