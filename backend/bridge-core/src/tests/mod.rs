mod config;
mod facade;
mod probe;
mod readiness;
