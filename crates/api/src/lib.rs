//! HTTP API: routing, request context, CSRF and flash handling, and the
//! JSON view models served to the workshop front end.

pub mod app;
pub mod authz;
pub mod context;
pub mod csrf;
pub mod flash;
pub mod middleware;
