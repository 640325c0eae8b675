//! End-to-end tests
//!
//! A real gateway, a real MCP client and a wiremock stand-in for the
//! downstream vacation API.

mod vacation_flows;
