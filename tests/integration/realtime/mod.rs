//! Real-time integration tests
//!
//! Real sockets against a served router
