//! Cross-module tests for chunking, ranking and the service layer.

mod ranking;
mod service;
