//! Flutter bridge for the BioSelf health record.
//!
//! Dart bindings are generated from [`api`] by `flutter_rust_bridge_codegen`.

pub mod api;
