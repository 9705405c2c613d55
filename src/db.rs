pub mod inspecao_repo;
pub use inspecao_repo::{InspecaoRepository, InspecaoStore};
