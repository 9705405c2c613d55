pub mod autosave_service;
pub mod conectividade;
pub mod rascunho;
pub mod rascunho_service;
pub mod relatorio_service;
