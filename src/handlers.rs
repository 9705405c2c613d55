pub mod catalogo;
pub mod inspecoes;
pub mod rascunho;
