pub mod catalogo;
pub mod formularios;
pub mod inspecao;
pub mod relatorio;
