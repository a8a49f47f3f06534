pub mod phylo;
pub mod recon;
