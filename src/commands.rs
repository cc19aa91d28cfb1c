pub mod explain;
pub mod recompute;
pub mod status;
