pub mod phase_position;
pub mod rpf_phase;
pub mod svg;
pub mod total_phase;
pub mod triplet;
