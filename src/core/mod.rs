pub mod duty_cycle;
pub mod inhibition;
pub mod segment;
pub mod spatial_pooler;
pub mod synapses;
pub mod topology;
