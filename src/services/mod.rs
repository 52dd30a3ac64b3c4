pub mod menu;
pub mod menu_seed;
pub mod order_sequencer;
pub mod order_status;
pub mod orders;
