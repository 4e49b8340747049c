pub mod activity;
pub mod intent;
pub mod surface;
pub mod terminal;
