pub mod write_number;
pub mod write_select;
pub mod write_setpoint;
pub mod write_switch;
