pub mod check;
pub mod list_msgs;
pub mod output;
