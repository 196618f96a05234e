pub mod click;
pub mod done;
pub mod dropdown;
pub mod extract;
pub mod input;
pub mod navigate;
pub mod screenshot;
pub mod scroll;
pub mod send_keys;
pub mod text;
pub mod user_input;
