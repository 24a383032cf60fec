pub mod controls;
pub mod saved_list;
pub mod status_line;
pub mod url_input;
