pub mod chat_panel;
pub mod header;
pub mod log_panel;
pub mod player_panel;
