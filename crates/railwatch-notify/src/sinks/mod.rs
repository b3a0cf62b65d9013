pub mod draft_file;
pub mod webhook;
