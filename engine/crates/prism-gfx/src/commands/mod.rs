pub mod command_context;
