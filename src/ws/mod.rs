pub mod control_server;
