//! IPC listener that accepts commands over a Unix socket.
//!
//! External tools connect to the socket, send newline-delimited JSON
//! commands and read one JSON acknowledgement per command.

pub mod listener;



