//! UCI protocol front end.

pub mod parser;
#[path = "loop.rs"]
pub mod r#loop;

pub use self::parser::{parse_uci_command, GoParams, UciCommand};
pub use self::r#loop::{run_uci_loop, score_string, UciEngine};
