//! UCI event loop and engine state machine.
//!
//! `go` launches the search on a dedicated worker thread so stop commands
//! are honored mid-think; the shared caches use atomic entries, so the
//! worker needs no locks. The worker prints its own `info` and `bestmove`
//! lines.

use std::io::{self, BufRead, Write};
use std::thread::{self, JoinHandle};

use super::parser::{parse_uci_command, GoParams, UciCommand};
use crate::board::{move_to_uci, Color};
use crate::engine::Engine;
use crate::search::{Search, CHECKMATE, MATE_THRESHOLD};
use crate::time::SearchLimits;

const ENGINE_NAME: &str = concat!("ferz ", env!("CARGO_PKG_VERSION"));

/// Worker threads recurse deeply with per-ply move buffers; give them room.
const SEARCH_STACK_BYTES: usize = 32 * 1024 * 1024;

pub struct UciEngine {
    engine: Engine,
    worker: Option<JoinHandle<()>>,
    running: bool,
}

/// Format a score for `info score ...`: centipawns, or moves-to-mate.
pub fn score_string(score: i32) -> String {
    if score >= MATE_THRESHOLD {
        format!("mate {}", (CHECKMATE - score + 1) / 2)
    } else if score <= -MATE_THRESHOLD {
        format!("mate -{}", (CHECKMATE + score + 1) / 2)
    } else {
        format!("cp {}", score)
    }
}

fn limits_from_go(params: &GoParams, side: Color) -> SearchLimits {
    if params.infinite || params.ponder {
        return SearchLimits::Infinite;
    }
    if let Some(ms) = params.movetime {
        return SearchLimits::FixedTime(ms);
    }
    if let Some(depth) = params.depth {
        return SearchLimits::FixedDepth(depth);
    }
    if let Some(nodes) = params.nodes {
        return SearchLimits::FixedNodes(nodes);
    }
    let (clock, inc) = match side {
        Color::White => (params.wtime, params.winc),
        Color::Black => (params.btime, params.binc),
    };
    match clock {
        Some(remaining) => SearchLimits::Adaptive {
            base_ms: 0,
            fischer_inc_ms: inc.unwrap_or(0),
            clock_remaining_ms: remaining,
            moves_to_go: params.movestogo,
        },
        // bare "go": think for a flat five seconds
        None => SearchLimits::FixedTime(5000),
    }
}

impl UciEngine {
    pub fn new() -> Self {
        UciEngine {
            engine: Engine::new(),
            worker: None,
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Wind down an active search and wait for its bestmove line.
    fn finish_search(&mut self) {
        if let Some(handle) = self.worker.take() {
            self.engine.stop();
            let _ = handle.join();
        }
    }

    /// Kill an active search; no bestmove is printed.
    fn kill_search(&mut self) {
        if let Some(handle) = self.worker.take() {
            self.engine.abort();
            let _ = handle.join();
        }
    }

    fn launch_search(&mut self, go: GoParams) {
        // one search at a time
        self.finish_search();

        let limits = limits_from_go(&go, self.engine.board().side);
        let (board, history, tt, eval_cache, control, params) = self.engine.search_handles();
        control.reset();

        let handle = thread::Builder::new()
            .name("search".to_string())
            .stack_size(SEARCH_STACK_BYTES)
            .spawn(move || {
                let mut search =
                    Search::new(board, history, &tt, &eval_cache, &params, &control);
                let report = search.think_with_info(&limits, &mut |info| {
                    let pv: Vec<String> = info.pv.iter().map(|&m| move_to_uci(m)).collect();
                    println!(
                        "info depth {} score {} nodes {} nps {} time {} hashfull {} pv {}",
                        info.depth,
                        score_string(info.score),
                        info.nodes,
                        info.nps,
                        info.elapsed_ms,
                        info.hashfull,
                        pv.join(" "),
                    );
                    let _ = io::stdout().flush();
                });
                if !report.aborted {
                    println!("bestmove {}", move_to_uci(report.best_move));
                    let _ = io::stdout().flush();
                }
            })
            .expect("failed to spawn search thread");
        self.worker = Some(handle);
    }

    pub fn handle_command(&mut self, cmd: UciCommand) -> Vec<String> {
        let mut out = Vec::new();
        match cmd {
            UciCommand::Uci => {
                out.push(format!("id name {}", ENGINE_NAME));
                out.push("id author the ferz authors".to_string());
                out.push("option name Hash type spin default 64 min 1 max 4096".to_string());
                out.push("uciok".to_string());
            }
            UciCommand::IsReady => {
                out.push("readyok".to_string());
            }
            UciCommand::UciNewGame => {
                self.finish_search();
                self.engine.new_game();
            }
            UciCommand::Position { fen, moves } => {
                self.finish_search();
                match fen {
                    Some(fen) => {
                        if let Err(e) = self.engine.set_position(&fen) {
                            out.push(format!("info string bad FEN: {}", e));
                            self.engine.new_game();
                            return out;
                        }
                    }
                    None => self.engine.new_game(),
                }
                for mv in &moves {
                    if let Err(e) = self.engine.apply_move(mv) {
                        out.push(format!("info string illegal move {}: {}", mv, e));
                        break;
                    }
                }
            }
            UciCommand::Go(params) => {
                self.launch_search(params);
            }
            UciCommand::Stop => {
                self.finish_search();
            }
            UciCommand::PonderHit => {
                // pondering is not implemented; the search keeps running
            }
            UciCommand::SetOption { name, value } => match name.as_str() {
                "Hash" => {
                    let Some(mb) = value.as_deref().and_then(|v| v.parse::<usize>().ok()) else {
                        out.push("info string bad Hash value".to_string());
                        return out;
                    };
                    if (1..=4096).contains(&mb) {
                        self.finish_search();
                        let params = self.engine.params().clone().tt_size_mb(mb);
                        self.engine = Engine::with_params(params);
                    } else {
                        out.push("info string Hash must be 1..4096 MB".to_string());
                    }
                }
                _ => {
                    out.push(format!("info string unknown option {}", name));
                }
            },
            UciCommand::Perft(depth) => {
                self.finish_search();
                let start = std::time::Instant::now();
                let mut total = 0u64;
                for (mv, nodes) in self.engine.perft_divide(depth) {
                    out.push(format!("{}: {}", mv, nodes));
                    total += nodes;
                }
                out.push(format!(
                    "perft({}) = {} nodes in {} ms",
                    depth,
                    total,
                    start.elapsed().as_millis()
                ));
            }
            UciCommand::Quit => {
                self.kill_search();
                self.running = false;
            }
            UciCommand::Unknown(line) => {
                if !line.is_empty() {
                    out.push(format!("info string unknown command: {}", line));
                }
            }
        }
        out
    }
}

impl Default for UciEngine {
    fn default() -> Self {
        Self::new()
    }
}

pub fn run_uci_loop() -> io::Result<()> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();

    let mut engine = UciEngine::new();
    let mut line = String::new();

    while engine.is_running() {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break; // EOF
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let responses = engine.handle_command(parse_uci_command(trimmed));
        for response in responses {
            writeln!(writer, "{}", response)?;
        }
        // the GUI needs every answer immediately
        writer.flush()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(engine: &mut UciEngine, line: &str) -> Vec<String> {
        engine.handle_command(parse_uci_command(line))
    }

    #[test]
    fn uci_handshake() {
        let mut engine = UciEngine::new();
        let out = drive(&mut engine, "uci");
        assert!(out.iter().any(|l| l.starts_with("id name")));
        assert_eq!(out.last().map(String::as_str), Some("uciok"));
        let out = drive(&mut engine, "isready");
        assert_eq!(out, vec!["readyok".to_string()]);
    }

    #[test]
    fn position_and_perft() {
        let mut engine = UciEngine::new();
        drive(&mut engine, "position startpos moves e2e4 e7e5");
        let out = drive(&mut engine, "perft 1");
        let total_line = out.last().unwrap();
        assert!(total_line.contains("= 29"), "perft 1 after 1.e4 e5: {}", total_line);
    }

    #[test]
    fn bad_fen_reports_and_resets() {
        let mut engine = UciEngine::new();
        let out = drive(&mut engine, "position fen this is garbage");
        assert!(out.iter().any(|l| l.contains("bad FEN")));
        // engine is back on the initial position and still functional
        let out = drive(&mut engine, "perft 1");
        assert!(out.last().unwrap().contains("= 20"));
    }

    #[test]
    fn score_strings() {
        assert_eq!(score_string(42), "cp 42");
        assert_eq!(score_string(CHECKMATE - 1), "mate 1");
        assert_eq!(score_string(CHECKMATE - 3), "mate 2");
        assert_eq!(score_string(-(CHECKMATE - 2)), "mate -1");
        assert_eq!(score_string(-(CHECKMATE - 4)), "mate -2");
    }

    #[test]
    fn go_and_stop_produce_one_search() {
        let mut engine = UciEngine::new();
        drive(&mut engine, "position startpos");
        drive(&mut engine, "go depth 3");
        // stop joins the worker; bestmove is printed by the worker itself
        drive(&mut engine, "stop");
        assert!(engine.worker.is_none());
        drive(&mut engine, "quit");
        assert!(!engine.is_running());
    }
}
