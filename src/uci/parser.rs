//! UCI command parser.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    IsReady,
    SetOption { name: String, value: Option<String> },
    UciNewGame,
    Position { fen: Option<String>, moves: Vec<String> },
    Go(GoParams),
    Stop,
    PonderHit,
    Quit,
    /// Engine extension: exhaustive node count for movegen validation.
    Perft(u32),
    Unknown(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParams {
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub movestogo: Option<u32>,
    pub movetime: Option<u64>,
    pub depth: Option<i32>,
    pub nodes: Option<u64>,
    pub mate: Option<u32>,
    pub infinite: bool,
    pub ponder: bool,
}

pub fn parse_uci_command(line: &str) -> UciCommand {
    let mut tokens = line.split_whitespace();
    let Some(head) = tokens.next() else {
        return UciCommand::Unknown(String::new());
    };

    match head {
        "uci" => UciCommand::Uci,
        "isready" => UciCommand::IsReady,
        "ucinewgame" => UciCommand::UciNewGame,
        "stop" => UciCommand::Stop,
        "ponderhit" => UciCommand::PonderHit,
        "quit" => UciCommand::Quit,
        "setoption" => parse_setoption(line),
        "position" => parse_position(line),
        "go" => UciCommand::Go(parse_go(line)),
        "perft" => match tokens.next().and_then(|t| t.parse().ok()) {
            Some(depth) => UciCommand::Perft(depth),
            None => UciCommand::Unknown(line.to_string()),
        },
        _ => UciCommand::Unknown(line.to_string()),
    }
}

fn parse_setoption(line: &str) -> UciCommand {
    // setoption name <id> [value <x>]
    let rest = line.trim_start_matches("setoption").trim();
    let rest = rest.strip_prefix("name").map(str::trim).unwrap_or(rest);
    let (name, value) = match rest.find(" value ") {
        Some(pos) => (
            rest[..pos].trim().to_string(),
            Some(rest[pos + 7..].trim().to_string()),
        ),
        None => (rest.to_string(), None),
    };
    UciCommand::SetOption { name, value }
}

fn parse_position(line: &str) -> UciCommand {
    let rest = line.trim_start_matches("position").trim();
    let (fen, moves_part) = if let Some(rest) = rest.strip_prefix("startpos") {
        (None, rest)
    } else if let Some(rest) = rest.strip_prefix("fen") {
        let rest = rest.trim();
        match rest.find("moves") {
            Some(pos) => (Some(rest[..pos].trim().to_string()), &rest[pos..]),
            None => (Some(rest.to_string()), ""),
        }
    } else {
        return UciCommand::Unknown(line.to_string());
    };

    let moves = moves_part
        .trim()
        .strip_prefix("moves")
        .map(|m| m.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();

    UciCommand::Position { fen, moves }
}

fn parse_go(line: &str) -> GoParams {
    let mut params = GoParams::default();
    let mut tokens = line.split_whitespace().skip(1).peekable();
    while let Some(token) = tokens.next() {
        match token {
            "wtime" => params.wtime = tokens.next().and_then(|t| t.parse().ok()),
            "btime" => params.btime = tokens.next().and_then(|t| t.parse().ok()),
            "winc" => params.winc = tokens.next().and_then(|t| t.parse().ok()),
            "binc" => params.binc = tokens.next().and_then(|t| t.parse().ok()),
            "movestogo" => params.movestogo = tokens.next().and_then(|t| t.parse().ok()),
            "movetime" => params.movetime = tokens.next().and_then(|t| t.parse().ok()),
            "depth" => params.depth = tokens.next().and_then(|t| t.parse().ok()),
            "nodes" => params.nodes = tokens.next().and_then(|t| t.parse().ok()),
            "mate" => params.mate = tokens.next().and_then(|t| t.parse().ok()),
            "infinite" => params.infinite = true,
            "ponder" => params.ponder = true,
            _ => {}
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_commands() {
        assert_eq!(parse_uci_command("uci"), UciCommand::Uci);
        assert_eq!(parse_uci_command("isready"), UciCommand::IsReady);
        assert_eq!(parse_uci_command("  quit  "), UciCommand::Quit);
        assert_eq!(parse_uci_command("perft 5"), UciCommand::Perft(5));
    }

    #[test]
    fn parses_position_startpos_with_moves() {
        let cmd = parse_uci_command("position startpos moves e2e4 e7e5");
        assert_eq!(
            cmd,
            UciCommand::Position {
                fen: None,
                moves: vec!["e2e4".to_string(), "e7e5".to_string()],
            }
        );
    }

    #[test]
    fn parses_position_fen() {
        let cmd =
            parse_uci_command("position fen 4k3/8/8/8/8/8/8/4K2R w K - 3 42 moves e1g1");
        assert_eq!(
            cmd,
            UciCommand::Position {
                fen: Some("4k3/8/8/8/8/8/8/4K2R w K - 3 42".to_string()),
                moves: vec!["e1g1".to_string()],
            }
        );
    }

    #[test]
    fn parses_go_clock() {
        let cmd = parse_uci_command("go wtime 30000 btime 28000 winc 500 binc 500 movestogo 12");
        let UciCommand::Go(params) = cmd else {
            panic!("expected go");
        };
        assert_eq!(params.wtime, Some(30000));
        assert_eq!(params.binc, Some(500));
        assert_eq!(params.movestogo, Some(12));
        assert!(!params.infinite);
    }

    #[test]
    fn parses_go_modes() {
        let UciCommand::Go(params) = parse_uci_command("go depth 9") else {
            panic!();
        };
        assert_eq!(params.depth, Some(9));
        let UciCommand::Go(params) = parse_uci_command("go infinite") else {
            panic!();
        };
        assert!(params.infinite);
        let UciCommand::Go(params) = parse_uci_command("go nodes 123456") else {
            panic!();
        };
        assert_eq!(params.nodes, Some(123456));
    }

    #[test]
    fn parses_setoption() {
        assert_eq!(
            parse_uci_command("setoption name Hash value 128"),
            UciCommand::SetOption {
                name: "Hash".to_string(),
                value: Some("128".to_string()),
            }
        );
    }
}
