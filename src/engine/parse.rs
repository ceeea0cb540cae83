use once_cell::sync::Lazy;
use regex::Regex;

use crate::moves::Move;

// `depth`, `cp` and `pv` in that order; `seldepth` and mate scores do not match.
static PROGRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bdepth (\d+)\b.*?\bcp (-?\d+)\b.*?\bpv (\S+)").expect("static progress pattern")
});

static FEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Fen: (.+) \d+ \d+$").expect("static fen pattern"));

/// First move and centipawn score of a search progress line reported at
/// exactly `depth`. Anything else yields `None`.
pub fn parse_candidate(line: &str, depth: u32) -> Option<Move> {
    let caps = PROGRESS_RE.captures(line.trim_end())?;
    let reported: u32 = caps[1].parse().ok()?;
    if reported != depth { return None; }
    let cp: i32 = caps[2].parse().ok()?;
    Some(Move::new(&caps[3], cp))
}

/// Position string of a board dump's `Fen:` line, without the move counters.
pub fn parse_fen_line(line: &str) -> Option<String> {
    FEN_RE.captures(line.trim()).map(|caps| caps[1].to_string())
}
