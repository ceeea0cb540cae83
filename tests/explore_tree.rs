use opening_explorer::board::cozy::Position;
use opening_explorer::explore::{root_only_best, ExploreStats, NoProgress, NodeReport};
use opening_explorer::{Candidates, EngineError, ExploreError, ExploreParams, Explorer, MoveSequence, Oracle, Progress};
use pretty_assertions::assert_eq;
use std::collections::{BTreeSet, HashMap};
use std::io;

/// Engine stand-in: canned replies per line, position keys from a local board.
struct Scripted {
    replies: HashMap<String, Vec<(String, i32)>>,
    multipv: u32,
    keys: bool,
    fail_on: Option<String>,
    queries: Vec<(String, u32)>,
}

impl Scripted {
    fn new(multipv: u32) -> Self {
        Self { replies: HashMap::new(), multipv, keys: true, fail_on: None, queries: Vec::new() }
    }

    fn reply(mut self, line: &str, moves: &[(&str, i32)]) -> Self {
        self.replies.insert(line.to_string(), moves.iter().map(|(m, cp)| (m.to_string(), *cp)).collect());
        self
    }

    fn queried(&self, line: &str) -> Option<u32> {
        self.queries.iter().find(|(l, _)| l == line).map(|(_, n)| *n)
    }
}

impl Oracle for Scripted {
    fn position_key(&mut self, line: &MoveSequence) -> Result<String, EngineError> {
        if !self.keys { return Ok(String::new()); }
        Ok(Position::from_line(line).map(|p| p.position_key()).unwrap_or_default())
    }

    fn best_moves(&mut self, line: &MoveSequence, _depth: u32, lines: u32) -> Result<Candidates, EngineError> {
        let key = line.to_string();
        if self.fail_on.as_deref() == Some(key.as_str()) {
            return Err(EngineError::Protocol {
                context: "waiting for `bestmove`".into(),
                source: io::Error::new(io::ErrorKind::UnexpectedEof, "engine closed its output"),
            });
        }
        self.queries.push((key.clone(), lines));
        let mut moves = self.replies.get(&key).cloned().unwrap_or_default();
        moves.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(moves.into_iter().take(lines as usize).collect())
    }

    fn multipv(&self) -> u32 { self.multipv }
}

fn run(oracle: &mut Scripted, initial: &str, variation_depth: u32, is_white: bool) -> Result<(BTreeSet<String>, ExploreStats), ExploreError> {
    let initial: MoveSequence = initial.parse().unwrap();
    let mut quiet = NoProgress;
    let params = ExploreParams { variation_depth, search_depth: 12, is_white, progress: &mut quiet };
    Explorer::new(oracle).explore_with_stats(&initial, params)
}

fn set(lines: &[&str]) -> BTreeSet<String> { lines.iter().map(|s| s.to_string()).collect() }

#[test]
fn root_mode_follows_parity_and_side() {
    let even: MoveSequence = "e2e4 e7e5".parse().unwrap();
    let odd: MoveSequence = "e2e4".parse().unwrap();
    assert!(root_only_best(&even, true));
    assert!(!root_only_best(&even, false));
    assert!(!root_only_best(&odd, true));
    assert!(root_only_best(&odd, false));
}

#[test]
fn zero_depth_returns_initial_without_queries() {
    let mut o = Scripted::new(3);
    let (res, stats) = run(&mut o, "e2e4 e7e5", 0, true).unwrap();
    assert_eq!(res, set(&["e2e4 e7e5"]));
    assert!(o.queries.is_empty());
    assert_eq!(stats, ExploreStats::default());
}

#[test]
fn only_best_root_follows_single_move() {
    let mut o = Scripted::new(3).reply("e2e4 e7e5", &[("d2d4", 20)]);
    let (res, _) = run(&mut o, "e2e4 e7e5", 1, true).unwrap();
    assert_eq!(res, set(&["e2e4 e7e5 d2d4"]));
    assert_eq!(o.queries, vec![("e2e4 e7e5".to_string(), 1)]);
}

#[test]
fn only_best_drops_losing_line() {
    let mut o = Scripted::new(3).reply("e2e4 e7e5", &[("g2g4", -300)]);
    let (res, stats) = run(&mut o, "e2e4 e7e5", 3, true).unwrap();
    assert!(res.is_empty(), "{res:?}");
    assert_eq!(stats.pruned, 1);
}

#[test]
fn threshold_itself_is_not_pruned_in_only_best() {
    let mut o = Scripted::new(3).reply("e2e4 e7e5", &[("f2f4", -250)]);
    let (res, _) = run(&mut o, "e2e4 e7e5", 1, true).unwrap();
    assert_eq!(res, set(&["e2e4 e7e5 f2f4"]));
}

#[test]
fn no_candidates_is_a_dead_end() {
    let mut o = Scripted::new(3);
    let (res, _) = run(&mut o, "e2e4 e7e5", 2, true).unwrap();
    assert_eq!(res, set(&["e2e4 e7e5"]));
}

#[test]
fn branching_confirms_losing_reply_with_one_more_ply() {
    let mut o = Scripted::new(2)
        .reply("e2e4", &[("e7e5", 10), ("c7c5", -400)])
        .reply("e2e4 e7e5", &[("g1f3", 30)])
        .reply("e2e4 e7e5 g1f3", &[("b8c6", 0), ("g8f6", -20)])
        .reply("e2e4 c7c5", &[("g1f3", 50)]);
    let (res, _) = run(&mut o, "e2e4", 3, true).unwrap();
    assert_eq!(res, set(&["e2e4 c7c5 g1f3", "e2e4 e7e5 g1f3 b8c6", "e2e4 e7e5 g1f3 g8f6"]));
    assert_eq!(o.queried("e2e4"), Some(2));
    assert_eq!(o.queried("e2e4 c7c5"), Some(1));
    assert_eq!(o.queried("e2e4 e7e5 g1f3"), Some(2));
    assert_eq!(o.queried("e2e4 c7c5 g1f3"), None);
}

#[test]
fn all_losing_candidates_keep_the_parent_line() {
    let mut o = Scripted::new(3)
        .reply("e2e4", &[("a7a6", -300), ("h7h6", -250)])
        .reply("e2e4 a7a6", &[("d2d4", -400)])
        .reply("e2e4 h7h6", &[("d2d4", 100)]);
    let (res, stats) = run(&mut o, "e2e4", 4, true).unwrap();
    assert_eq!(res, set(&["e2e4", "e2e4 h7h6 d2d4"]));
    assert_eq!(stats.pruned, 1);
}

fn transposing_script(multipv: u32) -> Scripted {
    Scripted::new(multipv)
        .reply("e2e4 e7e5", &[("g1f3", 30), ("b1c3", 20)])
        .reply("e2e4 e7e5 b1c3", &[("b8c6", 5)])
        .reply("e2e4 e7e5 b1c3 b8c6", &[("g1f3", 25)])
        .reply("e2e4 e7e5 b1c3 b8c6 g1f3", &[("f8c5", 0)])
        .reply("e2e4 e7e5 g1f3", &[("b8c6", 5)])
        .reply("e2e4 e7e5 g1f3 b8c6", &[("b1c3", 25)])
        .reply("e2e4 e7e5 g1f3 b8c6 b1c3", &[("f8c5", 0)])
}

#[test]
fn transposed_position_is_expanded_once() {
    let mut o = transposing_script(2);
    let (res, stats) = run(&mut o, "e2e4 e7e5", 4, false).unwrap();
    assert_eq!(res, set(&["e2e4 e7e5 b1c3 b8c6 g1f3 f8c5", "e2e4 e7e5 g1f3 b8c6 b1c3"]));
    assert_eq!(stats.transpositions, 1);
    assert_eq!(o.queried("e2e4 e7e5 g1f3 b8c6 b1c3"), None);
}

#[test]
fn missing_position_keys_disable_dedup() {
    let mut o = transposing_script(2);
    o.keys = false;
    let (res, stats) = run(&mut o, "e2e4 e7e5", 4, false).unwrap();
    assert_eq!(res, set(&["e2e4 e7e5 b1c3 b8c6 g1f3 f8c5", "e2e4 e7e5 g1f3 b8c6 b1c3 f8c5"]));
    assert_eq!(stats.transpositions, 0);
}

#[test]
fn engine_failure_aborts_everything() {
    let mut o = transposing_script(2);
    o.fail_on = Some("e2e4 e7e5 g1f3 b8c6".to_string());
    let err = run(&mut o, "e2e4 e7e5", 4, false).unwrap_err();
    let ExploreError::Engine { line, source } = err;
    assert_eq!(line, "e2e4 e7e5 g1f3 b8c6");
    assert!(matches!(source, EngineError::Protocol { .. }));
}

#[derive(Default)]
struct Counting {
    nodes: usize,
    milestones: Vec<usize>,
}

impl Progress for Counting {
    fn node(&mut self, _report: &NodeReport<'_>) { self.nodes += 1; }
    fn milestone(&mut self, collected: usize) { self.milestones.push(collected); }
}

#[test]
fn progress_sees_every_node_and_milestones() {
    // synthetic tokens: no board, so no keys
    let wide: Vec<(String, i32)> = (0..101).map(|i| (format!("m{i:03}"), 0)).collect();
    let mut o = Scripted::new(101);
    o.keys = false;
    o.replies.insert(String::new(), wide);
    for i in 0..101 {
        o.replies.insert(format!("m{i:03}"), vec![("x".to_string(), 0)]);
    }
    let mut sink = Counting::default();
    let params = ExploreParams { variation_depth: 2, search_depth: 8, is_white: false, progress: &mut sink };
    let (res, stats) = Explorer::new(&mut o).explore_with_stats(&MoveSequence::new(), params).unwrap();
    assert_eq!(res.len(), 101);
    assert_eq!(stats.nodes, 102);
    assert_eq!(sink.nodes, 102);
    assert_eq!(sink.milestones, vec![100]);
}
