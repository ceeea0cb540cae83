use opening_explorer::engine::parse::parse_candidate;
use opening_explorer::{Move, MoveSequence};

#[test]
fn text_form_is_a_fixed_point() {
    for text in ["e2e4", "e2e4 e7e5", "d2d4 g8f6 c2c4 e7e6 b1c3 f8b4", "e7e8q"] {
        let seq: MoveSequence = text.parse().unwrap();
        assert_eq!(seq.to_string(), text);
        let again: MoveSequence = seq.to_string().parse().unwrap();
        assert_eq!(again, seq);
    }
}

#[test]
fn evaluations_are_not_serialized() {
    let seq: MoveSequence = vec![Move::new("e2e4", 31), Move::new("c7c5", -12)].into_iter().collect();
    assert_eq!(seq.to_string(), "e2e4 c7c5");
    assert!(seq.white_to_move());
}

#[test]
fn candidate_parsing_is_deterministic() {
    let line = "info depth 12 seldepth 17 multipv 3 score cp -41 nodes 120021 pv g8f6 b1c3";
    let first = parse_candidate(line, 12);
    for _ in 0..3 {
        assert_eq!(parse_candidate(line, 12), first);
    }
    assert_eq!(first, Some(Move::new("g8f6", -41)));
    assert_eq!(parse_candidate(line, 11), None);
}
