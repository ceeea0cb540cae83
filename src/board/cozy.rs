use cozy_chess::{Board as CozyBoard, Color, File, Move, Piece, Square};

use crate::moves::MoveSequence;

/// Local replay of a move line, used to check lines before they are handed
/// to an engine and to derive position keys without one.
#[derive(Clone, Debug)]
pub struct Position {
    board: CozyBoard,
}

impl Position {
    pub fn startpos() -> Self {
        Self { board: CozyBoard::default() }
    }

    /// Plays a UCI token. Castling is accepted in the standard king-two-squares form.
    pub fn make_move_uci(&mut self, mv_uci: &str) -> Result<(), String> {
        let parsed: Move = mv_uci.parse().map_err(|_| format!("Malformed move: {}", mv_uci))?;
        let wanted = self.castle_as_king_takes_rook(parsed);
        let mut found = None;
        self.board.generate_moves(|moves| {
            for m in moves {
                if m == wanted { found = Some(m); break; }
            }
            found.is_some()
        });
        if let Some(m) = found { self.board.play(m); Ok(()) } else { Err(format!("Illegal move: {}", mv_uci)) }
    }

    // cozy-chess encodes castling as the king capturing its own rook.
    fn castle_as_king_takes_rook(&self, mv: Move) -> Move {
        if self.board.piece_on(mv.from) != Some(Piece::King) || mv.from.file() != File::E || mv.from.rank() != mv.to.rank() {
            return mv;
        }
        let rook_file = match mv.to.file() {
            File::G => File::H,
            File::C => File::A,
            _ => return mv,
        };
        Move { from: mv.from, to: Square::new(rook_file, mv.to.rank()), promotion: None }
    }

    pub fn legal_moves_count(&self) -> usize {
        let mut ct = 0usize;
        self.board.generate_moves(|moves| { ct += moves.len(); false });
        ct
    }

    pub fn side_to_move(&self) -> Color { self.board.side_to_move() }

    /// FEN with the halfmove and fullmove counters stripped, the same shape an
    /// engine board dump yields as a transposition key.
    pub fn position_key(&self) -> String {
        let fen = format!("{}", self.board);
        fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
    }

    pub fn set_from_start_and_moves<'a, I>(moves: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut pos = Self::startpos();
        for m in moves { pos.make_move_uci(m)?; }
        Ok(pos)
    }

    pub fn from_line(line: &MoveSequence) -> Result<Self, String> {
        Self::set_from_start_and_moves(line.tokens())
    }
}
