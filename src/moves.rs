use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// A move token in engine notation (`e2e4`, `e7e8q`) and the evaluation it
/// was reported with, in centipawns from the side to move.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    token: String,
    eval: i32,
}

impl Move {
    pub fn new(token: impl Into<String>, eval: i32) -> Self { Self { token: token.into(), eval } }

    pub fn token(&self) -> &str { &self.token }

    pub fn eval(&self) -> i32 { self.eval }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.token) }
}

/// A played line from the start position. Renders as the space-joined move
/// tokens; evaluations are not part of the text form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveSequence {
    moves: Vec<Move>,
}

impl MoveSequence {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.moves.len() }

    pub fn is_empty(&self) -> bool { self.moves.is_empty() }

    pub fn moves(&self) -> &[Move] { &self.moves }

    pub fn tokens(&self) -> impl Iterator<Item = &str> { self.moves.iter().map(|m| m.token()) }

    pub fn push(&mut self, mv: Move) { self.moves.push(mv); }

    /// Copy of this line with `mv` appended; the receiver is left untouched.
    pub fn extended(&self, mv: Move) -> Self {
        let mut next = self.clone();
        next.push(mv);
        next
    }

    /// True when white is to move after this line has been played from the start position.
    pub fn white_to_move(&self) -> bool { self.moves.len() % 2 == 0 }
}

impl FromIterator<Move> for MoveSequence {
    fn from_iter<I: IntoIterator<Item = Move>>(iter: I) -> Self { Self { moves: iter.into_iter().collect() } }
}

impl FromStr for MoveSequence {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.split_whitespace().map(|t| Move::new(t, 0)).collect())
    }
}

impl fmt::Display for MoveSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, mv) in self.moves.iter().enumerate() {
            if i > 0 { f.write_str(" ")?; }
            f.write_str(mv.token())?;
        }
        Ok(())
    }
}
