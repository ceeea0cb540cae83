use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// One terminal line per row, in set order.
pub fn write_variations<W: Write>(mut w: W, variations: &BTreeSet<String>) -> io::Result<()> {
    for line in variations {
        writeln!(w, "{line}")?;
    }
    w.flush()
}

/// Creates (or truncates) `path` and writes the variations into it.
pub fn write_variations_file<P: AsRef<Path>>(path: P, variations: &BTreeSet<String>) -> io::Result<()> {
    let f = BufWriter::new(File::create(path)?);
    write_variations(f, variations)
}
