use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Reads a whole text file into memory.
pub fn read_file<P: AsRef<Path>>(filename: P) -> io::Result<String> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents)
}

/// Splits a corpus into words.
///
/// - Splits on any whitespace, line breaks included
/// - Punctuation and case are kept as is
///
/// Example:
/// `"The cat.\n  Sat "` → `["The", "cat.", "Sat"]`
pub fn split_words(corpus: &str) -> Vec<String> {
	corpus.split_whitespace().map(str::to_owned).collect()
}

/// Splits a corpus into discrete sequences of words, one per line.
///
/// Blank lines are skipped.
pub fn split_sequences(corpus: &str) -> Vec<Vec<String>> {
	corpus
		.lines()
		.map(split_words)
		.filter(|sequence| !sequence.is_empty())
		.collect()
}

/// Reads a text file and returns its words.
pub fn read_words<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	Ok(split_words(&read_file(filename)?))
}

/// Reads a whole text from a reader (ex. stdin).
pub fn read_text_from<R: Read>(mut reader: R) -> io::Result<String> {
	let mut contents = String::new();
	reader.read_to_string(&mut contents)?;
	Ok(contents)
}

/// Joins generated words with single spaces.
pub fn join_words<W: AsRef<str>>(words: &[W]) -> String {
	words.iter().map(AsRef::<str>::as_ref).collect::<Vec<&str>>().join(" ")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn splits_on_lines_and_whitespace() {
		assert_eq!(split_words("The cat.\r\n  Sat\ton the  mat \n\n"), ["The", "cat.", "Sat", "on", "the", "mat"]);
		assert!(split_words(" \n ").is_empty());
	}

	#[test]
	fn reads_from_a_reader() {
		let text = read_text_from("a b\nc".as_bytes()).unwrap();
		assert_eq!(split_words(&text), ["a", "b", "c"]);
	}

	#[test]
	fn one_sequence_per_line() {
		let sequences = split_sequences("The cat sat.\n\n  \nThe dog ran off.\r\n");
		assert_eq!(sequences, [vec!["The", "cat", "sat."], vec!["The", "dog", "ran", "off."]]);
	}

	#[test]
	fn missing_file_is_an_io_error() {
		assert!(read_words("./does/not/exist.txt").is_err());
	}

	#[test]
	fn joins_with_spaces() {
		assert_eq!(join_words(&["a", "b", "c"]), "a b c");
		assert_eq!(join_words::<String>(&[]), "");
	}
}
