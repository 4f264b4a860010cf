use std::iter::Enumerate;
use std::str::{Lines, SplitWhitespace};

/// One command line of a scene description: the command word followed by its fields.
#[derive(Debug)]
pub struct Line<'a> {
    /// 1-based line number in the input.
    pub number: usize,
    pub command: &'a str,
    fields: SplitWhitespace<'a>,
}

impl<'a> Line<'a> {
    /// Consume the next whitespace separated field.
    pub fn field(&mut self) -> Option<&'a str> {
        self.fields.next()
    }
}

/// Splits a scene description into command lines, skipping blank lines and `#` comments.
#[derive(Debug)]
pub struct Lexer<'a> {
    lines: Enumerate<Lines<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            lines: input.lines().enumerate(),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        for (ix, text) in self.lines.by_ref() {
            let mut fields = text.split_whitespace();
            match fields.next() {
                None => continue,
                Some(command) if command.starts_with('#') => continue,
                Some(command) => {
                    return Some(Line {
                        number: ix + 1,
                        command,
                        fields,
                    })
                }
            }
        }

        None
    }
}

#[cfg(test)]
macro_rules! lexer_next {
    ($lexer:ident, $number:expr, $command:expr, [$($field:expr),*]) => {
        let result = $lexer.next();
        assert!(result.is_some());

        let mut result = result.unwrap();
        assert_eq!($number, result.number);
        assert_eq!($command, result.command);
        $(assert_eq!(Some($field), result.field());)*
        assert_eq!(None, result.field());
    };
}

#[test]
fn test_lex_basic() {
    let input = "image 4 4\ncamera_position 0 0 5\n";
    let mut lexer = Lexer::new(input);
    lexer_next!(lexer, 1, "image", ["4", "4"]);
    lexer_next!(lexer, 2, "camera_position", ["0", "0", "5"]);
    assert!(lexer.next().is_none());
}

#[test]
fn test_lex_blank_lines_and_comments() {
    let input = "\n   \n# a comment\n\tsphere  0 0 0\t1   1 0 0  \n#name foo";
    let mut lexer = Lexer::new(input);
    lexer_next!(lexer, 4, "sphere", ["0", "0", "0", "1", "1", "0", "0"]);
    assert!(lexer.next().is_none());
}

#[test]
fn test_lex_windows_newlines() {
    let input = "name a\r\nparent b\r\n";
    let mut lexer = Lexer::new(input);
    lexer_next!(lexer, 1, "name", ["a"]);
    lexer_next!(lexer, 2, "parent", ["b"]);
}
