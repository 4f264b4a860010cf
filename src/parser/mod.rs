use thiserror::Error;

mod lexer;
mod parser;

pub use parser::{parse, parse_file, Description};

#[derive(Error, Debug)]
pub enum Error {
    #[error("line {line}: `{command}` is missing its {field}")]
    MissingField {
        line: usize,
        command: String,
        field: &'static str,
    },

    #[error("line {line}: `{text}` is not a valid number")]
    InvalidNumber { line: usize, text: String },

    #[error("line {line}: `{command}` needs a shape to apply to")]
    NoShape { line: usize, command: String },

    #[error("line {line}: no shape is named `{name}`")]
    UnknownName { line: usize, name: String },

    #[error("line {line}: shape `{name}` can't be its own parent")]
    SelfParent { line: usize, name: String },

    #[error("line {line}: transform is not invertible")]
    SingularTransform { line: usize },

    #[error("line {line}: image must be at least 1x1")]
    InvalidImage { line: usize },

    #[error("the scene has no `image` line")]
    MissingImage,

    #[error("the camera position, target and up vector don't form a view")]
    DegenerateCamera,
}
