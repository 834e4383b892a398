mod common;

mod advisory;
mod parsing;
