// Lexer helpers shared by the query parser

use nom::{
    bytes::complete::tag_no_case,
    character::complete::{digit1, multispace0, satisfy},
    combinator::{map_res, not, recognize},
    sequence::{delimited, terminated},
    IResult,
};

/// Wrap a parser so it skips surrounding whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Unsigned integer literal
pub fn integer(input: &str) -> IResult<&str, usize> {
    map_res(digit1, str::parse::<usize>)(input)
}

/// Case-insensitive keyword that is not the prefix of a longer word
pub fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    recognize(terminated(
        tag_no_case(kw),
        not(satisfy(|c: char| c.is_ascii_alphabetic() || c == '_')),
    ))
}
