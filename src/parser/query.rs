// Custom filter query parser
//
// Grammar (NOT binds tightest, then AND, then OR):
//   expr   := term (OR term)*
//   term   := factor (AND factor)*
//   factor := NOT factor | '(' expr ')' | integer

use super::ast::Query;
use super::lexer::{integer, keyword, ws};
use crate::error::QueryError;
use nom::{
    branch::alt,
    character::complete::char,
    combinator::map,
    multi::many0,
    sequence::{delimited, preceded},
    IResult,
};

fn factor(input: &str) -> IResult<&str, Query> {
    alt((
        map(preceded(ws(keyword("NOT")), factor), Query::not),
        delimited(ws(char('(')), expr, ws(char(')'))),
        map(ws(integer), Query::Rule),
    ))(input)
}

fn term(input: &str) -> IResult<&str, Query> {
    let (input, first) = factor(input)?;
    let (input, rest) = many0(preceded(ws(keyword("AND")), factor))(input)?;
    Ok((input, rest.into_iter().fold(first, Query::and)))
}

fn expr(input: &str) -> IResult<&str, Query> {
    let (input, first) = term(input)?;
    let (input, rest) = many0(preceded(ws(keyword("OR")), term))(input)?;
    Ok((input, rest.into_iter().fold(first, Query::or)))
}

/// Parse a complete query; trailing input is an error
pub fn parse_query(input: &str) -> Result<Query, QueryError> {
    let parse_error = |remaining: &str| QueryError::Parse {
        query: input.to_string(),
        remaining: remaining.to_string(),
    };

    match ws(expr)(input) {
        Ok(("", query)) => Ok(query),
        Ok((remaining, _)) => Err(parse_error(remaining)),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(parse_error(e.input)),
        Err(nom::Err::Incomplete(_)) => Err(parse_error("")),
    }
}
