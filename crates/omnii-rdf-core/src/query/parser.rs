//! Query text to [`Query`].

use super::{GroupPattern, Projection, Query, QueryTriple, TermPattern};
use crate::syntax::{Cursor, Prefixes, Token, tokenize};
use crate::types::{Iri, Literal, RdfError, Term};
use crate::vocab::{MAX_NESTING_DEPTH, RDF_TYPE, XSD_BOOLEAN, XSD_DECIMAL, XSD_DOUBLE, XSD_INTEGER};
use std::collections::BTreeMap;

pub(super) fn parse(text: &str, extra: &BTreeMap<String, String>) -> Result<Query, RdfError> {
    let tokens = tokenize(text)?;
    let mut prefixes = Prefixes::standard();
    for (prefix, namespace) in extra {
        prefixes.bind(prefix.clone(), namespace.clone());
    }
    let mut parser = QueryParser {
        cursor: Cursor::new(&tokens),
        prefixes,
        depth: 0,
    };
    parser.query()
}

struct QueryParser<'t> {
    cursor: Cursor<'t>,
    prefixes: Prefixes,
    /// Groups currently open.
    depth: usize,
}

impl QueryParser<'_> {
    fn query(&mut self) -> Result<Query, RdfError> {
        self.prologue()?;

        if !self.cursor.eat_keyword("SELECT") {
            return Err(self.cursor.error("expected SELECT"));
        }
        let distinct = self.cursor.eat_keyword("DISTINCT") || self.cursor.eat_keyword("REDUCED");
        let projection = self.projection()?;

        self.cursor.eat_keyword("WHERE");
        let pattern = self.group()?;

        let limit = if self.cursor.eat_keyword("LIMIT") {
            Some(self.limit_value()?)
        } else {
            None
        };

        if !self.cursor.at_end() {
            return Err(self.cursor.error("unexpected trailing input"));
        }

        if let Projection::Variables(vars) = &projection {
            let bound = pattern.bound_variables();
            if let Some(unbound) = vars.iter().find(|v| !bound.contains(v)) {
                tracing::debug!(variable = %unbound, "Projected variable never bound");
            }
        }

        Ok(Query {
            projection,
            distinct,
            pattern,
            limit,
        })
    }

    fn prologue(&mut self) -> Result<(), RdfError> {
        loop {
            if self.cursor.eat_keyword("PREFIX") {
                let prefix = match self.cursor.next() {
                    Some(Token::PrefixedName { prefix, local }) if local.is_empty() => prefix.clone(),
                    _ => return Err(self.cursor.error("expected prefix name like 'ex:'")),
                };
                let namespace = self.iri_ref()?;
                self.prefixes.bind(prefix, namespace);
            } else if self.cursor.eat_keyword("BASE") {
                let base = self.iri_ref()?;
                self.prefixes.set_base(base);
            } else {
                return Ok(());
            }
        }
    }

    fn projection(&mut self) -> Result<Projection, RdfError> {
        if self.cursor.eat(&Token::Star) {
            return Ok(Projection::All);
        }
        let mut vars = Vec::new();
        while let Some(Token::Variable(name)) = self.cursor.peek() {
            vars.push(name.clone());
            self.cursor.next();
        }
        if vars.is_empty() {
            return Err(self.cursor.error("expected '*' or at least one variable"));
        }
        Ok(Projection::Variables(vars))
    }

    fn limit_value(&mut self) -> Result<usize, RdfError> {
        match self.cursor.peek() {
            Some(Token::Integer(n)) => {
                let value = n
                    .parse::<usize>()
                    .map_err(|_| self.cursor.error("LIMIT must be a non-negative integer"))?;
                self.cursor.next();
                Ok(value)
            }
            _ => Err(self.cursor.error("expected integer after LIMIT")),
        }
    }

    fn group(&mut self) -> Result<GroupPattern, RdfError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.cursor.error(format!(
                "group patterns nested more than {MAX_NESTING_DEPTH} deep"
            )));
        }
        self.depth = self.depth.saturating_add(1);
        let group = self.group_body();
        self.depth = self.depth.saturating_sub(1);
        group
    }

    fn group_body(&mut self) -> Result<GroupPattern, RdfError> {
        self.cursor.expect(&Token::LBrace, "'{'")?;
        let mut group = GroupPattern::default();

        loop {
            if self.cursor.eat(&Token::RBrace) {
                return Ok(group);
            }
            if self.cursor.eat(&Token::Dot) {
                continue;
            }
            if self.cursor.eat_keyword("OPTIONAL") {
                group.optionals.push(self.group()?);
            } else if self.cursor.eat_keyword("FILTER") {
                if self.cursor.eat_keyword("NOT") {
                    if !self.cursor.eat_keyword("EXISTS") {
                        return Err(self.cursor.error("expected EXISTS after FILTER NOT"));
                    }
                    group.not_exists.push(self.group()?);
                } else if self.cursor.eat_keyword("EXISTS") {
                    group.exists.push(self.group()?);
                } else {
                    return Err(self
                        .cursor
                        .error("only FILTER EXISTS and FILTER NOT EXISTS are supported"));
                }
            } else if self.cursor.at_end() {
                return Err(self.cursor.error("expected '}'"));
            } else {
                self.triples_same_subject(&mut group.triples)?;
            }
        }
    }

    fn triples_same_subject(&mut self, out: &mut Vec<QueryTriple>) -> Result<(), RdfError> {
        let subject = self.term_or_variable("subject")?;
        loop {
            let predicate = self.verb()?;
            loop {
                let object = self.term_or_variable("object")?;
                out.push(QueryTriple {
                    subject: subject.clone(),
                    predicate: predicate.clone(),
                    object,
                });
                if !self.cursor.eat(&Token::Comma) {
                    break;
                }
            }
            if !self.cursor.eat(&Token::Semicolon) {
                return Ok(());
            }
            while self.cursor.eat(&Token::Semicolon) {}
            if matches!(self.cursor.peek(), None | Some(Token::Dot | Token::RBrace)) {
                return Ok(());
            }
        }
    }

    fn verb(&mut self) -> Result<TermPattern, RdfError> {
        if matches!(self.cursor.peek(), Some(Token::Word(w)) if w == "a") {
            self.cursor.next();
            return Ok(TermPattern::Term(Term::iri(RDF_TYPE)));
        }
        match self.term_or_variable("predicate")? {
            TermPattern::Term(Term::Iri(iri)) => Ok(TermPattern::Term(Term::Iri(iri))),
            TermPattern::Variable(name) => Ok(TermPattern::Variable(name)),
            TermPattern::Term(_) => Err(self.cursor.error("predicate must be an IRI or variable")),
        }
    }

    fn iri_ref(&mut self) -> Result<String, RdfError> {
        match self.cursor.peek() {
            Some(Token::Iri(raw)) => {
                let resolved = self
                    .prefixes
                    .resolve(raw)
                    .ok_or_else(|| self.cursor.error(format!("relative IRI <{raw}> without a base")))?;
                self.cursor.next();
                Ok(resolved)
            }
            _ => Err(self.cursor.error("expected IRI")),
        }
    }

    fn term_or_variable(&mut self, what: &str) -> Result<TermPattern, RdfError> {
        let Some(token) = self.cursor.peek() else {
            return Err(self.cursor.error(format!("expected {what}")));
        };
        let pattern = match token {
            Token::Variable(name) => TermPattern::Variable(name.clone()),
            Token::Iri(_) => return Ok(TermPattern::Term(Term::iri(self.iri_ref()?))),
            Token::PrefixedName { prefix, local } => {
                let expanded = self
                    .prefixes
                    .expand(prefix, local)
                    .ok_or_else(|| self.cursor.error(format!("undeclared prefix '{prefix}:'")))?;
                TermPattern::Term(Term::iri(expanded))
            }
            Token::Str(value) => {
                let value = value.clone();
                self.cursor.next();
                return self.literal_suffix(value).map(|l| TermPattern::Term(Term::Literal(l)));
            }
            Token::Integer(n) => typed(n, XSD_INTEGER),
            Token::Decimal(n) => typed(n, XSD_DECIMAL),
            Token::Double(n) => typed(n, XSD_DOUBLE),
            Token::Word(w) if w == "true" || w == "false" => typed(w, XSD_BOOLEAN),
            Token::BlankLabel(_) | Token::LBracket => {
                return Err(self
                    .cursor
                    .error("blank nodes in query patterns are not supported"));
            }
            _ => return Err(self.cursor.error(format!("expected {what}"))),
        };
        self.cursor.next();
        Ok(pattern)
    }

    fn literal_suffix(&mut self, value: String) -> Result<Literal, RdfError> {
        match self.cursor.peek() {
            Some(Token::At(tag)) => {
                let literal = Literal::lang(value, tag.clone());
                self.cursor.next();
                Ok(literal)
            }
            Some(Token::DoubleCaret) => {
                self.cursor.next();
                match self.term_or_variable("datatype IRI")? {
                    TermPattern::Term(Term::Iri(dt)) => Ok(Literal::typed(value, dt)),
                    _ => Err(self.cursor.error("expected datatype IRI after '^^'")),
                }
            }
            _ => Ok(Literal::simple(value)),
        }
    }
}

fn typed(lexical: &str, datatype: &str) -> TermPattern {
    TermPattern::Term(Term::Literal(Literal::typed(lexical, Iri::new(datatype))))
}
