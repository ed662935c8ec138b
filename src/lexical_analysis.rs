//! Readtable-driven lexical analysis. A readtable is an ordered table of
//! regular-expression patterns, each paired with a reader action; the
//! tokenizer scans source text and emits tokens tagged with the index of the
//! readtable entry that matched them. Text that matches no entry is emitted
//! as untagged tokens rather than rejected, so a single table recognizes
//! structural delimiters and literals at once without a hand-written state
//! machine per token class.

use std::collections::VecDeque;

use lazy_static::lazy_static;
use regex::Regex;

use crate::sexpr_parsing::{SurfaceExpr, SyntaxError};

/// Callback signature for readtable entries that construct a surface value
/// directly from a matched token. The callback may pull further tokens from
/// the stream.
pub type ReaderCallback =
    fn(&Token, &mut TokenStream, &Readtable) -> Result<SurfaceExpr, SyntaxError>;

/// What the parser does with a token matched by a readtable entry.
#[derive(Clone, Copy)]
pub enum ReaderAction {
    /// The token opens a nested list. The matching closer is the entry
    /// immediately after this one in the readtable.
    Open,
    /// The token closes the list opened by the entry immediately before this
    /// one in the readtable.
    Close,
    /// The token is handed to a callback that produces a surface value.
    Callback(ReaderCallback),
}

/// An ordered table of (pattern, reader action) rules. Earlier rules take
/// precedence when patterns overlap.
#[derive(Clone)]
pub struct Readtable {
    rules: Vec<(Regex, ReaderAction)>,
}

lazy_static! {
    // The delimiters every reader starts from: parentheses and square
    // brackets as interchangeable list delimiters.
    static ref STANDARD_READTABLE: Readtable = {
        let mut readtable = Readtable::new();

        let delimiter_rules = [
            (r"\(", ReaderAction::Open),
            (r"\)", ReaderAction::Close),
            (r"\[", ReaderAction::Open),
            (r"\]", ReaderAction::Close),
        ];

        for (pattern, reader_action) in delimiter_rules {
            readtable
                .add_rule(pattern, reader_action)
                .expect("Unable to compile standard delimiter rule regex.");
        }

        readtable
    };
}

impl Readtable {
    /// Creates an empty readtable.
    pub fn new() -> Readtable {
        return Readtable { rules: Vec::new() };
    }

    /// The standard readtable: parentheses and square brackets as
    /// interchangeable list delimiters, and nothing else.
    pub fn standard() -> Readtable {
        return STANDARD_READTABLE.clone();
    }

    /// Appends a rule to the table. Matches are only recognized exactly at
    /// the scan position, so patterns need no anchoring.
    pub fn add_rule(
        &mut self,
        pattern: &str,
        reader_action: ReaderAction,
    ) -> Result<(), regex::Error> {
        let compiled_pattern = Regex::new(pattern)?;
        self.rules.push((compiled_pattern, reader_action));
        return Ok(());
    }

    /// Gets the reader action of the rule at `rule_idx`.
    pub fn action_at(&self, rule_idx: usize) -> Option<ReaderAction> {
        return self.rules.get(rule_idx).map(|(_, reader_action)| *reader_action);
    }

    /// The number of rules in the table.
    pub fn num_rules(&self) -> usize {
        return self.rules.len();
    }

    // Finds the first rule whose pattern matches at the start of `input_str`,
    // returning the rule index and the match length. Empty matches are
    // ignored so a rule can never stall the scan.
    fn match_at_start(&self, input_str: &str) -> Option<(usize, usize)> {
        for (rule_idx, (pattern, _)) in self.rules.iter().enumerate() {
            let matched_span = pattern
                .find(input_str)
                .filter(|match_obj| match_obj.start() == 0 && !match_obj.is_empty());

            if let Some(match_obj) = matched_span {
                return Some((rule_idx, match_obj.len()));
            }
        }

        return None;
    }
}

impl Default for Readtable {
    fn default() -> Readtable {
        return Readtable::standard();
    }
}

/// Represents a single token: the matched text, and the index of the
/// readtable rule that recognized it (`None` for plain untagged lexemes).
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Token {
    pub token_text: String,
    pub rule_idx: Option<usize>,
}

/// Lazily tokenizes source text against a readtable. Non-whitespace
/// characters accumulate into a buffer; whitespace or end of input flushes
/// the buffer, splitting it into tagged matches and untagged remainders. The
/// stream is restartable from the start by constructing a new one over the
/// same source text.
pub struct TokenStream<'a> {
    readtable: &'a Readtable,
    remaining_chars: std::str::Chars<'a>,
    pending_buffer: String,
    ready_tokens: VecDeque<Token>,
}

impl<'a> TokenStream<'a> {
    pub fn new(source_text: &'a str, readtable: &'a Readtable) -> TokenStream<'a> {
        return TokenStream {
            readtable,
            remaining_chars: source_text.chars(),
            pending_buffer: String::new(),
            ready_tokens: VecDeque::new(),
        };
    }

    // Splits the pending buffer into tokens. Each readtable match emits the
    // unmatched prefix (if any) as an untagged token followed by the matched
    // span as a tagged token; scanning restarts on the remainder, and
    // whatever never matches is emitted untagged at the end.
    fn flush_pending_buffer(&mut self) {
        let mut buffer = std::mem::take(&mut self.pending_buffer);
        let mut scan_idx = 0;

        while scan_idx <= buffer.len() {
            match self.readtable.match_at_start(&buffer[scan_idx..]) {
                Some((rule_idx, match_len)) => {
                    if scan_idx > 0 {
                        self.ready_tokens.push_back(Token {
                            token_text: String::from(&buffer[..scan_idx]),
                            rule_idx: None,
                        });
                    }

                    self.ready_tokens.push_back(Token {
                        token_text: String::from(&buffer[scan_idx..scan_idx + match_len]),
                        rule_idx: Some(rule_idx),
                    });

                    buffer = String::from(&buffer[scan_idx + match_len..]);
                    scan_idx = 0;
                }

                None => {
                    // Advance one character and retry the table there.
                    match buffer[scan_idx..].chars().next() {
                        Some(next_char) => {
                            scan_idx += next_char.len_utf8();
                        }
                        None => {
                            break;
                        }
                    };
                }
            };
        }

        if !buffer.is_empty() {
            self.ready_tokens.push_back(Token {
                token_text: buffer,
                rule_idx: None,
            });
        }
    }
}

impl<'a> Iterator for TokenStream<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        while self.ready_tokens.is_empty() {
            match self.remaining_chars.next() {
                Some(next_char) => {
                    if next_char.is_whitespace() {
                        self.flush_pending_buffer();
                    } else {
                        self.pending_buffer.push(next_char);
                    }
                }

                None => {
                    if self.pending_buffer.is_empty() {
                        return None;
                    }

                    self.flush_pending_buffer();
                }
            };
        }

        return self.ready_tokens.pop_front();
    }
}

/// Tokenizes the whole of `source_text` eagerly. Convenience wrapper over
/// `TokenStream` for callers that want the full token vector.
pub fn run_lexical_analysis(source_text: &str, readtable: &Readtable) -> Vec<Token> {
    return TokenStream::new(source_text, readtable).collect();
}
