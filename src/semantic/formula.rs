//! Calculated metric formulas.
//!
//! A formula is SQL arithmetic over `[MetricName]` references:
//! `([TotalRevenue] - [TotalCost]) / [TotalRevenue]`. Syntax is checked by
//! replacing every reference with a placeholder identifier and handing the
//! result to sqlparser. References between metrics form a directed graph
//! that must stay acyclic.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use regex::Regex;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Token, Tokenizer, Whitespace};

use crate::model::{MetricKind, Model};

/// Pattern for `[Metric Name]` references.
static METRIC_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]]+)\]").unwrap());

/// Prefix used for reference substitution before parsing.
const PLACEHOLDER_PREFIX: &str = "__metric_";

/// A piece of a formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormulaPart {
    /// Operator text, numbers, parentheses: kept verbatim.
    Text(String),
    /// A `[Name]` reference (name trimmed).
    Reference(String),
}

/// A parsed formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    parts: Vec<FormulaPart>,
}

impl Formula {
    pub fn parse(expression: &str) -> Self {
        let mut parts = Vec::new();
        let mut last = 0;
        for caps in METRIC_REFERENCE.captures_iter(expression) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if whole.start() > last {
                parts.push(FormulaPart::Text(expression[last..whole.start()].to_string()));
            }
            parts.push(FormulaPart::Reference(name.as_str().trim().to_string()));
            last = whole.end();
        }
        if last < expression.len() {
            parts.push(FormulaPart::Text(expression[last..].to_string()));
        }
        Self { parts }
    }

    pub fn parts(&self) -> &[FormulaPart] {
        &self.parts
    }

    /// Distinct references in order of first appearance.
    pub fn references(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.parts
            .iter()
            .filter_map(|p| match p {
                FormulaPart::Reference(name) => Some(name.as_str()),
                FormulaPart::Text(_) => None,
            })
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Check the formula parses as one SQL expression.
    pub fn check_syntax(&self) -> Result<(), String> {
        let mut placeholders: HashMap<&str, usize> = HashMap::new();
        let mut text = String::new();
        for part in &self.parts {
            match part {
                FormulaPart::Text(t) => text.push_str(t),
                FormulaPart::Reference(name) => {
                    let next = placeholders.len();
                    let n = *placeholders.entry(name.as_str()).or_insert(next);
                    text.push_str(&format!("{}{}__", PLACEHOLDER_PREFIX, n));
                }
            }
        }
        if text.trim().is_empty() {
            return Err("expression is empty".into());
        }

        let dialect = GenericDialect {};
        let tokens = Tokenizer::new(&dialect, &text)
            .tokenize()
            .map_err(|e| e.to_string())?;
        // Formulas are spliced onto one line, where a comment would swallow
        // everything after it.
        if tokens.iter().any(|t| {
            matches!(
                t,
                Token::Whitespace(Whitespace::SingleLineComment { .. } | Whitespace::MultiLineComment(_))
            )
        }) {
            return Err("comments are not allowed in expressions".into());
        }

        let mut parser = Parser::new(&dialect).with_tokens(tokens);
        parser.parse_expr().map_err(|e| e.to_string())?;
        let trailing = parser.peek_token().token;
        if trailing != Token::EOF {
            return Err(format!("unexpected '{}' after expression", trailing));
        }
        Ok(())
    }
}

// =============================================================================
// Reference graph
// =============================================================================

/// Directed graph of calculated metric references (`A -> B` when A's
/// formula mentions `[B]`).
#[derive(Debug, Default)]
pub struct ReferenceGraph {
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
    unresolved: Vec<(String, String)>,
}

impl ReferenceGraph {
    pub fn build(model: &Model) -> Self {
        let mut g = Self::default();
        for (name, metric) in model.metrics() {
            let from = g.node(name);
            let MetricKind::Calculated { expression } = &metric.kind else {
                continue;
            };
            for reference in Formula::parse(expression).references() {
                if model.metric(reference).is_none() {
                    g.unresolved.push((name.clone(), reference.to_string()));
                    continue;
                }
                let to = g.node(reference);
                g.graph.update_edge(from, to, ());
            }
        }
        g
    }

    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(idx) = self.nodes.get(name) {
            return *idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.nodes.insert(name.to_string(), idx);
        idx
    }

    /// `(metric, reference)` pairs naming metrics that do not exist.
    pub fn unresolved(&self) -> &[(String, String)] {
        &self.unresolved
    }

    /// First cycle reachable from `root`, as the path that closes it
    /// (`[A, B, A]`). Depth-first with an explicit stack.
    pub fn cycle_from(&self, root: &str) -> Option<Vec<String>> {
        let root = *self.nodes.get(root)?;
        let mut path = vec![root];
        let mut finished: HashSet<NodeIndex> = HashSet::new();
        let mut pending = vec![self.successors(root)];

        while let Some(frame) = pending.last_mut() {
            match frame.pop() {
                Some(next) => {
                    if let Some(pos) = path.iter().position(|n| *n == next) {
                        let mut cycle: Vec<String> =
                            path[pos..].iter().map(|n| self.graph[*n].clone()).collect();
                        cycle.push(self.graph[next].clone());
                        return Some(cycle);
                    }
                    if finished.contains(&next) {
                        continue;
                    }
                    path.push(next);
                    pending.push(self.successors(next));
                }
                None => {
                    pending.pop();
                    if let Some(done) = path.pop() {
                        finished.insert(done);
                    }
                }
            }
        }
        None
    }

    /// `neighbors` yields the newest edge first, so popping from the end
    /// visits references in the order they were written.
    fn successors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        self.graph.neighbors(node).collect()
    }

    /// Every set of mutually referencing metrics, including self-references.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                if scc.len() == 1 {
                    self.graph.contains_edge(scc[0], scc[0])
                } else {
                    true
                }
            })
            .map(|scc| {
                let mut names: Vec<String> =
                    scc.into_iter().map(|idx| self.graph[idx].clone()).collect();
                names.sort();
                names
            })
            .collect()
    }
}
