//! Duplicate statement blocks within one module.
//!
//! Every function body contributes sliding windows of
//! `methodSmells.duplicateBlockMinStatements` normalized statements. Windows
//! are bucketed by their xxh64 hash; a bucket with two or more
//! non-overlapping occurrences is one duplicate cluster. Clusters are grown
//! while every copy keeps matching, and statements already reported are not
//! reported again by the shifted windows that follow them.

use std::collections::{HashMap, HashSet};

use xxhash_rust::xxh64::xxh64;

use crate::analysis::model::{Declaration, Span, Statement};
use crate::error::DetectorError;

use super::detector::{DetectionContext, Detector};
use super::types::{ArchitecturalDefect, DefectType, Severity};

/// Start of a window: (function index, statement index).
type Occurrence = (usize, usize);

fn window_text(statements: &[Statement]) -> String {
    statements
        .iter()
        .map(|s| s.normalized.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct DuplicateBlockDetector;

impl Detector for DuplicateBlockDetector {
    fn name(&self) -> &'static str {
        "duplicate-block"
    }

    fn detectable_types(&self) -> &'static [DefectType] {
        &[DefectType::DuplicateBlock]
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Result<Vec<ArchitecturalDefect>, DetectorError> {
        let k = ctx.thresholds.method_smells.duplicate_block_min_statements;
        if k == 0 {
            return Err(DetectorError::Malformed(
                "duplicate block size must be positive".to_string(),
            ));
        }

        let bodies: Vec<(&Declaration, &[Statement])> = ctx
            .tree
            .functions()
            .filter_map(|(_, f)| f.body.as_ref().map(|b| (f, b.statements.as_slice())))
            .filter(|(_, stmts)| stmts.len() >= k)
            .collect();

        // hash -> cluster index, clusters in first-seen order
        let mut index: HashMap<u64, usize> = HashMap::new();
        let mut clusters: Vec<Vec<Occurrence>> = Vec::new();
        for (fi, (_, stmts)) in bodies.iter().enumerate() {
            for start in 0..=stmts.len() - k {
                let hash = xxh64(window_text(&stmts[start..start + k]).as_bytes(), 0);
                let slot = *index.entry(hash).or_insert_with(|| {
                    clusters.push(Vec::new());
                    clusters.len() - 1
                });
                clusters[slot].push((fi, start));
            }
        }

        let mut covered: HashSet<Occurrence> = HashSet::new();
        let mut defects = Vec::new();

        for cluster in clusters.into_iter().filter(|c| c.len() >= 2) {
            let Some(&(f0, s0)) = cluster.iter().find(|o| !covered.contains(*o)) else {
                continue;
            };
            let reference = window_text(&bodies[f0].1[s0..s0 + k]);

            // keep copies that really match and do not overlap an earlier copy
            let mut copies: Vec<Occurrence> = Vec::new();
            for &(fi, start) in &cluster {
                if covered.contains(&(fi, start)) {
                    continue;
                }
                if window_text(&bodies[fi].1[start..start + k]) != reference {
                    continue;
                }
                let overlaps = copies
                    .last()
                    .is_some_and(|&(pf, ps)| pf == fi && start < ps + k);
                if !overlaps {
                    copies.push((fi, start));
                }
            }
            if copies.len() < 2 {
                continue;
            }

            let len = extend_match(&bodies, &copies, k);
            for &(fi, start) in &copies {
                for i in start..start + len {
                    covered.insert((fi, i));
                }
            }

            let places: Vec<String> = copies
                .iter()
                .map(|&(fi, start)| {
                    let (func, stmts) = bodies[fi];
                    format!(
                        "{} (lines {})",
                        func.name,
                        Span::new(stmts[start].line, stmts[start + len - 1].line)
                    )
                })
                .collect();

            let (first_fn, first_stmts) = bodies[copies[0].0];
            let first_start = copies[0].1;
            let span = Span::new(
                first_stmts[first_start].line,
                first_stmts[first_start + len - 1].line,
            );
            let severity = if copies.len() >= 3 {
                Severity::High
            } else {
                Severity::Medium
            };
            defects.push(ArchitecturalDefect::new(
                DefectType::DuplicateBlock,
                severity,
                format!(
                    "{} statements in '{}' are repeated {} times: {}",
                    len,
                    first_fn.name,
                    copies.len(),
                    places.join(", ")
                ),
                ctx.location(span),
            ));
        }

        Ok(defects)
    }
}

/// Grow a matched block while every copy keeps matching the first one and
/// copies inside the same function stay disjoint.
fn extend_match(bodies: &[(&Declaration, &[Statement])], copies: &[Occurrence], k: usize) -> usize {
    let mut len = k;
    loop {
        let (f0, s0) = copies[0];
        let Some(next) = bodies[f0].1.get(s0 + len) else {
            return len;
        };
        let all_match = copies.iter().all(|&(fi, start)| {
            bodies[fi]
                .1
                .get(start + len)
                .is_some_and(|s| s.normalized == next.normalized)
        });
        let disjoint = copies
            .windows(2)
            .all(|w| w[0].0 != w[1].0 || w[0].1 + len + 1 <= w[1].1);
        if !all_match || !disjoint {
            return len;
        }
        len += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::model::{DeclarationKind, DeclarationTree, FunctionBody};
    use crate::thresholds::Thresholds;

    fn function(tree: &mut DeclarationTree, name: &str, first_line: usize, lines: &[&str]) {
        let statements = lines
            .iter()
            .enumerate()
            .map(|(i, text)| Statement {
                line: first_line + i,
                normalized: text.to_string(),
            })
            .collect::<Vec<_>>();
        let body = FunctionBody {
            statement_count: statements.len(),
            statements,
            ..Default::default()
        };
        tree.add(
            Declaration::new(name, DeclarationKind::Function)
                .with_span(first_line - 1, first_line + lines.len())
                .with_body(body),
            None,
        );
    }

    const BLOCK: [&str; 6] = [
        "let a = $NUM",
        "let b = a * $NUM",
        "print ( b )",
        "total += b",
        "count += $NUM",
        "log ( $STR )",
    ];

    fn run(tree: &DeclarationTree) -> Vec<ArchitecturalDefect> {
        let thresholds = Thresholds::default();
        let ctx = DetectionContext::new(tree, "Dup.swift", &thresholds);
        DuplicateBlockDetector.detect(&ctx).unwrap()
    }

    #[test]
    fn test_two_copies_form_one_cluster() {
        let mut tree = DeclarationTree::new();
        function(&mut tree, "first", 2, &BLOCK);
        function(&mut tree, "second", 20, &BLOCK);

        let defects = run(&tree);
        assert_eq!(defects.len(), 1);
        assert_eq!(defects[0].severity, Severity::Medium);
        assert!(defects[0].message.starts_with("6 statements"));
        assert!(defects[0].message.contains("second (lines 20-25)"));
        assert_eq!(defects[0].location.start_line, 2);
        assert_eq!(defects[0].location.end_line, 7);
    }

    #[test]
    fn test_three_copies_are_high() {
        let mut tree = DeclarationTree::new();
        function(&mut tree, "a", 2, &BLOCK[..5]);
        function(&mut tree, "b", 20, &BLOCK[..5]);
        function(&mut tree, "c", 40, &BLOCK[..5]);

        let defects = run(&tree);
        assert_eq!(defects.len(), 1);
        assert_eq!(defects[0].severity, Severity::High);
        assert!(defects[0].message.contains("repeated 3 times"));
    }

    #[test]
    fn test_short_or_distinct_blocks_are_ignored() {
        let mut tree = DeclarationTree::new();
        function(&mut tree, "a", 2, &BLOCK[..4]);
        function(&mut tree, "b", 20, &BLOCK[..4]);
        function(&mut tree, "c", 40, &["x()", "y()", "z()", "w()", "v()"]);
        assert!(run(&tree).is_empty());
    }
}
