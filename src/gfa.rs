// src/gfa.rs

//! GFA v1 text emitter and importer.
//!
//! The importer builds a graph through the public mutators: segments first,
//! then the buffered links and paths, so line order in the file does not
//! matter. Segment names must be numeric ids, as in the binary encoding.

use std::io::{self, BufRead, Error, ErrorKind, Write};

use crate::graph::VariationGraph;
use crate::progress;

fn gfa_error(msg: String) -> Error {
    Error::new(ErrorKind::InvalidData, msg)
}

fn parse_id(field: &str) -> io::Result<u64> {
    field
        .parse::<u64>()
        .map_err(|_| gfa_error(format!("segment name {:?} is not a numeric id", field)))
}

fn parse_orientation(field: &str) -> io::Result<bool> {
    match field {
        "+" => Ok(false),
        "-" => Ok(true),
        other => Err(gfa_error(format!("invalid orientation {:?}", other))),
    }
}

/// Parse a step list like `1+,2-` into (id, is_reverse) pairs. `*` denotes
/// an empty path.
fn parse_steps(field: &str) -> io::Result<Vec<(u64, bool)>> {
    if field == "*" {
        return Ok(Vec::new());
    }
    let mut steps = Vec::new();
    for step in field.split(',') {
        if step.len() < 2 {
            return Err(gfa_error(format!("invalid path step {:?}", step)));
        }
        let (id, orient) = step.split_at(step.len() - 1);
        steps.push((parse_id(id)?, parse_orientation(orient)?));
    }
    Ok(steps)
}

impl VariationGraph {
    /// Write the graph as GFA v1: a header, one `S` line per node, `L`
    /// lines with `0M` overlaps, and one `P` line per nonempty path.
    pub fn to_gfa<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "H\tVN:Z:1.0")?;
        let mut status: io::Result<()> = Ok(());
        self.for_each_handle(|h| {
            if let Err(e) = writeln!(out, "S\t{}\t{}", self.get_id(h), self.get_sequence(h)) {
                status = Err(e);
                return false;
            }
            let mut keep_going = true;
            self.follow_edges(h, false, |next| {
                if h.as_integer() < next.as_integer() {
                    if let Err(e) = writeln!(
                        out,
                        "L\t{}\t{}\t{}\t{}\t0M",
                        self.get_id(h),
                        if h.is_reverse() { "-" } else { "+" },
                        self.get_id(next),
                        if next.is_reverse() { "-" } else { "+" },
                    ) {
                        status = Err(e);
                        keep_going = false;
                    }
                }
                keep_going
            });
            if !keep_going {
                return false;
            }
            self.follow_edges(h.flip(), false, |next| {
                if h.as_integer() < next.as_integer() {
                    if let Err(e) = writeln!(
                        out,
                        "L\t{}\t{}\t{}\t{}\t0M",
                        self.get_id(h),
                        if h.is_reverse() { "+" } else { "-" },
                        self.get_id(next),
                        if next.is_reverse() { "-" } else { "+" },
                    ) {
                        status = Err(e);
                        keep_going = false;
                    }
                }
                keep_going
            });
            keep_going
        });
        status?;
        let mut paths = Vec::new();
        self.for_each_path_handle(|p| paths.push(p));
        for path in paths {
            let mut steps = String::new();
            let mut overlaps = String::new();
            self.for_each_occurrence_in_path(path, |occ| {
                let h = self.get_occurrence(occ);
                if !steps.is_empty() {
                    steps.push(',');
                    overlaps.push(',');
                }
                steps.push_str(&self.get_id(h).to_string());
                steps.push(if h.is_reverse() { '-' } else { '+' });
                overlaps.push_str(&self.get_length(h).to_string());
                overlaps.push('M');
            });
            writeln!(out, "P\t{}\t{}\t{}", self.get_path_name(path), steps, overlaps)?;
        }
        Ok(())
    }

    /// Build a graph from GFA v1 text.
    pub fn from_gfa<R: BufRead>(reader: R, show_progress: bool) -> io::Result<VariationGraph> {
        let mut graph = VariationGraph::new();
        let mut links: Vec<(u64, bool, u64, bool)> = Vec::new();
        let mut paths: Vec<(String, Vec<(u64, bool)>)> = Vec::new();
        let bar = if show_progress {
            Some(progress::line_progress("gfa"))
        } else {
            None
        };
        for line in reader.lines() {
            let line = line?;
            if let Some(bar) = &bar {
                bar.inc(1);
            }
            let mut fields = line.split('\t');
            match fields.next() {
                Some("S") => {
                    let name = fields
                        .next()
                        .ok_or_else(|| gfa_error("S line missing segment name".into()))?;
                    let seq = fields
                        .next()
                        .ok_or_else(|| gfa_error("S line missing sequence".into()))?;
                    let id = parse_id(name)?;
                    if seq.is_empty() || seq == "*" {
                        return Err(gfa_error(format!("segment {} has no sequence", id)));
                    }
                    if graph.has_node(id) {
                        return Err(gfa_error(format!("duplicate segment {}", id)));
                    }
                    graph.create_handle_with_id(seq, id);
                }
                Some("L") => {
                    let from = fields
                        .next()
                        .ok_or_else(|| gfa_error("L line missing source".into()))?;
                    let from_orient = fields
                        .next()
                        .ok_or_else(|| gfa_error("L line missing source orientation".into()))?;
                    let to = fields
                        .next()
                        .ok_or_else(|| gfa_error("L line missing target".into()))?;
                    let to_orient = fields
                        .next()
                        .ok_or_else(|| gfa_error("L line missing target orientation".into()))?;
                    links.push((
                        parse_id(from)?,
                        parse_orientation(from_orient)?,
                        parse_id(to)?,
                        parse_orientation(to_orient)?,
                    ));
                }
                Some("P") => {
                    let name = fields
                        .next()
                        .ok_or_else(|| gfa_error("P line missing path name".into()))?;
                    let steps = fields
                        .next()
                        .ok_or_else(|| gfa_error("P line missing step list".into()))?;
                    paths.push((name.to_string(), parse_steps(steps)?));
                }
                _ => {}
            }
        }
        for (from, from_rev, to, to_rev) in links {
            if !graph.has_node(from) || !graph.has_node(to) {
                return Err(gfa_error(format!("link references unknown segment {}", if graph.has_node(from) { to } else { from })));
            }
            let left = graph.get_handle(from, from_rev);
            let right = graph.get_handle(to, to_rev);
            graph.create_edge(left, right);
        }
        for (name, steps) in paths {
            if graph.has_path(&name) {
                return Err(gfa_error(format!("duplicate path name {:?}", name)));
            }
            let path = graph.create_path_handle(&name);
            for (id, rev) in steps {
                if !graph.has_node(id) {
                    return Err(gfa_error(format!("path {:?} visits unknown segment {}", name, id)));
                }
                let h = graph.get_handle(id, rev);
                graph.append_occurrence(path, h);
            }
        }
        if let Some(bar) = &bar {
            bar.finish_with_message(format!(
                "{} nodes, {} edges, {} paths",
                graph.node_size(),
                graph.get_edge_count(),
                graph.get_path_count()
            ));
        }
        Ok(graph)
    }
}
