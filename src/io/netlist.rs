//! IO for the ISCAS-derived "self" format netlist files
//!
//! Record columns: `role outline kind fanout_count fanin_count [fanin_ids...]`.
//! `role` is 0=GATE, 1=PI, 2=FB, 3=PO; `kind` is 0=IPT, 1=BRCH, 2=XOR, 3=OR,
//! 4=NOR, 5=NOT, 6=NAND, 7=AND. PI records omit fanin ids (`1 id 0 fout 0`);
//! FB records give the single fanin id directly after the kind
//! (`2 id 1 in_id`); GATE and PO records share the generic shape.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};

use crate::circuit::{Circuit, Node, NodeKind};
use crate::error::{EngineError, Result};

fn kind_from_code(id: u32, code: u32) -> Result<NodeKind> {
    match code {
        1 => Ok(NodeKind::Branch),
        2 => Ok(NodeKind::Xor),
        3 => Ok(NodeKind::Or),
        4 => Ok(NodeKind::Nor),
        5 => Ok(NodeKind::Not),
        6 => Ok(NodeKind::Nand),
        7 => Ok(NodeKind::And),
        other => Err(EngineError::Format(format!(
            "node {id}: unknown gate kind code {other}"
        ))),
    }
}

fn code_from_kind(kind: NodeKind) -> u32 {
    match kind {
        NodeKind::Pi => 0,
        NodeKind::Branch => 1,
        NodeKind::Xor => 2,
        NodeKind::Or => 3,
        NodeKind::Nor => 4,
        NodeKind::Not => 5,
        NodeKind::Nand => 6,
        NodeKind::And => 7,
    }
}

struct RawRecord {
    id: u32,
    role: u32,
    kind: u32,
    fanin_ids: Vec<u32>,
}

fn parse_ints(line: &str) -> Result<Vec<i64>> {
    line.split_whitespace()
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| EngineError::Format(format!("not an integer: {s}")))
        })
        .collect()
}

fn parse_record(fields: &[i64]) -> Result<RawRecord> {
    if fields.len() < 3 {
        return Err(EngineError::Format("malformed netlist record".to_string()));
    }
    let role = fields[0] as u32;
    let id = fields[1] as u32;
    let kind = fields[2] as u32;
    let fanin_ids = match role {
        1 => {
            if fields.len() != 5 || fields[4] != 0 {
                return Err(EngineError::Format(format!(
                    "node {id}: malformed PI record"
                )));
            }
            Vec::new()
        }
        2 => {
            if fields.len() != 4 {
                return Err(EngineError::Format(format!(
                    "node {id}: malformed branch record"
                )));
            }
            vec![fields[3] as u32]
        }
        0 | 3 => {
            if fields.len() < 5 {
                return Err(EngineError::Format(format!(
                    "node {id}: malformed gate/PO record"
                )));
            }
            let fin = fields[4] as usize;
            let ids: Vec<u32> = fields[5..].iter().map(|&x| x as u32).collect();
            if ids.len() != fin {
                return Err(EngineError::Format(format!(
                    "node {id}: declares {fin} fanins but lists {}",
                    ids.len()
                )));
            }
            ids
        }
        other => return Err(EngineError::Format(format!("unknown role code {other}"))),
    };
    Ok(RawRecord {
        id,
        role,
        kind,
        fanin_ids,
    })
}

/// Read a circuit in the "self" netlist format used by the ISCAS benchmarks.
///
/// ```text
/// 1    1    0    1    0
/// 1    2    0    1    0
/// 1    3    0    1    0
/// 1    6    0    1    0
/// 1    7    0    1    0
/// 3    22   6    0    2    10   16
/// 3    23   6    0    2    16   19
/// 0    10   6    1    2    1    3
/// 0    11   6    2    2    3    6
/// 0    16   6    1    2    2    11
/// 0    19   6    1    2    11   7
/// ```
pub fn read_netlist<R: Read>(r: R) -> Result<Circuit> {
    let mut records = Vec::new();
    for line in BufReader::new(r).lines() {
        let line = line?;
        let t = line.trim();
        if t.is_empty() {
            continue;
        }
        let fields = parse_ints(t)?;
        records.push(parse_record(&fields)?);
    }

    let mut id_to_index = HashMap::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        if id_to_index.insert(rec.id, i).is_some() {
            return Err(EngineError::Format(format!(
                "node id {} defined twice",
                rec.id
            )));
        }
    }

    let mut nodes = Vec::with_capacity(records.len());
    for rec in &records {
        let node_kind = match rec.role {
            1 => NodeKind::Pi,
            2 => NodeKind::Branch,
            _ => kind_from_code(rec.id, rec.kind)?,
        };
        let mut fanin = Vec::with_capacity(rec.fanin_ids.len());
        for &fid in &rec.fanin_ids {
            let &idx = id_to_index.get(&fid).ok_or_else(|| {
                EngineError::Format(format!(
                    "node {} references undefined fanin {fid}",
                    rec.id
                ))
            })?;
            fanin.push(idx);
        }
        nodes.push(Node {
            id: rec.id,
            kind: node_kind,
            fanin,
            fanout: Vec::new(),
            level: -1,
        });
    }
    for i in 0..nodes.len() {
        let fanin = nodes[i].fanin.clone();
        for u in fanin {
            nodes[u].fanout.push(i);
        }
    }

    Circuit::from_nodes(nodes)
}

/// Write a circuit back out in the "self" netlist format.
///
/// Primary outputs (nodes with no fanout) are written with role 3 (PO);
/// every other non-PI, non-branch node is written with role 0 (GATE).
pub fn write_netlist<W: Write>(w: &mut W, circuit: &Circuit) -> Result<()> {
    for (i, n) in circuit.nodes().iter().enumerate() {
        let role = if n.kind == NodeKind::Pi {
            1
        } else if n.kind == NodeKind::Branch {
            2
        } else if circuit.is_output(i) {
            3
        } else {
            0
        };
        match role {
            1 => writeln!(w, "1 {} 0 {} 0", n.id, n.fanout.len())?,
            2 => writeln!(
                w,
                "2 {} 1 {}",
                n.id,
                circuit.node(n.fanin[0]).id
            )?,
            _ => {
                let fanin_ids: Vec<String> = n
                    .fanin
                    .iter()
                    .map(|&u| circuit.node(u).id.to_string())
                    .collect();
                writeln!(
                    w,
                    "{} {} {} {} {} {}",
                    role,
                    n.id,
                    code_from_kind(n.kind),
                    n.fanout.len(),
                    n.fanin.len(),
                    fanin_ids.join(" ")
                )?;
            }
        }
    }
    Ok(())
}
