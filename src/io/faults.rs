//! IO for fault files: one `<id>@<0|1>` fault per line.

use std::io::{BufRead, BufReader, Read, Write};

use crate::circuit::Circuit;
use crate::error::{EngineError, Result};
use crate::fault::{Fault, StuckAt};

/// Read a fault list, resolving each external node id against `circuit`.
pub fn read_fault_file<R: Read>(r: R, circuit: &Circuit) -> Result<Vec<Fault>> {
    let mut faults = Vec::new();
    for line in BufReader::new(r).lines() {
        let line = line?;
        let t = line.trim();
        if t.is_empty() {
            continue;
        }
        let (id_str, stuck_str) = t
            .split_once('@')
            .ok_or_else(|| EngineError::Format(format!("malformed fault line: {t}")))?;
        let id: u32 = id_str
            .trim()
            .parse()
            .map_err(|_| EngineError::Format(format!("bad node id in fault line: {t}")))?;
        let stuck = match stuck_str.trim() {
            "0" => StuckAt::Zero,
            "1" => StuckAt::One,
            other => {
                return Err(EngineError::Format(format!(
                    "fault stuck value must be 0 or 1, got {other}"
                )))
            }
        };
        let node = circuit
            .nodes()
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| EngineError::Format(format!("fault line references unknown node id {id}")))?;
        faults.push(Fault { node, stuck });
    }
    Ok(faults)
}

/// Write a fault list, sorted lexicographically by (id, stuck) for
/// reproducibility.
pub fn write_fault_file<W: Write>(w: &mut W, circuit: &Circuit, faults: &[Fault]) -> Result<()> {
    let mut rows: Vec<(u32, StuckAt)> = faults
        .iter()
        .map(|f| (circuit.node(f.node).id, f.stuck))
        .collect();
    rows.sort();
    for (id, stuck) in rows {
        writeln!(w, "{id}@{stuck}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{Node, NodeKind};

    fn small_circuit() -> Circuit {
        let mut nodes = vec![
            Node { id: 1, kind: NodeKind::Pi, fanin: vec![], fanout: vec![1], level: -1 },
            Node { id: 2, kind: NodeKind::Not, fanin: vec![0], fanout: vec![], level: -1 },
        ];
        nodes[1].fanin = vec![0];
        Circuit::from_nodes(nodes).unwrap()
    }

    #[test]
    fn test_read_fault_file() {
        let circuit = small_circuit();
        let text = "1@0\n2@1\n";
        let faults = read_fault_file(text.as_bytes(), &circuit).unwrap();
        assert_eq!(faults.len(), 2);
        assert_eq!(faults[0], Fault { node: 0, stuck: StuckAt::Zero });
        assert_eq!(faults[1], Fault { node: 1, stuck: StuckAt::One });
    }

    #[test]
    fn test_write_fault_file_sorted() {
        let circuit = small_circuit();
        let faults = vec![
            Fault { node: 1, stuck: StuckAt::One },
            Fault { node: 0, stuck: StuckAt::One },
            Fault { node: 0, stuck: StuckAt::Zero },
        ];
        let mut buf = Vec::new();
        write_fault_file(&mut buf, &circuit, &faults).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "1@0\n1@1\n2@1\n");
    }

    #[test]
    fn test_unknown_node_id_is_format_error() {
        let circuit = small_circuit();
        let err = read_fault_file("99@0\n".as_bytes(), &circuit).unwrap_err();
        assert!(matches!(err, EngineError::Format(_)));
    }
}
