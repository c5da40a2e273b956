//! IO for pattern files: comma-separated, UTF-8, header row of PI ids
//! followed by one row per test vector.

use std::io::{BufRead, BufReader, Read, Write};

use crate::circuit::Circuit;
use crate::error::{EngineError, Result};

/// Read a pattern file against `circuit`'s primary inputs.
///
/// The header row gives PI ids, not necessarily in declaration order; each
/// data row is remapped so the returned `Vec<bool>` is always indexed in
/// `circuit.inputs()` order. An empty file (or a file with only a header)
/// yields an empty pattern list.
pub fn read_pattern_file<R: Read>(r: R, circuit: &Circuit) -> Result<Vec<Vec<bool>>> {
    let mut lines = BufReader::new(r).lines();
    let header = match lines.next() {
        Some(h) => h?,
        None => return Ok(Vec::new()),
    };
    let header_ids: Vec<u32> = header
        .trim()
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.trim()
                .parse::<u32>()
                .map_err(|_| EngineError::Format(format!("bad PI id in pattern header: {s}")))
        })
        .collect::<Result<_>>()?;
    if header_ids.is_empty() {
        return Ok(Vec::new());
    }
    if header_ids.len() != circuit.nb_inputs() {
        return Err(EngineError::Format(format!(
            "pattern header lists {} ids but circuit has {} primary inputs",
            header_ids.len(),
            circuit.nb_inputs()
        )));
    }
    // column j of a data row carries the value for header_ids[j]; map that
    // to its position in circuit.inputs() declaration order.
    let mut column_to_pi_pos = Vec::with_capacity(header_ids.len());
    for &id in &header_ids {
        let pos = circuit
            .inputs()
            .iter()
            .position(|&i| circuit.node(i).id == id)
            .ok_or_else(|| {
                EngineError::Format(format!("pattern header references unknown PI id {id}"))
            })?;
        column_to_pi_pos.push(pos);
    }

    let mut patterns = Vec::new();
    for line in lines {
        let line = line?;
        let t = line.trim();
        if t.is_empty() {
            continue;
        }
        let bits: Vec<&str> = t.split(',').map(|s| s.trim()).collect();
        if bits.len() != header_ids.len() {
            return Err(EngineError::Format(format!(
                "pattern row has {} values, expected {}",
                bits.len(),
                header_ids.len()
            )));
        }
        let mut pattern = vec![false; header_ids.len()];
        for (col, b) in bits.iter().enumerate() {
            let bit = match *b {
                "0" => false,
                "1" => true,
                other => {
                    return Err(EngineError::Format(format!(
                        "pattern value must be 0 or 1, got {other}"
                    )))
                }
            };
            pattern[column_to_pi_pos[col]] = bit;
        }
        patterns.push(pattern);
    }
    Ok(patterns)
}

/// Write a pattern file: a fresh header row of PI ids (declaration order)
/// followed by one comma-separated row per pattern.
pub fn write_pattern_file<W: Write>(w: &mut W, circuit: &Circuit, patterns: &[Vec<bool>]) -> Result<()> {
    let header: Vec<String> = circuit
        .inputs()
        .iter()
        .map(|&i| circuit.node(i).id.to_string())
        .collect();
    writeln!(w, "{}", header.join(","))?;
    for pattern in patterns {
        let row: Vec<&str> = pattern.iter().map(|&b| if b { "1" } else { "0" }).collect();
        writeln!(w, "{}", row.join(","))?;
    }
    Ok(())
}
