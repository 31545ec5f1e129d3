use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::schema::v1::GaitQcV1;

const HEADER: &str =
    "variable\tvalue\tunit\tsd\tcv\tleft_mean\tright_mean\tasymmetry_index\ttotal_steps\tnormative";

pub fn write_tsv(path: &Path, report: &GaitQcV1) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut w = BufWriter::new(file);
    write_rows(&mut w, report)?;
    w.flush()?;
    Ok(())
}

/// One row per clinical variable; missing optional fields are empty.
pub fn write_rows<W: Write>(w: &mut W, report: &GaitQcV1) -> Result<()> {
    writeln!(w, "{}", HEADER)?;
    for (variable, v) in &report.clinical_variables {
        let normative = report
            .normative
            .as_ref()
            .and_then(|m| m.get(variable))
            .map(|c| c.comparison.as_str())
            .unwrap_or("");
        writeln!(
            w,
            "{}\t{:.6}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            variable,
            v.value,
            v.unit,
            opt(v.sd),
            opt(v.cv),
            opt(v.left_mean),
            opt(v.right_mean),
            opt(v.asymmetry_index),
            v.total_steps.map(|n| n.to_string()).unwrap_or_default(),
            normative
        )?;
    }
    Ok(())
}

fn opt(value: Option<f64>) -> String {
    value.map(|v| format!("{:.6}", v)).unwrap_or_default()
}
