//! Minimal `.npy` (format 1.0) writer for `f64` matrices.
//!
//! Layout: magic `\x93NUMPY`, version `1.0`, little-endian `u16` header
//! length, an ASCII dict header padded with spaces to a 64-byte boundary and
//! terminated by `\n`, then the data as `<f8` in C (row-major) order.

use anyhow::{bail, Context, Result};
use nalgebra::DMatrix;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const MAGIC: &[u8] = b"\x93NUMPY";
const ALIGN: usize = 64;

/// Header bytes (magic through trailing newline) for a `rows × cols` array.
pub fn header(rows: usize, cols: usize) -> Result<Vec<u8>> {
    let dict = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': ({rows}, {cols}), }}"
    );
    // magic + version + u16 length
    let prefix = MAGIC.len() + 2 + 2;
    let unpadded = prefix + dict.len() + 1;
    let total = unpadded.div_ceil(ALIGN) * ALIGN;
    let header_len = total - prefix;
    let Ok(len16) = u16::try_from(header_len) else {
        bail!("npy header of {header_len} bytes does not fit format 1.0");
    };

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&len16.to_le_bytes());
    out.extend_from_slice(dict.as_bytes());
    out.resize(total - 1, b' ');
    out.push(b'\n');
    Ok(out)
}

pub fn write_npy<W: Write>(mut w: W, m: &DMatrix<f64>) -> Result<()> {
    w.write_all(&header(m.nrows(), m.ncols())?)?;
    for r in 0..m.nrows() {
        for v in m.row(r).iter() {
            w.write_all(&v.to_le_bytes())?;
        }
    }
    w.flush()?;
    Ok(())
}

pub fn save<P: AsRef<Path>>(path: P, m: &DMatrix<f64>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_npy(BufWriter::new(file), m).with_context(|| format!("writing {}", path.display()))
}
