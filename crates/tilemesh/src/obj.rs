use glam::Vec2;
use log::info;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::mesh::MeshFragment;
use crate::Result;

const HEADER: &str = "# exported with tiles2obj";

#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Group name used when all fragments go into one object.
    pub name: String,
    /// One `o meshN` group per fragment.
    pub split: bool,
    pub normals: bool,
    /// Add to an existing file, continuing its face indices.
    pub append: bool,
    /// Added to every position on top of the fragment's own offset.
    pub offset: Vec2,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            name: "mesh".to_string(),
            split: false,
            normals: false,
            append: false,
            offset: Vec2::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub groups: usize,
    pub vertices: usize,
    pub triangles: usize,
    /// Largest face index found in the file before writing (append mode).
    pub index_offset: u32,
}

/// Highest vertex index referenced by any `f` record.
///
/// Each face token may carry `/`-separated texture and normal indices;
/// all components count.
pub fn scan_max_face_index<R: BufRead>(reader: R) -> io::Result<u32> {
    let mut max_index = 0u32;

    for line in reader.lines() {
        let line = line?;
        let mut tokens = line.split_whitespace();

        if tokens.next() != Some("f") {
            continue;
        }

        for component in tokens.flat_map(|t| t.split('/')) {
            if let Ok(index) = component.parse::<u32>() {
                max_index = max_index.max(index);
            }
        }
    }

    Ok(max_index)
}

fn write_positions<W: Write>(w: &mut W, mesh: &MeshFragment, offset: Vec2) -> io::Result<()> {
    let shift = offset + mesh.offset;
    for v in &mesh.vertices {
        let p = v.position;
        writeln!(w, "v {} {} {}", p.x + shift.x, p.y + shift.y, p.z)?;
    }
    Ok(())
}

fn write_normals<W: Write>(w: &mut W, mesh: &MeshFragment) -> io::Result<()> {
    for v in &mesh.vertices {
        let n = v.normal;
        writeln!(w, "vn {} {} {}", n.x, n.y, n.z)?;
    }
    Ok(())
}

fn write_faces<W: Write>(
    w: &mut W,
    mesh: &MeshFragment,
    index_offset: u32,
    normals: bool,
) -> io::Result<()> {
    for tri in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i + index_offset + 1);
        if normals {
            writeln!(w, "f {a}//{a} {b}//{b} {c}//{c}")?;
        } else {
            writeln!(w, "f {a} {b} {c}")?;
        }
    }
    Ok(())
}

/// Serialize fragments as OBJ; face indices start after `index_offset`.
pub fn write_obj<W: Write>(
    w: &mut W,
    fragments: &[MeshFragment],
    index_offset: u32,
    options: &ExportOptions,
) -> io::Result<ExportStats> {
    let mut stats = ExportStats {
        index_offset,
        ..ExportStats::default()
    };

    writeln!(w, "{HEADER}")?;
    writeln!(w)?;

    let meshes: Vec<&MeshFragment> = fragments.iter().filter(|m| !m.is_empty()).collect();
    let mut offset = index_offset;

    if options.split {
        for (n, mesh) in meshes.iter().enumerate() {
            writeln!(w, "o mesh{n}")?;

            write_positions(w, mesh, options.offset)?;
            if options.normals {
                write_normals(w, mesh)?;
            }
            write_faces(w, mesh, offset, options.normals)?;
            writeln!(w)?;

            offset += mesh.vertices.len() as u32;
            stats.groups += 1;
        }
    } else {
        writeln!(w, "o {}", options.name)?;

        for mesh in &meshes {
            write_positions(w, mesh, options.offset)?;
        }

        if options.normals {
            for mesh in &meshes {
                write_normals(w, mesh)?;
            }
        }

        for mesh in &meshes {
            write_faces(w, mesh, offset, options.normals)?;
            offset += mesh.vertices.len() as u32;
        }

        stats.groups = 1;
    }

    stats.vertices = meshes.iter().map(|m| m.vertices.len()).sum();
    stats.triangles = meshes.iter().map(|m| m.triangle_count()).sum();

    Ok(stats)
}

/// Write (or append) the fragments to `path`.
pub fn export_obj<P: AsRef<Path>>(
    path: P,
    fragments: &[MeshFragment],
    options: &ExportOptions,
) -> Result<ExportStats> {
    let path = path.as_ref();

    let index_offset = if options.append {
        match File::open(path) {
            Ok(f) => scan_max_face_index(BufReader::new(f))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        }
    } else {
        0
    };

    let file = if options.append {
        OpenOptions::new().create(true).append(true).open(path)?
    } else {
        File::create(path)?
    };

    let mut w = BufWriter::new(file);
    let stats = write_obj(&mut w, fragments, index_offset, options)?;
    w.flush()?;

    info!(
        "Saved {}: {} vertices, {} triangles",
        path.display(),
        stats.vertices,
        stats.triangles
    );

    Ok(stats)
}
