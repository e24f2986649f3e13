use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use glam::{Mat4, Vec3};

use crate::foundation::core::Rgb8;
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::scene::mesh::Mesh;

/// A model file handed over by the caller: its name (for the extension and error
/// messages) and raw bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ModelFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> ForgeResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let bytes = std::fs::read(path)
            .map_err(|e| ForgeError::from(e).into_model_load(name.clone()))?;
        Ok(Self { name, bytes })
    }

    /// Lower-cased extension without the dot.
    pub fn extension(&self) -> String {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default()
    }
}

pub trait ModelParser: Send + Sync {
    /// Lower-case extensions this parser handles.
    fn extensions(&self) -> &'static [&'static str];
    fn parse(&self, bytes: &[u8]) -> ForgeResult<Mesh>;
}

/// Extension-keyed set of model parsers.
#[derive(Clone)]
pub struct ParserRegistry {
    parsers: BTreeMap<String, Arc<dyn ModelParser>>,
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("extensions", &self.parsers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        let mut r = Self::empty();
        r.register(Arc::new(StlParser));
        r.register(Arc::new(ObjParser));
        r.register(Arc::new(GltfParser));
        r
    }
}

impl ParserRegistry {
    pub fn empty() -> Self {
        Self {
            parsers: BTreeMap::new(),
        }
    }

    /// Register `parser` for each of its extensions, replacing earlier entries.
    pub fn register(&mut self, parser: Arc<dyn ModelParser>) {
        for ext in parser.extensions() {
            self.parsers
                .insert(ext.to_ascii_lowercase(), Arc::clone(&parser));
        }
    }

    pub fn supports(&self, extension: &str) -> bool {
        self.parsers.contains_key(&extension.to_ascii_lowercase())
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.parsers.keys().map(String::as_str)
    }

    /// Parse and normalize a model. Every failure is tagged with the file name.
    #[tracing::instrument(skip(self, file), fields(name = %file.name, bytes = file.bytes.len()))]
    pub fn load(&self, file: &ModelFile) -> ForgeResult<Mesh> {
        self.load_inner(file)
            .map_err(|e| e.into_model_load(file.name.clone()))
    }

    fn load_inner(&self, file: &ModelFile) -> ForgeResult<Mesh> {
        let extension = file.extension();
        let parser = self
            .parsers
            .get(&extension)
            .ok_or_else(|| ForgeError::UnsupportedFormat {
                extension: extension.clone(),
            })?;
        let mut mesh = parser.parse(&file.bytes)?;
        mesh.validate()?;
        mesh.normalize();
        tracing::debug!(triangles = mesh.triangle_count(), "model parsed");
        Ok(mesh)
    }
}

/// STL, binary or ASCII. Z-up meshes are turned Y-up.
#[derive(Clone, Copy, Debug, Default)]
pub struct StlParser;

impl StlParser {
    fn parse_binary(bytes: &[u8]) -> ForgeResult<Mesh> {
        let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
        let mut mesh = Mesh::default();
        mesh.positions.reserve(count * 3);
        mesh.triangles.reserve(count);
        for tri in 0..count {
            let base = 84 + tri * 50;
            // Skip the 12-byte facet normal; normals are recomputed when shading.
            let mut corner = [0u32; 3];
            for (k, slot) in corner.iter_mut().enumerate() {
                let off = base + 12 + k * 12;
                let read = |o: usize| {
                    f32::from_le_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]])
                };
                *slot = mesh.positions.len() as u32;
                mesh.positions
                    .push(Vec3::new(read(off), read(off + 4), read(off + 8)));
            }
            mesh.triangles.push(corner);
        }
        Ok(mesh)
    }

    fn parse_ascii(text: &str) -> ForgeResult<Mesh> {
        let mut mesh = Mesh::default();
        let mut pending: Vec<u32> = Vec::with_capacity(3);
        for (line_no, line) in text.lines().enumerate() {
            let mut it = line.split_whitespace();
            match it.next() {
                Some("vertex") => {
                    let v = parse_vec3(&mut it)
                        .ok_or_else(|| ForgeError::parse(format!("bad vertex on line {}", line_no + 1)))?;
                    pending.push(mesh.positions.len() as u32);
                    mesh.positions.push(v);
                }
                Some("endloop") => {
                    if pending.len() != 3 {
                        return Err(ForgeError::parse(format!(
                            "facet ending on line {} has {} vertices",
                            line_no + 1,
                            pending.len()
                        )));
                    }
                    mesh.triangles.push([pending[0], pending[1], pending[2]]);
                    pending.clear();
                }
                _ => {}
            }
        }
        Ok(mesh)
    }
}

impl ModelParser for StlParser {
    fn extensions(&self) -> &'static [&'static str] {
        &["stl"]
    }

    fn parse(&self, bytes: &[u8]) -> ForgeResult<Mesh> {
        let binary_len = (bytes.len() >= 84).then(|| {
            let n = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
            84 + n * 50
        });
        let mut mesh = if binary_len == Some(bytes.len()) {
            Self::parse_binary(bytes)?
        } else if bytes.trim_ascii_start().starts_with(b"solid") {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| ForgeError::parse(format!("ascii stl is not utf-8: {e}")))?;
            Self::parse_ascii(text)?
        } else {
            return Err(ForgeError::parse("stl is neither valid binary nor ascii"));
        };
        mesh.rotate_x(-std::f32::consts::FRAC_PI_2);
        Ok(mesh)
    }
}

/// Wavefront OBJ: polygon faces (fan-triangulated), `v/vt/vn` references, negative
/// indices, and optional `v x y z r g b` vertex colors.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjParser;

impl ModelParser for ObjParser {
    fn extensions(&self) -> &'static [&'static str] {
        &["obj"]
    }

    fn parse(&self, bytes: &[u8]) -> ForgeResult<Mesh> {
        let text = String::from_utf8_lossy(bytes);
        let mut mesh = Mesh::default();
        let mut colors: Vec<Option<Rgb8>> = Vec::new();

        for (line_no, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            let mut it = line.split_whitespace();
            match it.next() {
                Some("v") => {
                    let p = parse_vec3(&mut it)
                        .ok_or_else(|| ForgeError::parse(format!("bad vertex on line {}", line_no + 1)))?;
                    mesh.positions.push(p);
                    colors.push(parse_vec3(&mut it).map(|c| {
                        let ch = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
                        Rgb8::new(ch(c.x), ch(c.y), ch(c.z))
                    }));
                }
                Some("f") => {
                    let n = mesh.positions.len();
                    let idx = it
                        .map(|tok| resolve_index(tok, n))
                        .collect::<Option<Vec<u32>>>()
                        .ok_or_else(|| ForgeError::parse(format!("bad face on line {}", line_no + 1)))?;
                    if idx.len() < 3 {
                        return Err(ForgeError::parse(format!(
                            "face on line {} has fewer than 3 vertices",
                            line_no + 1
                        )));
                    }
                    for k in 1..idx.len() - 1 {
                        mesh.triangles.push([idx[0], idx[k], idx[k + 1]]);
                    }
                }
                _ => {}
            }
        }

        if colors.iter().all(Option::is_some) && !colors.is_empty() {
            mesh.colors = colors.into_iter().flatten().collect();
        }
        Ok(mesh)
    }
}

/// glTF 2.0: `.gltf` with embedded buffers, or binary `.glb`. Triangle primitives of the
/// default scene are flattened with their node transforms. Colors come from `COLOR_0`
/// tinted by the material's base color factor, or from the factor alone.
#[derive(Clone, Copy, Debug, Default)]
pub struct GltfParser;

impl ModelParser for GltfParser {
    fn extensions(&self) -> &'static [&'static str] {
        &["gltf", "glb"]
    }

    fn parse(&self, bytes: &[u8]) -> ForgeResult<Mesh> {
        let (document, buffers, _images) =
            gltf::import_slice(bytes).map_err(|e| ForgeError::parse(format!("gltf: {e}")))?;
        let mut mesh = Mesh::default();
        match document.default_scene().or_else(|| document.scenes().next()) {
            Some(scene) => {
                for node in scene.nodes() {
                    append_gltf_node(&node, Mat4::IDENTITY, &buffers, &mut mesh)?;
                }
            }
            None => {
                for m in document.meshes() {
                    append_gltf_mesh(&m, Mat4::IDENTITY, &buffers, &mut mesh)?;
                }
            }
        }
        Ok(mesh)
    }
}

fn append_gltf_node(
    node: &gltf::Node<'_>,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Mesh,
) -> ForgeResult<()> {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    if let Some(m) = node.mesh() {
        append_gltf_mesh(&m, world, buffers, out)?;
    }
    for child in node.children() {
        append_gltf_node(&child, world, buffers, out)?;
    }
    Ok(())
}

fn append_gltf_mesh(
    m: &gltf::Mesh<'_>,
    world: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Mesh,
) -> ForgeResult<()> {
    for prim in m.primitives() {
        if prim.mode() != gltf::mesh::Mode::Triangles {
            tracing::debug!(mode = ?prim.mode(), "skipping non-triangle primitive");
            continue;
        }
        let reader = prim.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
        let Some(positions) = reader.read_positions() else {
            continue;
        };
        let base = u32::try_from(out.positions.len())
            .map_err(|_| ForgeError::parse("gltf: too many vertices"))?;
        out.positions
            .extend(positions.map(|p| world.transform_point3(Vec3::from(p))));
        let count = out.positions.len() as u32 - base;

        let factor = prim.material().pbr_metallic_roughness().base_color_factor();
        let tint = linear_to_rgb8(factor);
        if let Some(colors) = reader.read_colors(0) {
            out.colors.extend(colors.into_rgba_f32().take(count as usize).map(|c| {
                linear_to_rgb8([c[0] * factor[0], c[1] * factor[1], c[2] * factor[2], 1.0])
            }));
        }
        out.colors.resize(out.positions.len(), tint);

        match reader.read_indices() {
            Some(indices) => {
                let idx: Vec<u32> = indices.into_u32().collect();
                for tri in idx.chunks_exact(3) {
                    out.triangles
                        .push([base + tri[0], base + tri[1], base + tri[2]]);
                }
            }
            None => {
                for first in (0..count / 3).map(|t| base + t * 3) {
                    out.triangles.push([first, first + 1, first + 2]);
                }
            }
        }
    }
    Ok(())
}

/// glTF colors are linear; the renderer works in sRGB bytes.
fn linear_to_rgb8(c: [f32; 4]) -> Rgb8 {
    let ch = |v: f32| {
        let v = v.clamp(0.0, 1.0);
        let s = if v <= 0.003_130_8 {
            v * 12.92
        } else {
            1.055 * v.powf(1.0 / 2.4) - 0.055
        };
        (s * 255.0).round() as u8
    };
    Rgb8::new(ch(c[0]), ch(c[1]), ch(c[2]))
}

fn parse_vec3<'a>(it: &mut impl Iterator<Item = &'a str>) -> Option<Vec3> {
    let x = it.next()?.parse().ok()?;
    let y = it.next()?.parse().ok()?;
    let z = it.next()?.parse().ok()?;
    Some(Vec3::new(x, y, z))
}

/// `v`, `v/vt`, `v//vn` or `v/vt/vn`; 1-based, negative counts from the end.
fn resolve_index(token: &str, count: usize) -> Option<u32> {
    let raw: i64 = token.split('/').next()?.parse().ok()?;
    let count = count as i64;
    let zero_based = match raw {
        0 => return None,
        r if r > 0 => r - 1,
        r => count + r,
    };
    (0..count).contains(&zero_based).then_some(zero_based as u32)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/loader.rs"]
mod tests;
