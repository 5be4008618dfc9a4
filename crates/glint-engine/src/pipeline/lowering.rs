//! Uniform block lowering.
//!
//! naga lays out GLSL uniform blocks as std140, but the WGSL it emits cannot
//! express every std140 layout: `float`/`int`/`vec2` arrays need a 16-byte
//! stride WGSL has no spelling for, booleans are not host-shareable and
//! two-row matrices have no std140 form in naga at all. Block members of
//! those kinds are stored `vec4`-wide (booleans as `uint`) under the name
//! `glint_<name>` and copied into private globals with their declared names
//! before the stage's `main` runs, so shader code reads them unchanged.
//!
//! Only blocks without an instance name are rewritten.

use std::ops::Range;

use super::shader::{ArrayLayout, ScalarType, Shape, UniformType};

/// Prefix of the padded block member that stores a lowered uniform.
pub const STORAGE_PREFIX: &str = "glint_";

/// A rewritten block member, as the host writes it.
#[derive(Debug, Clone, PartialEq)]
pub struct LoweredMember {
    pub name: String,
    pub ty: UniformType,
    pub array: Option<ArrayLayout>,
}

impl LoweredMember {
    pub fn storage_name(&self) -> String {
        format!("{STORAGE_PREFIX}{}", self.name)
    }
}

/// A stage source ready for naga.
#[derive(Debug, Clone)]
pub struct PreparedStage {
    pub source: String,
    pub lowered: Vec<LoweredMember>,
}

/// Lowers the stage's uniform blocks. With `flip_y` the written clip-space
/// `y` is negated after the stage's own `main` has run.
pub fn prepare_stage(source: &str, flip_y: bool) -> Result<PreparedStage, String> {
    let (body, lowered, loaders) = lower_blocks(source)?;
    Ok(PreparedStage {
        source: wrap_main(&body, &loaders, flip_y),
        lowered,
    })
}

// ── main wrapper ──────────────────────────────────────────────────────────

/// Renames the stage's `main` and appends a new one that runs the uniform
/// loaders, then the renamed one, then the clip-space flip.
fn wrap_main(source: &str, loaders: &[String], flip_y: bool) -> String {
    if loaders.is_empty() && !flip_y {
        return source.to_string();
    }

    let mut prelude = String::from("#define main glint_user_main\n");
    if flip_y {
        prelude.push_str("#define gl_Position glint_position\nvec4 glint_position;\n");
    }

    let mut epilogue = String::from("\n#undef main\n");
    if flip_y {
        epilogue.push_str("#undef gl_Position\n");
    }
    epilogue.push_str("void main() {\n");
    for loader in loaders {
        epilogue.push_str(&format!("    {loader}();\n"));
    }
    epilogue.push_str("    glint_user_main();\n");
    if flip_y {
        epilogue.push_str("    gl_Position = vec4(glint_position.x, -glint_position.y, glint_position.zw);\n");
    }
    epilogue.push_str("}\n");

    let (version, body) = match source.trim_start().strip_prefix("#version") {
        Some(_) => {
            let start = source.len() - source.trim_start().len();
            let end = source[start..].find('\n').map_or(source.len(), |i| start + i + 1);
            source.split_at(end)
        }
        None => ("", source),
    };

    let mut out = String::with_capacity(source.len() + prelude.len() + epilogue.len() + 1);
    out.push_str(version);
    if !version.is_empty() && !version.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&prelude);
    out.push_str(body);
    out.push_str(&epilogue);
    out
}

// ── blocks ────────────────────────────────────────────────────────────────

struct BlockSpan {
    name: String,
    body: Range<usize>,
    /// One past the closing `;`.
    end: usize,
    has_instance: bool,
}

#[derive(Default)]
struct BodyRewrite {
    members: String,
    globals: String,
    copies: String,
    lowered: Vec<LoweredMember>,
}

/// Returns the rewritten source, the lowered members and one loader
/// function name per rewritten block.
fn lower_blocks(source: &str) -> Result<(String, Vec<LoweredMember>, Vec<String>), String> {
    let src = mask_comments(source);
    let mut out = String::with_capacity(src.len());
    let mut lowered = Vec::new();
    let mut loaders = Vec::new();
    let mut copied_up_to = 0;
    let mut search_from = 0;

    while let Some(block) = next_block(&src, search_from) {
        search_from = block.end;
        let body = &src[block.body.clone()];
        let rewrite = rewrite_body(body)?;
        if rewrite.lowered.is_empty() {
            continue;
        }
        if block.has_instance {
            let names: Vec<_> = rewrite.lowered.iter().map(|m| m.name.as_str()).collect();
            return Err(format!(
                "uniform block '{}' must be declared without an instance name to hold {names:?}",
                block.name
            ));
        }

        let loader = format!("glint_load_{}", block.name);
        // Everything added lands on the block's own lines so later line
        // numbers in compile errors stay put.
        out.push_str(&src[copied_up_to..block.body.start]);
        out.push_str(&rewrite.members);
        out.extend(std::iter::repeat_n('\n', body.matches('\n').count()));
        out.push_str(&src[block.body.end..block.end]);
        out.push(' ');
        out.push_str(&rewrite.globals);
        out.push_str(&format!("void {loader}() {{ {}}}", rewrite.copies));

        copied_up_to = block.end;
        lowered.extend(rewrite.lowered);
        loaders.push(loader);
    }
    out.push_str(&src[copied_up_to..]);

    Ok((out, lowered, loaders))
}

fn next_block(src: &str, from: usize) -> Option<BlockSpan> {
    let bytes = src.as_bytes();
    let mut pos = from;

    while let Some(found) = src.get(pos..)?.find("uniform") {
        let start = pos + found;
        let after = start + "uniform".len();
        pos = after;

        let bounded = (start == 0 || !is_ident(bytes[start - 1]))
            && bytes.get(after).is_none_or(|b| !is_ident(*b));
        if !bounded {
            continue;
        }

        let name_start = skip_ws(src, after);
        let name_end = ident_end(src, name_start);
        if name_end == name_start {
            continue;
        }
        let open = skip_ws(src, name_end);
        if bytes.get(open) != Some(&b'{') {
            continue;
        }
        let close = open + src[open..].find('}')?;

        let next = skip_ws(src, close + 1);
        let has_instance = bytes.get(next) != Some(&b';');
        let end = match src[close..].find(';') {
            Some(i) => close + i + 1,
            None => src.len(),
        };

        return Some(BlockSpan {
            name: src[name_start..name_end].to_string(),
            body: open + 1..close,
            end,
            has_instance,
        });
    }
    None
}

fn rewrite_body(body: &str) -> Result<BodyRewrite, String> {
    let mut rewrite = BodyRewrite::default();

    for decl in body.split(';').map(str::trim).filter(|d| !d.is_empty()) {
        // Layout qualifiers on members are passed through untouched.
        let Some(declarators) = split_declaration(decl) else {
            rewrite.members.push_str(decl);
            rewrite.members.push_str("; ");
            continue;
        };

        for Declarator { prefix, ty, name, array } in declarators {
            let logical = parse_type(ty);
            let plan = logical.filter(|t| needs_lowering(*t, array.is_some()));
            let Some(logical) = plan else {
                rewrite.members.push_str(&format!("{prefix} {name}"));
                if let Some(len) = array {
                    rewrite.members.push_str(&format!("[{len}]"));
                }
                rewrite.members.push_str("; ");
                continue;
            };

            let len = array.map(|len| parse_len(name, len)).transpose()?;
            lower_member(&mut rewrite, ty, name, logical, len);
        }
    }
    Ok(rewrite)
}

struct Declarator<'a> {
    /// Qualifiers and type, as written.
    prefix: &'a str,
    ty: &'a str,
    name: &'a str,
    array: Option<&'a str>,
}

/// Splits `float a, b[3]` into its declarators. `None` for declarations the
/// rewrite leaves alone.
fn split_declaration(decl: &str) -> Option<Vec<Declarator<'_>>> {
    if decl.contains('(') {
        return None;
    }
    let mut parts = decl.split(',');
    let (prefix, name, array) = split_declarator(parts.next()?)?;
    let ty = prefix.rsplit(char::is_whitespace).next().filter(|t| !t.is_empty())?;

    let mut out = vec![Declarator {
        prefix,
        ty,
        name,
        array,
    }];
    for part in parts {
        let (rest, name, array) = split_declarator(part)?;
        if !rest.is_empty() {
            return None;
        }
        out.push(Declarator {
            prefix,
            ty,
            name,
            array,
        });
    }
    Some(out)
}

/// Splits `highp float w[3]` into `("highp float", "w", Some("3"))`.
fn split_declarator(text: &str) -> Option<(&str, &str, Option<&str>)> {
    let text = text.trim();
    let (head, array) = match text.strip_suffix(']') {
        Some(rest) => {
            let open = rest.rfind('[')?;
            (rest[..open].trim_end(), Some(rest[open + 1..].trim()))
        }
        None => (text, None),
    };
    let start = head.len() - head.bytes().rev().take_while(|b| is_ident(*b)).count();
    let name = &head[start..];
    if name.is_empty() {
        return None;
    }
    Some((head[..start].trim(), name, array))
}

fn parse_len(name: &str, text: &str) -> Result<u32, String> {
    text.trim_end_matches(['u', 'U'])
        .parse::<u32>()
        .ok()
        .filter(|len| *len > 0)
        .ok_or_else(|| format!("uniform '{name}': array length must be a positive integer literal, found '{text}'"))
}

fn parse_type(name: &str) -> Option<UniformType> {
    let scalar = |scalar| UniformType {
        scalar,
        shape: Shape::Scalar,
    };
    match name {
        "float" => return Some(scalar(ScalarType::Float)),
        "int" => return Some(scalar(ScalarType::Int)),
        "uint" => return Some(scalar(ScalarType::Uint)),
        "bool" => return Some(scalar(ScalarType::Bool)),
        _ => {}
    }

    let dimension = |s: &str| s.parse::<u8>().ok().filter(|n| (2..=4).contains(n));

    if let Some(dims) = name.strip_prefix("mat") {
        let (columns, rows) = match dims.split_once('x') {
            Some((c, r)) => (dimension(c)?, dimension(r)?),
            None => {
                let n = dimension(dims)?;
                (n, n)
            }
        };
        return Some(UniformType {
            scalar: ScalarType::Float,
            shape: Shape::Matrix { columns, rows },
        });
    }

    let (scalar, size) = [
        ("vec", ScalarType::Float),
        ("ivec", ScalarType::Int),
        ("uvec", ScalarType::Uint),
        ("bvec", ScalarType::Bool),
    ]
    .into_iter()
    .find_map(|(prefix, scalar)| name.strip_prefix(prefix).map(|size| (scalar, size)))?;

    Some(UniformType {
        scalar,
        shape: Shape::Vector(dimension(size)?),
    })
}

fn needs_lowering(ty: UniformType, arrayed: bool) -> bool {
    if ty.scalar == ScalarType::Bool {
        return true;
    }
    match ty.shape {
        Shape::Matrix { rows: 2, .. } => true,
        Shape::Scalar | Shape::Vector(2) => arrayed,
        _ => false,
    }
}

const SWIZZLES: [&str; 4] = ["x", "xy", "xyz", "xyzw"];

fn lower_member(rewrite: &mut BodyRewrite, ty_name: &str, name: &str, ty: UniformType, len: Option<u32>) {
    let storage = format!("{STORAGE_PREFIX}{name}");

    let stride = match ty.shape {
        Shape::Matrix { columns, rows } => {
            let columns = u32::from(columns);
            let swizzle = SWIZZLES[rows as usize - 1];
            rewrite
                .members
                .push_str(&format!("vec4 {storage}[{}]; ", columns * len.unwrap_or(1)));

            let matrix = |first: u32| {
                let cols: Vec<_> = (first..first + columns)
                    .map(|c| format!("{storage}[{c}].{swizzle}"))
                    .collect();
                format!("{ty_name}({})", cols.join(", "))
            };
            match len {
                Some(len) => {
                    for i in 0..len {
                        rewrite
                            .copies
                            .push_str(&format!("{name}[{i}] = {}; ", matrix(i * columns)));
                    }
                }
                None => rewrite.copies.push_str(&format!("{name} = {}; ", matrix(0))),
            }
            16 * columns
        }

        Shape::Scalar | Shape::Vector(_) => {
            let width = ty.components();
            match len {
                Some(len) => {
                    let element = match ty.scalar {
                        ScalarType::Float => "vec4",
                        ScalarType::Int => "ivec4",
                        ScalarType::Uint | ScalarType::Bool => "uvec4",
                    };
                    rewrite.members.push_str(&format!("{element} {storage}[{len}]; "));
                    for i in 0..len {
                        let read = format!("{storage}[{i}].{}", SWIZZLES[width - 1]);
                        rewrite
                            .copies
                            .push_str(&format!("{name}[{i}] = {}; ", unpack(ty, &read)));
                    }
                }
                None => {
                    // Only booleans get here.
                    let storage_ty = match width {
                        1 => "uint".to_string(),
                        n => format!("uvec{n}"),
                    };
                    rewrite.members.push_str(&format!("{storage_ty} {storage}; "));
                    rewrite
                        .copies
                        .push_str(&format!("{name} = {}; ", unpack(ty, &storage)));
                }
            }
            16
        }
    };

    match len {
        Some(len) => rewrite.globals.push_str(&format!("{ty_name} {name}[{len}]; ")),
        None => rewrite.globals.push_str(&format!("{ty_name} {name}; ")),
    }
    rewrite.lowered.push(LoweredMember {
        name: name.to_string(),
        ty,
        array: len.map(|len| ArrayLayout { len, stride }),
    });
}

/// Converts a stored read back to the declared type.
fn unpack(ty: UniformType, read: &str) -> String {
    match (ty.scalar, ty.shape) {
        (ScalarType::Bool, Shape::Vector(n)) => format!("notEqual({read}, uvec{n}(0u))"),
        (ScalarType::Bool, _) => format!("{read} != 0u"),
        _ => read.to_string(),
    }
}

// ── scanning ──────────────────────────────────────────────────────────────

fn is_ident(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn skip_ws(s: &str, i: usize) -> usize {
    i + s[i..].len() - s[i..].trim_start().len()
}

fn ident_end(s: &str, i: usize) -> usize {
    i + s[i..].bytes().take_while(|b| is_ident(*b)).count()
}

/// Blanks out comments, keeping byte offsets and line breaks.
fn mask_comments(source: &str) -> String {
    let mut bytes = source.as_bytes().to_vec();
    let mut i = 0;
    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'/', b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    bytes[i] = b' ';
                    i += 1;
                }
            }
            (b'/', b'*') => {
                let mut j = i + 2;
                while j + 1 < bytes.len() && !(bytes[j] == b'*' && bytes[j + 1] == b'/') {
                    j += 1;
                }
                let end = (j + 2).min(bytes.len());
                for b in &mut bytes[i..end] {
                    if *b != b'\n' {
                        *b = b' ';
                    }
                }
                i = end;
            }
            _ => i += 1,
        }
    }
    // Only whole comments were replaced, so the bytes are still UTF-8.
    String::from_utf8_lossy(&bytes).into_owned()
}
