//! Unified export pass.
//!
//! The HTTP and socket synthesizers each inline their registry output in a
//! marked region. This pass lifts both regions into one shared artifact,
//! keeping the first declaration of every exported name, and rewrites the
//! call-site artifacts to import what they reference.

use crate::artifact::{Artifact, REGION_END, REGION_START, banner_comment};
use std::collections::HashMap;
use typewire_core::{GenError, GenResult, GeneratorConfig};

/// Keywords that may follow `export` in a registry declaration
const DECLARATION_KEYWORDS: &[&str] = &[
    "interface",
    "type",
    "function",
    "async function",
    "const",
    "let",
    "class",
    "abstract class",
    "enum",
];

/// Import statements longer than this are broken across lines
const IMPORT_WIDTH: usize = 100;

/// One exported top-level declaration, with its leading doc comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub text: String,
}

/// Result of merging the HTTP and socket artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged {
    pub http: Artifact,
    pub socket: Artifact,
    pub shared: Artifact,
}

/// Merge the HTTP and socket artifacts into two call sites and a shared artifact
pub fn merge(http: &Artifact, socket: &Artifact, config: &GeneratorConfig) -> GenResult<Merged> {
    let (mut call_sites, shared) = merge_all(&[http, socket], config)?;
    let socket = call_sites.pop();
    let http = call_sites.pop();
    match (http, socket) {
        (Some(http), Some(socket)) => Ok(Merged {
            http,
            socket,
            shared,
        }),
        _ => Err(GenError::Resolution(
            "merge did not return both call-site artifacts".into(),
        )),
    }
}

/// Merge any number of artifacts.
///
/// Returns the rewritten call-site artifacts in input order, followed by the
/// shared artifact.
pub fn merge_all(
    artifacts: &[&Artifact],
    config: &GeneratorConfig,
) -> GenResult<(Vec<Artifact>, Artifact)> {
    let mut declarations: Vec<Declaration> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for artifact in artifacts {
        let region = artifact.shared_region().ok_or_else(|| {
            GenError::Resolution(format!("`{}` has no shared region", artifact.file_name))
        })?;
        for declaration in split_declarations(region)? {
            match index.get(&declaration.name) {
                Some(&at) => {
                    if declarations[at].text != declaration.text {
                        tracing::warn!(
                            name = %declaration.name,
                            file = %artifact.file_name,
                            "conflicting shared declaration; keeping the first"
                        );
                    }
                }
                None => {
                    index.insert(declaration.name.clone(), declarations.len());
                    declarations.push(declaration);
                }
            }
        }
    }

    let names: Vec<&str> = declarations.iter().map(|d| d.name.as_str()).collect();
    let module = config.shared_module();
    let call_sites = artifacts
        .iter()
        .map(|artifact| rewrite_call_site(artifact, &names, &module))
        .collect::<GenResult<Vec<_>>>()?;

    tracing::debug!(
        declarations = declarations.len(),
        artifacts = artifacts.len(),
        "merged shared declarations"
    );

    let shared = Artifact::new(
        config.shared_file.clone(),
        render_shared(&config.banner, &declarations),
    );
    Ok((call_sites, shared))
}

/// Split a region into declarations.
///
/// Declarations are separated by blank lines. A chunk that does not start
/// an exported declaration continues the one before it.
pub fn split_declarations(region: &str) -> GenResult<Vec<Declaration>> {
    let mut out: Vec<Declaration> = Vec::new();
    for chunk in region.split("\n\n") {
        let chunk = chunk.trim_matches('\n');
        if chunk.trim().is_empty() {
            continue;
        }
        match declaration_name(chunk) {
            Some(name) => out.push(Declaration {
                name,
                text: chunk.to_string(),
            }),
            None => match out.last_mut() {
                Some(previous) => {
                    previous.text.push_str("\n\n");
                    previous.text.push_str(chunk);
                }
                None => {
                    return Err(GenError::Resolution(format!(
                        "shared region starts with an unnamed block: `{}`",
                        chunk.lines().next().unwrap_or_default()
                    )));
                }
            },
        }
    }
    Ok(out)
}

/// Exported name of a declaration, skipping its leading comment
pub fn declaration_name(text: &str) -> Option<String> {
    let line = text.lines().map(str::trim).find(|line| {
        !(line.is_empty() || line.starts_with("/*") || line.starts_with('*') || line.starts_with("//"))
    })?;

    let rest = line.strip_prefix("export ")?;
    let rest = rest.strip_prefix("declare ").unwrap_or(rest);
    let rest = DECLARATION_KEYWORDS
        .iter()
        .find_map(|keyword| rest.strip_prefix(keyword)?.strip_prefix(' '))?;

    let name: String = rest.chars().take_while(|c| is_ident_char(*c)).collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        None
    } else {
        Some(name)
    }
}

/// Whether `name` appears in `text` as a whole word
pub fn references(text: &str, name: &str) -> bool {
    text.match_indices(name).any(|(at, _)| {
        let before = text[..at].chars().next_back();
        let after = text[at + name.len()..].chars().next();
        !before.is_some_and(is_ident_char) && !after.is_some_and(is_ident_char)
    })
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn render_shared(banner: &str, declarations: &[Declaration]) -> String {
    let mut out = banner_comment(banner);
    out.push_str("\n\n");
    if declarations.is_empty() {
        out.push_str("export {};\n");
        return out;
    }
    let body = declarations
        .iter()
        .map(|d| d.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    out.push_str(&body);
    out.push('\n');
    out
}

fn rewrite_call_site(artifact: &Artifact, names: &[&str], module: &str) -> GenResult<Artifact> {
    let stripped = strip_region(&artifact.contents).ok_or_else(|| {
        GenError::Resolution(format!("`{}` has no shared region", artifact.file_name))
    })?;

    let mut used: Vec<&str> = names
        .iter()
        .copied()
        .filter(|name| references(&stripped, name))
        .collect();
    used.sort_unstable();

    let contents = if used.is_empty() {
        stripped
    } else {
        insert_after_header(&stripped, &import_statement(&used, module))
    };
    Ok(Artifact::new(artifact.file_name.clone(), contents))
}

/// Remove the region, its markers, and the blank lines after it
fn strip_region(contents: &str) -> Option<String> {
    let start = contents.find(REGION_START)?;
    let end = contents[start..].find(REGION_END)? + start + REGION_END.len();
    let mut out = contents[..start].to_string();
    out.push_str(contents[end..].trim_start_matches('\n'));
    Some(out)
}

fn import_statement(names: &[&str], module: &str) -> String {
    let single = format!("import {{ {} }} from '{module}';", names.join(", "));
    if single.len() <= IMPORT_WIDTH {
        return single;
    }
    let mut out = "import {\n".to_string();
    for name in names {
        out.push_str(&format!("  {name},\n"));
    }
    out.push_str(&format!("}} from '{module}';"));
    out
}

/// Insert a statement after the leading `//` comment block
fn insert_after_header(contents: &str, statement: &str) -> String {
    let header_len: usize = contents
        .split_inclusive('\n')
        .take_while(|line| line.starts_with("//"))
        .map(str::len)
        .sum();
    let (header, rest) = contents.split_at(header_len);
    let rest = rest.trim_start_matches('\n');
    if header.is_empty() {
        format!("{statement}\n\n{rest}")
    } else {
        format!("{header}\n{statement}\n\n{rest}")
    }
}
