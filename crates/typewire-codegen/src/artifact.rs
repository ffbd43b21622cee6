//! Generated artifacts and the shared-definition region they carry.

/// Opening marker of the region holding registry definitions
pub const REGION_START: &str = "// #region typewire:shared";

/// Closing marker of the region holding registry definitions
pub const REGION_END: &str = "// #endregion typewire:shared";

/// One generated TypeScript file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// File name relative to the output directory
    pub file_name: String,
    pub contents: String,
}

impl Artifact {
    pub fn new(file_name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            contents: contents.into(),
        }
    }

    /// Text between the region markers, if the artifact has a region
    pub fn shared_region(&self) -> Option<&str> {
        let start = self.contents.find(REGION_START)?;
        let after_start = start + REGION_START.len();
        let end = self.contents[after_start..].find(REGION_END)? + after_start;
        Some(self.contents[after_start..end].trim_matches('\n'))
    }
}

/// Render the banner comment, one `//` line per banner line
pub fn banner_comment(banner: &str) -> String {
    banner
        .lines()
        .map(|line| {
            if line.is_empty() {
                "//".to_string()
            } else {
                format!("// {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Assemble an artifact from its sections.
///
/// Layout: banner, shared region with registry definitions, then the
/// call-site body. Sections are separated by one blank line.
pub fn assemble(banner: &str, definitions: &str, body: &str) -> String {
    let mut out = banner_comment(banner);
    out.push_str("\n\n");
    out.push_str(REGION_START);
    out.push('\n');
    if !definitions.is_empty() {
        out.push('\n');
        out.push_str(definitions);
        out.push_str("\n\n");
    }
    out.push_str(REGION_END);
    out.push_str("\n\n");
    out.push_str(body.trim_end());
    out.push('\n');
    out
}
